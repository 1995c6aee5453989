//! HTTP disbursement gateway client.

use super::{Disburser, DisbursementError, DisbursementReceipt};
use crate::domain::{BankDetails, Money};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Disbursement provider reached over HTTP.
///
/// No automatic retry: a failed or unknown outcome is handed back to the
/// payout workflow, and an administrator decides after checking the
/// provider's records. Blind retries risk double payment.
#[derive(Debug, Clone)]
pub struct HttpDisburser {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DisburseRequest<'a> {
    destination_bank: &'a str,
    account_number: &'a str,
    account_name: &'a str,
    amount: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DisburseResponse {
    success: bool,
    reference_id: Option<String>,
    #[serde(default)]
    provider_fee: i64,
    message: Option<String>,
}

impl HttpDisburser {
    /// Create a gateway client with a bounded per-call timeout.
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl Disburser for HttpDisburser {
    async fn disburse(
        &self,
        bank: &BankDetails,
        amount: Money,
    ) -> Result<DisbursementReceipt, DisbursementError> {
        debug!(bank = %bank.bank_name, amount = %amount, "Calling disbursement provider");

        let url = format!("{}/v1/disbursements", self.base_url);
        let payload = DisburseRequest {
            destination_bank: &bank.bank_name,
            account_number: &bank.account_number,
            account_name: &bank.account_name,
            amount: amount.as_i64(),
        };

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    // The transfer may have gone through; only the ack was lost.
                    DisbursementError::Unknown(format!("timeout: {}", e))
                } else if e.is_connect() {
                    DisbursementError::Rejected(format!("connection failed: {}", e))
                } else {
                    DisbursementError::Unknown(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_server_error() {
            // The provider may have accepted the transfer before failing.
            return Err(DisbursementError::Unknown(format!(
                "provider returned {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(DisbursementError::Rejected(format!(
                "provider returned {}",
                status
            )));
        }

        let body: DisburseResponse = response
            .json()
            .await
            .map_err(|e| DisbursementError::ParseError(e.to_string()))?;

        if !body.success {
            return Err(DisbursementError::Rejected(
                body.message.unwrap_or_else(|| "provider declined".to_string()),
            ));
        }

        let reference_id = body.reference_id.ok_or_else(|| {
            DisbursementError::ParseError("success response missing referenceId".to_string())
        })?;

        Ok(DisbursementReceipt {
            reference_id,
            provider_fee: Money::new(body.provider_fee),
        })
    }
}
