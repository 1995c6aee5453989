use axum::http::StatusCode;
use pasarledger::api;
use pasarledger::db::init_db;
use pasarledger::disbursement::MockDisburser;
use pasarledger::workflow::{PayoutService, ReconciliationService, SettlementService};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    disburser: Arc<MockDisburser>,
    _temp: TempDir,
}

async fn setup_test_app(disburser: MockDisburser) -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(pasarledger::Repository::new(pool));

    let disburser = Arc::new(disburser);
    let state = api::AppState {
        repo: repo.clone(),
        settlement: Arc::new(SettlementService::new(repo.clone())),
        payout: Arc::new(PayoutService::new(repo.clone(), disburser.clone())),
        reconciliation: Arc::new(ReconciliationService::new(repo)),
    };
    let app = api::create_router(state);

    TestApp {
        app,
        disburser,
        _temp: temp_dir,
    }
}

async fn send(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            builder
                .body(axum::body::Body::from(json.to_string()))
                .unwrap()
        }
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };

    let resp = app.oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Settle one order so the courier wallet holds 9000.
async fn fund_courier(app: &axum::Router) {
    let (status, _) = send(
        app.clone(),
        "PUT",
        "/v1/regions/jkt-selatan/fee-config",
        Some(json!({
            "buyerServiceFee": 2000,
            "courierAppFee": 1000,
            "maxMerchantsPerOrder": 3,
            "extraFeePerMerchant": 3000,
            "driverExtraShare": 2000,
            "appExtraShare": 1000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        app.clone(),
        "POST",
        "/v1/settlements",
        Some(json!({
            "orderId": "o-1",
            "regionId": "jkt-selatan",
            "merchantId": "m-1",
            "courierId": "c-1",
            "totalPrice": 53000,
            "deliveryFee": 8000,
            "merchantCount": 2
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

fn withdrawal_body(amount: i64) -> Value {
    json!({
        "ownerId": "c-1",
        "amount": amount,
        "bank": {
            "bankName": "BCA",
            "accountNumber": "1234567890",
            "accountName": "Budi Kurir"
        }
    })
}

#[tokio::test]
async fn test_full_withdrawal_flow() {
    let test_app = setup_test_app(MockDisburser::succeeding("ref-42")).await;
    fund_courier(&test_app.app).await;

    let (status, request) = send(
        test_app.app.clone(),
        "POST",
        "/v1/withdrawals",
        Some(withdrawal_body(6000)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["status"], "REQUESTED");
    let id = request["id"].as_str().unwrap().to_string();

    // The hold is visible immediately.
    let (_, wallet) = send(test_app.app.clone(), "GET", "/v1/wallets/c-1", None).await;
    assert_eq!(wallet["balance"], 3000);
    assert_eq!(wallet["held"], 6000);

    let (status, approved) = send(
        test_app.app.clone(),
        "POST",
        &format!("/v1/withdrawals/{}/approve", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "COMPLETED");
    assert_eq!(approved["disbursementRef"], "ref-42");
    assert_eq!(test_app.disburser.calls(), 1);

    let (_, wallet) = send(test_app.app.clone(), "GET", "/v1/wallets/c-1", None).await;
    assert_eq!(wallet["balance"], 3000);
    assert_eq!(wallet["held"], 0);

    // Ledger reflects the disbursement.
    let (_, ledger) = send(
        test_app.app,
        "GET",
        "/v1/ledger?entryType=WITHDRAWAL",
        None,
    )
    .await;
    assert_eq!(ledger["entries"].as_array().unwrap().len(), 1);
    assert_eq!(ledger["entries"][0]["credit"], 6000);
}

#[tokio::test]
async fn test_approve_is_exactly_once() {
    let test_app = setup_test_app(MockDisburser::succeeding("ref-42")).await;
    fund_courier(&test_app.app).await;

    let (_, request) = send(
        test_app.app.clone(),
        "POST",
        "/v1/withdrawals",
        Some(withdrawal_body(6000)),
    )
    .await;
    let id = request["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        test_app.app.clone(),
        "POST",
        &format!("/v1/withdrawals/{}/approve", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The duplicate approve is a conflict and does not reach the provider.
    let (status, body) = send(
        test_app.app,
        "POST",
        &format!("/v1/withdrawals/{}/approve", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["errorCode"], "INVALID_STATE");
    assert_eq!(test_app.disburser.calls(), 1);
}

#[tokio::test]
async fn test_insufficient_balance_is_422() {
    let test_app = setup_test_app(MockDisburser::succeeding("ref-1")).await;
    fund_courier(&test_app.app).await;

    let (status, body) = send(
        test_app.app,
        "POST",
        "/v1/withdrawals",
        Some(withdrawal_body(9001)),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errorCode"], "INSUFFICIENT_BALANCE");
}

#[tokio::test]
async fn test_reject_restores_balance() {
    let test_app = setup_test_app(MockDisburser::succeeding("ref-1")).await;
    fund_courier(&test_app.app).await;

    let (_, request) = send(
        test_app.app.clone(),
        "POST",
        "/v1/withdrawals",
        Some(withdrawal_body(6000)),
    )
    .await;
    let id = request["id"].as_str().unwrap().to_string();

    let (status, rejected) = send(
        test_app.app.clone(),
        "POST",
        &format!("/v1/withdrawals/{}/reject", id),
        Some(json!({ "reason": "bank account mismatch" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["status"], "REJECTED");
    assert_eq!(rejected["adminNote"], "bank account mismatch");

    // Round-trip law: the exact pre-request balance is back.
    let (_, wallet) = send(test_app.app.clone(), "GET", "/v1/wallets/c-1", None).await;
    assert_eq!(wallet["balance"], 9000);
    assert_eq!(wallet["held"], 0);

    // The provider was never involved.
    assert_eq!(test_app.disburser.calls(), 0);

    // And the reconciliation sweep still balances.
    let (_, report) = send(test_app.app, "GET", "/v1/reconciliation", None).await;
    assert_eq!(report["consistent"], true);
}

#[tokio::test]
async fn test_timeout_leaves_processing_and_keeps_hold() {
    let test_app = setup_test_app(MockDisburser::timing_out()).await;
    fund_courier(&test_app.app).await;

    let (_, request) = send(
        test_app.app.clone(),
        "POST",
        "/v1/withdrawals",
        Some(withdrawal_body(6000)),
    )
    .await;
    let id = request["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        test_app.app.clone(),
        "POST",
        &format!("/v1/withdrawals/{}/approve", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["errorCode"], "DISBURSEMENT_UNKNOWN");

    // PROCESSING, hold intact: the money may already have left.
    let (_, stored) = send(
        test_app.app.clone(),
        "GET",
        &format!("/v1/withdrawals/{}", id),
        None,
    )
    .await;
    assert_eq!(stored["status"], "PROCESSING");

    let (_, wallet) = send(test_app.app, "GET", "/v1/wallets/c-1", None).await;
    assert_eq!(wallet["balance"], 3000);
    assert_eq!(wallet["held"], 6000);
}

#[tokio::test]
async fn test_provider_rejection_requeues_request() {
    let test_app = setup_test_app(MockDisburser::rejecting("account closed")).await;
    fund_courier(&test_app.app).await;

    let (_, request) = send(
        test_app.app.clone(),
        "POST",
        "/v1/withdrawals",
        Some(withdrawal_body(6000)),
    )
    .await;
    let id = request["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        test_app.app.clone(),
        "POST",
        &format!("/v1/withdrawals/{}/approve", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, stored) = send(
        test_app.app.clone(),
        "GET",
        &format!("/v1/withdrawals/{}", id),
        None,
    )
    .await;
    assert_eq!(stored["status"], "REQUESTED");

    // The admin can still reject it and release the hold.
    let (status, _) = send(
        test_app.app.clone(),
        "POST",
        &format!("/v1/withdrawals/{}/reject", id),
        Some(json!({ "reason": "unusable bank account" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, wallet) = send(test_app.app, "GET", "/v1/wallets/c-1", None).await;
    assert_eq!(wallet["balance"], 9000);
}

#[tokio::test]
async fn test_stuck_processing_resolved_as_failed() {
    let test_app = setup_test_app(MockDisburser::timing_out()).await;
    fund_courier(&test_app.app).await;

    let (_, request) = send(
        test_app.app.clone(),
        "POST",
        "/v1/withdrawals",
        Some(withdrawal_body(6000)),
    )
    .await;
    let id = request["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        test_app.app.clone(),
        "POST",
        &format!("/v1/withdrawals/{}/approve", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    // While PROCESSING, neither approve nor reject touches it.
    let (status, _) = send(
        test_app.app.clone(),
        "POST",
        &format!("/v1/withdrawals/{}/approve", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = send(
        test_app.app.clone(),
        "POST",
        &format!("/v1/withdrawals/{}/reject", id),
        Some(json!({ "reason": "stuck" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Admin checked the provider: the transfer never happened. Requeue.
    let (status, resolved) = send(
        test_app.app.clone(),
        "POST",
        &format!("/v1/withdrawals/{}/resolve", id),
        Some(json!({ "outcome": "failed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["status"], "REQUESTED");

    // The hold survived the round trip and can now be released.
    let (status, _) = send(
        test_app.app.clone(),
        "POST",
        &format!("/v1/withdrawals/{}/reject", id),
        Some(json!({ "reason": "provider unreachable" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, wallet) = send(test_app.app.clone(), "GET", "/v1/wallets/c-1", None).await;
    assert_eq!(wallet["balance"], 9000);
    assert_eq!(wallet["held"], 0);

    let (_, report) = send(test_app.app, "GET", "/v1/reconciliation", None).await;
    assert_eq!(report["consistent"], true);
}

#[tokio::test]
async fn test_stuck_processing_resolved_as_disbursed() {
    let test_app = setup_test_app(MockDisburser::timing_out()).await;
    fund_courier(&test_app.app).await;

    let (_, request) = send(
        test_app.app.clone(),
        "POST",
        "/v1/withdrawals",
        Some(withdrawal_body(6000)),
    )
    .await;
    let id = request["id"].as_str().unwrap().to_string();

    send(
        test_app.app.clone(),
        "POST",
        &format!("/v1/withdrawals/{}/approve", id),
        None,
    )
    .await;

    // Admin found the transfer in the provider's records.
    let (status, resolved) = send(
        test_app.app.clone(),
        "POST",
        &format!("/v1/withdrawals/{}/resolve", id),
        Some(json!({ "outcome": "disbursed", "referenceId": "manual-7", "providerFee": 100 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["status"], "COMPLETED");
    assert_eq!(resolved["disbursementRef"], "manual-7");

    let (_, wallet) = send(test_app.app.clone(), "GET", "/v1/wallets/c-1", None).await;
    assert_eq!(wallet["balance"], 3000);
    assert_eq!(wallet["held"], 0);

    // Journal carries the withdrawal and the provider fee.
    let (_, ledger) = send(
        test_app.app.clone(),
        "GET",
        "/v1/ledger?entryType=WITHDRAWAL",
        None,
    )
    .await;
    assert_eq!(ledger["entries"].as_array().unwrap().len(), 1);
    assert_eq!(ledger["entries"][0]["credit"], 6000);

    let (_, fees) = send(
        test_app.app,
        "GET",
        "/v1/ledger?entryType=DISBURSEMENT_FEE",
        None,
    )
    .await;
    assert_eq!(fees["entries"].as_array().unwrap().len(), 1);
    assert_eq!(fees["entries"][0]["credit"], 100);
}

#[tokio::test]
async fn test_list_withdrawals_by_status() {
    let test_app = setup_test_app(MockDisburser::succeeding("ref-1")).await;
    fund_courier(&test_app.app).await;

    let (_, first) = send(
        test_app.app.clone(),
        "POST",
        "/v1/withdrawals",
        Some(withdrawal_body(2000)),
    )
    .await;
    send(
        test_app.app.clone(),
        "POST",
        "/v1/withdrawals",
        Some(withdrawal_body(3000)),
    )
    .await;
    send(
        test_app.app.clone(),
        "POST",
        &format!("/v1/withdrawals/{}/approve", first["id"].as_str().unwrap()),
        None,
    )
    .await;

    let (status, list) = send(
        test_app.app.clone(),
        "GET",
        "/v1/withdrawals?status=REQUESTED",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["amount"], 3000);

    let (_, completed) = send(
        test_app.app,
        "GET",
        "/v1/withdrawals?status=COMPLETED",
        None,
    )
    .await;
    assert_eq!(completed.as_array().unwrap().len(), 1);
}
