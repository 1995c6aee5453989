//! Platform allocation-percentage config endpoints.

use super::AppState;
use crate::domain::{PlatformConfig, TimeMs};
use crate::error::{AppError, AppResult};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtQuery {
    /// Instant to resolve against; defaults to now.
    pub at_ms: Option<i64>,
}

pub async fn get_platform_config(
    State(state): State<AppState>,
    Query(query): Query<AtQuery>,
) -> AppResult<Json<PlatformConfig>> {
    let at = query.at_ms.map(TimeMs::new).unwrap_or_else(TimeMs::now);
    let config = state
        .repo
        .get_platform_config_at(at)
        .await?
        .ok_or_else(|| AppError::NotFound("no platform config in effect".to_string()))?;
    Ok(Json(config))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformConfigBody {
    pub p_csr: i64,
    pub p_sys: i64,
    pub p_mkt: i64,
    pub p_emg: i64,
    /// When the new percentages take effect; defaults to now. Versions are
    /// append-only, so history stays reproducible.
    pub effective_from_ms: Option<i64>,
}

pub async fn put_platform_config(
    State(state): State<AppState>,
    Json(body): Json<PlatformConfigBody>,
) -> AppResult<(StatusCode, Json<PlatformConfig>)> {
    let config = PlatformConfig {
        p_csr: body.p_csr,
        p_sys: body.p_sys,
        p_mkt: body.p_mkt,
        p_emg: body.p_emg,
        effective_from_ms: body
            .effective_from_ms
            .map(TimeMs::new)
            .unwrap_or_else(TimeMs::now),
    };
    config.validate()?;

    state.repo.insert_platform_config(&config).await?;
    info!(
        p_csr = config.p_csr,
        p_sys = config.p_sys,
        p_mkt = config.p_mkt,
        p_emg = config.p_emg,
        effective_from_ms = config.effective_from_ms.as_i64(),
        "Platform config version appended"
    );
    Ok((StatusCode::CREATED, Json(config)))
}
