//! API route handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{StatusCode, Uri},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::roms::validate_rom_name;
use crate::security::{check_body, BodyViolation};
use crate::store::PlayStat;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub environment: String,
}

#[derive(Debug, Serialize)]
pub struct RomsResponse {
    pub roms: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PlayAck {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub data: Vec<PlayStat>,
}

/// `GET /api/health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        environment: state.config.server.environment.clone(),
    })
}

/// `GET /api/roms`
pub async fn list_roms(State(state): State<AppState>) -> Result<Json<RomsResponse>, ApiError> {
    let roms = state
        .library
        .list_roms()
        .await
        .map_err(|e| ApiError::internal("Failed to list ROMs.", e))?;
    Ok(Json(RomsResponse { roms }))
}

/// `POST /api/rom-play`
pub async fn log_play(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<PlayAck>), ApiError> {
    let Json(body) = payload?;

    let fields = check_body(&body, state.config.security.max_body_depth).map_err(|v| match v {
        BodyViolation::NotAnObject => ApiError::InvalidRequestFormat,
        BodyViolation::TooDeep => ApiError::RequestTooComplex,
    })?;

    let rom_name = validate_rom_name(fields.get("romName").unwrap_or(&Value::Null))
        .map_err(ApiError::InvalidRomName)?;

    // Telemetry loss is logged inside the event log and never fails the request.
    state.events.record_play(&rom_name).await;

    Ok((StatusCode::CREATED, Json(PlayAck { ok: true })))
}

/// `GET /api/rom-stats`
pub async fn rom_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let data = state
        .events
        .play_stats()
        .await
        .map_err(|e| ApiError::internal("Failed to get statistics.", e))?;
    Ok(Json(StatsResponse { data }))
}

/// Unknown `/api` paths.
pub async fn api_not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
