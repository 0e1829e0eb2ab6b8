use axum::{
    extract::{Path, State},
    Json,
};
use utoipa::OpenApi;

use super::{
    dto::{ErrorBody, PerfumeRequest, PowerRequest},
    errors::AppError,
    AppState,
};
use crate::{
    control::{PerfumeChange, PowerChange},
    registry::{self, DeviceSummary, Discovery},
    rituals::{models::Device, session::TokenStatus},
    status::StatusRecord,
};

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Log in, discover the account's hubs and persist the session.
#[utoipa::path(
    post,
    path = "/session",
    responses(
        (status = 200, description = "Token, expiry and devices", body = Discovery),
        (status = 401, description = "Credentials rejected", body = ErrorBody),
        (status = 502, description = "Upstream API error", body = ErrorBody),
        (status = 504, description = "Upstream unreachable", body = ErrorBody),
    ),
    tag = "session"
)]
pub async fn authenticate(State(state): State<AppState>) -> Result<Json<Discovery>, AppError> {
    Ok(Json(state.registry.discover().await?))
}

/// Local token check; does not contact the upstream API.
#[utoipa::path(
    get,
    path = "/session",
    responses(
        (status = 200, description = "Token validity", body = TokenStatus),
    ),
    tag = "session"
)]
pub async fn token_status(State(state): State<AppState>) -> Json<TokenStatus> {
    Json(state.client.session().token_status().await)
}

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

/// Live list of the account's hubs in summary form.
#[utoipa::path(
    get,
    path = "/devices",
    responses(
        (status = 200, description = "Device summaries", body = Vec<DeviceSummary>),
        (status = 502, description = "Upstream API error", body = ErrorBody),
    ),
    tag = "devices"
)]
pub async fn list_devices(
    State(state): State<AppState>,
) -> Result<Json<Vec<DeviceSummary>>, AppError> {
    let devices = state.registry.list_devices().await?;
    Ok(Json(registry::summarize(&devices)))
}

/// Normalized status of one device.
#[utoipa::path(
    get,
    path = "/devices/{hash}/status",
    params(
        ("hash" = String, Path, description = "Device hash"),
    ),
    responses(
        (status = 200, description = "Device status", body = StatusRecord),
        (status = 400, description = "Invalid device hash", body = ErrorBody),
        (status = 502, description = "Upstream API error", body = ErrorBody),
    ),
    tag = "devices"
)]
pub async fn get_status(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Json<StatusRecord>, AppError> {
    Ok(Json(state.status.get_status(&hash).await?))
}

/// Switch a device on or off.
#[utoipa::path(
    post,
    path = "/devices/{hash}/power",
    params(
        ("hash" = String, Path, description = "Device hash"),
    ),
    request_body = PowerRequest,
    responses(
        (status = 200, description = "Power switched", body = PowerChange),
        (status = 400, description = "Invalid device hash", body = ErrorBody),
        (status = 502, description = "Upstream API error", body = ErrorBody),
    ),
    tag = "devices"
)]
pub async fn set_power(
    State(state): State<AppState>,
    Path(hash): Path<String>,
    Json(req): Json<PowerRequest>,
) -> Result<Json<PowerChange>, AppError> {
    Ok(Json(state.control.set_power(&hash, req.on).await?))
}

/// Set the perfume amount (1..=3).
#[utoipa::path(
    post,
    path = "/devices/{hash}/perfume",
    params(
        ("hash" = String, Path, description = "Device hash"),
    ),
    request_body = PerfumeRequest,
    responses(
        (status = 200, description = "Perfume amount set", body = PerfumeChange),
        (status = 400, description = "Amount outside 1..=3", body = ErrorBody),
        (status = 502, description = "Upstream API error", body = ErrorBody),
    ),
    tag = "devices"
)]
pub async fn set_perfume_amount(
    State(state): State<AppState>,
    Path(hash): Path<String>,
    Json(req): Json<PerfumeRequest>,
) -> Result<Json<PerfumeChange>, AppError> {
    Ok(Json(
        state
            .control
            .set_perfume_amount(&hash, req.amount)
            .await?,
    ))
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Returns `200 OK` with `{"status":"ok"}` when the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        authenticate,
        token_status,
        list_devices,
        get_status,
        set_power,
        set_perfume_amount,
        health
    ),
    components(schemas(
        Discovery,
        Device,
        DeviceSummary,
        TokenStatus,
        StatusRecord,
        PowerRequest,
        PowerChange,
        PerfumeRequest,
        PerfumeChange,
        ErrorBody
    )),
    tags(
        (name = "session", description = "Authentication and token state"),
        (name = "devices", description = "Diffuser status and control"),
        (name = "system",  description = "System endpoints"),
    ),
    info(
        title = "Rituals Bridge API",
        version = "0.1.0",
        description = "REST bridge to the Rituals Perfume Genie cloud API"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
