pub mod dto;
pub mod errors;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use handlers::ApiDoc;

use crate::{
    control::ControlService, registry::DeviceRegistry, rituals::RitualsClient,
    status::StatusAggregator,
};

/// Everything the handlers need; all parts share one client and token cache.
#[derive(Clone)]
pub struct AppState {
    pub client: RitualsClient,
    pub registry: DeviceRegistry,
    pub status: StatusAggregator,
    pub control: ControlService,
}

impl AppState {
    pub fn new(client: RitualsClient) -> Self {
        Self {
            registry: DeviceRegistry::new(client.clone()),
            status: StatusAggregator::new(client.clone()),
            control: ControlService::new(client.clone()),
            client,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route(
            "/session",
            post(handlers::authenticate).get(handlers::token_status),
        )
        .route("/devices", get(handlers::list_devices))
        .route("/devices/{hash}/status", get(handlers::get_status))
        .route("/devices/{hash}/power", post(handlers::set_power))
        .route("/devices/{hash}/perfume", post(handlers::set_perfume_amount))
        .with_state(state)
        .split_for_parts();

    router
        .route("/health", get(handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
}
