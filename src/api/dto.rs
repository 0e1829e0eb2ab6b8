use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /devices/{hash}/power`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PowerRequest {
    pub on: bool,
}

/// Request body for `POST /devices/{hash}/perfume`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PerfumeRequest {
    /// 1 (low) to 3 (high).
    pub amount: i64,
}

/// Body of every failed response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}
