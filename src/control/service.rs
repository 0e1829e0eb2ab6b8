use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    error::{Error, Result},
    rituals::{models::attributes, RitualsClient},
};

/// Valid perfume amounts (fan intensity levels).
pub const PERFUME_AMOUNT_RANGE: std::ops::RangeInclusive<i64> = 1..=3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PowerChange {
    pub device_hash: String,
    pub is_on: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PerfumeChange {
    pub device_hash: String,
    pub perfume_amount: i64,
}

/// Writes the power and perfume-amount attributes of a device.
#[derive(Clone)]
pub struct ControlService {
    client: RitualsClient,
}

impl ControlService {
    pub fn new(client: RitualsClient) -> Self {
        Self { client }
    }

    pub async fn set_power(&self, device_hash: &str, on: bool) -> Result<PowerChange> {
        let hash = require_hash(device_hash)?;
        let value = if on { "1" } else { "0" };

        self.client.set_attribute(hash, attributes::FAN, value).await?;
        info!(device_hash = %hash, on, "Power switched");

        Ok(PowerChange {
            device_hash: hash.to_owned(),
            is_on: on,
        })
    }

    /// Rejects amounts outside `1..=3` before any network call.
    pub async fn set_perfume_amount(&self, device_hash: &str, amount: i64) -> Result<PerfumeChange> {
        let hash = require_hash(device_hash)?;
        if !PERFUME_AMOUNT_RANGE.contains(&amount) {
            return Err(Error::Validation(format!(
                "Perfume amount must be between 1 and 3, got {amount}"
            )));
        }

        self.client
            .set_attribute(hash, attributes::SPEED, &amount.to_string())
            .await?;
        info!(device_hash = %hash, amount, "Perfume amount set");

        Ok(PerfumeChange {
            device_hash: hash.to_owned(),
            perfume_amount: amount,
        })
    }
}

/// Trimmed, non-empty device hash.
pub(crate) fn require_hash(device_hash: &str) -> Result<&str> {
    let hash = device_hash.trim();
    if hash.is_empty() {
        return Err(Error::Validation("deviceHash is required".to_owned()));
    }
    if hash.contains('/') {
        return Err(Error::Validation(format!("invalid deviceHash: {hash:?}")));
    }
    Ok(hash)
}
