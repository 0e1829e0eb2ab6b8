pub mod normalize;

use serde::Serialize;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::{
    control::require_hash,
    error::Result,
    reading_cache::{OptionalMetrics, ReadingCache},
    rituals::{
        models::{attributes, sensors, RawReading},
        RitualsClient,
    },
};

/// Normalized status of one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusRecord {
    pub device_hash: String,
    pub is_on: bool,
    /// `1..=3`, or `0` when unknown.
    pub perfume_amount: i64,
    pub room_size: Option<i64>,
    /// `0..=100`
    pub wifi_percent: Option<i64>,
    /// `0..=100`
    pub perfume_level_percent: Option<i64>,
    /// `0..=100`
    pub battery_percent: Option<i64>,
}

/// What to report for an optional sensor whose read failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Retention {
    /// The last value successfully read for that device.
    #[default]
    LastKnown,
    /// `None`.
    Drop,
}

/// Turns attribute and sensor reads into a [`StatusRecord`].
///
/// Power and perfume amount are required and their errors propagate. Room
/// size and the sensors are best-effort: a failed read never aborts the
/// status fetch.
#[derive(Clone)]
pub struct StatusAggregator {
    client: RitualsClient,
    cache: ReadingCache,
    retention: Retention,
}

impl StatusAggregator {
    pub fn new(client: RitualsClient) -> Self {
        Self::with_retention(client, Retention::LastKnown)
    }

    pub fn with_retention(client: RitualsClient, retention: Retention) -> Self {
        Self {
            client,
            cache: ReadingCache::new(),
            retention,
        }
    }

    pub async fn get_status(&self, device_hash: &str) -> Result<StatusRecord> {
        let hash = require_hash(device_hash)?;
        debug!(device_hash = %hash, "Fetching device status");

        let fan = self.client.get_attribute(hash, attributes::FAN).await?;
        let speed = self.client.get_attribute(hash, attributes::SPEED).await?;

        let room = optional(
            hash,
            attributes::ROOM_SIZE,
            self.client.get_attribute(hash, attributes::ROOM_SIZE).await,
        );
        let wifi = optional(
            hash,
            sensors::WIFI,
            self.client.get_sensor(hash, sensors::WIFI).await,
        );
        let fill = optional(
            hash,
            sensors::FILL,
            self.client.get_sensor(hash, sensors::FILL).await,
        );
        let battery = optional(
            hash,
            sensors::BATTERY,
            self.client.get_sensor(hash, sensors::BATTERY).await,
        );

        let fresh = OptionalMetrics {
            wifi_percent: scalar_int(&wifi).map(normalize::wifi_percent),
            perfume_level_percent: scalar_int(&fill).map(normalize::perfume_level_percent),
            battery_percent: scalar_int(&battery).map(normalize::battery_percent),
        };

        let metrics = match self.retention {
            Retention::LastKnown => self.cache.merge(hash, fresh).await,
            Retention::Drop => fresh,
        };

        let record = StatusRecord {
            device_hash: hash.to_owned(),
            is_on: normalize::is_on(fan.extract()),
            perfume_amount: normalize::perfume_amount(speed.extract()),
            room_size: normalize::room_size(room.as_ref().and_then(RawReading::extract)),
            wifi_percent: metrics.wifi_percent,
            perfume_level_percent: metrics.perfume_level_percent,
            battery_percent: metrics.battery_percent,
        };

        info!(
            device_hash = %hash,
            is_on = record.is_on,
            perfume_amount = record.perfume_amount,
            wifi_percent = ?record.wifi_percent,
            perfume_level_percent = ?record.perfume_level_percent,
            "Device status"
        );
        Ok(record)
    }
}

fn optional(hash: &str, name: &str, read: Result<RawReading>) -> Option<RawReading> {
    match read {
        Ok(reading) => Some(reading),
        Err(e) => {
            debug!(device_hash = %hash, name = %name, error = %e, "Optional read failed");
            None
        }
    }
}

fn scalar_int(reading: &Option<RawReading>) -> Option<i64> {
    reading
        .as_ref()
        .and_then(RawReading::extract)
        .and_then(normalize::parse_int)
}
