use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    error::{Error, Result},
    rituals::{
        models::{attributes, Device},
        RitualsClient,
    },
};

const HUBS_PATH: &str = "/apiv2/account/hubs";

/// Simplified view of a [`Device`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DeviceSummary {
    pub hash: String,
    pub hublot: String,
    pub name: String,
    pub room: String,
    pub is_online: bool,
    pub is_on: bool,
}

impl From<&Device> for DeviceSummary {
    fn from(device: &Device) -> Self {
        Self {
            hash: device.hash.clone(),
            hublot: device.hublot.clone(),
            name: device.attribute(attributes::ROOM_NAME).unwrap_or_default(),
            room: device.attribute(attributes::SPACE_NAME).unwrap_or_default(),
            is_online: device.status == 1,
            is_on: device.attribute(attributes::FAN).as_deref() == Some("1"),
        }
    }
}

pub fn summarize(devices: &[Device]) -> Vec<DeviceSummary> {
    devices.iter().map(DeviceSummary::from).collect()
}

/// Output of an authenticate-and-discover run; also what the session
/// store receives.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Discovery {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub devices: Vec<Device>,
    pub device_summaries: Vec<DeviceSummary>,
}

/// Hubs belonging to the account. Every call is a live fetch.
#[derive(Clone)]
pub struct DeviceRegistry {
    client: RitualsClient,
}

impl DeviceRegistry {
    pub fn new(client: RitualsClient) -> Self {
        Self { client }
    }

    pub async fn list_devices(&self) -> Result<Vec<Device>> {
        let resp = self.client.request(Method::GET, HUBS_PATH, None).await?;
        let value: Value = resp.json()?;

        if !value.is_array() {
            return Err(Error::api(resp.status, "Invalid response format: expected an array of hubs"));
        }

        serde_json::from_value(value)
            .map_err(|e| Error::api(resp.status, format!("malformed hub record: {e}")))
    }

    /// Log in afresh, fetch the hubs and record both in the session.
    pub async fn discover(&self) -> Result<Discovery> {
        let session = self.client.session();
        session.refresh().await?;
        let devices = self.list_devices().await?;
        info!(device_count = devices.len(), "Discovered Rituals devices");

        // The hubs call may have replaced a rejected token; report the one in use.
        let token = session.valid_token().await?;

        session.remember_devices(&token, devices.clone()).await;

        Ok(Discovery {
            token: token.value,
            expires_at: token.expires_at,
            device_summaries: summarize(&devices),
            devices,
        })
    }
}
