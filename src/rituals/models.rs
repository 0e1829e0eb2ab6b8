use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// Login : POST /apiv2/account/token
// ---------------------------------------------------------------------------

/// JSON body sent to the login endpoint.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Login response.
///
/// Success:  `{ "success": "<token>" }`
/// Failure:  `{ "message": "..." }` (some deployments use `error` instead)
#[derive(Debug, Default, Deserialize)]
pub struct LoginResponse {
    pub success: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl LoginResponse {
    /// The bearer token, if the login succeeded.
    pub fn token(&self) -> Option<&str> {
        self.success.as_deref().filter(|t| !t.is_empty())
    }

    /// Server-provided failure text, if any.
    pub fn failure_message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .filter(|m| !m.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Hubs : GET /apiv2/account/hubs
// ---------------------------------------------------------------------------

/// Attribute keys inside `attributeValues`.
pub mod attributes {
    /// Power, `"0"` or `"1"`.
    pub const FAN: &str = "fanc";
    /// Perfume amount, `"1"`..`"3"`.
    pub const SPEED: &str = "speedc";
    /// Room size.
    pub const ROOM_SIZE: &str = "roomc";
    pub const ROOM_NAME: &str = "roomnamec";
    pub const SPACE_NAME: &str = "fspacenamec";
}

/// Sensor names under `/apiv2/hubs/{hash}/sensors/`.
pub mod sensors {
    pub const BATTERY: &str = "battc";
    /// Raw signal in dBm, typically negative.
    pub const WIFI: &str = "wific";
    /// Remaining perfume in units of 1/16000 of a full cartridge.
    pub const FILL: &str = "fillc";
}

/// A hub as returned by the hubs endpoint.
///
/// Attribute values are kept as raw JSON because the vendor mixes strings
/// and numbers; use [`Device::attribute`] to read them as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Device {
    pub hash: String,
    #[serde(default)]
    pub hublot: String,
    /// `1` means online.
    #[serde(default)]
    pub status: i64,
    #[serde(rename = "attributeValues", default)]
    #[schema(value_type = Object)]
    pub attribute_values: BTreeMap<String, Value>,
}

impl Device {
    /// Attribute value rendered as text. Numbers are stringified; `null`,
    /// objects and arrays count as absent.
    pub fn attribute(&self, name: &str) -> Option<String> {
        match self.attribute_values.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Attribute / sensor readings
//
// GET /apiv2/hubs/{hash}/attributes/{attr} and /sensors/{sensor} answer with
// either a bare scalar (`"1"`, `-52`, or unquoted text) or an object carrying
// `raw` and/or `value`. Both shapes are accepted.
// ---------------------------------------------------------------------------

/// A single attribute or sensor payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawReading {
    Scalar(String),
    Wrapped {
        value: Option<String>,
        raw: Option<String>,
    },
}

impl RawReading {
    /// Parse a response body. Bodies that are not valid JSON are taken as a
    /// bare scalar. Returns `None` for empty bodies, `null` and arrays.
    pub fn parse(body: &str) -> Option<Self> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return None;
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => Self::from_json(&value),
            Err(_) => Some(Self::Scalar(trimmed.to_owned())),
        }
    }

    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self::Wrapped {
                value: map.get("value").and_then(scalar_text),
                raw: map.get("raw").and_then(scalar_text),
            }),
            other => scalar_text(other).map(Self::Scalar),
        }
    }

    /// The scalar carried by this reading: `raw` wins over `value`, which
    /// wins over a bare scalar payload.
    pub fn extract(&self) -> Option<&str> {
        match self {
            Self::Wrapped { raw: Some(raw), .. } => Some(raw),
            Self::Wrapped { value: Some(value), .. } => Some(value),
            Self::Wrapped { .. } => None,
            Self::Scalar(s) => Some(s),
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
