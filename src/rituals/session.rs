use std::{fmt, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use reqwest::{header, Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use super::models::{Device, LoginRequest, LoginResponse};
use crate::{
    error::{Error, Result},
    session_store::{SessionStore, StoredSession},
};

pub(crate) const LOGIN_PATH: &str = "/apiv2/account/token";

/// The server does not return a TTL; tokens are assumed to last a day.
pub const DEFAULT_TOKEN_LIFETIME_HOURS: i64 = 24;

/// Account email and password. Never mutated after construction.
#[derive(Clone)]
pub struct Credentials {
    email: String,
    secret: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, secret: SecretString) -> Self {
        Self {
            email: email.into(),
            secret,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Opaque bearer token with its assumed validity window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Result of a local token check; never touches the network.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TokenStatus {
    pub valid: bool,
    /// A token is cached but its expiry has passed.
    pub expired: bool,
    pub expires_at: Option<DateTime<Utc>>,
    /// Whole hours left, `None` when there is no valid token.
    pub expires_in_hours: Option<i64>,
    pub token_length: usize,
    pub device_count: usize,
    pub first_device_hash: Option<String>,
}

/// Owns the current token and the device list discovered with it.
///
/// The token mutex is held across the login call, so concurrent callers that
/// find the token stale wait for the one refresh in flight instead of
/// logging in themselves. `snapshot` mirrors the cached token and is only
/// written while the mutex is held; local checks read it without waiting on
/// a login.
pub struct AuthSession {
    http: Client,
    base_url: String,
    credentials: Credentials,
    token_lifetime: Duration,
    token: Mutex<Option<Token>>,
    snapshot: RwLock<Option<Token>>,
    devices: RwLock<Vec<Device>>,
    store: Arc<dyn SessionStore>,
}

impl AuthSession {
    pub(crate) fn new(
        http: Client,
        base_url: String,
        credentials: Credentials,
        token_lifetime: Duration,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            http,
            base_url,
            credentials,
            token_lifetime,
            token: Mutex::new(None),
            snapshot: RwLock::new(None),
            devices: RwLock::new(Vec::new()),
            store,
        }
    }

    /// Adopt a previously stored session if its token is still valid.
    /// Returns whether anything was restored.
    pub async fn restore(&self) -> bool {
        let Some(stored) = self.store.load().await else {
            return false;
        };

        let now = Utc::now();
        if now >= stored.expires_at {
            debug!(expires_at = %stored.expires_at, "Stored Rituals token already expired");
            return false;
        }

        let mut guard = self.token.lock().await;
        let token = Token {
            value: stored.token,
            issued_at: stored.expires_at - self.token_lifetime,
            expires_at: stored.expires_at,
        };
        self.replace(&mut guard, Some(token)).await;
        *self.devices.write().await = stored.devices;
        info!(expires_at = %stored.expires_at, "Restored Rituals session from store");
        true
    }

    /// Log in with the configured credentials. Does not touch the cache.
    pub async fn authenticate(&self) -> Result<Token> {
        let url = format!("{}{}", self.base_url, LOGIN_PATH);
        debug!(url = %url, email = %self.credentials.email, "Requesting Rituals token");

        let body = LoginRequest {
            email: &self.credentials.email,
            password: self.credentials.secret.expose_secret(),
        };

        let resp = self
            .http
            .post(&url)
            .header(header::ACCEPT, "*/*")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        let parsed = serde_json::from_str::<LoginResponse>(&text).unwrap_or_default();

        // A 5xx that explains itself is still a rejected login.
        if status.is_server_error() && parsed.failure_message().is_none() {
            warn!(status = %status, "Rituals login endpoint returned server error");
            return Err(Error::api(status, text));
        }

        match parsed.token() {
            Some(token) if status.is_success() => {
                let issued_at = Utc::now();
                info!(token_length = token.len(), "Authenticated with Rituals API");
                Ok(Token {
                    value: token.to_owned(),
                    issued_at,
                    expires_at: issued_at + self.token_lifetime,
                })
            }
            _ => {
                let message = parsed
                    .failure_message()
                    .map(str::to_owned)
                    .unwrap_or_else(|| generic_failure(status));
                warn!(status = %status, message = %message, "Rituals login rejected");
                Err(Error::Authentication { message })
            }
        }
    }

    /// Returns the cached token while it is valid, otherwise logs in again and
    /// replaces the cache.
    pub async fn valid_token(&self) -> Result<Token> {
        let mut guard = self.token.lock().await;

        if let Some(cached) = guard.as_ref() {
            if cached.is_valid_at(Utc::now()) {
                return Ok(cached.clone());
            }
            info!(expired_at = %cached.expires_at, "Rituals token expired; re-authenticating");
        }

        let token = self.authenticate().await?;
        self.replace(&mut guard, Some(token.clone())).await;
        // Saved under the lock so the store sees tokens in cache order.
        self.persist(&token).await;
        Ok(token)
    }

    /// Unconditionally log in and replace the cached token.
    pub async fn refresh(&self) -> Result<Token> {
        let mut guard = self.token.lock().await;
        let token = self.authenticate().await?;
        self.replace(&mut guard, Some(token.clone())).await;
        // Saved under the lock so the store sees tokens in cache order.
        self.persist(&token).await;
        Ok(token)
    }

    /// Drop the cached token if it is still the one the caller saw rejected.
    pub(crate) async fn invalidate(&self, rejected: &str) {
        let mut guard = self.token.lock().await;
        if guard.as_ref().is_some_and(|t| t.value == rejected) {
            debug!("Discarding rejected Rituals token");
            self.replace(&mut guard, None).await;
        }
    }

    /// Record the devices discovered with the current token and persist both.
    /// Skips the store when `token` is no longer the cached one.
    pub async fn remember_devices(&self, token: &Token, devices: Vec<Device>) {
        let guard = self.token.lock().await;
        *self.devices.write().await = devices;
        if guard.as_ref() == Some(token) {
            self.persist(token).await;
        }
    }

    pub async fn token_status(&self) -> TokenStatus {
        let now = Utc::now();
        let token = self.snapshot.read().await.clone();
        let devices = self.devices.read().await;

        let valid = token.as_ref().is_some_and(|t| t.is_valid_at(now));
        TokenStatus {
            valid,
            expired: token.is_some() && !valid,
            expires_at: token.as_ref().map(|t| t.expires_at),
            expires_in_hours: token
                .as_ref()
                .filter(|_| valid)
                .map(|t| (t.expires_at - now).num_hours()),
            token_length: token.as_ref().map_or(0, |t| t.value.len()),
            device_count: devices.len(),
            first_device_hash: devices.first().map(|d| d.hash.clone()),
        }
    }

    async fn replace(&self, guard: &mut Option<Token>, token: Option<Token>) {
        *self.snapshot.write().await = token.clone();
        *guard = token;
    }

    async fn persist(&self, token: &Token) {
        let session = StoredSession {
            token: token.value.clone(),
            expires_at: token.expires_at,
            devices: self.devices.read().await.clone(),
        };
        self.store.save(&session).await;
    }
}

fn generic_failure(status: StatusCode) -> String {
    format!("no token in login response (HTTP {status})")
}
