pub mod models;
pub mod session;

use std::{sync::Arc, time::Duration};

use reqwest::{header, Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{
    config::Config,
    error::{Error, Result},
    session_store::{MemorySessionStore, SessionStore},
};

use self::{
    models::RawReading,
    session::{AuthSession, Credentials, Token, DEFAULT_TOKEN_LIFETIME_HOURS},
};

pub const DEFAULT_BASE_URL: &str = "https://rituals.apiv2.sense-company.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Authenticated client for the Rituals cloud API.
///
/// Cheap to clone; all clones share one token cache.
#[derive(Clone)]
pub struct RitualsClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    base_url: String,
    session: AuthSession,
}

/// Status and body of a successful call.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| Error::api(self.status, format!("malformed response body: {e}")))
    }

    pub fn reading(&self) -> Result<RawReading> {
        RawReading::parse(&self.body)
            .ok_or_else(|| Error::api(self.status, format!("unreadable reading: {:?}", self.body)))
    }
}

/// Builder for [`RitualsClient`].
pub struct RitualsClientBuilder {
    credentials: Credentials,
    base_url: String,
    timeout: Duration,
    token_lifetime: chrono::Duration,
    store: Arc<dyn SessionStore>,
}

impl RitualsClientBuilder {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            token_lifetime: chrono::Duration::hours(DEFAULT_TOKEN_LIFETIME_HOURS),
            store: Arc::new(MemorySessionStore::new()),
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn token_lifetime(mut self, lifetime: chrono::Duration) -> Self {
        self.token_lifetime = lifetime;
        self
    }

    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = store;
        self
    }

    pub fn build(self) -> Result<RitualsClient> {
        let http = Client::builder().timeout(self.timeout).build()?;
        let session = AuthSession::new(
            http.clone(),
            self.base_url.clone(),
            self.credentials,
            self.token_lifetime,
            self.store,
        );

        Ok(RitualsClient {
            inner: Arc::new(Inner {
                http,
                base_url: self.base_url,
                session,
            }),
        })
    }
}

impl RitualsClient {
    pub fn builder(credentials: Credentials) -> RitualsClientBuilder {
        RitualsClientBuilder::new(credentials)
    }

    pub fn from_config(config: &Config, store: Arc<dyn SessionStore>) -> Result<Self> {
        Self::builder(config.credentials())
            .base_url(&config.rituals_base_url)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .session_store(store)
            .build()
    }

    pub fn session(&self) -> &AuthSession {
        &self.inner.session
    }

    /// Issue an authenticated call against `path`.
    ///
    /// A `form` body is sent as `application/x-www-form-urlencoded`; the
    /// attribute endpoints reject JSON. A 401/403 answer discards the token
    /// and the call is retried once with a fresh login.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        form: Option<&[(&str, &str)]>,
    ) -> Result<ApiResponse> {
        let token = self.session().valid_token().await?;

        match self.send(&method, path, form, &token).await {
            Err(e) if e.is_auth_rejected() => {
                warn!(path = %path, error = %e, "Rituals rejected token; re-authenticating once");
                self.session().invalidate(&token.value).await;
                let fresh = self.session().valid_token().await?;
                self.send(&method, path, form, &fresh).await
            }
            other => other,
        }
    }

    pub async fn get_attribute(&self, hash: &str, attribute: &str) -> Result<RawReading> {
        let path = format!("/apiv2/hubs/{hash}/attributes/{attribute}");
        self.request(Method::GET, &path, None).await?.reading()
    }

    pub async fn set_attribute(&self, hash: &str, attribute: &str, value: &str) -> Result<()> {
        let path = format!("/apiv2/hubs/{hash}/attributes/{attribute}");
        let form = [(attribute, value)];
        self.request(Method::POST, &path, Some(&form[..])).await?;
        Ok(())
    }

    pub async fn get_sensor(&self, hash: &str, sensor: &str) -> Result<RawReading> {
        let path = format!("/apiv2/hubs/{hash}/sensors/{sensor}");
        self.request(Method::GET, &path, None).await?.reading()
    }

    async fn send(
        &self,
        method: &Method,
        path: &str,
        form: Option<&[(&str, &str)]>,
        token: &Token,
    ) -> Result<ApiResponse> {
        let url = format!("{}{}", self.inner.base_url, path);
        debug!(method = %method, url = %url, "Rituals API request");

        let mut builder = self
            .inner
            .http
            .request(method.clone(), &url)
            .header(header::ACCEPT, "*/*")
            .header(header::AUTHORIZATION, token.value.as_str());

        if let Some(form) = form {
            builder = builder.form(form);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            warn!(method = %method, url = %url, status = %status, "Rituals API returned error status");
            return Err(Error::api(status, body));
        }

        Ok(ApiResponse { status, body })
    }
}
