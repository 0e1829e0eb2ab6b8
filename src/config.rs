use std::path::PathBuf;

use anyhow::{Context, Result};
use secrecy::SecretString;

use crate::rituals::{session::Credentials, DEFAULT_BASE_URL};

#[derive(Debug, Clone)]
pub struct Config {
    pub rituals_email: String,
    pub rituals_password: SecretString,
    pub rituals_base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Where to persist token, expiry and devices. In-memory when unset.
    pub session_file: Option<PathBuf>,
    pub server_host: String,
    pub server_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            rituals_email: required("RITUALS_EMAIL")?,
            rituals_password: SecretString::from(required("RITUALS_PASSWORD")?),
            rituals_base_url: optional("RITUALS_BASE_URL", DEFAULT_BASE_URL),
            request_timeout_secs: parse_timeout(&optional("RITUALS_TIMEOUT_SECS", "10"))?,
            session_file: std::env::var("RITUALS_SESSION_FILE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional("SERVER_PORT", "8080")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
        })
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.rituals_email.clone(), self.rituals_password.clone())
    }
}

fn parse_timeout(raw: &str) -> Result<u64> {
    let secs: u64 = raw
        .trim()
        .parse()
        .context("RITUALS_TIMEOUT_SECS must be a positive integer")?;
    anyhow::ensure!(secs > 0, "RITUALS_TIMEOUT_SECS must be a positive integer");
    Ok(secs)
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("missing required env var: {key}"))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}
