//! Client configuration.
//!
//! `ClientConfig` holds connection settings, `Credentials` holds the
//! merchant id and secret. `Settings::from_env` loads both from
//! `PLATEGA_*` environment variables, reading a `.env` file first if one
//! exists.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::error::PlategaError;

pub const DEFAULT_BASE_URL: &str = "https://app.platega.io/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where requests go and how long the owned transport waits for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Only applies to a transport the client builds itself.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Merchant id and API secret, both non-blank.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    merchant_id: String,
    secret: String,
}

impl Credentials {
    pub fn new(merchant_id: impl Into<String>, secret: impl Into<String>) -> Result<Self, PlategaError> {
        let merchant_id = merchant_id.into();
        let secret = secret.into();
        if merchant_id.trim().is_empty() {
            return Err(PlategaError::invalid_argument("merchant_id", "merchant id cannot be empty"));
        }
        if secret.trim().is_empty() {
            return Err(PlategaError::invalid_argument("secret", "secret cannot be empty"));
        }
        Ok(Self { merchant_id, secret })
    }

    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    pub(crate) fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("merchant_id", &self.merchant_id)
            .field("secret", &"[redacted]")
            .finish()
    }
}

/// Environment-driven configuration.
///
/// # Environment Variables
///
/// - `PLATEGA_MERCHANT_ID` (required)
/// - `PLATEGA_SECRET` (required)
/// - `PLATEGA_BASE_URL` (optional), defaults to `https://app.platega.io/`
/// - `PLATEGA_TIMEOUT_SECS` (optional), defaults to 30
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: ClientConfig,
    pub credentials: Credentials,
}

#[derive(Deserialize)]
struct RawSettings {
    merchant_id: String,
    secret: String,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

/// Failure to assemble [`Settings`] from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read PLATEGA_* environment: {0}")]
    Env(#[from] envy::Error),

    #[error(transparent)]
    Invalid(#[from] PlategaError),
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine.
        dotenvy::dotenv().ok();
        let raw = envy::prefixed("PLATEGA_").from_env::<RawSettings>()?;
        Self::from_raw(raw)
    }

    /// Same as [`Settings::from_env`] but over an explicit variable list.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let raw = envy::prefixed("PLATEGA_").from_iter::<_, RawSettings>(vars)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSettings) -> Result<Self, ConfigError> {
        let mut config = ClientConfig::default();
        if let Some(base_url) = raw.base_url {
            config.base_url = base_url;
        }
        if let Some(secs) = raw.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        Ok(Self {
            config,
            credentials: Credentials::new(raw.merchant_id, raw.secret)?,
        })
    }
}
