//! Client configuration.
//!
//! Defaults point at a local development server. Every value can be
//! overridden from the environment (`MATCHHUB_*`) and, in the CLI, from flags.

use std::time::Duration;

use matchhub_core::{DEFAULT_TYPING_WINDOW, SessionConfig};
use thiserror::Error;
use url::Url;

use crate::endpoint::websocket_base;

/// API base URL used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Time allowed for one REST request, including the body.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Time allowed for the WebSocket handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment variable holding the API base URL.
pub const ENV_API_URL: &str = "MATCHHUB_API_URL";
/// Environment variable holding an explicit WebSocket base URL.
pub const ENV_WS_URL: &str = "MATCHHUB_WS_URL";
/// Environment variable holding the typing window in milliseconds.
pub const ENV_TYPING_WINDOW_MS: &str = "MATCHHUB_TYPING_WINDOW_MS";
/// Environment variable holding the request timeout in seconds.
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "MATCHHUB_REQUEST_TIMEOUT_SECS";

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A URL setting did not parse
    #[error("{key}: invalid URL {value:?}: {reason}")]
    InvalidUrl {
        /// Setting name
        key: &'static str,
        /// Offending value
        value: String,
        /// Parser message
        reason: String,
    },

    /// A numeric setting did not parse
    #[error("{key}: expected a non-negative integer, got {value:?}")]
    InvalidNumber {
        /// Setting name
        key: &'static str,
        /// Offending value
        value: String,
    },

    /// URL scheme has no WebSocket counterpart
    #[error("unsupported URL scheme {scheme:?} (expected http, https, ws or wss)")]
    UnsupportedScheme {
        /// The scheme found
        scheme: String,
    },

    /// URL cannot carry a path (e.g. `mailto:`)
    #[error("URL {0} cannot be used as a base")]
    NotABase(String),
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST API base URL
    pub api_url: Url,
    /// WebSocket base URL. Derived from `api_url` when `None`.
    pub ws_url: Option<Url>,
    /// How long a typing indicator stays up
    pub typing_window: Duration,
    /// Timeout for one REST request
    pub request_timeout: Duration,
    /// Timeout for the WebSocket handshake
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            ws_url: None,
            typing_window: DEFAULT_TYPING_WINDOW,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `MATCHHUB_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    ///
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(value) = get(ENV_API_URL) {
            config.api_url = parse_url(ENV_API_URL, &value)?;
        }
        if let Some(value) = get(ENV_WS_URL) {
            config.ws_url = Some(parse_url(ENV_WS_URL, &value)?);
        }
        if let Some(value) = get(ENV_TYPING_WINDOW_MS) {
            config.typing_window = Duration::from_millis(parse_number(ENV_TYPING_WINDOW_MS, &value)?);
        }
        if let Some(value) = get(ENV_REQUEST_TIMEOUT_SECS) {
            config.request_timeout =
                Duration::from_secs(parse_number(ENV_REQUEST_TIMEOUT_SECS, &value)?);
        }

        Ok(config)
    }

    /// WebSocket base URL: the explicit one, or `api_url` with `ws`/`wss`.
    pub fn websocket_base(&self) -> Result<Url, ConfigError> {
        match &self.ws_url {
            Some(url) => websocket_base(url),
            None => websocket_base(&self.api_url),
        }
    }

    /// Session settings derived from this configuration.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig { typing_window: self.typing_window }
    }
}

/// Parse a URL setting.
pub fn parse_url(key: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        key,
        value: value.to_owned(),
        reason: e.to_string(),
    })
}

fn parse_number(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidNumber { key, value: value.to_owned() })
}

fn default_api_url() -> Url {
    // Constant input; parsing cannot fail.
    Url::parse(DEFAULT_API_URL).unwrap_or_else(|_| unreachable!("default API URL is valid"))
}
