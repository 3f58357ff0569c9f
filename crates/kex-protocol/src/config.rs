//! Kex configuration and validation.
//!
//! Defaults match the hosted relay: 20 second long polls and a 5 minute
//! session timeout. `from_env` overrides them from `KEX_*` variables.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::Direction;
use crate::error::ConfigError;

/// Longest poll the relay accepts.
pub const MAX_POLL_SECS: u64 = 60;

/// Relay endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// API root; `kex/send` and `kex/receive` are resolved against it.
    pub base_url: String,
    /// Bearer token for the logged-in session, if the relay requires one.
    pub session_token: Option<String>,
    /// Budget for a request on top of any server-side poll time.
    pub request_timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000/_/api/1.0".to_string(),
            session_token: None,
            request_timeout_secs: 10,
        }
    }
}

impl RelayConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Settings for one device taking part in pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KexConfig {
    pub relay: RelayConfig,
    /// Server-side long-poll duration.
    pub poll_duration_secs: u64,
    /// Bound on a whole pairing attempt.
    pub session_timeout_secs: u64,
    /// Direction this device sends in. It receives the other one.
    pub direction: Direction,
}

impl Default for KexConfig {
    fn default() -> Self {
        Self {
            relay: RelayConfig::default(),
            poll_duration_secs: 20,
            session_timeout_secs: 300,
            direction: Direction::Forward,
        }
    }
}

impl KexConfig {
    /// Defaults overridden by `KEX_*` environment variables, then validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("KEX_RELAY_URL") {
            config.relay.base_url = url;
        }
        if let Some(token) = lookup("KEX_SESSION_TOKEN") {
            config.relay.session_token = (!token.is_empty()).then_some(token);
        }
        if let Some(secs) = lookup("KEX_REQUEST_TIMEOUT_SECS") {
            config.relay.request_timeout_secs = parse_secs("KEX_REQUEST_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = lookup("KEX_POLL_SECS") {
            config.poll_duration_secs = parse_secs("KEX_POLL_SECS", &secs)?;
        }
        if let Some(secs) = lookup("KEX_SESSION_TIMEOUT_SECS") {
            config.session_timeout_secs = parse_secs("KEX_SESSION_TIMEOUT_SECS", &secs)?;
        }
        if let Some(dir) = lookup("KEX_DIRECTION") {
            config.direction = parse_direction(&dir)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.relay.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "relay.base_url",
                reason: format!("expected an http(s) URL, got {url:?}"),
            });
        }

        if self.relay.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "relay.request_timeout_secs",
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.poll_duration_secs > MAX_POLL_SECS {
            return Err(ConfigError::InvalidValue {
                key: "poll_duration_secs",
                reason: format!("must be at most {MAX_POLL_SECS}"),
            });
        }

        if self.session_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "session_timeout_secs",
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.session_timeout_secs < self.poll_duration_secs {
            return Err(ConfigError::Invalid(format!(
                "session timeout ({}s) is shorter than one poll ({}s)",
                self.session_timeout_secs, self.poll_duration_secs
            )));
        }

        Ok(())
    }

    pub fn poll_duration(&self) -> Duration {
        Duration::from_secs(self.poll_duration_secs)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }
}

fn parse_secs(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
            key,
            reason: e.to_string(),
        })
}

fn parse_direction(value: &str) -> Result<Direction, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "forward" => Ok(Direction::Forward),
        "2" | "reverse" => Ok(Direction::Reverse),
        other => Err(ConfigError::InvalidValue {
            key: "KEX_DIRECTION",
            reason: format!("expected forward, reverse, 1 or 2, got {other:?}"),
        }),
    }
}
