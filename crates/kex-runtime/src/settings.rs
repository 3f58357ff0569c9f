//! Device settings read from the environment.

use std::str::FromStr;

use anyhow::{anyhow, bail, Context as _, Result};
use kex_protocol::{Context, Direction, KexConfig, SessionSecret};
use shared_types::{DeviceId, Uid};

/// What this device does in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Opens the session with `startkex`.
    Start,
    /// Opens the session with `startrevkex`.
    StartReverse,
    /// Waits for the peer to open the session.
    Listen,
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(Role::Start),
            "start-reverse" | "reverse" => Ok(Role::StartReverse),
            "listen" => Ok(Role::Listen),
            other => bail!("unknown KEX_ROLE {other:?} (expected start, start-reverse or listen)"),
        }
    }
}

pub struct DeviceSettings {
    pub role: Role,
    pub secret: SessionSecret,
    /// True when no secret was configured and one was generated.
    pub generated_secret: bool,
    pub uid: Uid,
    pub device_id: DeviceId,
    pub peer_device_id: DeviceId,
    pub kex: KexConfig,
}

impl DeviceSettings {
    pub fn from_env() -> Result<Self> {
        let kex = KexConfig::from_env().context("invalid KEX_* relay settings")?;
        let role: Role = optional("KEX_ROLE")
            .unwrap_or_else(|| "listen".to_string())
            .parse()?;

        let (secret, generated_secret) = match optional("KEX_SECRET") {
            Some(hex) => (
                SessionSecret::from_hex(&hex).context("KEX_SECRET must be 64 hex characters")?,
                false,
            ),
            None if role == Role::Listen => {
                bail!("KEX_SECRET is required to listen for a pairing session")
            }
            None => (SessionSecret::generate(), true),
        };

        Ok(Self {
            role,
            secret,
            generated_secret,
            uid: required("KEX_UID")?,
            device_id: required("KEX_DEVICE_ID")?,
            peer_device_id: required("KEX_PEER_DEVICE_ID")?,
            kex,
        })
    }

    /// Context for a new pairing attempt.
    pub fn context(&self) -> Context {
        Context::new(
            self.uid,
            self.device_id,
            self.peer_device_id,
            self.secret.strong_id(),
            self.secret.weak_id(),
            self.direction(),
        )
    }

    /// Listeners answer in the reverse direction unless configured otherwise.
    fn direction(&self) -> Direction {
        match (self.role, optional("KEX_DIRECTION")) {
            (_, Some(_)) => self.kex.direction,
            (Role::Listen, None) => Direction::Reverse,
            (_, None) => Direction::Forward,
        }
    }
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn required<T>(key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let value = optional(key).ok_or_else(|| anyhow!("{key} is not set"))?;
    value
        .trim()
        .parse()
        .map_err(|e| anyhow!("invalid {key}: {e}"))
}
