//! # Kex Runtime
//!
//! Joins a pairing session through the HTTP relay and logs every message
//! until the session completes, fails, or times out.
//!
//! This is an observer, not a pairing client. `LoggingHandler` never sends
//! a reply, so two instances of this binary cannot complete a pairing on
//! their own: after the role's opening message both sides just poll until
//! the peer sends `done` or the session timeout passes. A real device
//! drives the exchange through `KexSession::hello`, `please_sign` and `done`.
//!
//! ## Environment
//!
//! - `KEX_ROLE`: `start`, `start-reverse` or `listen` (default)
//! - `KEX_SECRET`: session secret hex; generated when starting without one
//! - `KEX_UID`, `KEX_DEVICE_ID`, `KEX_PEER_DEVICE_ID`: hex ids
//! - `KEX_RELAY_URL`, `KEX_SESSION_TOKEN`, `KEX_POLL_SECS`,
//!   `KEX_SESSION_TIMEOUT_SECS`, `KEX_DIRECTION`: see `KexConfig`
//! - `RUST_LOG`: log filter, `info` by default

mod handlers;
mod settings;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use kex_protocol::{HttpRelayClient, KexSession, SystemTimeSource};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::handlers::LoggingHandler;
use crate::settings::{DeviceSettings, Role};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load configuration
    let settings = DeviceSettings::from_env()?;
    if settings.generated_secret {
        info!(
            secret = %settings.secret.to_hex(),
            "Generated session secret; pass it to the other device as KEX_SECRET"
        );
    }

    let relay = Arc::new(HttpRelayClient::new(&settings.kex.relay));
    let mut session = KexSession::from_config(
        settings.context(),
        relay,
        Arc::new(LoggingHandler),
        SystemTimeSource::new(),
        &settings.kex,
    );
    info!(
        role = ?settings.role,
        weak_id = %session.context().weak_id(),
        direction = %session.context().meta.direction,
        relay = %settings.kex.relay.base_url,
        "Joining pairing session"
    );

    let outcome = async {
        match settings.role {
            Role::Start => session.start_kex_session().await?,
            Role::StartReverse => session.start_reverse_kex_session().await?,
            Role::Listen => {}
        }
        session.run_until_complete().await
    }
    .await;

    if let Err(e) = outcome {
        error!("pairing failed: {e}");
        return Err(e).context("pairing failed");
    }

    info!(elapsed_ms = session.elapsed().as_millis() as u64, "Pairing complete");
    Ok(())
}
