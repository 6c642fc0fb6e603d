//! Tracing initialization.
//!
//! The component logs diagnostics through the `tracing` facade: retrieval
//! fallbacks and storage failures at warn, discarded session records and
//! rejected logins at debug. Hosting applications that already install their
//! own subscriber should skip this and rely on theirs; [`init_telemetry`] is
//! for hosts that want the plain console subscriber.
//!
//! Verbosity is controlled with the standard `RUST_LOG` environment
//! variable, defaulting to `info`.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the fmt subscriber with env-filter control.
///
/// Fails if a global subscriber is already set.
pub fn init_telemetry() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}
