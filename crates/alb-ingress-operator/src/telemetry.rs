//! Tracing subscriber setup
//!
//! Installs the global subscriber: an `EnvFilter` honouring `RUST_LOG` with a
//! fallback of `info,alb_ingress_operator=debug`, and a fmt layer that is
//! either human readable or JSON for log collectors.

use tracing::info;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,alb_ingress_operator=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize tracing.
///
/// Must be called once at startup. A second call fails because the global
/// subscriber is already set.
pub fn init(json: bool) -> Result<(), TryInitError> {
    let registry = tracing_subscriber::registry().with(env_filter());

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_span_events(FmtSpan::CLOSE)
                    .with_current_span(false),
            )
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()?;
    }

    info!(json, "Tracing initialized");
    Ok(())
}
