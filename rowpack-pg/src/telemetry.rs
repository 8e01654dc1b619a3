//! Tracing subscriber initialization

use crate::error::{PgError, PgResult};
use rowpack_core::config::{env_flag, env_var};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to the startup event
    pub service_name: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    /// Filter used when `RUST_LOG` is unset
    pub default_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: env_var("ROWPACK_SERVICE_NAME")
                .unwrap_or_else(|| "rowpack-import".to_string()),
            json: env_flag("ROWPACK_LOG_JSON"),
            default_filter: "rowpack_engine=info,rowpack_pg=info,warn".to_string(),
        }
    }
}

/// Install the global tracing subscriber. Logs go to stderr.
///
/// Call once at startup; a second call fails because a subscriber is
/// already set.
pub fn init_tracing(config: &TelemetryConfig) -> PgResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));
    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    result.map_err(|e| PgError::Telemetry {
        reason: e.to_string(),
    })?;

    tracing::info!(
        service_name = config.service_name,
        json = config.json,
        "Telemetry initialized"
    );
    Ok(())
}
