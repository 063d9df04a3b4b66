pub mod config;
pub mod error;

pub use config::{
    check_timestamp_format, CalendarConfig, Config, ConfigValidationError, ValidationResult,
};
pub use error::{AuthError, ConfigError, NetworkError, ReqwestErrorExt};

use anyhow::Result;

/// Install the global tracing subscriber. `RUST_LOG` wins over the `info`
/// default.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!("gcal core initialized");
    Ok(())
}
