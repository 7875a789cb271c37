//! Tracing Subscriber Initialization
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and either
//! JSON or human-readable output.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{ApiError, ApiResult};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "plura_api=debug,tower_http=debug,info";

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" | "text" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to the startup event
    pub service_name: String,
    /// Environment (production, staging, development)
    pub environment: String,
    /// Output format
    pub log_format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "plura-api".to_string(),
            environment: "development".to_string(),
            log_format: LogFormat::Json,
        }
    }
}

impl TelemetryConfig {
    /// Environment variables:
    /// - `PLURA_SERVICE_NAME` (default: plura-api)
    /// - `PLURA_ENVIRONMENT` (default: development)
    /// - `PLURA_LOG_FORMAT`: "json" or "pretty" (default: json)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            service_name: lookup("PLURA_SERVICE_NAME").unwrap_or(defaults.service_name),
            environment: lookup("PLURA_ENVIRONMENT").unwrap_or(defaults.environment),
            log_format: lookup("PLURA_LOG_FORMAT")
                .and_then(|s| LogFormat::parse(&s))
                .unwrap_or(defaults.log_format),
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Call once at startup, before anything logs.
pub fn init_tracing(config: &TelemetryConfig) -> ApiResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().pretty()).try_init(),
    };
    result.map_err(|e| ApiError::internal_error(format!("Failed to init subscriber: {}", e)))?;

    tracing::info!(
        service_name = %config.service_name,
        environment = %config.environment,
        log_format = ?config.log_format,
        "Telemetry initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_config_default() {
        let config = TelemetryConfig::from_lookup(|_| None);
        assert_eq!(config.service_name, "plura-api");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_log_format_selection() {
        let config = TelemetryConfig::from_lookup(|key| {
            (key == "PLURA_LOG_FORMAT").then(|| "Pretty".to_string())
        });
        assert_eq!(config.log_format, LogFormat::Pretty);

        assert_eq!(LogFormat::parse("json"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("xml"), None);
    }
}
