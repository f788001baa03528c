//! Builder for configuring the process-wide tracing subscriber
//!
//! # Example
//!
//! ```rust,ignore
//! use simmesh_core::otel::Observability;
//!
//! let _guard = Observability::builder("simmesh-consumer")
//!     .environment_from_env()
//!     .json_logging()
//!     .log_level_from_env()
//!     .build()?;
//! ```

use std::env;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Builder for configuring logging/tracing output
pub struct ObservabilityBuilder {
    service_name: String,
    environment: Option<String>,
    json_logging: bool,
    log_level: String,
}

impl ObservabilityBuilder {
    /// Create a new observability builder
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            environment: None,
            json_logging: false,
            log_level: "info".to_string(),
        }
    }

    /// Set the environment (e.g. "production", "staging", "development")
    pub fn environment(mut self, env: impl Into<String>) -> Self {
        self.environment = Some(env.into());
        self
    }

    /// Read environment from ENVIRONMENT or ENV env var
    pub fn environment_from_env(mut self) -> Self {
        self.environment = env::var("ENVIRONMENT").or_else(|_| env::var("ENV")).ok();
        self
    }

    /// Enable JSON-formatted log output
    pub fn json_logging(mut self) -> Self {
        self.json_logging = true;
        self
    }

    /// Set the log level (trace, debug, info, warn, error)
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Read log level from RUST_LOG env var, falling back to whatever was set
    pub fn log_level_from_env(mut self) -> Self {
        if let Ok(level) = env::var("RUST_LOG") {
            self.log_level = level;
        }
        self
    }

    /// Initialize the global tracing subscriber
    ///
    /// Returns a guard; there is nothing to flush on drop today, but keeping
    /// the init/guard split matches how the other components take a handle
    /// they hold for the process lifetime.
    pub fn build(self) -> Result<ObservabilityGuard, ObservabilityError> {
        let env_filter =
            EnvFilter::try_new(&self.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

        let registry = tracing_subscriber::registry().with(env_filter);

        let result = if self.json_logging {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_thread_ids(true),
                )
                .try_init()
        } else {
            registry
                .with(tracing_subscriber::fmt::layer().with_target(true))
                .try_init()
        };

        result.map_err(|e| ObservabilityError::SubscriberInit(e.to_string()))?;

        tracing::info!(
            service = %self.service_name,
            environment = self.environment.as_deref().unwrap_or("development"),
            "tracing initialized"
        );

        Ok(ObservabilityGuard { _private: () })
    }
}

/// Guard returned by [`ObservabilityBuilder::build`]. Keep it alive for the
/// lifetime of the process.
pub struct ObservabilityGuard {
    _private: (),
}

/// Errors that can occur during observability setup
#[derive(Debug)]
pub enum ObservabilityError {
    /// Failed to initialize the subscriber
    SubscriberInit(String),
}

impl std::fmt::Display for ObservabilityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObservabilityError::SubscriberInit(msg) => {
                write!(f, "failed to initialize subscriber: {}", msg)
            }
        }
    }
}

impl std::error::Error for ObservabilityError {}

/// Type alias for the builder
pub type Observability = ObservabilityBuilder;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let builder = ObservabilityBuilder::new("test-service");
        assert_eq!(builder.service_name, "test-service");
        assert!(builder.environment.is_none());
        assert!(!builder.json_logging);
        assert_eq!(builder.log_level, "info");
    }

    #[test]
    fn builder_fluent_api() {
        let builder = ObservabilityBuilder::new("test-service")
            .environment("production")
            .json_logging()
            .log_level("debug");

        assert_eq!(builder.environment, Some("production".to_string()));
        assert!(builder.json_logging);
        assert_eq!(builder.log_level, "debug");
    }
}
