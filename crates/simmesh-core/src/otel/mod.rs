//! Tracing/logging setup shared by the producer, consumer and aggregator
//! binaries.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use simmesh_core::otel::Observability;
//!
//! let _guard = Observability::builder("simmesh-consumer")
//!     .environment_from_env()
//!     .log_level_from_env()
//!     .build()?;
//! ```

mod builder;

pub use builder::{Observability, ObservabilityBuilder, ObservabilityError, ObservabilityGuard};

/// Convenience wrapper around [`Observability::builder`] reading everything
/// from the environment (`RUST_LOG`, `ENVIRONMENT`/`ENV`, `LOG_FORMAT=json`).
pub fn init_tracing(service_name: impl Into<String>) -> Result<ObservabilityGuard, ObservabilityError> {
    let mut builder = Observability::new(service_name)
        .environment_from_env()
        .log_level_from_env();

    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        builder = builder.json_logging();
    }

    builder.build()
}
