use thiserror::Error;

/// Errors surfaced by the aggregator binary.
///
/// The poll loop never lets one of these escape — it logs, skips the
/// cycle, and backs off (see [`crate::poller`]).
#[derive(Debug, Error)]
pub enum AggregatorError {
    /// Configuration could not be parsed from flags/environment.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A broker operation failed.
    #[error("broker error: {0}")]
    Broker(#[from] simmesh_broker::BrokerError),

    /// JSON encoding of an export document failed.
    #[error("json export error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV encoding of an export document failed.
    #[error("csv export error: {0}")]
    Csv(String),

    /// The HTTP server could not bind or accept.
    #[error("http server error: {0}")]
    Http(String),
}

impl From<csv::Error> for AggregatorError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}

/// Convenience alias for aggregator operations.
pub type Result<T> = std::result::Result<T, AggregatorError>;
