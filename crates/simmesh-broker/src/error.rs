use thiserror::Error;

/// Errors surfaced by [`crate::BrokerClient`] and [`crate::BrokerPool`].
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The underlying AMQP connection or channel failed.
    #[error("amqp error: {0}")]
    Amqp(#[from] lapin::Error),

    /// A connection attempt exhausted its bounded retry budget.
    #[error("connection failed after {attempts} attempt(s)")]
    ConnectionFailed {
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    /// A pool `acquire()` call did not obtain a connection within
    /// `pool_timeout`.
    #[error("timed out after {0:?} waiting for a pooled connection")]
    PoolTimeout(std::time::Duration),

    /// The pool has been shut down and can no longer hand out connections.
    #[error("connection pool is closed")]
    PoolClosed,

    /// A message body could not be serialized or deserialized as JSON.
    #[error("message codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Convenience alias for broker operations.
pub type Result<T> = std::result::Result<T, BrokerError>;
