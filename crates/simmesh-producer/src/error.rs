use thiserror::Error;

/// Errors surfaced by the producer binary.
#[derive(Debug, Error)]
pub enum ProducerError {
    /// Configuration could not be parsed from flags/environment.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The model file could not be read or parsed.
    #[error("model error: {0}")]
    Model(#[from] simmesh_model::ModelError),

    /// A distribution draw failed while generating a scenario.
    #[error("sampling error: {0}")]
    Sampling(#[from] simmesh_sampler::DistributionError),

    /// A broker operation (connect, declare, publish) failed.
    #[error("broker error: {0}")]
    Broker(#[from] simmesh_broker::BrokerError),

    /// The model file could not be read from disk.
    #[error("could not read model file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias for producer operations.
pub type Result<T> = std::result::Result<T, ProducerError>;
