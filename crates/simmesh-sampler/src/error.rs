use thiserror::Error;

/// Errors raised while validating parameters or drawing from a distribution.
#[derive(Debug, Error)]
pub enum DistributionError {
    /// A required parameter was not present in the parameter map.
    #[error("missing parameter '{name}' for distribution '{distribution}'")]
    MissingParameter {
        /// Distribution tag, as reported to the caller.
        distribution: &'static str,
        /// Missing parameter name.
        name: &'static str,
    },

    /// A parameter was present but outside its valid domain.
    #[error("invalid parameter '{name}' for distribution '{distribution}': {reason}")]
    InvalidParameter {
        /// Distribution tag.
        distribution: &'static str,
        /// Parameter name.
        name: &'static str,
        /// Human-readable reason.
        reason: String,
    },

    /// `exponential` was given both `lambda` and `scale` and they disagree.
    #[error("'lambda' and 'scale' disagree for exponential: lambda={lambda}, scale={scale} (expected scale = 1/lambda)")]
    ConflictingExponentialParameters {
        /// The `lambda` value supplied.
        lambda: f64,
        /// The `scale` value supplied.
        scale: f64,
    },

    /// The underlying `rand_distr` constructor rejected the parameters.
    #[error("distribution '{distribution}' rejected its parameters: {source}")]
    Backend {
        /// Distribution tag.
        distribution: &'static str,
        /// Underlying error from `rand_distr`.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Convenience alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, DistributionError>;
