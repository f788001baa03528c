use thiserror::Error;

/// Errors surfaced by the consumer binary.
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// Configuration could not be parsed from flags/environment.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// No model could be read from `cola_modelo` after `model_load_attempts`.
    #[error("no model available on the model queue after {attempts} attempt(s)")]
    ModelUnavailable {
        /// Number of `get` attempts made.
        attempts: u32,
    },

    /// The loaded model declared a function type this consumer cannot run.
    #[error("model error: {0}")]
    Model(#[from] simmesh_model::ModelError),

    /// A broker operation failed.
    #[error("broker error: {0}")]
    Broker(#[from] simmesh_broker::BrokerError),
}

/// Convenience alias for consumer operations.
pub type Result<T> = std::result::Result<T, ConsumerError>;

/// How a per-scenario processing failure should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Not recoverable by retrying: NACK without requeue, which routes to
    /// the dead-letter queue by topology.
    Terminal,
    /// May succeed on a later attempt: republish with an incremented
    /// retry counter (if under the retry budget), else dead-letter.
    Transient,
}

/// A failure observed while processing one scenario, carrying enough
/// context to log and classify it.
#[derive(Debug)]
pub struct ScenarioFailure {
    /// Coarse error-kind label, used as a telemetry counter key and as
    /// the `x-last-error` header value on republication.
    pub kind: &'static str,
    /// Human-readable detail for logging.
    pub detail: String,
    /// Whether this failure is retryable.
    pub class: ErrorClass,
}

impl From<serde_json::Error> for ScenarioFailure {
    fn from(err: serde_json::Error) -> Self {
        Self { kind: "decode_error", detail: err.to_string(), class: ErrorClass::Transient }
    }
}

impl From<simmesh_sandbox::SandboxError> for ScenarioFailure {
    fn from(err: simmesh_sandbox::SandboxError) -> Self {
        use simmesh_sandbox::SandboxError::*;
        let (kind, class) = match &err {
            Syntax(_) => ("expression_evaluation_error", ErrorClass::Terminal),
            UndefinedName(_) => ("expression_evaluation_error", ErrorClass::Terminal),
            ForbiddenFunction(_) => ("expression_evaluation_error", ErrorClass::Terminal),
            ArityMismatch { .. } => ("expression_evaluation_error", ErrorClass::Terminal),
            Security(_) => ("security_error", ErrorClass::Terminal),
            // Arithmetic/domain errors (division by zero, etc.) surface
            // unchanged and are retried like any other transient failure.
            Evaluation(_) => ("numeric_error", ErrorClass::Transient),
            MissingResult => ("missing_result_error", ErrorClass::Terminal),
            Timeout(_) => ("timeout_error", ErrorClass::Terminal),
            StepBudgetExceeded(_) => ("step_budget_exceeded_error", ErrorClass::Terminal),
        };
        Self { kind, detail: err.to_string(), class }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simmesh_sandbox::SandboxError;

    #[test]
    fn numeric_errors_are_transient() {
        let failure: ScenarioFailure = SandboxError::Evaluation("division by zero".into()).into();
        assert_eq!(failure.class, ErrorClass::Transient);
        assert_eq!(failure.kind, "numeric_error");
    }

    #[test]
    fn security_violations_are_terminal() {
        let failure: ScenarioFailure = SandboxError::Security("module 'os' is not permitted".into()).into();
        assert_eq!(failure.class, ErrorClass::Terminal);
        assert_eq!(failure.kind, "security_error");
    }

    #[test]
    fn step_budget_exhaustion_is_not_labeled_a_security_error() {
        let failure: ScenarioFailure = SandboxError::StepBudgetExceeded(1_000_000).into();
        assert_eq!(failure.class, ErrorClass::Terminal);
        assert_ne!(failure.kind, "security_error");
    }
}
