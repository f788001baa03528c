use thiserror::Error;

/// Errors raised while parsing or evaluating a sandboxed payload.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// Tokenizing or parsing the source failed.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// A name referenced in an expression is neither a binding, a
    /// whitelisted constant, nor a whitelisted function.
    #[error("name '{0}' is not defined")]
    UndefinedName(String),

    /// A call targeted a function name outside the whitelist.
    #[error("function '{0}' is not permitted")]
    ForbiddenFunction(String),

    /// A whitelisted function was called with the wrong number of arguments.
    #[error("function '{name}' expects {expected}, got {got}")]
    ArityMismatch {
        /// Function name.
        name: String,
        /// Human-readable arity description, e.g. "1 argument" or "at least 1 argument".
        expected: &'static str,
        /// Number of arguments actually supplied.
        got: usize,
    },

    /// A runtime arithmetic error, e.g. division by zero.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// An `import`/`from ... import ...` statement named a module outside
    /// the whitelist (`math`, `numpy`/`np`).
    #[error("security error: {0}")]
    Security(String),

    /// The restricted code block did not assign `result` anywhere reachable.
    #[error("code did not produce a 'result' binding")]
    MissingResult,

    /// Execution exceeded its wall-clock budget.
    #[error("execution timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The interpreter's step budget was exhausted (a safety net under
    /// `Timeout` for tight CPU-bound loops, see the interpreter's step
    /// counter).
    #[error("exceeded the maximum number of evaluated steps ({0})")]
    StepBudgetExceeded(u64),
}

/// Convenience alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, SandboxError>;
