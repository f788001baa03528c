use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or validating a model file.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The model file does not exist.
    #[error("model file not found: {0}")]
    NotFound(PathBuf),

    /// The file exists but could not be read.
    #[error("failed to read model file: {0}")]
    Io(#[from] std::io::Error),

    /// A required section is missing entirely.
    #[error("missing required section [{0}]")]
    MissingSection(&'static str),

    /// A required key is missing from a section that is otherwise present.
    #[error("missing required field '{field}' in [{section}]")]
    MissingField {
        /// Section the field was expected in.
        section: &'static str,
        /// Field name.
        field: &'static str,
    },

    /// A line in `[VARIABLES]` could not be parsed.
    #[error("line {line}: {message}")]
    InvalidVariable {
        /// 1-based line number in the source file.
        line: usize,
        /// Human-readable reason.
        message: String,
    },

    /// `[VARIABLES]` was present but contained no variable lines.
    #[error("no variables found in [VARIABLES]")]
    NoVariables,

    /// `kind` was not `float` or `int`.
    #[error("invalid variable type '{0}', expected 'float' or 'int'")]
    InvalidType(String),

    /// `distribution` is not one of the six supported tags.
    #[error("unsupported distribution '{0}'")]
    UnsupportedDistribution(String),

    /// A `param=value` pair failed to parse as a number.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Human-readable reason.
        reason: String,
    },

    /// `[FUNCION] tipo` was not `expresion` or `codigo`.
    #[error("invalid function type '{0}', expected 'expresion' or 'codigo'")]
    InvalidFunctionType(String),

    /// `tipo = expresion` but `expresion` was empty or missing.
    #[error("expression must not be empty")]
    EmptyExpression,

    /// `tipo = codigo` but the code block was empty.
    #[error("code must not be empty")]
    EmptyCode,

    /// No `codigo =` marker was found under `[FUNCION]`.
    #[error("missing 'codigo =' marker in [FUNCION]")]
    MissingCodeMarker,

    /// The code block does not assign a `resultado` name anywhere.
    #[error("code must assign a 'resultado' variable, e.g. resultado = x + y")]
    MissingResultAssignment,

    /// `numero_escenarios` failed to parse as a positive integer.
    #[error("'numero_escenarios' must be a positive integer, got '{0}'")]
    InvalidScenarioCount(String),

    /// `semilla_aleatoria` was present but not an integer.
    #[error("'semilla_aleatoria' must be an integer: {0}")]
    InvalidSeed(String),
}

/// Convenience alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, ModelError>;
