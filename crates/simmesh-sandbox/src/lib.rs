//! Sandboxed evaluation of model payloads.
//!
//! Two modes, matching a model's `[FUNCION] tipo`:
//!
//! - [`expr::evaluate_expression`] (B1): a safe arithmetic expression
//!   evaluator over an allow-listed AST.
//! - [`code::execute_code`] (B2): a restricted statement interpreter with
//!   a wall-clock timeout, for multi-line `codigo` payloads.

#![deny(missing_docs)]

mod error;
pub mod code;
pub mod expr;

pub use error::{Result, SandboxError};

use std::collections::HashMap;
use std::time::Duration;

use simmesh_model::Payload;

/// Evaluates a model's [`Payload`] against a scenario's variable bindings.
///
/// `timeout` bounds [`Payload::Codigo`] execution only; expression
/// evaluation is synchronous and unbounded (it cannot loop).
pub fn evaluate_payload(payload: &Payload, bindings: &HashMap<String, f64>, timeout: Duration) -> Result<f64> {
    match payload {
        Payload::Expresion { expresion } => expr::evaluate_expression(expresion, bindings),
        Payload::Codigo { codigo } => code::execute_code(codigo, bindings.clone(), timeout, "resultado"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_expression_payload() {
        let payload = Payload::Expresion { expresion: "x + y".to_string() };
        let bindings = HashMap::from([("x".to_string(), 2.0), ("y".to_string(), 3.0)]);
        assert_eq!(evaluate_payload(&payload, &bindings, Duration::from_secs(1)).unwrap(), 5.0);
    }

    #[test]
    fn evaluates_code_payload() {
        let payload = Payload::Codigo { codigo: "resultado = x * 2".to_string() };
        let bindings = HashMap::from([("x".to_string(), 21.0)]);
        assert_eq!(evaluate_payload(&payload, &bindings, Duration::from_secs(1)).unwrap(), 42.0);
    }
}
