use std::collections::HashMap;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use super::interpreter::{run_block, Budget};
use super::parser::parse_block;
use crate::error::{Result, SandboxError};
use crate::expr::code_functions;

/// Upper bound on evaluated statements/loop iterations within one
/// [`execute_code`] call, independent of the wall-clock timeout — a safety
/// net for tight CPU-bound loops that would otherwise only be caught at
/// thread-join granularity.
const MAX_STEPS: u64 = 20_000_000;

/// Runs a restricted code block under a wall-clock `timeout`, on a
/// dedicated OS thread joined with that timeout — mirroring the source's
/// daemon-thread-plus-`join(timeout)` enforcement. On expiry, the
/// thread is left running (it is not killed) and [`SandboxError::Timeout`]
/// is returned immediately.
///
/// `result_var` names the binding the code must assign (`"resultado"` for
/// model payloads, matching the model file format).
pub fn execute_code(
    source: &str,
    bindings: HashMap<String, f64>,
    timeout: Duration,
    result_var: &str,
) -> Result<f64> {
    let block = parse_block(source)?;
    let result_var = result_var.to_string();
    let deadline = Instant::now() + timeout;

    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("simmesh-sandbox-code".into())
        .spawn(move || {
            let functions = code_functions();
            let mut bindings = bindings;
            let mut budget = Budget::new(MAX_STEPS, deadline);
            let outcome = run_block(&block, &mut bindings, &functions, &mut budget)
                .map(|_| bindings.get(&result_var).copied());
            let _ = tx.send(outcome);
        })
        .expect("failed to spawn sandbox execution thread");

    match rx.recv_timeout(timeout) {
        Ok(Ok(Some(value))) => Ok(value),
        Ok(Ok(None)) => Err(SandboxError::MissingResult),
        Ok(Err(err)) => Err(err),
        Err(_) => Err(SandboxError::Timeout(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_the_named_result() {
        let bindings = HashMap::from([("x".to_string(), 3.0), ("y".to_string(), 4.0)]);
        let value = execute_code(
            "suma = x + y\nproducto = x * y\nresultado = suma * producto",
            bindings,
            Duration::from_secs(1),
            "resultado",
        )
        .unwrap();
        assert_eq!(value, 84.0);
    }

    #[test]
    fn missing_result_binding_is_an_error() {
        let bindings = HashMap::new();
        let err = execute_code("x = 1", bindings, Duration::from_secs(1), "resultado").unwrap_err();
        assert!(matches!(err, SandboxError::MissingResult));
    }

    #[test]
    fn infinite_loop_times_out() {
        let bindings = HashMap::from([("resultado".to_string(), 0.0)]);
        let err = execute_code(
            "while 1:\n    resultado += 1",
            bindings,
            Duration::from_millis(50),
            "resultado",
        )
        .unwrap_err();
        assert!(matches!(err, SandboxError::Timeout(_)));
    }
}
