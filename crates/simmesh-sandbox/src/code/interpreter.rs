use std::collections::HashMap;
use std::time::Instant;

use super::ast::{AssignOp, Block, Stmt};
use crate::error::{Result, SandboxError};
use crate::expr::{evaluate_with, FunctionTable};

/// Tracks the cooperative step budget and wall-clock deadline shared across
/// one execution of a restricted code block.
///
/// The deadline is enforced by the caller via a joined thread with a
/// timeout (see [`super::execute_code`]); this counter exists so a
/// tight CPU-bound loop still notices the deadline between thread-join
/// polls rather than only at completion.
pub struct Budget {
    steps: u64,
    max_steps: u64,
    deadline: Instant,
}

impl Budget {
    /// Builds a budget that allows up to `max_steps` evaluated
    /// statements/iterations and expires at `deadline`.
    pub fn new(max_steps: u64, deadline: Instant) -> Self {
        Self { steps: 0, max_steps, deadline }
    }

    fn tick(&mut self) -> Result<()> {
        self.steps += 1;
        if self.steps > self.max_steps {
            return Err(SandboxError::StepBudgetExceeded(self.max_steps));
        }
        if Instant::now() >= self.deadline {
            return Err(SandboxError::Timeout(std::time::Duration::from_secs(0)));
        }
        Ok(())
    }
}

/// Runs `block` against `bindings`, mutating them in place.
pub fn run_block(
    block: &Block,
    bindings: &mut HashMap<String, f64>,
    functions: &FunctionTable,
    budget: &mut Budget,
) -> Result<()> {
    for stmt in block {
        run_stmt(stmt, bindings, functions, budget)?;
    }
    Ok(())
}

fn run_stmt(
    stmt: &Stmt,
    bindings: &mut HashMap<String, f64>,
    functions: &FunctionTable,
    budget: &mut Budget,
) -> Result<()> {
    budget.tick()?;

    match stmt {
        Stmt::Assign { name, op, value } => {
            let rhs = evaluate_with(value, bindings, functions)?;
            let new_value = match op {
                AssignOp::Plain => rhs,
                AssignOp::Add | AssignOp::Sub | AssignOp::Mul | AssignOp::Div => {
                    let current = *bindings
                        .get(name)
                        .ok_or_else(|| SandboxError::UndefinedName(name.clone()))?;
                    match op {
                        AssignOp::Add => current + rhs,
                        AssignOp::Sub => current - rhs,
                        AssignOp::Mul => current * rhs,
                        AssignOp::Div => {
                            if rhs == 0.0 {
                                return Err(SandboxError::Evaluation("division by zero".into()));
                            }
                            current / rhs
                        }
                        AssignOp::Plain => unreachable!(),
                    }
                }
            };
            bindings.insert(name.clone(), new_value);
            Ok(())
        }
        Stmt::If { branches, else_body } => {
            for (cond, body) in branches {
                if evaluate_with(cond, bindings, functions)? != 0.0 {
                    return run_block(body, bindings, functions, budget);
                }
            }
            if let Some(else_body) = else_body {
                run_block(else_body, bindings, functions, budget)?;
            }
            Ok(())
        }
        Stmt::While { cond, body } => {
            while evaluate_with(cond, bindings, functions)? != 0.0 {
                budget.tick()?;
                run_block(body, bindings, functions, budget)?;
            }
            Ok(())
        }
        Stmt::For { var, start, stop, step, body } => {
            let start = evaluate_with(start, bindings, functions)?;
            let stop = evaluate_with(stop, bindings, functions)?;
            let step_value = evaluate_with(step, bindings, functions)?;
            if step_value == 0.0 {
                return Err(SandboxError::Evaluation("range() step must not be zero".into()));
            }

            let mut i = start;
            while (step_value > 0.0 && i < stop) || (step_value < 0.0 && i > stop) {
                budget.tick()?;
                bindings.insert(var.clone(), i);
                run_block(body, bindings, functions, budget)?;
                i += step_value;
            }
            Ok(())
        }
        Stmt::Pass => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::parse_block;
    use crate::expr::expression_functions;

    fn run(source: &str, bindings: &mut HashMap<String, f64>) -> Result<()> {
        let block = parse_block(source).unwrap();
        let functions = expression_functions();
        let mut budget = Budget::new(1_000_000, Instant::now() + std::time::Duration::from_secs(5));
        run_block(&block, bindings, &functions, &mut budget)
    }

    #[test]
    fn runs_straight_line_code() {
        let mut bindings = HashMap::from([("x".to_string(), 3.0), ("y".to_string(), 4.0)]);
        run("suma = x + y\nproducto = x * y\nresultado = suma * producto", &mut bindings).unwrap();
        assert_eq!(bindings["resultado"], 84.0);
    }

    #[test]
    fn runs_for_loop_accumulation() {
        let mut bindings = HashMap::new();
        run("total = 0\nfor i in range(0, 5):\n    total += i\nresultado = total", &mut bindings).unwrap();
        assert_eq!(bindings["resultado"], 10.0);
    }

    #[test]
    fn runs_if_elif_else() {
        let mut bindings = HashMap::from([("x".to_string(), 0.0)]);
        run("if x > 0:\n    resultado = 1\nelif x < 0:\n    resultado = -1\nelse:\n    resultado = 0", &mut bindings)
            .unwrap();
        assert_eq!(bindings["resultado"], 0.0);
    }

    #[test]
    fn infinite_loop_trips_step_budget() {
        let mut bindings = HashMap::from([("resultado".to_string(), 0.0)]);
        let block = parse_block("while 1:\n    resultado += 1").unwrap();
        let functions = expression_functions();
        let mut budget = Budget::new(1000, Instant::now() + std::time::Duration::from_secs(5));
        let err = run_block(&block, &mut bindings, &functions, &mut budget).unwrap_err();
        assert!(matches!(err, SandboxError::StepBudgetExceeded(_)));
    }
}
