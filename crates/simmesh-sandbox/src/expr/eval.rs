use std::collections::HashMap;

use super::ast::{BinaryOp, CompareOp, Expr, UnaryOp};
use super::functions::{constants, FunctionTable};
use crate::error::{Result, SandboxError};

/// Evaluates `expr` against `bindings`, resolving unbound names against the
/// whitelisted constants, and calls against `functions`.
pub fn eval(expr: &Expr, bindings: &HashMap<String, f64>, functions: &FunctionTable) -> Result<f64> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Name(name) => {
            if let Some(value) = bindings.get(name) {
                Ok(*value)
            } else if let Some(value) = constants().get(name.as_str()) {
                Ok(*value)
            } else {
                Err(SandboxError::UndefinedName(name.clone()))
            }
        }
        Expr::Unary(op, operand) => {
            let value = eval(operand, bindings, functions)?;
            Ok(match op {
                UnaryOp::Pos => value,
                UnaryOp::Neg => -value,
            })
        }
        Expr::Binary(op, lhs, rhs) => {
            let lhs = eval(lhs, bindings, functions)?;
            let rhs = eval(rhs, bindings, functions)?;
            eval_binary(*op, lhs, rhs)
        }
        Expr::Compare(first, chain) => {
            let mut left = eval(first, bindings, functions)?;
            for (op, rhs_expr) in chain {
                let right = eval(rhs_expr, bindings, functions)?;
                if !compare(*op, left, right) {
                    return Ok(0.0);
                }
                left = right;
            }
            Ok(1.0)
        }
        Expr::Call(name, arg_exprs) => {
            let function = functions
                .get(name)
                .ok_or_else(|| SandboxError::ForbiddenFunction(name.clone()))?;
            let mut args = Vec::with_capacity(arg_exprs.len());
            for arg in arg_exprs {
                args.push(eval(arg, bindings, functions)?);
            }
            function.call(name, &args)
        }
        Expr::Ternary(cond, then_branch, else_branch) => {
            if eval(cond, bindings, functions)? != 0.0 {
                eval(then_branch, bindings, functions)
            } else {
                eval(else_branch, bindings, functions)
            }
        }
    }
}

fn eval_binary(op: BinaryOp, lhs: f64, rhs: f64) -> Result<f64> {
    Ok(match op {
        BinaryOp::Add => lhs + rhs,
        BinaryOp::Sub => lhs - rhs,
        BinaryOp::Mul => lhs * rhs,
        BinaryOp::Div => {
            if rhs == 0.0 {
                return Err(SandboxError::Evaluation("division by zero".into()));
            }
            lhs / rhs
        }
        BinaryOp::FloorDiv => {
            if rhs == 0.0 {
                return Err(SandboxError::Evaluation("floor division by zero".into()));
            }
            (lhs / rhs).floor()
        }
        BinaryOp::Mod => {
            if rhs == 0.0 {
                return Err(SandboxError::Evaluation("modulo by zero".into()));
            }
            lhs.rem_euclid(rhs)
        }
        BinaryOp::Pow => lhs.powf(rhs),
    })
}

fn compare(op: CompareOp, lhs: f64, rhs: f64) -> bool {
    match op {
        CompareOp::Eq => lhs == rhs,
        CompareOp::Ne => lhs != rhs,
        CompareOp::Lt => lhs < rhs,
        CompareOp::Le => lhs <= rhs,
        CompareOp::Gt => lhs > rhs,
        CompareOp::Ge => lhs >= rhs,
    }
}
