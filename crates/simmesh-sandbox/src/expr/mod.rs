//! B1: a safe arithmetic expression evaluator.
//!
//! Parses a source string into a restricted [`ast::Expr`] tree — numeric
//! literals, name lookups, unary/binary operators, chained comparisons, a
//! ternary conditional, and calls to a bare whitelisted name — then
//! evaluates it against a variable binding. Anything outside that shape is
//! rejected at parse time; anything outside the function/constant
//! whitelists is rejected at evaluation time.

pub mod ast;
mod eval;
mod functions;
mod lexer;
mod parser;

use std::collections::HashMap;

pub use functions::{code_functions, constants, expression_functions, Arity, Function, FunctionTable};
pub use parser::parse_expr;

use crate::error::Result;

/// Parses and evaluates `source` against `bindings` using the B1 arithmetic
/// function whitelist.
pub fn evaluate_expression(source: &str, bindings: &HashMap<String, f64>) -> Result<f64> {
    let expr = parse_expr(source)?;
    let functions = expression_functions();
    eval::eval(&expr, bindings, &functions)
}

/// Evaluates an already-parsed [`ast::Expr`] against `bindings` and a
/// caller-supplied function table — used by the B2 code interpreter, which
/// reuses this expression grammar inside statements with its own (wider)
/// numeric function whitelist.
pub fn evaluate_with(expr: &ast::Expr, bindings: &HashMap<String, f64>, functions: &FunctionTable) -> Result<f64> {
    eval::eval(expr, bindings, functions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn evaluates_arithmetic() {
        let b = bindings(&[("x", 2.0), ("y", 3.0)]);
        assert_eq!(evaluate_expression("x + y", &b).unwrap(), 5.0);
        assert_eq!(evaluate_expression("x ** 2 + y ** 2", &b).unwrap(), 13.0);
    }

    #[test]
    fn evaluates_whitelisted_call() {
        let b = bindings(&[("x", 16.0)]);
        assert_eq!(evaluate_expression("sqrt(x)", &b).unwrap(), 4.0);
    }

    #[test]
    fn evaluates_constants() {
        let b = HashMap::new();
        assert!((evaluate_expression("pi", &b).unwrap() - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn rejects_forbidden_function() {
        let b = HashMap::new();
        assert!(evaluate_expression("exec(1)", &b).is_err());
    }

    #[test]
    fn rejects_undefined_name() {
        let b = HashMap::new();
        assert!(evaluate_expression("z + 1", &b).is_err());
    }

    #[test]
    fn ternary_picks_correct_branch() {
        let b = bindings(&[("x", -5.0)]);
        assert_eq!(evaluate_expression("x > 0 ? x : -x", &b).unwrap(), 5.0);
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let b = bindings(&[("x", 1.0), ("y", 0.0)]);
        assert!(evaluate_expression("x / y", &b).is_err());
    }
}

#[cfg(test)]
mod correctness_properties {
    use super::*;
    use proptest::prelude::*;

    /// A fully-parenthesized arithmetic tree over `+`, `-`, `*` and small
    /// integer literals — no division, so there is no zero-denominator case
    /// to special-case away.
    #[derive(Debug, Clone)]
    enum Tree {
        Num(f64),
        Add(Box<Tree>, Box<Tree>),
        Sub(Box<Tree>, Box<Tree>),
        Mul(Box<Tree>, Box<Tree>),
    }

    impl Tree {
        fn to_source(&self) -> String {
            match self {
                Tree::Num(n) => format!("({n})"),
                Tree::Add(l, r) => format!("({} + {})", l.to_source(), r.to_source()),
                Tree::Sub(l, r) => format!("({} - {})", l.to_source(), r.to_source()),
                Tree::Mul(l, r) => format!("({} * {})", l.to_source(), r.to_source()),
            }
        }

        fn to_value(&self) -> f64 {
            match self {
                Tree::Num(n) => *n,
                Tree::Add(l, r) => l.to_value() + r.to_value(),
                Tree::Sub(l, r) => l.to_value() - r.to_value(),
                Tree::Mul(l, r) => l.to_value() * r.to_value(),
            }
        }
    }

    fn tree_strategy() -> impl Strategy<Value = Tree> {
        let leaf = (-1_000i32..1_000).prop_map(|n| Tree::Num(n as f64));
        leaf.prop_recursive(4, 64, 4, |inner| {
            prop_oneof![
                (inner.clone(), inner.clone()).prop_map(|(l, r)| Tree::Add(Box::new(l), Box::new(r))),
                (inner.clone(), inner.clone()).prop_map(|(l, r)| Tree::Sub(Box::new(l), Box::new(r))),
                (inner.clone(), inner).prop_map(|(l, r)| Tree::Mul(Box::new(l), Box::new(r))),
            ]
        })
    }

    proptest! {
        /// For any expression built from the allowed `+`/`-`/`*`/literal
        /// grammar, parsing and evaluating its rendered source agrees with
        /// directly computing the same tree, within floating-point tolerance.
        #[test]
        fn evaluator_agrees_with_direct_computation(tree in tree_strategy()) {
            let expected = tree.to_value();
            let source = tree.to_source();
            let actual = evaluate_expression(&source, &HashMap::new()).unwrap();
            let tolerance = 1e-6 * expected.abs().max(1.0);
            prop_assert!((actual - expected).abs() <= tolerance, "source {source:?}: expected {expected}, got {actual}");
        }
    }
}
