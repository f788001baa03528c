use std::collections::HashMap;

use crate::error::{Result, SandboxError};

/// Describes how many arguments a whitelisted function accepts.
#[derive(Debug, Clone, Copy)]
pub enum Arity {
    /// Exactly `n` arguments.
    Exact(usize),
    /// At least one argument, any number.
    Variadic,
}

impl Arity {
    fn accepts(&self, n: usize) -> bool {
        match self {
            Arity::Exact(expected) => n == *expected,
            Arity::Variadic => n >= 1,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Arity::Exact(1) => "1 argument",
            Arity::Exact(2) => "2 arguments",
            Arity::Exact(n) if *n == 0 => "0 arguments",
            Arity::Exact(_) => "a fixed number of arguments",
            Arity::Variadic => "at least 1 argument",
        }
    }
}

type Implementation = fn(&[f64]) -> f64;

/// A whitelisted callable: its arity and implementation.
#[derive(Clone, Copy)]
pub struct Function {
    arity: Arity,
    implementation: Implementation,
}

impl Function {
    /// Invokes the function after validating `args`' arity.
    pub fn call(&self, name: &str, args: &[f64]) -> Result<f64> {
        if !self.arity.accepts(args.len()) {
            return Err(SandboxError::ArityMismatch {
                name: name.to_string(),
                expected: self.arity.describe(),
                got: args.len(),
            });
        }
        Ok((self.implementation)(args))
    }
}

/// A whitelist of callable names plus their implementations.
pub struct FunctionTable {
    functions: HashMap<&'static str, Function>,
}

impl FunctionTable {
    /// Looks up `name`, returning `None` if it is not whitelisted.
    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }
}

macro_rules! unary_fn {
    ($name:ident, $inner:expr) => {
        fn $name(args: &[f64]) -> f64 {
            let f: fn(f64) -> f64 = $inner;
            f(args[0])
        }
    };
}

macro_rules! binary_fn {
    ($name:ident, $inner:expr) => {
        fn $name(args: &[f64]) -> f64 {
            let f: fn(f64, f64) -> f64 = $inner;
            f(args[0], args[1])
        }
    };
}

unary_fn!(f_abs, f64::abs);
unary_fn!(f_round, f64::round);
unary_fn!(f_sqrt, f64::sqrt);
unary_fn!(f_exp, f64::exp);
unary_fn!(f_ln, f64::ln);
unary_fn!(f_log10, f64::log10);
unary_fn!(f_log2, f64::log2);
unary_fn!(f_sin, f64::sin);
unary_fn!(f_cos, f64::cos);
unary_fn!(f_tan, f64::tan);
unary_fn!(f_asin, f64::asin);
unary_fn!(f_acos, f64::acos);
unary_fn!(f_atan, f64::atan);
unary_fn!(f_sinh, f64::sinh);
unary_fn!(f_cosh, f64::cosh);
unary_fn!(f_tanh, f64::tanh);
unary_fn!(f_ceil, f64::ceil);
unary_fn!(f_floor, f64::floor);
unary_fn!(f_trunc, f64::trunc);
unary_fn!(f_degrees, f64::to_degrees);
unary_fn!(f_radians, f64::to_radians);
unary_fn!(f_square, |x| x * x);
unary_fn!(f_sign, |x: f64| if x > 0.0 {
    1.0
} else if x < 0.0 {
    -1.0
} else {
    0.0
});

binary_fn!(f_atan2, f64::atan2);
binary_fn!(f_pow, f64::powf);

fn f_min(args: &[f64]) -> f64 {
    args.iter().copied().fold(f64::INFINITY, f64::min)
}

fn f_max(args: &[f64]) -> f64 {
    args.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn f_sum(args: &[f64]) -> f64 {
    args.iter().sum()
}

fn f_mean(args: &[f64]) -> f64 {
    args.iter().sum::<f64>() / args.len() as f64
}

fn f_median(args: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = args.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

fn f_variance(args: &[f64]) -> f64 {
    let mean = f_mean(args);
    args.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / args.len() as f64
}

fn f_std(args: &[f64]) -> f64 {
    f_variance(args).sqrt()
}

fn f_clip(args: &[f64]) -> f64 {
    args[0].max(args[1]).min(args[2])
}

fn function(implementation: Implementation, arity: Arity) -> Function {
    Function { arity, implementation }
}

/// Names and implementations allowed inside B1 arithmetic expressions:
/// the same 26-entry table the original source's `ALLOWED_FUNCTIONS`
/// dict exposes (`math`-flavored names, e.g. `asin` rather than `arcsin`).
pub fn expression_functions() -> FunctionTable {
    let mut functions = HashMap::new();
    functions.insert("abs", function(f_abs, Arity::Exact(1)));
    functions.insert("round", function(f_round, Arity::Exact(1)));
    functions.insert("min", function(f_min, Arity::Variadic));
    functions.insert("max", function(f_max, Arity::Variadic));
    functions.insert("sum", function(f_sum, Arity::Variadic));
    functions.insert("sqrt", function(f_sqrt, Arity::Exact(1)));
    functions.insert("pow", function(f_pow, Arity::Exact(2)));
    functions.insert("exp", function(f_exp, Arity::Exact(1)));
    functions.insert("log", function(f_ln, Arity::Exact(1)));
    functions.insert("log10", function(f_log10, Arity::Exact(1)));
    functions.insert("log2", function(f_log2, Arity::Exact(1)));
    functions.insert("sin", function(f_sin, Arity::Exact(1)));
    functions.insert("cos", function(f_cos, Arity::Exact(1)));
    functions.insert("tan", function(f_tan, Arity::Exact(1)));
    functions.insert("asin", function(f_asin, Arity::Exact(1)));
    functions.insert("acos", function(f_acos, Arity::Exact(1)));
    functions.insert("atan", function(f_atan, Arity::Exact(1)));
    functions.insert("atan2", function(f_atan2, Arity::Exact(2)));
    functions.insert("sinh", function(f_sinh, Arity::Exact(1)));
    functions.insert("cosh", function(f_cosh, Arity::Exact(1)));
    functions.insert("tanh", function(f_tanh, Arity::Exact(1)));
    functions.insert("ceil", function(f_ceil, Arity::Exact(1)));
    functions.insert("floor", function(f_floor, Arity::Exact(1)));
    functions.insert("trunc", function(f_trunc, Arity::Exact(1)));
    functions.insert("degrees", function(f_degrees, Arity::Exact(1)));
    functions.insert("radians", function(f_radians, Arity::Exact(1)));
    debug_assert_eq!(functions.len(), 26);
    FunctionTable { functions }
}

/// Names and implementations allowed inside B2 restricted code blocks: a
/// scalar equivalent of the original source's numpy-function whitelist
/// (`arcsin` rather than `asin`, plus `mean`/`median`/`std`/`var`/`power`/
/// `square`/`sign`/`clip`, since the sandbox operates on scalar bindings
/// rather than arrays).
pub fn code_functions() -> FunctionTable {
    let mut functions = HashMap::new();
    functions.insert("abs", function(f_abs, Arity::Exact(1)));
    functions.insert("sqrt", function(f_sqrt, Arity::Exact(1)));
    functions.insert("exp", function(f_exp, Arity::Exact(1)));
    functions.insert("log", function(f_ln, Arity::Exact(1)));
    functions.insert("log10", function(f_log10, Arity::Exact(1)));
    functions.insert("log2", function(f_log2, Arity::Exact(1)));
    functions.insert("sin", function(f_sin, Arity::Exact(1)));
    functions.insert("cos", function(f_cos, Arity::Exact(1)));
    functions.insert("tan", function(f_tan, Arity::Exact(1)));
    functions.insert("arcsin", function(f_asin, Arity::Exact(1)));
    functions.insert("arccos", function(f_acos, Arity::Exact(1)));
    functions.insert("arctan", function(f_atan, Arity::Exact(1)));
    functions.insert("arctan2", function(f_atan2, Arity::Exact(2)));
    functions.insert("sinh", function(f_sinh, Arity::Exact(1)));
    functions.insert("cosh", function(f_cosh, Arity::Exact(1)));
    functions.insert("tanh", function(f_tanh, Arity::Exact(1)));
    functions.insert("floor", function(f_floor, Arity::Exact(1)));
    functions.insert("ceil", function(f_ceil, Arity::Exact(1)));
    functions.insert("round", function(f_round, Arity::Exact(1)));
    functions.insert("sum", function(f_sum, Arity::Variadic));
    functions.insert("mean", function(f_mean, Arity::Variadic));
    functions.insert("median", function(f_median, Arity::Variadic));
    functions.insert("std", function(f_std, Arity::Variadic));
    functions.insert("var", function(f_variance, Arity::Variadic));
    functions.insert("min", function(f_min, Arity::Variadic));
    functions.insert("max", function(f_max, Arity::Variadic));
    functions.insert("power", function(f_pow, Arity::Exact(2)));
    functions.insert("square", function(f_square, Arity::Exact(1)));
    functions.insert("sign", function(f_sign, Arity::Exact(1)));
    functions.insert("clip", function(f_clip, Arity::Exact(3)));
    FunctionTable { functions }
}

/// The five whitelisted named constants, shared by both sandbox modes.
pub fn constants() -> HashMap<&'static str, f64> {
    HashMap::from([
        ("pi", std::f64::consts::PI),
        ("e", std::f64::consts::E),
        ("tau", std::f64::consts::TAU),
        ("inf", f64::INFINITY),
        ("nan", f64::NAN),
    ])
}
