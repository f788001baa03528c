use crate::expr::ast::Expr;

/// Augmented-assignment operators, e.g. `x += 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Plain,
    /// `+=`
    Add,
    /// `-=`
    Sub,
    /// `*=`
    Mul,
    /// `/=`
    Div,
}

/// A statement in the restricted code dialect.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `name = expr` or `name += expr` etc.
    Assign {
        /// Target name.
        name: String,
        /// Which assignment operator was used.
        op: AssignOp,
        /// Right-hand side expression.
        value: Expr,
    },
    /// `if cond: block (elif cond: block)* (else: block)?`
    If {
        /// `(condition, body)` pairs, `if` first then any `elif`s.
        branches: Vec<(Expr, Block)>,
        /// The trailing `else` body, if present.
        else_body: Option<Block>,
    },
    /// `while cond: block`
    While {
        /// Loop condition, re-evaluated before each iteration.
        cond: Expr,
        /// Loop body.
        body: Block,
    },
    /// `for name in range(start, stop, step): block`
    For {
        /// Loop variable name.
        var: String,
        /// Range start (inclusive).
        start: Expr,
        /// Range stop (exclusive).
        stop: Expr,
        /// Range step (defaults to `1`).
        step: Expr,
        /// Loop body.
        body: Block,
    },
    /// A no-op statement.
    Pass,
}

/// An ordered sequence of statements.
pub type Block = Vec<Stmt>;
