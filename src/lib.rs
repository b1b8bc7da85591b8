//! Compile-once, evaluate-many math expressions.
//!
//! # Why?
//!
//! Performance. Expressions that are evaluated over and over with different
//! inputs should not pay for tokenizing, symbol lookups or constant
//! arithmetic each time. We compile the text once into a small tree, folding
//! every literal-only sub-expression, and then only walk that tree.
//!
//! # Example
//!
//! ```rust
//! use crunch_expr::*;
//!
//! let mut env = Environment::new();
//! env.set_variable_names(["x", "y"]);
//! env.add_function("mult", 2, |args| args[0] * args[1]);
//!
//! let compiled = CompiledExpression::compile("mult(x, 2 ^ 3) - y", &env).unwrap();
//! assert_eq!(compiled.evaluate(&[5.0, 1.0]).unwrap(), 39.0);
//! assert_eq!(compiled.evaluate(&[1.0, 9.0]).unwrap(), -1.0);
//!
//! // Positional variables need no declaration.
//! assert_eq!(evaluate_expression("$1 - $2", &[10.0, -4.0]).unwrap(), 14.0);
//! ```
//!
//! # Operators
//!
//! Operators with a higher priority are applied first (see
//! [`environment::priority`]). Operators sharing a priority always group left
//! to right, including `^`: `2^3^2` is `(2^3)^2`. Unary operators, including
//! negation, bind tighter than any built-in binary operator, so `-2^2` is `4`.

pub mod environment;
mod error;
mod evaluate;
mod expression;
mod lookup;
mod parse;
mod real;
mod reduce;

pub use environment::{
    default_environment, BinaryOperator, Environment, Function, Operator, Symbol, UnaryOperator,
};
pub use error::{CompileError, Error, EvaluateError};
pub use expression::*;
pub use lookup::SymbolTrie;
pub use real::{Real, SlotId};

/// Compiles `input` against the built-in symbols only.
pub fn compile(input: &str) -> Result<CompiledExpression, CompileError> {
    CompiledExpression::compile(input, default_environment())
}

pub fn compile_with(input: &str, env: &Environment) -> Result<CompiledExpression, CompileError> {
    CompiledExpression::compile(input, env)
}

/// Compiles and evaluates in one go. Prefer [`compile`] for anything
/// evaluated more than once.
pub fn evaluate_expression(input: &str, values: &[Real]) -> Result<Real, Error> {
    Ok(compile(input)?.evaluate(values)?)
}
