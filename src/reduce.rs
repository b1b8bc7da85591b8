//! Turns the flat token sequence of one scope into a single [`Value`].
//!
//! Function calls are bound to their argument lists first. Operators are then
//! applied one priority level at a time, highest first, folding any operation
//! whose operands are all literals.

use std::sync::Arc;

use bitvec::vec::BitVec;
use tracing::trace;

use crate::environment::{BinaryOperator, Function, Operator, UnaryOperator};
use crate::error::CompileError;
use crate::expression::Value;

/// One element of a scope's token sequence.
#[derive(Clone, Debug)]
pub(crate) enum Token {
    Operator(Operator),
    Function(Arc<Function>),
    Arguments(Vec<Value>),
    Value(Value),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::Operator(op) => format!("operator `{}`", op.symbol()),
            Self::Function(function) => format!("function `{}`", function.name()),
            Self::Arguments(arguments) => format!("argument list of {}", arguments.len()),
            Self::Value(value) => format!("value `{value}`"),
        }
    }
}

pub(crate) fn reduce(tokens: Vec<Token>) -> Result<Value, CompileError> {
    let (mut tokens, priorities) = bind_functions(tokens)?;
    for priority in priorities.iter_ones().rev() {
        // Priorities were collected from `u8`s.
        let priority = priority as u8;
        trace!(priority, tokens = tokens.len(), "reducing priority level");
        tokens = reduce_priority(tokens, priority)?;
    }
    single_value(tokens)
}

/// Replaces each function and its argument list by a call, and collects the
/// distinct operator priorities present.
fn bind_functions(tokens: Vec<Token>) -> Result<(Vec<Token>, BitVec), CompileError> {
    let mut bound = Vec::with_capacity(tokens.len());
    let mut priorities = BitVec::new();
    let mut tokens = tokens.into_iter();
    while let Some(token) = tokens.next() {
        match token {
            Token::Function(function) => {
                let Some(Token::Arguments(arguments)) = tokens.next() else {
                    return Err(CompileError::MissingArgumentList {
                        function: function.name().to_string(),
                    });
                };
                if arguments.len() != function.arity() {
                    return Err(CompileError::ArityMismatch {
                        function: function.name().to_string(),
                        expected: function.arity(),
                        found: arguments.len(),
                    });
                }
                bound.push(Token::Value(Value::FunctionCall(
                    function,
                    arguments.into_boxed_slice(),
                )));
            }
            Token::Operator(op) => {
                let priority = usize::from(op.priority());
                if priorities.len() <= priority {
                    priorities.resize(priority + 1, false);
                }
                priorities.set(priority, true);
                bound.push(Token::Operator(op));
            }
            other => bound.push(other),
        }
    }
    Ok((bound, priorities))
}

/// Applies every operator of `priority`, scanning left to right. Each result
/// lands on the output before the scan continues, so it becomes the left
/// operand of the next operator at this priority.
fn reduce_priority(tokens: Vec<Token>, priority: u8) -> Result<Vec<Token>, CompileError> {
    let mut output: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut tokens = tokens.into_iter();
    while let Some(token) = tokens.next() {
        let op = match token {
            Token::Operator(op) if op.priority() == priority => op,
            other => {
                output.push(other);
                continue;
            }
        };
        let Some(next) = tokens.next() else {
            return Err(CompileError::NoFollowingOperand {
                operator: op.symbol().to_string(),
            });
        };
        let value = match op {
            Operator::Unary(op) => {
                let only = operand(next, op.symbol())?;
                fold_unary(op, only)
            }
            Operator::Binary(op) => {
                let Some(previous) = output.pop() else {
                    return Err(CompileError::NoLeadingOperand {
                        operator: op.symbol().to_string(),
                    });
                };
                let lhs = operand(previous, op.symbol())?;
                let rhs = operand(next, op.symbol())?;
                fold_binary(op, lhs, rhs)
            }
        };
        output.push(Token::Value(value));
    }
    Ok(output)
}

fn operand(token: Token, operator: &str) -> Result<Value, CompileError> {
    match token {
        Token::Value(value) => Ok(value),
        Token::Operator(_) => Err(CompileError::AdjacentOperators {
            operator: operator.to_string(),
        }),
        other => Err(CompileError::NotAValue {
            found: other.describe(),
        }),
    }
}

fn fold_unary(op: Arc<UnaryOperator>, only: Value) -> Value {
    match only {
        Value::Literal(only) => Value::Literal(op.apply(only)),
        only => Value::UnaryOperation(op, Box::new(only)),
    }
}

fn fold_binary(op: Arc<BinaryOperator>, lhs: Value, rhs: Value) -> Value {
    match (lhs, rhs) {
        (Value::Literal(lhs), Value::Literal(rhs)) => Value::Literal(op.apply(lhs, rhs)),
        (lhs, rhs) => Value::BinaryOperation(op, Box::new(lhs), Box::new(rhs)),
    }
}

fn single_value(tokens: Vec<Token>) -> Result<Value, CompileError> {
    let mut tokens = tokens.into_iter();
    match tokens.next() {
        Some(Token::Value(value)) => {
            if tokens.next().is_some() {
                return Err(CompileError::AdjacentValues);
            }
            Ok(value)
        }
        Some(other) => Err(CompileError::NotAValue {
            found: other.describe(),
        }),
        None => Err(CompileError::NotAValue {
            found: "nothing".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{priority, Environment, Symbol};

    use pretty_assertions::assert_eq;

    fn op(env: &Environment, spelling: &str) -> Token {
        match env.lookup(spelling, 0) {
            Some((Symbol::Operator(op), _)) => Token::Operator(op.clone()),
            other => panic!("Not an operator: {other:?}"),
        }
    }

    fn negate(env: &Environment) -> Token {
        Token::Operator(Operator::Unary(env.negation().clone()))
    }

    fn lit(value: f32) -> Token {
        Token::Value(Value::Literal(value.into()))
    }

    fn var(slot: usize) -> Token {
        Token::Value(Value::Variable(slot))
    }

    #[test]
    fn folds_literal_operations() {
        let env = Environment::new();
        // 2 + 3 * 4
        let tokens = vec![lit(2.0), op(&env, "+"), lit(3.0), op(&env, "*"), lit(4.0)];
        let value = reduce(tokens).unwrap();
        assert!(matches!(value, Value::Literal(v) if v == 14.0), "{value:?}");
    }

    #[test]
    fn same_priority_groups_left_to_right() {
        let env = Environment::new();
        // 2 ^ 3 ^ 2 is (2^3)^2 = 64, not 2^9.
        let tokens = vec![lit(2.0), op(&env, "^"), lit(3.0), op(&env, "^"), lit(2.0)];
        assert!(matches!(reduce(tokens).unwrap(), Value::Literal(v) if v == 64.0));

        // $1 - $2 - $3 keeps ($1 - $2) on the left.
        let tokens = vec![var(0), op(&env, "-"), var(1), op(&env, "-"), var(2)];
        assert_eq!(reduce(tokens).unwrap().to_string(), "(($1 - $2) - $3)");
    }

    #[test]
    fn unary_binds_tighter_than_binary() {
        let env = Environment::new();
        // 1 - -$1
        let tokens = vec![lit(1.0), op(&env, "-"), negate(&env), var(0)];
        assert_eq!(reduce(tokens).unwrap().to_string(), "(1 - (-($1)))");
    }

    #[test]
    fn function_calls_are_bound_but_not_folded() {
        let mut env = Environment::new();
        env.add_function("twice", 1, |args| 2.0 * args[0]);
        let Some((Symbol::Function(twice), _)) = env.lookup("twice", 0) else {
            panic!("Missing function");
        };
        let tokens = vec![
            Token::Function(twice.clone()),
            Token::Arguments(vec![Value::Literal(4.0)]),
            op(&env, "+"),
            lit(1.0),
        ];
        assert_eq!(reduce(tokens).unwrap().to_string(), "(twice(4) + 1)");

        let tokens = vec![Token::Function(twice.clone()), lit(1.0)];
        assert_eq!(
            reduce(tokens).unwrap_err(),
            CompileError::MissingArgumentList {
                function: "twice".into()
            }
        );

        let tokens = vec![Token::Function(twice.clone()), Token::Arguments(vec![])];
        assert_eq!(
            reduce(tokens).unwrap_err(),
            CompileError::ArityMismatch {
                function: "twice".into(),
                expected: 1,
                found: 0
            }
        );
    }

    #[test]
    fn operand_errors() {
        let env = Environment::new();
        assert_eq!(
            reduce(vec![op(&env, "+")]).unwrap_err(),
            CompileError::NoFollowingOperand {
                operator: "+".into()
            }
        );
        assert_eq!(
            reduce(vec![op(&env, "*"), lit(1.0)]).unwrap_err(),
            CompileError::NoLeadingOperand {
                operator: "*".into()
            }
        );
        assert_eq!(
            reduce(vec![negate(&env), negate(&env), lit(1.0)]).unwrap_err(),
            CompileError::AdjacentOperators {
                operator: "-".into()
            }
        );
        assert_eq!(
            reduce(vec![lit(1.0), op(&env, "*"), op(&env, "+"), lit(1.0)]).unwrap_err(),
            CompileError::AdjacentOperators {
                operator: "*".into()
            }
        );
    }

    #[test]
    fn leftover_sequences() {
        assert_eq!(reduce(vec![lit(1.0), lit(1.0)]).unwrap_err(), CompileError::AdjacentValues);
        assert_eq!(
            reduce(vec![]).unwrap_err(),
            CompileError::NotAValue {
                found: "nothing".into()
            }
        );
    }

    #[test]
    fn priorities_are_visited_highest_first() {
        let (_, priorities) = bind_functions(vec![
            lit(1.0),
            Token::Operator(Operator::binary("@", 9, |lhs, rhs| lhs * rhs)),
            lit(1.0),
            Token::Operator(Operator::binary("#", priority::OR, |lhs, _| lhs)),
            lit(1.0),
        ])
        .unwrap();
        let visited: Vec<_> = priorities.iter_ones().rev().collect();
        assert_eq!(visited, vec![9, 0]);
    }
}
