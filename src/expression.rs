use std::fmt;
use std::sync::Arc;

use crate::environment::{BinaryOperator, Function, UnaryOperator, VARIABLE_MARKER};
use crate::real::{Real, SlotId};

/// A node of a compiled expression tree.
#[derive(Clone, Debug)]
pub enum Value {
    // Constant, including anything folded at compile time.
    Literal(Real),

    // Input variable.
    Variable(SlotId),

    // Operators applied to non-constant operands.
    UnaryOperation(Arc<UnaryOperator>, Box<Value>),
    BinaryOperation(Arc<BinaryOperator>, Box<Value>, Box<Value>),

    // Native function call. Argument count matches the function's arity.
    FunctionCall(Arc<Function>, Box<[Value]>),
}

impl Value {
    /// Number of slots evaluation must supply: the highest slot referenced
    /// anywhere below this node, plus one.
    pub fn variable_count(&self) -> usize {
        match self {
            Self::Literal(_) => 0,
            Self::Variable(slot) => slot + 1,
            Self::UnaryOperation(_, only) => only.variable_count(),
            Self::BinaryOperation(_, lhs, rhs) => lhs.variable_count().max(rhs.variable_count()),
            Self::FunctionCall(_, arguments) => arguments
                .iter()
                .map(Value::variable_count)
                .max()
                .unwrap_or(0),
        }
    }
}

/// Renders text that compiles back to an equivalent tree. Named variables
/// render positionally.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value}"),
            Self::Variable(slot) => write!(f, "{VARIABLE_MARKER}{}", slot + 1),
            // Parenthesized whole, so the operator keeps its operand whatever
            // the priority of operators around it.
            Self::UnaryOperation(op, only) => write!(f, "({}({only}))", op.symbol()),
            Self::BinaryOperation(op, lhs, rhs) => write!(f, "({lhs} {} {rhs})", op.symbol()),
            Self::FunctionCall(function, arguments) => {
                write!(f, "{}(", function.name())?;
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{argument}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// An expression compiled once and evaluated any number of times.
///
/// Evaluation only reads the tree, so a single instance can be shared across
/// threads and evaluated concurrently.
#[derive(Clone, Debug)]
pub struct CompiledExpression {
    root: Value,
    variable_count: usize,
}

impl CompiledExpression {
    pub(crate) fn new(root: Value) -> Self {
        let variable_count = root.variable_count();
        Self {
            root,
            variable_count,
        }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Minimum number of values [`Self::evaluate`] accepts.
    pub fn variable_count(&self) -> usize {
        self.variable_count
    }

    /// True when the whole expression folded to a single literal.
    pub fn is_constant(&self) -> bool {
        matches!(self.root, Value::Literal(_))
    }
}

impl fmt::Display for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.root, f)
    }
}
