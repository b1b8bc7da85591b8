use thiserror::Error;

/// Why an expression failed to compile.
///
/// Offsets are byte offsets into the compiled text.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    #[error("expression is empty")]
    EmptyExpression,

    #[error("unbalanced parenthesis at offset {offset}")]
    UnbalancedParenthesis { offset: usize },

    #[error("unrecognized token `{token}` at offset {offset}")]
    UnknownToken { token: String, offset: usize },

    #[error("invalid variable reference `{token}` at offset {offset}, positional variables start at $1")]
    InvalidVariable { token: String, offset: usize },

    #[error("operator `{operator}` has no leading operand")]
    NoLeadingOperand { operator: String },

    #[error("operator `{operator}` has no following operand")]
    NoFollowingOperand { operator: String },

    #[error("adjacent operators have no values to operate on (at `{operator}`)")]
    AdjacentOperators { operator: String },

    #[error("function `{function}` must be followed by an argument list")]
    MissingArgumentList { function: String },

    #[error("function `{function}` takes {expected} args, but got {found}")]
    ArityMismatch {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("expected a value, found {found}")]
    NotAValue { found: String },

    #[error("adjacent values have no operator between them")]
    AdjacentValues,
}

/// Why a compiled expression could not be evaluated.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EvaluateError {
    #[error("expression needs {required} variable values, but only {supplied} were supplied")]
    MissingValues { required: usize, supplied: usize },
}

/// Either failure, for the one-shot helpers that compile and evaluate together.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Evaluate(#[from] EvaluateError),
}
