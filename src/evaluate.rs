use smallvec::SmallVec;

use crate::error::EvaluateError;
use crate::expression::{CompiledExpression, Value};
use crate::real::Real;

#[cfg(feature = "rayon")]
use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};

/// Arguments of most calls fit without touching the heap.
type Arguments = SmallVec<[Real; 4]>;

impl CompiledExpression {
    pub fn evaluate_without_vars(&self) -> Result<Real, EvaluateError> {
        self.evaluate(&[])
    }

    /// Calculates the result with variable slot `i` reading `values[i]`.
    ///
    /// Extra values are ignored; too few is an error.
    pub fn evaluate(&self, values: &[Real]) -> Result<Real, EvaluateError> {
        validate_values(values, self.variable_count())?;
        self.root().evaluate(values)
    }

    /// Evaluates once per row of values, with optional data parallelism via
    /// the `rayon` feature. Fails on the first row with too few values.
    pub fn evaluate_batch<R: AsRef<[Real]> + Sync>(
        &self,
        rows: &[R],
    ) -> Result<Vec<Real>, EvaluateError> {
        #[cfg(feature = "rayon")]
        {
            rows.par_iter()
                .map(|row| self.evaluate(row.as_ref()))
                .collect()
        }
        #[cfg(not(feature = "rayon"))]
        {
            rows.iter().map(|row| self.evaluate(row.as_ref())).collect()
        }
    }
}

impl Value {
    /// Recursively evaluates this node. Variables read `values` directly, so
    /// nothing is stored on the tree and concurrent evaluation is sound.
    pub fn evaluate(&self, values: &[Real]) -> Result<Real, EvaluateError> {
        match self {
            Self::Literal(value) => Ok(*value),
            Self::Variable(slot) => {
                values
                    .get(*slot)
                    .copied()
                    .ok_or(EvaluateError::MissingValues {
                        required: slot + 1,
                        supplied: values.len(),
                    })
            }
            Self::UnaryOperation(op, only) => Ok(op.apply(only.evaluate(values)?)),
            Self::BinaryOperation(op, lhs, rhs) => {
                let lhs = lhs.evaluate(values)?;
                let rhs = rhs.evaluate(values)?;
                Ok(op.apply(lhs, rhs))
            }
            Self::FunctionCall(function, arguments) => {
                let arguments = arguments
                    .iter()
                    .map(|argument| argument.evaluate(values))
                    .collect::<Result<Arguments, _>>()?;
                Ok(function.call(&arguments))
            }
        }
    }
}

fn validate_values(values: &[Real], required: usize) -> Result<(), EvaluateError> {
    if values.len() < required {
        return Err(EvaluateError::MissingValues {
            required,
            supplied: values.len(),
        });
    }
    Ok(())
}
