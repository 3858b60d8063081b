//! Core errors (renderer-agnostic).

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    /// A transform can only be copied from exactly 16 column-major components.
    #[error("invalid matrix source: expected 16 components, got {len}")]
    InvalidMatrixSource { len: usize },

    /// Inversion requested for a matrix whose determinant is zero.
    #[error("matrix is not invertible (determinant is zero)")]
    SingularMatrix,
}

pub type CoreResult<T> = Result<T, CoreError>;
