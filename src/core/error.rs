use ndarray::ShapeError;
use thiserror::Error;

/// Error types for phase recovery operations.
///
/// Every fallible entry point of the crate reports one of these variants. Errors are
/// raised at the point of detection and abort the whole run; no partial estimate
/// is ever returned alongside an error.
#[derive(Error, Debug)]
pub enum PhaseError {
    /// Operands of an elementwise operation have incompatible shapes.
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },

    /// A parameter or input array is outside its valid domain
    /// (e.g. `rho <= 0`, zero iterations, negative or NaN magnitudes).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Failure raised by the forward/inverse transform pair.
    #[error("Transform failed: {0}")]
    Transform(String),

    /// Error related to ndarray construction.
    #[error("Array shape error: {0}")]
    ShapeError(#[from] ShapeError),
}
