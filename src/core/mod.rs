pub mod error;
pub mod ops;

pub use error::PhaseError;
pub use ops::{
    check_shape, magnitude_error, magnitude_project, mysign, phase_factor, relative_difference,
    validate_magnitude,
};
