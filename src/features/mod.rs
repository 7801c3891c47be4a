pub mod phase_recovery;
pub mod reconstruction;

pub use phase_recovery::*;
pub use reconstruction::*;
