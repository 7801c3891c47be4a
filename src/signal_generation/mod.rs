pub mod generators;
pub mod init;

pub use generators::{chirp, tone};
pub use init::{DEFAULT_SEED, random_phase_init, random_phase_init_using, zero_dual};
