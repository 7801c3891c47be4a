//! # DASP-Phase: Phase Recovery from Magnitude Spectrograms
//!
//! DASP-Phase reconstructs a time-domain signal from a magnitude-only short-time Fourier
//! transform. Starting from a random phase, it searches for a complex spectrogram whose
//! magnitude matches the target and which is the STFT of some real signal.
//!
//! ## Key Features
//! - Griffin-Lim (GLA): alternating magnitude and range projections.
//! - ADMM-GLA: the same problem split with an auxiliary variable and a scaled dual
//!   variable, which relaxes the range constraint through a penalty `rho`.
//! - A `rustfft`-backed centered STFT behind the [`Transform`] trait, so other
//!   transform implementations can be plugged in.
//! - Seeded, reproducible random-phase initialization.
//!
//! ## Usage
//! ```rust
//! use dasp_phase::{Stft, StftConfig, magnitude_spectrogram, random_phase_init, run_gla, stft_zero_pad, tone, Transform};
//!
//! let y = tone(440.0, Some(16000), Some(4000), None, None);
//! let stft = Stft::new(StftConfig::default()).unwrap();
//! let padded = stft_zero_pad(&y, 512, 256).unwrap();
//! let amp = magnitude_spectrogram(&padded, &stft).unwrap();
//! let z0 = random_phase_init(&amp, 0).unwrap();
//! let x = run_gla(&z0, &amp, 10, &stft).unwrap();
//! let recovered = stft.inverse(&x).unwrap();
//! assert_eq!(recovered.len(), padded.len());
//! ```
//!
//! ## Modules
//! See the individual module documentation for detailed information on available functionality.

/// Core module.
///
/// Error type, elementwise projection primitives, input validation and error metrics.
pub mod core;

/// Signal processing module.
///
/// The STFT transform pair, range projection and frame-grid zero-padding.
pub mod signal_processing;

/// Signal generation module.
///
/// Test waveforms and random-phase initialization.
pub mod signal_generation;

/// Feature module.
///
/// The GLA and ADMM-GLA engines and the end-to-end reconstruction driver.
pub mod features;

/// Utility module.
///
/// Frame and sample bookkeeping for the STFT grid.
pub mod utils;

// Re-export all public items from the modules for convenient access at the crate root.
pub use crate::core::*;
pub use signal_processing::*;
pub use signal_generation::*;
pub use features::*;
pub use utils::*;
