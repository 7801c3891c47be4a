use crate::core::{PhaseError, validate_magnitude};
use ndarray::{Array2, Zip};
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::Uniform;
use num_complex::Complex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Seed used when the caller does not pick one.
pub const DEFAULT_SEED: u64 = 0;

/// Builds the random-phase starting point `z0 = amp ⊙ exp(i·2π·U)` from a seed.
///
/// `U` holds independent uniform draws in `[0, 1)`, one per spectrogram entry.
/// The same seed and shape always give the same `z0`.
///
/// # Arguments
/// * `amp` - Magnitude spectrogram (shape: `[n_freqs, n_frames]`).
/// * `seed` - Seed of the random source.
///
/// # Examples
/// ```
/// use ndarray::Array2;
/// let amp = Array2::<f32>::ones((4, 3));
/// let a = dasp_phase::random_phase_init(&amp, 7).unwrap();
/// let b = dasp_phase::random_phase_init(&amp, 7).unwrap();
/// assert_eq!(a, b);
/// ```
pub fn random_phase_init(amp: &Array2<f32>, seed: u64) -> Result<Array2<Complex<f32>>, PhaseError> {
    let mut rng = StdRng::seed_from_u64(seed);
    random_phase_init_using(amp, &mut rng)
}

/// Same as [`random_phase_init`], drawing from a caller-supplied random source.
pub fn random_phase_init_using<R: Rng + ?Sized>(
    amp: &Array2<f32>,
    rng: &mut R,
) -> Result<Array2<Complex<f32>>, PhaseError> {
    validate_magnitude(amp)?;
    let draws = Array2::<f32>::random_using(amp.raw_dim(), Uniform::new(0.0, 1.0), rng);
    Ok(Zip::from(amp)
        .and(&draws)
        .map_collect(|&a, &u| Complex::from_polar(a, TAU * u)))
}

/// All-zero dual variable matching `amp`'s shape.
pub fn zero_dual(amp: &Array2<f32>) -> Array2<Complex<f32>> {
    Array2::zeros(amp.raw_dim())
}
