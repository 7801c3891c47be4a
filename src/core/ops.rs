use crate::core::PhaseError;
use ndarray::{Array2, Zip};
use num_complex::Complex;

/// Returns the unit-magnitude phase factor `exp(i * angle(c))` of a single value.
///
/// The angle of an exact zero (including signed zeros) is taken to be `0`, so a
/// zero entry maps to `1 + 0i` instead of an undefined or NaN phase. Zeros show up
/// routinely in zero-padded frames and silent frequency bins.
///
/// # Examples
/// ```
/// use num_complex::Complex;
/// let p = dasp_phase::phase_factor(Complex::new(0.0, 3.0));
/// assert!((p.re - 0.0).abs() < 1e-6 && (p.im - 1.0).abs() < 1e-6);
/// assert_eq!(dasp_phase::phase_factor(Complex::new(0.0, 0.0)), Complex::new(1.0, 0.0));
/// ```
#[inline]
pub fn phase_factor(c: Complex<f32>) -> Complex<f32> {
    if c.re == 0.0 && c.im == 0.0 {
        return Complex::new(1.0, 0.0);
    }
    Complex::from_polar(1.0, c.im.atan2(c.re))
}

/// Elementwise phase factor of a complex spectrogram (`exp(i * angle(w))`).
///
/// # Arguments
/// * `w` - Complex spectrogram (shape: `[n_freqs, n_frames]`).
///
/// # Returns
/// Array of the same shape whose entries all have unit magnitude.
pub fn mysign(w: &Array2<Complex<f32>>) -> Array2<Complex<f32>> {
    w.mapv(phase_factor)
}

/// Fails with [`PhaseError::ShapeMismatch`] unless both shapes are equal.
pub fn check_shape(expected: (usize, usize), got: (usize, usize)) -> Result<(), PhaseError> {
    if expected != got {
        return Err(PhaseError::ShapeMismatch { expected, got });
    }
    Ok(())
}

/// Imposes a magnitude on a complex spectrogram while keeping its phase.
///
/// Computes `amp ⊙ exp(i * angle(z))` elementwise. The result satisfies
/// `|x| == amp` up to rounding.
///
/// # Arguments
/// * `z` - Complex spectrogram supplying the phase.
/// * `amp` - Magnitude spectrogram, same shape as `z`.
///
/// # Returns
/// The magnitude-consistent spectrogram, or `ShapeMismatch` when `z` and `amp` differ in shape.
///
/// # Examples
/// ```
/// use ndarray::arr2;
/// use num_complex::Complex;
/// let z = arr2(&[[Complex::new(0.0, -2.0), Complex::new(0.0, 0.0)]]);
/// let amp = arr2(&[[3.0_f32, 0.5]]);
/// let x = dasp_phase::magnitude_project(&z, &amp).unwrap();
/// assert!((x[[0, 0]].im + 3.0).abs() < 1e-6);
/// assert_eq!(x[[0, 1]], Complex::new(0.5, 0.0));
/// ```
pub fn magnitude_project(
    z: &Array2<Complex<f32>>,
    amp: &Array2<f32>,
) -> Result<Array2<Complex<f32>>, PhaseError> {
    check_shape(amp.dim(), z.dim())?;
    Ok(Zip::from(z)
        .and(amp)
        .map_collect(|&z, &a| phase_factor(z) * a))
}

/// Checks that a magnitude spectrogram is usable as a phase recovery target.
///
/// Rejects empty arrays and any entry that is negative, NaN or infinite.
pub fn validate_magnitude(amp: &Array2<f32>) -> Result<(), PhaseError> {
    if amp.is_empty() {
        return Err(PhaseError::InvalidParameter(
            "magnitude spectrogram is empty".to_string(),
        ));
    }
    if let Some(((f, t), a)) = amp
        .indexed_iter()
        .find(|&(_, a)| !a.is_finite() || *a < 0.0)
    {
        return Err(PhaseError::InvalidParameter(format!(
            "magnitude at bin {}, frame {} must be finite and non-negative, got {}",
            f, t, a
        )));
    }
    Ok(())
}

/// Mean absolute magnitude error `mean(| |z| - amp |)`.
///
/// # Returns
/// The error, or `ShapeMismatch` when the shapes differ. An empty pair yields `0.0`.
pub fn magnitude_error(z: &Array2<Complex<f32>>, amp: &Array2<f32>) -> Result<f32, PhaseError> {
    check_shape(amp.dim(), z.dim())?;
    if amp.is_empty() {
        return Ok(0.0);
    }
    let total = Zip::from(z)
        .and(amp)
        .fold(0.0_f64, |acc, &z, &a| acc + (z.norm() - a).abs() as f64);
    Ok((total / amp.len() as f64) as f32)
}

/// Relative Frobenius distance `‖a - b‖ / ‖b‖`.
///
/// Falls back to the absolute distance `‖a - b‖` when `b` is all zeros.
pub fn relative_difference(
    a: &Array2<Complex<f32>>,
    b: &Array2<Complex<f32>>,
) -> Result<f32, PhaseError> {
    check_shape(b.dim(), a.dim())?;
    let (diff, reference) = Zip::from(a).and(b).fold((0.0_f64, 0.0_f64), |(d, r), &a, &b| {
        (d + (a - b).norm_sqr() as f64, r + b.norm_sqr() as f64)
    });
    let diff = diff.sqrt();
    let reference = reference.sqrt();
    let distance = if reference > 0.0 { diff / reference } else { diff };
    Ok(distance as f32)
}

/// Mean primal residual `mean(|x - z|)` between two spectrogram estimates.
pub(crate) fn mean_abs_difference(x: &Array2<Complex<f32>>, z: &Array2<Complex<f32>>) -> f32 {
    if x.is_empty() {
        return 0.0;
    }
    let total = Zip::from(x)
        .and(z)
        .fold(0.0_f64, |acc, &x, &z| acc + (x - z).norm() as f64);
    (total / x.len() as f64) as f32
}
