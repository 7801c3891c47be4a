use ndarray::Array1;

/// Generates a pure tone (cosine wave) at a specified frequency.
///
/// # Arguments
/// * `frequency` - Frequency of the tone in Hz
/// * `sr` - Optional sample rate in Hz (defaults to 16000 Hz)
/// * `length` - Optional length in samples (overrides duration if provided)
/// * `duration` - Optional duration in seconds (defaults to 1.0 if length not provided)
/// * `phi` - Optional initial phase in radians (defaults to 0.0)
///
/// # Returns
/// Returns a `Vec<f32>` containing the generated wave.
///
/// # Examples
/// ```
/// let y = dasp_phase::tone(440.0, None, Some(10000), None, None);
/// assert_eq!(y.len(), 10000);
/// assert_eq!(y[0], 1.0);
/// ```
pub fn tone(
    frequency: f32,
    sr: Option<u32>,
    length: Option<usize>,
    duration: Option<f32>,
    phi: Option<f32>,
) -> Vec<f32> {
    let sample_rate = sr.unwrap_or(16000);
    let len = length.unwrap_or_else(|| (duration.unwrap_or(1.0) * sample_rate as f32) as usize);
    let phase = phi.unwrap_or(0.0);
    (0..len)
        .map(|n| {
            (2.0 * std::f32::consts::PI * frequency * n as f32 / sample_rate as f32 + phase).cos()
        })
        .collect()
}

/// Generates a linear chirp sweeping from `fmin` to `fmax` over the signal.
///
/// # Arguments
/// * `fmin` - Starting frequency in Hz
/// * `fmax` - Ending frequency in Hz
/// * `sr` - Optional sample rate in Hz (defaults to 16000 Hz)
/// * `length` - Optional length in samples (overrides duration if provided)
/// * `duration` - Optional duration in seconds (defaults to 1.0 if length not provided)
///
/// # Returns
/// Returns a `Vec<f32>` containing the chirp signal.
pub fn chirp(
    fmin: f32,
    fmax: f32,
    sr: Option<u32>,
    length: Option<usize>,
    duration: Option<f32>,
) -> Vec<f32> {
    let sample_rate = sr.unwrap_or(16000);
    let len = length.unwrap_or_else(|| (duration.unwrap_or(1.0) * sample_rate as f32) as usize);
    let total = len as f32 / sample_rate as f32;
    let t = Array1::linspace(0.0, total, len);
    let sweep = (fmax - fmin) / total.max(f32::EPSILON);
    t.iter()
        .map(|&t| (2.0 * std::f32::consts::PI * (fmin * t + 0.5 * sweep * t * t)).cos())
        .collect()
}
