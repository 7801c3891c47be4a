use crate::core::{PhaseError, check_shape, phase_factor};
use log::warn;
use ndarray::{Array2, Axis};
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Forward/inverse short-time Fourier transform pair used by the phase recovery engines.
///
/// Implementations must be linear and must reproduce a spectrogram's shape on a
/// round trip: for any signal length on the frame grid (see
/// [`stft_zero_pad`](crate::signal_processing::stft_zero_pad)), `forward(inverse(w))`
/// has the same shape as `w`.
pub trait Transform {
    /// Computes the complex spectrogram (shape: `[n_freqs, n_frames]`) of a real signal.
    fn forward(&self, signal: &[f32]) -> Result<Array2<Complex<f32>>, PhaseError>;

    /// Synthesizes a real signal from a complex spectrogram.
    fn inverse(&self, spectrogram: &Array2<Complex<f32>>) -> Result<Vec<f32>, PhaseError>;
}

/// Frame configuration of an [`Stft`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StftConfig {
    /// Window length in samples.
    pub win_length: usize,
    /// Hop length between consecutive frames in samples.
    pub hop_length: usize,
    /// FFT size; the spectrogram has `n_fft / 2 + 1` frequency bins.
    pub n_fft: usize,
}

impl Default for StftConfig {
    /// 512-sample window, 256-sample hop, 512-point FFT.
    fn default() -> Self {
        Self {
            win_length: 512,
            hop_length: 256,
            n_fft: 512,
        }
    }
}

impl StftConfig {
    pub fn new(win_length: usize, hop_length: usize) -> Self {
        Self {
            win_length,
            hop_length,
            n_fft: win_length,
        }
    }

    pub fn n_fft(mut self, n_fft: usize) -> Self {
        self.n_fft = n_fft;
        self
    }

    /// Number of one-sided frequency bins.
    pub fn n_freqs(&self) -> usize {
        self.n_fft / 2 + 1
    }

    fn validate(&self) -> Result<(), PhaseError> {
        if self.win_length == 0 || self.hop_length == 0 || self.n_fft == 0 {
            return Err(PhaseError::InvalidParameter(format!(
                "STFT sizes must be positive: win_length={}, hop_length={}, n_fft={}",
                self.win_length, self.hop_length, self.n_fft
            )));
        }
        if self.win_length > self.n_fft {
            return Err(PhaseError::InvalidParameter(format!(
                "win_length={} must not exceed n_fft={}",
                self.win_length, self.n_fft
            )));
        }
        if self.hop_length > self.win_length {
            return Err(PhaseError::InvalidParameter(format!(
                "hop_length={} must not exceed win_length={}",
                self.hop_length, self.win_length
            )));
        }
        Ok(())
    }
}

/// Centered STFT with a periodic Hann window, backed by `rustfft`.
///
/// Forward frames are centered: the signal is reflect-padded by `n_fft / 2` samples
/// on both ends, giving `1 + len / hop_length` frames. The inverse is a windowed
/// overlap-add normalized by the summed squared window, trimmed back by `n_fft / 2`
/// on both ends, giving `hop_length * (n_frames - 1)` samples.
///
/// FFT plans and the window are computed once, so one `Stft` can serve any number
/// of runs.
pub struct Stft {
    config: StftConfig,
    window: Vec<f32>,
    forward_plan: Arc<dyn Fft<f32>>,
    inverse_plan: Arc<dyn Fft<f32>>,
}

impl Stft {
    /// Builds the transform pair for `config`.
    ///
    /// # Errors
    /// `InvalidParameter` when a size is zero, `win_length > n_fft` or `hop_length > win_length`.
    pub fn new(config: StftConfig) -> Result<Self, PhaseError> {
        config.validate()?;
        let mut planner = FftPlanner::new();
        Ok(Self {
            window: padded_window(config.win_length, config.n_fft),
            forward_plan: planner.plan_fft_forward(config.n_fft),
            inverse_plan: planner.plan_fft_inverse(config.n_fft),
            config,
        })
    }

    pub fn config(&self) -> StftConfig {
        self.config
    }

    pub fn window(&self) -> &[f32] {
        &self.window
    }
}

impl Transform for Stft {
    fn forward(&self, signal: &[f32]) -> Result<Array2<Complex<f32>>, PhaseError> {
        let n_fft = self.config.n_fft;
        let hop = self.config.hop_length;
        let pad = n_fft / 2;
        if signal.len() <= pad {
            return Err(PhaseError::Transform(format!(
                "signal of length {} is too short for centered framing with n_fft={}",
                signal.len(),
                n_fft
            )));
        }

        let padded = reflect_pad(signal, pad);
        let n_frames = 1 + (padded.len() - n_fft) / hop;
        let mut spectrogram = Array2::zeros((self.config.n_freqs(), n_frames));
        let mut buffer = vec![Complex::new(0.0, 0.0); n_fft];

        for (frame_idx, mut column) in spectrogram.axis_iter_mut(Axis(1)).enumerate() {
            let start = frame_idx * hop;
            for ((b, &sample), &w) in buffer
                .iter_mut()
                .zip(padded[start..start + n_fft].iter())
                .zip(self.window.iter())
            {
                *b = Complex::new(sample * w, 0.0);
            }
            self.forward_plan.process(&mut buffer);
            for (bin, &value) in column.iter_mut().zip(buffer.iter()) {
                *bin = value;
            }
        }

        Ok(spectrogram)
    }

    fn inverse(&self, spectrogram: &Array2<Complex<f32>>) -> Result<Vec<f32>, PhaseError> {
        let n_fft = self.config.n_fft;
        let hop = self.config.hop_length;
        let (n_freqs, n_frames) = spectrogram.dim();
        if n_freqs != self.config.n_freqs() {
            return Err(PhaseError::Transform(format!(
                "spectrogram has {} frequency bins, n_fft={} requires {}",
                n_freqs,
                n_fft,
                self.config.n_freqs()
            )));
        }
        if n_frames == 0 {
            return Err(PhaseError::Transform(
                "spectrogram has no frames".to_string(),
            ));
        }

        let full_len = n_fft + hop * (n_frames - 1);
        let mut signal = vec![0.0_f32; full_len];
        let mut window_sum = vec![0.0_f32; full_len];
        let mut buffer = vec![Complex::new(0.0, 0.0); n_fft];
        let scale = 1.0 / n_fft as f32;

        for (frame_idx, column) in spectrogram.axis_iter(Axis(1)).enumerate() {
            // Rebuild the Hermitian spectrum so the inverse FFT is real.
            buffer[0] = Complex::new(column[0].re, 0.0);
            for k in 1..n_freqs {
                if 2 * k == n_fft {
                    buffer[k] = Complex::new(column[k].re, 0.0);
                } else {
                    buffer[k] = column[k];
                    buffer[n_fft - k] = column[k].conj();
                }
            }
            self.inverse_plan.process(&mut buffer);

            let start = frame_idx * hop;
            for (i, (value, &w)) in buffer.iter().zip(self.window.iter()).enumerate() {
                signal[start + i] += value.re * scale * w;
                window_sum[start + i] += w * w;
            }
        }

        let pad = n_fft / 2;
        let mut nola_violated = false;
        for (i, (sample, &sum)) in signal.iter_mut().zip(window_sum.iter()).enumerate() {
            if sum > f32::MIN_POSITIVE {
                *sample /= sum;
            } else if i >= pad && i < full_len - pad {
                nola_violated = true;
            }
        }
        if nola_violated {
            warn!("NOLA condition failed, STFT may not be invertible");
        }

        Ok(signal[pad..full_len - pad].to_vec())
    }
}

/// Projects a complex spectrogram onto the range of the STFT operator.
///
/// Computes `forward(inverse(w))`: the spectrogram of the real signal that best
/// matches `w`. Values of an inconsistent spectrogram change on the round trip;
/// a spectrogram that already is an STFT is reproduced up to rounding.
///
/// # Arguments
/// * `w` - Complex spectrogram (shape: `[n_freqs, n_frames]`).
/// * `transform` - The forward/inverse transform pair.
///
/// # Returns
/// The range-consistent spectrogram of the same shape, or the transform's error.
/// `ShapeMismatch` if the round trip does not reproduce `w`'s shape.
pub fn range_project<T: Transform + ?Sized>(
    w: &Array2<Complex<f32>>,
    transform: &T,
) -> Result<Array2<Complex<f32>>, PhaseError> {
    let signal = transform.inverse(w)?;
    let projected = transform.forward(&signal)?;
    check_shape(w.dim(), projected.dim())?;
    Ok(projected)
}

/// Magnitude spectrogram `|S|` of a real signal.
///
/// # Examples
/// ```
/// use dasp_phase::{Stft, StftConfig, magnitude_spectrogram};
/// let stft = Stft::new(StftConfig::new(64, 32)).unwrap();
/// let amp = magnitude_spectrogram(&vec![0.5_f32; 256], &stft).unwrap();
/// assert_eq!(amp.dim(), (33, 9));
/// ```
pub fn magnitude_spectrogram<T: Transform + ?Sized>(
    signal: &[f32],
    transform: &T,
) -> Result<Array2<f32>, PhaseError> {
    Ok(transform.forward(signal)?.mapv(|c| c.norm()))
}

/// Computes the short-time Fourier transform of `y` with a one-off [`Stft`].
///
/// # Arguments
/// * `y` - Input signal.
/// * `n_fft` - FFT size (defaults to 512).
/// * `hop_length` - Hop length (defaults to `win_length / 2`).
/// * `win_length` - Window length (defaults to `n_fft`).
pub fn stft(
    y: &[f32],
    n_fft: Option<usize>,
    hop_length: Option<usize>,
    win_length: Option<usize>,
) -> Result<Array2<Complex<f32>>, PhaseError> {
    let n = n_fft.unwrap_or(512);
    let win = win_length.unwrap_or(n);
    let hop = hop_length.unwrap_or(win / 2);
    Stft::new(StftConfig::new(win, hop).n_fft(n))?.forward(y)
}

/// Inverse of [`stft`]; the FFT size is inferred from the bin count.
pub fn istft(
    stft_matrix: &Array2<Complex<f32>>,
    hop_length: Option<usize>,
    win_length: Option<usize>,
) -> Result<Vec<f32>, PhaseError> {
    let n_fft = stft_matrix.shape()[0].saturating_sub(1) * 2;
    let win = win_length.unwrap_or(n_fft);
    let hop = hop_length.unwrap_or(win / 2);
    Stft::new(StftConfig::new(win, hop).n_fft(n_fft))?.inverse(stft_matrix)
}

/// Splits a complex spectrogram into magnitude and unit phase factor.
///
/// Zero entries get the phase factor `1 + 0i`, so `magnitude * phase` reproduces the input exactly.
pub fn magphase(d: &Array2<Complex<f32>>, power: Option<f32>) -> (Array2<f32>, Array2<Complex<f32>>) {
    let power_val = power.unwrap_or(1.0);
    let magnitude = d.mapv(|x| x.norm().powf(power_val));
    let phase = d.mapv(phase_factor);
    (magnitude, phase)
}

/// Periodic Hann window of length `n`.
pub fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / n as f32).cos())
        .collect()
}

fn padded_window(win_length: usize, n_fft: usize) -> Vec<f32> {
    let mut window = vec![0.0; n_fft];
    let offset = (n_fft - win_length) / 2;
    window[offset..offset + win_length].copy_from_slice(&hann_window(win_length));
    window
}

/// Mirror padding without repeating the edge sample; requires `pad < y.len()`.
fn reflect_pad(y: &[f32], pad: usize) -> Vec<f32> {
    let n = y.len();
    let mut padded = Vec::with_capacity(n + 2 * pad);
    padded.extend((1..=pad).rev().map(|i| y[i]));
    padded.extend_from_slice(y);
    padded.extend((1..=pad).map(|i| y[n - 1 - i]));
    padded
}
