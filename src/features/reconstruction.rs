use crate::core::PhaseError;
use crate::features::phase_recovery::{
    AdmmParams, GlaParams, run_admm_with_params, run_gla_with_params, validate_rho,
};
use crate::signal_generation::{DEFAULT_SEED, random_phase_init, zero_dual};
use crate::signal_processing::{Stft, StftConfig, Transform, magnitude_spectrogram, stft_zero_pad};
use log::debug;

/// Settings of an end-to-end reconstruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconstructionConfig {
    pub stft: StftConfig,
    /// Iterations of each engine.
    pub max_iter: usize,
    /// ADMM penalty parameter.
    pub rho: f32,
    /// Seed of the random initial phase.
    pub seed: u64,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            stft: StftConfig::default(),
            max_iter: 10,
            rho: 0.1,
            seed: DEFAULT_SEED,
        }
    }
}

impl ReconstructionConfig {
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn rho(mut self, rho: f32) -> Self {
        self.rho = rho;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn stft(mut self, stft: StftConfig) -> Self {
        self.stft = stft;
        self
    }
}

/// Signals produced by [`reconstruct`], each of length `padded_len`.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    /// Length of the input signal before zero-padding.
    pub original_len: usize,
    /// Length after padding onto the frame grid.
    pub padded_len: usize,
    /// Signal synthesized from the random-phase initialization alone.
    pub random_phase: Vec<f32>,
    /// Griffin-Lim reconstruction.
    pub gla: Vec<f32>,
    /// ADMM-GLA reconstruction.
    pub admm: Vec<f32>,
}

/// Discards the phase of `signal` and recovers it with both GLA and ADMM-GLA.
///
/// The signal is zero-padded onto the frame grid, its magnitude spectrogram is taken,
/// and both engines start from the same seeded random-phase spectrogram (with an
/// all-zero dual variable for ADMM-GLA).
///
/// # Examples
/// ```
/// use dasp_phase::{ReconstructionConfig, StftConfig, reconstruct, tone};
/// let y = tone(440.0, Some(8000), Some(1000), None, None);
/// let config = ReconstructionConfig::default().stft(StftConfig::new(128, 64)).max_iter(3);
/// let out = reconstruct(&y, &config).unwrap();
/// assert_eq!(out.padded_len, 1024);
/// assert_eq!(out.gla.len(), out.padded_len);
/// ```
pub fn reconstruct(signal: &[f32], config: &ReconstructionConfig) -> Result<Reconstruction, PhaseError> {
    let transform = Stft::new(config.stft)?;
    reconstruct_with(signal, config, &transform)
}

/// Same as [`reconstruct`] with a caller-supplied transform.
///
/// The transform must frame signals the way `config.stft` describes, since the
/// padding is computed from `config.stft`.
pub fn reconstruct_with<T: Transform + ?Sized>(
    signal: &[f32],
    config: &ReconstructionConfig,
    transform: &T,
) -> Result<Reconstruction, PhaseError> {
    validate_rho(config.rho)?;
    let padded = stft_zero_pad(signal, config.stft.win_length, config.stft.hop_length)?;
    debug!(
        "reconstructing {} samples (padded to {}), seed={}",
        signal.len(),
        padded.len(),
        config.seed
    );

    let amp = magnitude_spectrogram(&padded, transform)?;
    let z0 = random_phase_init(&amp, config.seed)?;
    let u0 = zero_dual(&amp);

    let gla_params = GlaParams::default().max_iter(config.max_iter);
    let x_gla = run_gla_with_params(&z0, &amp, gla_params, transform)?.estimate;

    let admm_params = AdmmParams::default().max_iter(config.max_iter).rho(config.rho);
    let x_admm = run_admm_with_params(&z0, &u0, &amp, admm_params, transform)?.estimate;

    Ok(Reconstruction {
        original_len: signal.len(),
        padded_len: padded.len(),
        random_phase: transform.inverse(&z0)?,
        gla: transform.inverse(&x_gla)?,
        admm: transform.inverse(&x_admm)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal_generation::chirp;

    #[test]
    fn test_reconstruct_lengths() {
        let y = chirp(300.0, 3000.0, Some(16000), Some(2000), None);
        let config = ReconstructionConfig::default()
            .stft(StftConfig::new(256, 128))
            .max_iter(4);
        let out = reconstruct(&y, &config).unwrap();
        assert_eq!(out.original_len, 2000);
        assert_eq!(out.padded_len, 2048);
        for signal in [&out.random_phase, &out.gla, &out.admm] {
            assert_eq!(signal.len(), out.padded_len);
            assert!(signal.iter().all(|s| s.is_finite()));
        }
    }

    #[test]
    fn test_reconstruct_rejects_bad_rho() {
        let y = chirp(300.0, 3000.0, Some(16000), Some(2000), None);
        let config = ReconstructionConfig::default().rho(0.0);
        assert!(matches!(
            reconstruct(&y, &config),
            Err(PhaseError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_reconstruct_rejects_empty() {
        assert!(reconstruct(&[], &ReconstructionConfig::default()).is_err());
    }
}
