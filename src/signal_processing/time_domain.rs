use crate::core::PhaseError;
use crate::utils::time::padded_length;

/// Zero-pads a signal onto the STFT frame grid.
///
/// Appends zeros so the length becomes `win_length + T * hop_length` for the smallest
/// integer `T >= 0` covering the original length. Signals already on the grid are
/// returned unchanged; signals shorter than one window are padded to `win_length`.
///
/// # Arguments
/// * `signal` - The input signal.
/// * `win_length` - Window length in samples.
/// * `hop_length` - Hop length in samples.
///
/// # Returns
/// The padded signal.
///
/// # Errors
/// * `PhaseError::InvalidParameter` - If the signal is empty or a size is zero.
///
/// # Examples
/// ```
/// use dasp_phase::signal_processing::stft_zero_pad;
/// let padded = stft_zero_pad(&[1.0; 600], 512, 256).unwrap();
/// assert_eq!(padded.len(), 768);
/// assert_eq!(padded[599], 1.0);
/// assert_eq!(padded[600], 0.0);
/// ```
pub fn stft_zero_pad(
    signal: &[f32],
    win_length: usize,
    hop_length: usize,
) -> Result<Vec<f32>, PhaseError> {
    if signal.is_empty() {
        return Err(PhaseError::InvalidParameter(
            "cannot pad an empty signal".to_string(),
        ));
    }
    if win_length == 0 || hop_length == 0 {
        return Err(PhaseError::InvalidParameter(format!(
            "win_length={} and hop_length={} must be positive",
            win_length, hop_length
        )));
    }

    let mut padded = signal.to_vec();
    padded.resize(padded_length(signal.len(), win_length, hop_length), 0.0);
    Ok(padded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stft_zero_pad_lengths() {
        assert_eq!(stft_zero_pad(&[0.5; 10000], 512, 256).unwrap().len(), 10240);
        assert_eq!(stft_zero_pad(&[0.5; 768], 512, 256).unwrap().len(), 768);
        assert_eq!(stft_zero_pad(&[0.5; 3], 512, 256).unwrap().len(), 512);
    }

    #[test]
    fn test_stft_zero_pad_keeps_samples() {
        let y: Vec<f32> = (0..700).map(|n| n as f32).collect();
        let padded = stft_zero_pad(&y, 512, 256).unwrap();
        assert_eq!(&padded[..700], &y[..]);
        assert!(padded[700..].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_stft_zero_pad_invalid() {
        assert!(matches!(
            stft_zero_pad(&[], 512, 256),
            Err(PhaseError::InvalidParameter(_))
        ));
        assert!(stft_zero_pad(&[1.0], 512, 0).is_err());
    }
}
