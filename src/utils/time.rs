/// Smallest frame-grid length `win_length + T * hop_length` (with integer `T >= 0`)
/// that covers `n_samples` samples.
///
/// # Arguments
/// * `n_samples` - Length of the original signal.
/// * `win_length` - Window length in samples.
/// * `hop_length` - Hop length in samples (must be non-zero).
///
/// # Examples
/// ```
/// use dasp_phase::utils::padded_length;
/// assert_eq!(padded_length(10000, 512, 256), 10240);
/// assert_eq!(padded_length(768, 512, 256), 768);
/// assert_eq!(padded_length(100, 512, 256), 512);
/// ```
pub fn padded_length(n_samples: usize, win_length: usize, hop_length: usize) -> usize {
    let hops = n_samples.saturating_sub(win_length).div_ceil(hop_length);
    win_length + hops * hop_length
}

/// Number of centered STFT frames for a signal of `n_samples` samples.
///
/// # Examples
/// ```
/// use dasp_phase::utils::frame_count;
/// assert_eq!(frame_count(10240, 256), 41);
/// ```
pub fn frame_count(n_samples: usize, hop_length: usize) -> usize {
    1 + n_samples / hop_length
}

/// Length in samples of the inverse STFT of `n_frames` centered frames.
pub fn frames_to_samples(n_frames: usize, hop_length: usize) -> usize {
    n_frames.saturating_sub(1) * hop_length
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_length_on_grid() {
        for t in 0..5 {
            let len = 512 + t * 256;
            assert_eq!(padded_length(len, 512, 256), len);
        }
        assert_eq!(padded_length(513, 512, 256), 768);
        assert_eq!(padded_length(0, 512, 256), 512);
    }

    #[test]
    fn test_frames_round_trip() {
        let len = padded_length(10000, 512, 256);
        let frames = frame_count(len, 256);
        assert_eq!(frames_to_samples(frames, 256), len);
    }
}
