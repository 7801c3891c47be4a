use approx::assert_abs_diff_eq;
use dasp_phase::{
    PhaseError, Stft, StftConfig, Transform, mysign, random_phase_init, range_project,
    relative_difference, stft_zero_pad, tone,
};
use ndarray::Array2;
use num_complex::Complex;

#[test]
fn test_mysign_zero_entries() {
    let w = Array2::<Complex<f32>>::zeros((3, 4));
    let s = mysign(&w);
    assert!(s.iter().all(|&c| c == Complex::new(1.0, 0.0)));
}

#[test]
fn test_mysign_unit_magnitude() {
    let amp = Array2::<f32>::from_elem((5, 6), 2.5);
    let z = random_phase_init(&amp, 11).unwrap();
    for c in mysign(&z).iter() {
        assert_abs_diff_eq!(c.norm(), 1.0, epsilon = 1e-6);
    }
}

#[test]
fn test_stft_istft_round_trip() {
    let stft = Stft::new(StftConfig::default()).unwrap();
    let y = tone(440.0, Some(16000), Some(5000), None, None);
    let padded = stft_zero_pad(&y, 512, 256).unwrap();
    let spec = stft.forward(&padded).unwrap();
    let recovered = stft.inverse(&spec).unwrap();
    assert_eq!(recovered.len(), padded.len());
    for (a, b) in padded.iter().zip(recovered.iter()) {
        assert_abs_diff_eq!(a, b, epsilon = 1e-4);
    }
}

#[test]
fn test_range_projection_idempotent() {
    let stft = Stft::new(StftConfig::default()).unwrap();
    let amp = Array2::<f32>::ones((257, 13));
    let w0 = random_phase_init(&amp, 5).unwrap();

    let w = range_project(&w0, &stft).unwrap();
    assert!(relative_difference(&w, &w0).unwrap() > 0.1);

    let again = range_project(&w, &stft).unwrap();
    assert_eq!(again.dim(), w.dim());
    assert!(relative_difference(&again, &w).unwrap() < 1e-4);
}

#[test]
fn test_range_projection_shape_for_padded_lengths() {
    let stft = Stft::new(StftConfig::default()).unwrap();
    for len in [1, 511, 512, 513, 1000, 10000] {
        let y = tone(300.0, Some(16000), Some(len), None, None);
        let padded = stft_zero_pad(&y, 512, 256).unwrap();
        let spec = stft.forward(&padded).unwrap();
        let projected = range_project(&spec, &stft).unwrap();
        assert_eq!(projected.dim(), spec.dim());
    }
}

struct ShrinkingTransform {
    inner: Stft,
}

impl Transform for ShrinkingTransform {
    fn forward(&self, signal: &[f32]) -> Result<Array2<Complex<f32>>, PhaseError> {
        self.inner.forward(&signal[..signal.len() - 256])
    }

    fn inverse(&self, spectrogram: &Array2<Complex<f32>>) -> Result<Vec<f32>, PhaseError> {
        self.inner.inverse(spectrogram)
    }
}

#[test]
fn test_range_projection_detects_shape_change() {
    let transform = ShrinkingTransform {
        inner: Stft::new(StftConfig::default()).unwrap(),
    };
    let w = Array2::<Complex<f32>>::from_elem((257, 9), Complex::new(1.0, 0.0));
    assert!(matches!(
        range_project(&w, &transform),
        Err(PhaseError::ShapeMismatch { .. })
    ));
}
