pub mod spectral;
pub mod time_domain;

pub use spectral::{
    Stft, StftConfig, Transform, hann_window, istft, magnitude_spectrogram, magphase,
    range_project, stft,
};
pub use time_domain::stft_zero_pad;
