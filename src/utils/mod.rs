pub mod time;

pub use time::{frame_count, frames_to_samples, padded_length};
