//! Pre- and post-processing around the recognition model.

pub mod decode;
pub mod normalize;

pub use decode::argmax_sequence;
pub use normalize::{CaptchaNormalizer, NormalizedImage, TARGET_HEIGHT};
