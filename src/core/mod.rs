//! Core error handling and inference session management.

pub mod errors;
pub mod inference;

pub use errors::{OcrError, OcrResult};
pub use inference::{RecognitionSession, DEFAULT_INPUT_NAME};
