//! Error types for the captcha recognition pipeline.
//!
//! Input-validation errors are raised before any processing starts; model and
//! charset errors raised on first use recur on every subsequent call until
//! the asset is fixed. A model that declares zero outputs is deliberately not
//! represented here: the session manager reports it as an absent result, not
//! a fault, since the caller can still treat "no recognizable text" as a
//! normal outcome.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Convenient result alias for reader operations.
pub type OcrResult<T> = Result<T, OcrError>;

/// Enum representing the errors that can occur while reading a captcha.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The input image path does not exist.
    #[error("input not found: {path}")]
    InputNotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// The input file or buffer contained zero bytes.
    #[error("empty input: {context}")]
    EmptyInput {
        /// Description of the empty input (path or buffer origin).
        context: String,
    },

    /// The input bytes could not be decoded as an image.
    #[error("image decode")]
    ImageDecode(#[from] image::ImageError),

    /// The decoded image violates a preprocessing precondition.
    #[error("invalid image: {message}")]
    InvalidImage {
        /// A message describing the violated precondition.
        message: String,
    },

    /// The configured model file does not exist.
    #[error("model not found: {path}")]
    ModelNotFound {
        /// Configured model location.
        path: PathBuf,
    },

    /// The model bytes were empty or could not be loaded into a session.
    #[error("model load failed for '{path}': {context}")]
    ModelLoad {
        /// Configured model location.
        path: PathBuf,
        /// Additional context about the failure.
        context: String,
        /// The underlying ONNX Runtime error, if any.
        #[source]
        source: Option<ort::Error>,
    },

    /// The charset asset was missing, empty, or not a JSON array of strings.
    #[error("charset load failed for '{path}': {context}")]
    CharsetLoad {
        /// Configured charset location.
        path: PathBuf,
        /// Additional context about the failure.
        context: String,
        /// The underlying JSON error, if any.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Error raised by the ONNX Runtime during inference.
    #[error("inference: {context}")]
    Inference {
        /// Additional context about the failing stage.
        context: String,
        /// The underlying ONNX Runtime error.
        #[source]
        source: ort::Error,
    },

    /// The model produced an output incompatible with the expected
    /// `[sequence, 1, vocabulary]` layout.
    #[error("unexpected model output: {message}")]
    UnexpectedOutput {
        /// A message describing the mismatch.
        message: String,
    },

    /// The shared session lock was poisoned by a panicking caller.
    #[error("session lock poisoned")]
    SessionPoisoned,

    /// Error from tensor shape operations.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// The operation was aborted by the caller's cancellation token.
    #[error("operation cancelled")]
    Cancelled,

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

impl OcrError {
    /// Creates an `InputNotFound` error for the given path.
    pub fn input_not_found(path: impl AsRef<Path>) -> Self {
        Self::InputNotFound {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Creates an `EmptyInput` error with context describing the input.
    pub fn empty_input(context: impl Into<String>) -> Self {
        Self::EmptyInput {
            context: context.into(),
        }
    }

    /// Creates an `InvalidImage` error.
    pub fn invalid_image(message: impl Into<String>) -> Self {
        Self::InvalidImage {
            message: message.into(),
        }
    }

    /// Creates a `ModelNotFound` error for the given path.
    pub fn model_not_found(path: impl AsRef<Path>) -> Self {
        Self::ModelNotFound {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Creates a `ModelLoad` error with context and an optional source.
    pub fn model_load(
        path: impl AsRef<Path>,
        context: impl Into<String>,
        source: Option<ort::Error>,
    ) -> Self {
        Self::ModelLoad {
            path: path.as_ref().to_path_buf(),
            context: context.into(),
            source,
        }
    }

    /// Creates a `CharsetLoad` error with context and an optional source.
    pub fn charset_load(
        path: impl AsRef<Path>,
        context: impl Into<String>,
        source: Option<serde_json::Error>,
    ) -> Self {
        Self::CharsetLoad {
            path: path.as_ref().to_path_buf(),
            context: context.into(),
            source,
        }
    }

    /// Creates an `Inference` error wrapping an ONNX Runtime failure.
    pub fn inference(context: impl Into<String>, source: ort::Error) -> Self {
        Self::Inference {
            context: context.into(),
            source,
        }
    }

    /// Creates an `UnexpectedOutput` error.
    pub fn unexpected_output(message: impl Into<String>) -> Self {
        Self::UnexpectedOutput {
            message: message.into(),
        }
    }
}
