//! # captcha-reader
//!
//! A captcha OCR library built on ONNX Runtime. The model itself is an
//! opaque predictor; this crate provides the deterministic, bit-exact
//! pipeline around it:
//!
//! - **Normalization**: image bytes are resized to a fixed height of 64
//!   (width follows the aspect ratio), grayscaled, and scaled into a flat
//!   `[-1, 1]` float buffer shaped `[1, 1, height, width]`.
//! - **Inference**: the tensor is bound to the model's single input slot and
//!   run through a lazily loaded, cached session.
//! - **Decoding**: the `[sequence, 1, vocabulary]` output is reduced by
//!   per-position argmax and mapped through a fixed JSON charset, with the
//!   blank class (id 0) filtered out.
//!
//! Both read operations are async and cancellable, and a single reader
//! instance can serve concurrent calls: the model and charset are each
//! loaded exactly once even when first use races.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use captcha_reader::prelude::*;
//! use std::path::Path;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), OcrError> {
//! let reader = CaptchaReader::new(ReaderConfig::default());
//! let cancel = CancellationToken::new();
//!
//! if let Some(text) = reader
//!     .read_text_from_path(Path::new("captcha.jpg"), &cancel)
//!     .await?
//! {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! * [`core`] - Error taxonomy and the ONNX session manager
//! * [`processors`] - Image normalization and argmax decoding
//! * [`reader`] - The `OcrReader` facade and its configuration
//! * [`utils`] - The charset registry

pub mod core;
pub mod processors;
pub mod reader;
pub mod utils;

/// Commonly used types for working with the reader.
pub mod prelude {
    pub use crate::core::{OcrError, OcrResult, RecognitionSession};
    pub use crate::processors::{argmax_sequence, CaptchaNormalizer, NormalizedImage};
    pub use crate::reader::{ByteSource, CaptchaReader, FsByteSource, OcrReader, ReaderConfig};
    pub use crate::utils::Charset;
    pub use tokio_util::sync::CancellationToken;
}
