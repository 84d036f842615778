//! Captcha reader facade: image bytes in, recognized text out.
//!
//! Orchestrates normalization, inference, argmax decoding, and charset
//! mapping behind a single pair of read operations. The path variant is a
//! thin wrapper that loads bytes and delegates to the bytes variant, so
//! there is exactly one pipeline regardless of how the image arrives.

use crate::core::errors::{OcrError, OcrResult};
use crate::core::inference::{RecognitionSession, DEFAULT_INPUT_NAME};
use crate::processors::decode::argmax_sequence;
use crate::processors::normalize::CaptchaNormalizer;
use crate::utils::charset::Charset;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

/// Asynchronous byte access used by the reader for images and assets.
///
/// Injecting the source keeps the lazy-load and error paths testable without
/// touching the real file system.
#[async_trait]
pub trait ByteSource: Send + Sync {
    /// Whether a file exists at the given path.
    async fn exists(&self, path: &Path) -> bool;

    /// Reads the full contents of the file at the given path.
    async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;
}

/// Default byte source backed by `tokio::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsByteSource;

#[async_trait]
impl ByteSource for FsByteSource {
    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }
}

#[async_trait]
impl<T: ByteSource + ?Sized> ByteSource for Arc<T> {
    async fn exists(&self, path: &Path) -> bool {
        self.as_ref().exists(path).await
    }

    async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        self.as_ref().read(path).await
    }
}

/// Locations of the model and charset assets plus the model's input name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Path to the serialized ONNX model.
    pub model_path: PathBuf,
    /// Path to the JSON charset aligned with the model's output classes.
    pub charset_path: PathBuf,
    /// Name of the model's single input slot.
    pub input_name: String,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/common_old.onnx"),
            charset_path: PathBuf::from("models/common_old.json"),
            input_name: DEFAULT_INPUT_NAME.to_string(),
        }
    }
}

impl ReaderConfig {
    /// Creates a configuration with the default asset layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the model path.
    pub fn model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    /// Sets the charset path.
    pub fn charset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.charset_path = path.into();
        self
    }

    /// Sets the model's input slot name.
    pub fn input_name(mut self, name: impl Into<String>) -> Self {
        self.input_name = name.into();
        self
    }
}

/// Reads text from captcha images.
///
/// Both operations return `Ok(None)` when the model produced no output
/// tensor, which callers should treat as "nothing recognized" rather than a
/// failure. Cancellation is cooperative: a token cancelled before or between
/// pipeline stages aborts with [`OcrError::Cancelled`] and never yields a
/// partial string.
#[async_trait]
pub trait OcrReader: Send + Sync {
    /// Reads text from an image file.
    async fn read_text_from_path(
        &self,
        image_path: &Path,
        cancel: &CancellationToken,
    ) -> OcrResult<Option<String>>;

    /// Reads text from raw image bytes.
    async fn read_text(
        &self,
        image_bytes: &[u8],
        cancel: &CancellationToken,
    ) -> OcrResult<Option<String>>;
}

/// Default [`OcrReader`] over a pre-trained ddddocr-style ONNX model.
///
/// The session and charset are loaded lazily on first use and cached for the
/// lifetime of the reader; concurrent first calls are collapsed into a
/// single load by the `OnceCell` guards. A failed load is reported to the
/// caller and will recur on every call until the asset is fixed; nothing is
/// retried automatically. Dropping the reader releases the ONNX Runtime
/// resources.
pub struct CaptchaReader<S: ByteSource = FsByteSource> {
    config: ReaderConfig,
    source: S,
    normalizer: CaptchaNormalizer,
    session: OnceCell<RecognitionSession>,
    charset: OnceCell<Charset>,
}

impl CaptchaReader<FsByteSource> {
    /// Creates a reader over the real file system.
    pub fn new(config: ReaderConfig) -> Self {
        Self::with_source(config, FsByteSource)
    }
}

impl<S: ByteSource> CaptchaReader<S> {
    /// Creates a reader with an injected byte source.
    pub fn with_source(config: ReaderConfig, source: S) -> Self {
        Self {
            config,
            source,
            normalizer: CaptchaNormalizer::new(),
            session: OnceCell::new(),
            charset: OnceCell::new(),
        }
    }

    /// Returns the reader's configuration.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Returns the cached session, loading the model exactly once.
    async fn session(&self) -> OcrResult<&RecognitionSession> {
        self.session
            .get_or_try_init(|| async {
                let path = self.config.model_path.as_path();
                if !self.source.exists(path).await {
                    return Err(OcrError::model_not_found(path));
                }

                let bytes = self.source.read(path).await?;
                tracing::debug!(
                    "loaded {} model bytes from '{}'",
                    bytes.len(),
                    path.display()
                );
                RecognitionSession::from_bytes(&bytes, path, Some(self.config.input_name.as_str()))
            })
            .await
    }

    /// Returns the cached charset, loading the asset exactly once.
    async fn charset(&self) -> OcrResult<&Charset> {
        self.charset
            .get_or_try_init(|| async {
                let path = self.config.charset_path.as_path();
                if !self.source.exists(path).await {
                    return Err(OcrError::charset_load(path, "charset file not found", None));
                }

                let bytes = self.source.read(path).await?;
                Charset::from_json_bytes(&bytes, path)
            })
            .await
    }
}

impl<S: ByteSource> std::fmt::Debug for CaptchaReader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptchaReader")
            .field("config", &self.config)
            .field("session_loaded", &self.session.initialized())
            .field("charset_loaded", &self.charset.initialized())
            .finish()
    }
}

#[async_trait]
impl<S: ByteSource> OcrReader for CaptchaReader<S> {
    async fn read_text_from_path(
        &self,
        image_path: &Path,
        cancel: &CancellationToken,
    ) -> OcrResult<Option<String>> {
        if cancel.is_cancelled() {
            return Err(OcrError::Cancelled);
        }

        if !self.source.exists(image_path).await {
            return Err(OcrError::input_not_found(image_path));
        }

        let buffer = self.source.read(image_path).await?;
        if buffer.is_empty() {
            return Err(OcrError::empty_input(image_path.display().to_string()));
        }

        self.read_text(&buffer, cancel).await
    }

    async fn read_text(
        &self,
        image_bytes: &[u8],
        cancel: &CancellationToken,
    ) -> OcrResult<Option<String>> {
        if cancel.is_cancelled() {
            return Err(OcrError::Cancelled);
        }

        let normalized = self.normalizer.normalize(image_bytes)?;
        let input = normalized.into_tensor()?;

        let session = self.session().await?;
        if cancel.is_cancelled() {
            return Err(OcrError::Cancelled);
        }

        // Cancellation is cooperative: an in-flight forward pass is not
        // preempted, but its result is discarded at the next check.
        let output = session.run(&input)?;
        if cancel.is_cancelled() {
            return Err(OcrError::Cancelled);
        }

        let Some(output) = output else {
            return Ok(None);
        };

        let ids = argmax_sequence(&output);
        let charset = self.charset().await?;
        let text = charset.decode(&ids);

        tracing::debug!(
            "decoded {} class ids into {} symbols",
            ids.len(),
            text.chars().count()
        );
        Ok(Some(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory byte source that counts reads across all paths.
    struct MemorySource {
        files: HashMap<PathBuf, Vec<u8>>,
        reads: AtomicUsize,
    }

    impl MemorySource {
        fn new(files: HashMap<PathBuf, Vec<u8>>) -> Self {
            Self {
                files,
                reads: AtomicUsize::new(0),
            }
        }

        fn empty() -> Self {
            Self::new(HashMap::new())
        }
    }

    #[async_trait]
    impl ByteSource for MemorySource {
        async fn exists(&self, path: &Path) -> bool {
            self.files.contains_key(path)
        }

        async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.files.get(path).cloned().ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file")
            })
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([128, 128, 128]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .unwrap();
        bytes
    }

    #[tokio::test]
    async fn missing_image_path_fails_with_input_not_found() {
        let reader = CaptchaReader::with_source(ReaderConfig::default(), MemorySource::empty());
        let result = reader
            .read_text_from_path(Path::new("captchas/missing.jpg"), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(OcrError::InputNotFound { .. })));
    }

    #[tokio::test]
    async fn zero_byte_image_file_fails_with_empty_input() {
        let image_path = PathBuf::from("captchas/empty.jpg");
        let files = HashMap::from([(image_path.clone(), Vec::new())]);
        let reader = CaptchaReader::with_source(ReaderConfig::default(), MemorySource::new(files));

        let result = reader
            .read_text_from_path(&image_path, &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(OcrError::EmptyInput { .. })));
    }

    #[tokio::test]
    async fn cancelled_token_aborts_before_any_processing() {
        let source = Arc::new(MemorySource::empty());
        let reader =
            CaptchaReader::with_source(ReaderConfig::default(), Arc::clone(&source));

        let cancel = CancellationToken::new();
        cancel.cancel();

        let by_path = reader
            .read_text_from_path(Path::new("captchas/any.jpg"), &cancel)
            .await;
        let by_bytes = reader.read_text(&png_bytes(32, 32), &cancel).await;

        assert!(matches!(by_path, Err(OcrError::Cancelled)));
        assert!(matches!(by_bytes, Err(OcrError::Cancelled)));
        assert_eq!(source.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn undecodable_bytes_fail_before_model_load() {
        let source = Arc::new(MemorySource::empty());
        let reader =
            CaptchaReader::with_source(ReaderConfig::default(), Arc::clone(&source));

        let result = reader
            .read_text(b"not an image", &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(OcrError::ImageDecode(_))));
        assert_eq!(source.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_model_fails_with_model_not_found() {
        let reader = CaptchaReader::with_source(ReaderConfig::default(), MemorySource::empty());

        let result = reader
            .read_text(&png_bytes(64, 32), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(OcrError::ModelNotFound { .. })));
    }

    #[tokio::test]
    async fn empty_model_file_fails_with_model_load() {
        let config = ReaderConfig::default();
        let files = HashMap::from([(config.model_path.clone(), Vec::new())]);
        let reader = CaptchaReader::with_source(config, MemorySource::new(files));

        let result = reader
            .read_text(&png_bytes(64, 32), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(OcrError::ModelLoad { .. })));
    }

    #[tokio::test]
    async fn concurrent_first_use_loads_charset_exactly_once() {
        let config = ReaderConfig::default();
        let files = HashMap::from([(
            config.charset_path.clone(),
            br#"["<blank>", "a", "b"]"#.to_vec(),
        )]);
        let source = Arc::new(MemorySource::new(files));
        let reader = Arc::new(CaptchaReader::with_source(config, Arc::clone(&source)));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let reader = Arc::clone(&reader);
            handles.push(tokio::spawn(
                async move { reader.charset().await.map(Charset::len) },
            ));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 3);
        }

        assert_eq!(source.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_charset_load_is_reported_on_every_call() {
        let config = ReaderConfig::default();
        let files = HashMap::from([(config.charset_path.clone(), b"not json".to_vec())]);
        let reader = CaptchaReader::with_source(config, MemorySource::new(files));

        for _ in 0..2 {
            assert!(matches!(
                reader.charset().await,
                Err(OcrError::CharsetLoad { .. })
            ));
        }
    }
}
