//! ONNX Runtime session management for the recognition model.
//!
//! The session is built once from the model bytes and reused for every
//! inference call. ONNX Runtime does not document concurrent `run` on a
//! shared session as safe, so calls are serialized behind a mutex.

use crate::core::errors::{OcrError, OcrResult};
use ndarray::{Array3, Array4, ArrayView3};
use ort::logging::LogLevel;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Default name of the model's single input slot.
pub const DEFAULT_INPUT_NAME: &str = "input1";

/// A loaded, ready-to-run instance of the pre-trained recognition model.
///
/// Owns the ONNX Runtime resources for its lifetime; dropping the session
/// releases them.
pub struct RecognitionSession {
    session: Mutex<Session>,
    input_name: String,
    model_path: PathBuf,
}

impl std::fmt::Debug for RecognitionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognitionSession")
            .field("input_name", &self.input_name)
            .field("model_path", &self.model_path)
            .finish()
    }
}

impl RecognitionSession {
    /// Builds a session from model bytes already read from `model_path`.
    ///
    /// The path is kept for diagnostics only; the caller is responsible for
    /// reading the configured location exactly once. Empty or malformed
    /// bytes fail with [`OcrError::ModelLoad`].
    pub fn from_bytes(
        model_bytes: &[u8],
        model_path: impl AsRef<Path>,
        input_name: Option<&str>,
    ) -> OcrResult<Self> {
        let path = model_path.as_ref();
        if model_bytes.is_empty() {
            return Err(OcrError::model_load(path, "model file is empty", None));
        }

        let session = Session::builder()
            .and_then(|builder| builder.with_log_level(LogLevel::Error))
            .and_then(|builder| builder.commit_from_memory(model_bytes))
            .map_err(|e| {
                OcrError::model_load(path, "failed to create ONNX session", Some(e))
            })?;

        Ok(Self {
            session: Mutex::new(session),
            input_name: input_name.unwrap_or(DEFAULT_INPUT_NAME).to_string(),
            model_path: path.to_path_buf(),
        })
    }

    /// Returns the model path this session was loaded from.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Returns the input slot name the tensor is bound to.
    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    /// Runs the model on a `[1, 1, height, width]` input tensor and returns
    /// the `[sequence, 1, vocabulary]` output.
    ///
    /// Output dimensions are read from the tensor produced by the model, not
    /// hard-coded, so vocabulary or sequence-length changes across model
    /// variants are picked up automatically. Returns `Ok(None)` when the
    /// model declares no outputs: that is a model-contract mismatch the
    /// caller can still act on, so it is reported and downgraded to an
    /// absent result rather than an error.
    pub fn run(&self, input: &Array4<f32>) -> OcrResult<Option<Array3<f32>>> {
        let input_shape = input.shape().to_vec();

        let input_tensor = TensorRef::from_array_view(input.view()).map_err(|e| {
            OcrError::inference(
                format!("failed to bind input tensor with shape {input_shape:?}"),
                e,
            )
        })?;
        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

        let mut session = self.session.lock().map_err(|_| OcrError::SessionPoisoned)?;

        let output_name = match session.outputs.first() {
            Some(output) => output.name.clone(),
            None => {
                tracing::error!(
                    "model '{}' declares no outputs",
                    self.model_path.display()
                );
                return Ok(None);
            }
        };

        let outputs = session.run(inputs).map_err(|e| {
            OcrError::inference(
                format!(
                    "forward pass failed for input '{}' with shape {:?}",
                    self.input_name, input_shape
                ),
                e,
            )
        })?;

        let (output_shape, output_data) = outputs[output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                OcrError::inference(
                    format!("failed to extract output '{output_name}' as f32"),
                    e,
                )
            })?;

        if output_shape.len() != 3 {
            return Err(OcrError::unexpected_output(format!(
                "expected a 3D [sequence, 1, vocabulary] tensor, got {}D with shape {:?}",
                output_shape.len(),
                output_shape
            )));
        }

        let sequence_len = output_shape[0] as usize;
        let batch = output_shape[1] as usize;
        let vocab_size = output_shape[2] as usize;

        tracing::debug!(
            "inference produced output '{}' with shape [{}, {}, {}]",
            output_name,
            sequence_len,
            batch,
            vocab_size
        );

        let view = ArrayView3::from_shape((sequence_len, batch, vocab_size), output_data)?;
        Ok(Some(view.to_owned()))
    }
}
