//! Greedy decoding of recognition model outputs.
//!
//! The model emits one row of class scores per sequence position; decoding
//! selects the per-position argmax. Mapping the resulting class ids to text
//! is handled by [`crate::utils::charset::Charset`].

use ndarray::Array3;

/// Per-position argmax over the class axis at batch index 0.
///
/// Dimensions are read from the tensor's own shape, never hard-coded, so the
/// decoder stays correct across model variants with different sequence
/// lengths or vocabularies. Ties resolve to the lowest class id (strict `>`
/// comparison). The result always has one entry per sequence position.
pub fn argmax_sequence(pred: &Array3<f32>) -> Vec<usize> {
    let sequence_len = pred.shape()[0];
    let vocab_size = pred.shape()[2];

    let mut ids = Vec::with_capacity(sequence_len);
    for i in 0..sequence_len {
        let mut max_index = 0;
        let mut max_value = f32::NEG_INFINITY;
        for j in 0..vocab_size {
            let value = pred[[i, 0, j]];
            if value > max_value {
                max_value = value;
                max_index = j;
            }
        }
        ids.push(max_index);
    }

    tracing::debug!(
        "argmax over {} positions with {} classes",
        sequence_len,
        vocab_size
    );
    ids
}
