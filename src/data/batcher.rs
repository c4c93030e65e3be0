// ============================================================
// Layer 4 — Sequence Batcher
// ============================================================
// Turns equal-length rows of token indices into an Int tensor
// of shape [batch_size, seq_len].
//
//   [[2, 4, 3, 0], [2, 5, 6, 3]] → flatten → from_ints → reshape
//
// Burn Int tensors are built from i32 here; indices never come
// close to i32::MAX because they are bounded by vocab_size.

use burn::prelude::*;

#[derive(Clone, Debug)]
pub struct SequenceBatcher<B: Backend> {
    device: B::Device,
}

impl<B: Backend> SequenceBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Stack `rows` into a [rows, width] tensor.
    ///
    /// Every row must have the same length.
    pub fn batch(&self, rows: &[Vec<usize>]) -> Tensor<B, 2, Int> {
        let batch_size = rows.len();
        let seq_len    = rows.first().map_or(0, Vec::len);
        debug_assert!(rows.iter().all(|r| r.len() == seq_len), "ragged batch");

        let flat: Vec<i32> = rows
            .iter()
            .flat_map(|r| r.iter().map(|&t| t as i32))
            .collect();

        Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len])
    }

    /// A [1, 1] tensor holding a single token.
    pub fn single(&self, token: usize) -> Tensor<B, 2, Int> {
        Tensor::<B, 1, Int>::from_ints([token as i32], &self.device).reshape([1, 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_batch_shape_and_values() {
        let batcher = SequenceBatcher::<NdArray>::new(Default::default());
        let t = batcher.batch(&[vec![2, 4, 3, 0], vec![2, 5, 6, 3]]);
        assert_eq!(t.dims(), [2, 4]);
        let values: Vec<i64> = t.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(values, vec![2, 4, 3, 0, 2, 5, 6, 3]);
    }

    #[test]
    fn test_single_token() {
        let batcher = SequenceBatcher::<NdArray>::new(Default::default());
        assert_eq!(batcher.single(7).dims(), [1, 1]);
    }
}
