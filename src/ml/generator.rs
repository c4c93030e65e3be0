// ============================================================
// Layer 5 — Generator Network
// ============================================================
//   token [b, 1] ─▶ Embedding ─▶ LstmStack ─▶ Linear ─▶ logits [b, V]
//
// The network emits raw next-token logits; log-probabilities,
// temperature and sampling are applied by the caller.
//
// `step_soft` takes a probability distribution over the
// vocabulary instead of a token index. Its embedding is the
// distribution-weighted sum of embedding rows, which keeps a
// relaxed sample differentiable end to end.

use burn::{
    nn::{Embedding, EmbeddingConfig, Linear, LinearConfig},
    prelude::*,
};

use crate::ml::config::GanConfig;
use crate::ml::recurrent::{LstmStack, StackState};

#[derive(Module, Debug)]
pub struct Generator<B: Backend> {
    pub embedding: Embedding<B>,
    pub recurrent: LstmStack<B>,
    pub output:    Linear<B>,
}

impl GanConfig {
    pub fn init_generator<B: Backend>(&self, device: &B::Device) -> Generator<B> {
        Generator {
            embedding: EmbeddingConfig::new(self.vocab_size, self.embedding_dim).init(device),
            recurrent: LstmStack::new(self.embedding_dim, self.hidden_dim, self.num_layers, device),
            output:    LinearConfig::new(self.hidden_dim, self.vocab_size).init(device),
        }
    }
}

impl<B: Backend> Generator<B> {
    /// tokens [batch, seq] → logits [batch, seq, vocab]
    pub fn forward(
        &self,
        tokens: Tensor<B, 2, Int>,
        state:  Option<StackState<B>>,
    ) -> (Tensor<B, 3>, StackState<B>) {
        self.decode(self.embedding.forward(tokens), state)
    }

    /// One decoding step: tokens [batch, 1] → logits [batch, vocab].
    pub fn step(
        &self,
        tokens: Tensor<B, 2, Int>,
        state:  Option<StackState<B>>,
    ) -> (Tensor<B, 2>, StackState<B>) {
        let (logits, state) = self.forward(tokens, state);
        (squeeze_step(logits), state)
    }

    /// One decoding step fed with distributions: soft [batch, vocab].
    pub fn step_soft(
        &self,
        soft:  Tensor<B, 2>,
        state: Option<StackState<B>>,
    ) -> (Tensor<B, 2>, StackState<B>) {
        let [batch, _] = soft.dims();
        let d_model = self.embedding_dim();
        let embedded = soft
            .matmul(self.embedding.weight.val())
            .reshape([batch, 1, d_model]);
        let (logits, state) = self.decode(embedded, state);
        (squeeze_step(logits), state)
    }

    pub fn vocab_size(&self) -> usize {
        self.embedding.weight.val().dims()[0]
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding.weight.val().dims()[1]
    }

    pub fn device(&self) -> B::Device {
        self.output.weight.val().device()
    }

    fn decode(
        &self,
        embedded: Tensor<B, 3>,
        state:    Option<StackState<B>>,
    ) -> (Tensor<B, 3>, StackState<B>) {
        let (hidden, state) = self.recurrent.forward(embedded, state);
        (self.output.forward(hidden), state)
    }
}

/// [batch, 1, vocab] → [batch, vocab]
fn squeeze_step<B: Backend>(logits: Tensor<B, 3>) -> Tensor<B, 2> {
    let [batch, _, vocab] = logits.dims();
    logits.reshape([batch, vocab])
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::TensorData;

    fn tiny() -> GanConfig {
        GanConfig::new()
            .with_vocab_size(12)
            .with_embedding_dim(6)
            .with_hidden_dim(8)
            .with_num_layers(2)
            .with_max_length(10)
    }

    #[test]
    fn test_forward_shapes() {
        let device = Default::default();
        let g = tiny().init_generator::<NdArray>(&device);
        let tokens = Tensor::<NdArray, 2, Int>::zeros([3, 5], &device);
        let (logits, _) = g.forward(tokens, None);
        assert_eq!(logits.dims(), [3, 5, 12]);
        assert_eq!(g.vocab_size(), 12);
    }

    #[test]
    fn test_one_hot_soft_step_matches_hard_step() {
        let device = Default::default();
        let g = tiny().init_generator::<NdArray>(&device);

        let hard = Tensor::<NdArray, 2, Int>::from_ints([[5]], &device);
        let mut one_hot = vec![0.0f32; 12];
        one_hot[5] = 1.0;
        let soft = Tensor::<NdArray, 2>::from_data(TensorData::new(one_hot, [1, 12]), &device);

        let (a, _) = g.step(hard, None);
        let (b, _) = g.step_soft(soft, None);
        let diff: f32 = (a - b).abs().max().into_scalar().elem();
        assert!(diff < 1e-5, "diff = {diff}");
    }
}
