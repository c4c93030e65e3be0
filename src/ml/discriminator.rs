// ============================================================
// Layer 5 — Discriminator Network
// ============================================================
//   tokens [b, t] ─▶ Embedding ─▶ LstmStack ─▶ top-layer final
//   hidden [b, h] ─▶ Linear(h, 1) ─▶ logit [b, 1]
//
// `forward` returns the raw logit so the loss can use the
// numerically stable BCE-with-logits. `classify` applies the
// sigmoid and yields P(real) in [0, 1].

use burn::{
    nn::{Embedding, EmbeddingConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::sigmoid,
};

use crate::ml::config::GanConfig;
use crate::ml::recurrent::LstmStack;

#[derive(Module, Debug)]
pub struct Discriminator<B: Backend> {
    pub embedding: Embedding<B>,
    pub recurrent: LstmStack<B>,
    pub output:    Linear<B>,
}

impl GanConfig {
    pub fn init_discriminator<B: Backend>(&self, device: &B::Device) -> Discriminator<B> {
        Discriminator {
            embedding: EmbeddingConfig::new(self.vocab_size, self.embedding_dim).init(device),
            recurrent: LstmStack::new(self.embedding_dim, self.hidden_dim, self.num_layers, device),
            output:    LinearConfig::new(self.hidden_dim, 1).init(device),
        }
    }
}

impl<B: Backend> Discriminator<B> {
    /// tokens [batch, seq] → logits [batch, 1]
    pub fn forward(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        self.score(self.embedding.forward(tokens))
    }

    /// Distributions over the vocabulary, soft [batch, seq, vocab] → logits [batch, 1].
    pub fn forward_soft(&self, soft: Tensor<B, 3>) -> Tensor<B, 2> {
        let [batch, seq, vocab] = soft.dims();
        let d_model = self.embedding.weight.val().dims()[1];
        let embedded = soft
            .reshape([batch * seq, vocab])
            .matmul(self.embedding.weight.val())
            .reshape([batch, seq, d_model]);
        self.score(embedded)
    }

    /// P(real) for each sequence, [batch, 1].
    pub fn classify(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        sigmoid(self.forward(tokens))
    }

    pub fn device(&self) -> B::Device {
        self.output.weight.val().device()
    }

    fn score(&self, embedded: Tensor<B, 3>) -> Tensor<B, 2> {
        let (_, state) = self.recurrent.forward(embedded, None);
        self.output.forward(state.top_hidden())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    fn tiny() -> GanConfig {
        GanConfig::new()
            .with_vocab_size(9)
            .with_embedding_dim(4)
            .with_hidden_dim(5)
            .with_num_layers(2)
            .with_max_length(8)
    }

    #[test]
    fn test_classify_is_a_probability_per_row() {
        let device = Default::default();
        let d = tiny().init_discriminator::<NdArray>(&device);
        let tokens = Tensor::<NdArray, 2, Int>::from_ints([[2, 4, 5, 3], [2, 6, 3, 0]], &device);

        let probs = d.classify(tokens);
        assert_eq!(probs.dims(), [2, 1]);
        let values: Vec<f32> = probs.into_data().convert::<f32>().to_vec().unwrap();
        assert!(values.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_soft_one_hot_matches_token_input() {
        let device = Default::default();
        let d = tiny().init_discriminator::<NdArray>(&device);
        let rows = [2usize, 7, 3];

        let tokens = Tensor::<NdArray, 2, Int>::from_ints([[2, 7, 3]], &device);
        let one_hot: Vec<f32> = rows
            .iter()
            .flat_map(|&t| (0..9).map(move |i| if i == t { 1.0 } else { 0.0 }))
            .collect();
        let soft = Tensor::<NdArray, 3>::from_data(
            burn::tensor::TensorData::new(one_hot, [1, 3, 9]),
            &device,
        );

        let diff: f32 = (d.forward(tokens) - d.forward_soft(soft)).abs().max().into_scalar().elem();
        assert!(diff < 1e-5, "diff = {diff}");
    }
}
