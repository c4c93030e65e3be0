// ============================================================
// Layer 5 — Stacked LSTM
// ============================================================
// burn's Lstm is a single layer. Both networks need `num_layers`
// of them, each feeding its hidden sequence to the next:
//
//   x [b, t, e] ─▶ lstm_0 ─▶ h_0 [b, t, h] ─▶ lstm_1 ─▶ … ─▶ h_n
//
// StackState carries the per-layer (cell, hidden) pair between
// calls, which is how the generator decodes one token at a time.

use burn::{
    nn::{Lstm, LstmConfig, LstmState},
    prelude::*,
};

#[derive(Module, Debug)]
pub struct LstmStack<B: Backend> {
    first: Lstm<B>,
    rest:  Vec<Lstm<B>>,
}

/// Recurrent memory of every layer, cell and hidden each [batch, hidden].
#[derive(Clone, Debug)]
pub struct StackState<B: Backend> {
    lower: Vec<(Tensor<B, 2>, Tensor<B, 2>)>,
    top:   (Tensor<B, 2>, Tensor<B, 2>),
}

impl<B: Backend> StackState<B> {
    /// Final hidden state of the top layer, [batch, hidden].
    pub fn top_hidden(&self) -> Tensor<B, 2> {
        self.top.1.clone()
    }

    /// Bottom layer first.
    fn into_layers(self) -> impl Iterator<Item = (Tensor<B, 2>, Tensor<B, 2>)> {
        self.lower.into_iter().chain(std::iter::once(self.top))
    }
}

impl<B: Backend> LstmStack<B> {
    /// # Panics
    /// If `num_layers` is 0; `GanConfig::validate` rejects that first.
    pub fn new(d_input: usize, d_hidden: usize, num_layers: usize, device: &B::Device) -> Self {
        assert!(num_layers > 0, "an LSTM stack needs at least one layer");
        Self {
            first: LstmConfig::new(d_input, d_hidden, true).init(device),
            rest:  (1..num_layers).map(|_| LstmConfig::new(d_hidden, d_hidden, true).init(device)).collect(),
        }
    }

    pub fn num_layers(&self) -> usize {
        1 + self.rest.len()
    }

    /// Bottom layer first.
    pub fn layers(&self) -> impl Iterator<Item = &Lstm<B>> {
        std::iter::once(&self.first).chain(&self.rest)
    }

    /// input [batch, seq, d_input] → ([batch, seq, d_hidden], state after the last step)
    pub fn forward(
        &self,
        input: Tensor<B, 3>,
        state: Option<StackState<B>>,
    ) -> (Tensor<B, 3>, StackState<B>) {
        let mut previous = state.map(StackState::into_layers);
        let mut carried = || {
            previous
                .as_mut()
                .and_then(Iterator::next)
                .map(|(cell, hidden)| LstmState::new(cell, hidden))
        };

        let (mut x, first) = self.first.forward(input, carried());
        let mut top = (first.cell, first.hidden);
        let mut lower = Vec::with_capacity(self.rest.len());

        for lstm in &self.rest {
            let (output, layer_state) = lstm.forward(x, carried());
            lower.push(std::mem::replace(&mut top, (layer_state.cell, layer_state.hidden)));
            x = output;
        }

        (x, StackState { lower, top })
    }
}
