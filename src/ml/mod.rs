// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn network and training code lives here.
//
//   config.rs        — GanConfig (architecture) and TrainOptions
//   recurrent.rs     — multi-layer LSTM shared by both networks
//   generator.rs     — Embedding → LSTM stack → next-token logits
//   discriminator.rs — Embedding → LSTM stack → P(real)
//   sampler.rs       — temperature sampling and Gumbel-softmax rollouts
//   trainer.rs       — alternating D / G updates with Adam
//   gan.rs           — StoryGan: vocabulary + both networks
//
// Everything runs on the CPU ndarray backend. Training wraps it
// in Autodiff; serving uses the bare backend.
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Goodfellow et al. (2014) Generative Adversarial Nets

use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};

pub mod config;
pub mod discriminator;
pub mod gan;
pub mod generator;
pub mod recurrent;
pub mod sampler;
pub mod trainer;

pub type InferBackend = NdArray;
pub type TrainBackend = Autodiff<InferBackend>;

pub fn device() -> NdArrayDevice {
    NdArrayDevice::Cpu
}
