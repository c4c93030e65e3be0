// ============================================================
// story_gan — LSTM GAN for short Chinese stories
// ============================================================
//   Layer 1  cli/          argument parsing, command routing
//   Layer 1b server/       HTTP endpoints (axum)
//   Layer 2  application/  training and generation workflows
//   Layer 3  domain/       vocabulary, outcomes, traits
//   Layer 4  data/         corpus loading, segmentation, encoding
//   Layer 5  ml/           burn networks, sampling, training
//   Layer 6  infra/        checkpoint and metrics persistence

#![recursion_limit = "256"]

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod infra;
pub mod ml;
pub mod server;

pub use error::{GanError, Result};
pub use ml::{config::GanConfig, config::TrainOptions, gan::StoryGan};
