// ============================================================
// Layer 5 — Architecture and Training Configuration
// ============================================================
// GanConfig holds the five numbers that fix every parameter
// shape; they are written into the checkpoint and must match
// on load. TrainOptions holds everything that only matters
// while training.
//
// #[derive(Config)] generates new(), with_* builders, Clone,
// serde support and save/load to JSON.

use burn::prelude::*;

use crate::domain::vocabulary::RESERVED_TOKENS;
use crate::error::{GanError, Result};

#[derive(Config, Debug, PartialEq)]
pub struct GanConfig {
    /// Rows of both embedding tables and width of the generator output.
    #[config(default = 5000)]
    pub vocab_size: usize,
    #[config(default = 128)]
    pub embedding_dim: usize,
    #[config(default = 256)]
    pub hidden_dim: usize,
    /// Stacked LSTM layers in each network.
    #[config(default = 2)]
    pub num_layers: usize,
    /// Longest sequence (markers included) used for training and sampling.
    #[config(default = 100)]
    pub max_length: usize,
}

impl GanConfig {
    pub fn validate(&self) -> Result<()> {
        let problem = if self.vocab_size < RESERVED_TOKENS.len() {
            Some(format!("vocab_size must be at least {}", RESERVED_TOKENS.len()))
        } else if self.embedding_dim == 0 || self.hidden_dim == 0 {
            Some("embedding_dim and hidden_dim must be positive".to_string())
        } else if self.num_layers == 0 {
            Some("num_layers must be at least 1".to_string())
        } else if self.max_length < 2 {
            Some("max_length must leave room for <s> and one token".to_string())
        } else {
            None
        };

        match problem {
            Some(msg) => Err(GanError::InvalidOptions(msg)),
            None => Ok(()),
        }
    }
}

#[derive(Config, Debug)]
pub struct TrainOptions {
    #[config(default = 100)]
    pub epochs: usize,
    #[config(default = 32)]
    pub batch_size: usize,
    #[config(default = 2e-4)]
    pub lr_generator: f64,
    #[config(default = 2e-4)]
    pub lr_discriminator: f64,
    /// Log losses and a sample every this many epochs.
    #[config(default = 10)]
    pub report_every: usize,
    /// Gumbel-softmax temperature for the generator's relaxed samples.
    #[config(default = 1.0)]
    pub gumbel_tau: f64,
}

impl TrainOptions {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(GanError::InvalidOptions("batch_size must be at least 1".into()));
        }
        if !(self.lr_generator > 0.0 && self.lr_discriminator > 0.0) {
            return Err(GanError::InvalidOptions("learning rates must be positive".into()));
        }
        if !(self.gumbel_tau.is_finite() && self.gumbel_tau > 0.0) {
            return Err(GanError::InvalidOptions("gumbel_tau must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = GanConfig::new();
        assert_eq!(
            (c.vocab_size, c.embedding_dim, c.hidden_dim, c.num_layers, c.max_length),
            (5000, 128, 256, 2, 100)
        );
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_rejects_degenerate_shapes() {
        assert!(GanConfig::new().with_vocab_size(3).validate().is_err());
        assert!(GanConfig::new().with_num_layers(0).validate().is_err());
        assert!(GanConfig::new().with_max_length(1).validate().is_err());
        assert!(GanConfig::new().with_hidden_dim(0).validate().is_err());
    }

    #[test]
    fn test_train_options_validation() {
        assert!(TrainOptions::new().validate().is_ok());
        assert!(TrainOptions::new().with_batch_size(0).validate().is_err());
        assert!(TrainOptions::new().with_lr_generator(0.0).validate().is_err());
        assert!(TrainOptions::new().with_gumbel_tau(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_config_json_round_trip() {
        let c = GanConfig::new().with_vocab_size(3000).with_max_length(50);
        let json = serde_json::to_string(&c).unwrap();
        let back: GanConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
