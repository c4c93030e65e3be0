// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Four subcommands: `train`, `generate`, `status`, `serve`.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::{net::IpAddr, path::PathBuf};

use crate::application::train_use_case::TrainConfig;

const DEFAULT_CHECKPOINT: &str = "checkpoints/story_gan.mpk";

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the story GAN and save a checkpoint
    Train(TrainArgs),

    /// Generate one story and print it as JSON
    Generate(GenerateArgs),

    /// Print whether a trained model is available, as JSON
    Status(StatusArgs),

    /// Serve stories over HTTP
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Story file (one story per line) or directory of .txt files;
    /// the built-in sample stories are used when omitted
    #[arg(long)]
    pub corpus: Option<String>,

    /// Where to write the checkpoint; config and metrics go beside it
    #[arg(long, default_value = DEFAULT_CHECKPOINT)]
    pub checkpoint: String,

    #[arg(long, default_value_t = 50)]
    pub epochs: usize,

    /// Real sequences per discriminator step (fake batch matches it)
    #[arg(long, default_value_t = 8)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 2e-4)]
    pub lr_generator: f64,

    #[arg(long, default_value_t = 2e-4)]
    pub lr_discriminator: f64,

    /// Vocabulary size including the four reserved markers
    #[arg(long, default_value_t = 3000)]
    pub vocab_size: usize,

    #[arg(long, default_value_t = 128)]
    pub embedding_dim: usize,

    #[arg(long, default_value_t = 256)]
    pub hidden_dim: usize,

    /// Stacked LSTM layers in each network
    #[arg(long, default_value_t = 2)]
    pub num_layers: usize,

    /// Longest training sequence, markers included; longer stories are skipped
    #[arg(long, default_value_t = 50)]
    pub max_length: usize,

    /// Seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Demo stories to print after training
    #[arg(long, default_value_t = 3)]
    pub samples: usize,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            corpus:           a.corpus,
            checkpoint:       a.checkpoint,
            epochs:           a.epochs,
            batch_size:       a.batch_size,
            lr_generator:     a.lr_generator,
            lr_discriminator: a.lr_discriminator,
            vocab_size:       a.vocab_size,
            embedding_dim:    a.embedding_dim,
            hidden_dim:       a.hidden_dim,
            num_layers:       a.num_layers,
            max_length:       a.max_length,
            seed:             a.seed,
            samples:          a.samples,
        }
    }
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Sampling temperature, clamped to [0.1, 2.0]
    #[arg(long, default_value_t = 0.8)]
    pub temperature: f64,

    #[arg(long, default_value = DEFAULT_CHECKPOINT)]
    pub checkpoint: PathBuf,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[arg(long, default_value = DEFAULT_CHECKPOINT)]
    pub checkpoint: PathBuf,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, default_value = "0.0.0.0")]
    pub host: IpAddr,

    #[arg(long, default_value_t = 5000)]
    pub port: u16,

    #[arg(long, default_value = DEFAULT_CHECKPOINT)]
    pub checkpoint: PathBuf,

    /// Seconds a single generation request may take
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_args_into_config() {
        let cli = Cli::parse_from(["story-gan", "train", "--epochs", "5", "--seed", "7"]);
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.epochs, 5);
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.vocab_size, 3000);
        assert_eq!(cfg.checkpoint, DEFAULT_CHECKPOINT);
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::parse_from(["story-gan", "serve"]);
        let Commands::Serve(args) = cli.command else { panic!("expected serve") };
        assert_eq!(args.port, 5000);
        assert_eq!(args.timeout_secs, 30);
    }

    #[test]
    fn test_generate_temperature() {
        let cli = Cli::parse_from(["story-gan", "generate", "--temperature", "1.5"]);
        let Commands::Generate(args) = cli.command else { panic!("expected generate") };
        assert_eq!(args.temperature, 1.5);
    }
}
