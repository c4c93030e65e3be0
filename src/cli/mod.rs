// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and routes to a use case.
//
//   train    — train on a corpus, save checkpoint + metrics
//   generate — one story as JSON (falls back when no model)
//   status   — whether a checkpoint can be loaded, as JSON
//   serve    — HTTP server (see crate::server)
//
// `generate` and `status` print exactly one JSON object on
// stdout; logs go to stderr.

pub mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Commands, GenerateArgs, ServeArgs, StatusArgs, TrainArgs};
use std::{net::SocketAddr, path::Path};

use crate::application::{
    generate_use_case::{self, AvailabilityStatus, GenerateUseCase},
    model_handle::ModelHandle,
    train_use_case::{TrainConfig, TrainUseCase},
};
use crate::domain::story::{clamp_temperature, StoryResponse};
use crate::server::{self, ServerConfig};

#[derive(Parser, Debug)]
#[command(
    name = "story-gan",
    version,
    about = "Train an LSTM GAN on short Chinese stories and generate new ones."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Generate(args) => run_generate(args),
            Commands::Status(args)   => run_status(args),
            Commands::Serve(args)    => run_serve(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    let config: TrainConfig = args.into();
    tracing::info!("Training story GAN; checkpoint → '{}'", config.checkpoint);

    let summary = TrainUseCase::new(config).execute()?;
    if let Some(last) = summary.report.last() {
        println!(
            "Training complete. Final D_loss = {:.4}, G_loss = {:.4}",
            last.d_loss, last.g_loss
        );
    }
    for (i, story) in summary.samples.iter().enumerate() {
        println!("Sample {}: {}", i + 1, story);
    }
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    println!("{}", serde_json::to_string(&generate_response(&args))?);
    Ok(())
}

fn run_status(args: StatusArgs) -> Result<()> {
    println!("{}", serde_json::to_string(&status_response(&args.checkpoint))?);
    Ok(())
}

fn generate_response(args: &GenerateArgs) -> StoryResponse {
    match ModelHandle::load(&args.checkpoint) {
        Ok(handle) => GenerateUseCase::new(handle).generate(Some(args.temperature)),
        // an unreadable checkpoint still yields a story, flagged with the error
        Err(e) => generate_use_case::respond_unreadable(e.to_string(), clamp_temperature(args.temperature)),
    }
}

fn status_response(checkpoint: &Path) -> AvailabilityStatus {
    let loaded = ModelHandle::load(checkpoint)
        .map(|handle| handle.is_loaded())
        .map_err(|e| {
            tracing::warn!("Checkpoint unusable: {}", e);
            e.to_string()
        });
    generate_use_case::availability(loaded)
}

fn run_serve(args: ServeArgs) -> Result<()> {
    let config = ServerConfig {
        address:      SocketAddr::new(args.host, args.port),
        checkpoint:   args.checkpoint,
        timeout_secs: args.timeout_secs,
        ..ServerConfig::default()
    };
    let runtime = tokio::runtime::Runtime::new().context("Cannot start the async runtime")?;
    runtime.block_on(server::run(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::story::{StoryMethod, ERROR_FALLBACK, FALLBACK_STORIES};
    use std::path::PathBuf;

    fn generate_args(checkpoint: PathBuf) -> GenerateArgs {
        GenerateArgs { temperature: 0.8, checkpoint }
    }

    #[test]
    fn test_status_json_without_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let json = serde_json::to_value(status_response(&dir.path().join("none.mpk"))).unwrap();
        assert_eq!(json["model_available"], false);
        assert!(json["model_type"].is_null());
        assert!(json.get("model_loaded").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_status_json_with_unreadable_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.mpk");
        std::fs::write(&path, b"not a checkpoint").unwrap();

        let json = serde_json::to_value(status_response(&path)).unwrap();
        assert_eq!(json["model_available"], false);
        assert!(json["error"].is_string());
    }

    #[test]
    fn test_generate_json_without_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let response = generate_response(&generate_args(dir.path().join("none.mpk")));
        assert_eq!(response.method, StoryMethod::Fallback);
        assert!(FALLBACK_STORIES.contains(&response.story.as_str()));
        assert!(!response.model_available);
    }

    #[test]
    fn test_generate_json_with_unreadable_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.mpk");
        std::fs::write(&path, b"not a checkpoint").unwrap();

        let json = serde_json::to_value(generate_response(&generate_args(path))).unwrap();
        assert_eq!(json["story"], ERROR_FALLBACK);
        assert_eq!(json["method"], "fallback");
        assert_eq!(json["model_available"], false);
        assert!(json["error"].is_string());
    }
}
