// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates one training run:
//
//   Step 1: Load stories              (Layer 4 - data)
//   Step 2: Build a fresh StoryGan    (Layer 5 - ml)
//   Step 3: Adversarial training      (Layer 5 - ml)
//   Step 4: Save checkpoint           (Layer 6 - infra)
//   Step 5: Save config + metrics     (Layer 6 - infra)
//   Step 6: Sample a few demo stories (Layer 5 - ml)
//
// The trained model is returned on the inference backend so the
// server can swap it straight into its ModelHandle.

use anyhow::{Context, Result};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::data::loader::{SampleCorpus, TextCorpusLoader};
use crate::domain::{story::DEFAULT_TEMPERATURE, traits::CorpusSource};
use crate::infra::metrics::MetricsLogger;
use crate::ml::{
    config::{GanConfig, TrainOptions},
    device,
    gan::StoryGan,
    trainer::TrainReport,
    InferBackend, TrainBackend,
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything one run needs. Saved next to the checkpoint as
// train_config.json so a run can be reproduced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Story file or directory of *.txt files; None uses the built-in stories.
    pub corpus:           Option<String>,
    pub checkpoint:       String,
    pub epochs:           usize,
    pub batch_size:       usize,
    pub lr_generator:     f64,
    pub lr_discriminator: f64,
    pub vocab_size:       usize,
    pub embedding_dim:    usize,
    pub hidden_dim:       usize,
    pub num_layers:       usize,
    pub max_length:       usize,
    pub seed:             Option<u64>,
    /// Demo stories to sample after training.
    pub samples:          usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            corpus:           None,
            checkpoint:       "checkpoints/story_gan.mpk".to_string(),
            epochs:           50,
            batch_size:       8,
            lr_generator:     2e-4,
            lr_discriminator: 2e-4,
            vocab_size:       3000,
            embedding_dim:    128,
            hidden_dim:       256,
            num_layers:       2,
            max_length:       50,
            seed:             None,
            samples:          3,
        }
    }
}

impl TrainConfig {
    pub fn gan_config(&self) -> GanConfig {
        GanConfig::new()
            .with_vocab_size(self.vocab_size)
            .with_embedding_dim(self.embedding_dim)
            .with_hidden_dim(self.hidden_dim)
            .with_num_layers(self.num_layers)
            .with_max_length(self.max_length)
    }

    pub fn train_options(&self) -> TrainOptions {
        TrainOptions::new()
            .with_epochs(self.epochs)
            .with_batch_size(self.batch_size)
            .with_lr_generator(self.lr_generator)
            .with_lr_discriminator(self.lr_discriminator)
    }

    /// Directory holding the checkpoint, config and metrics.
    pub fn run_dir(&self) -> PathBuf {
        match Path::new(&self.checkpoint).parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

/// What a finished run hands back.
pub struct TrainSummary {
    pub model:   StoryGan<InferBackend>,
    pub report:  TrainReport,
    pub samples: Vec<String>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config:  TrainConfig,
    stories: Option<Vec<String>>,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config, stories: None }
    }

    /// Train on `stories` instead of reading `config.corpus`.
    pub fn with_stories(config: TrainConfig, stories: Vec<String>) -> Self {
        Self { config, stories: Some(stories) }
    }

    pub fn execute(&self) -> Result<TrainSummary> {
        let cfg = &self.config;
        let mut rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        // ── Step 1: Load stories ──────────────────────────────────────────────
        let stories = self.load_stories()?;
        tracing::info!("Training on {} stories", stories.len());

        // ── Step 2: Fresh model ───────────────────────────────────────────────
        let mut gan = StoryGan::<TrainBackend>::new(cfg.gan_config(), &device())
            .context("Invalid model configuration")?;

        // ── Step 3: Adversarial training ──────────────────────────────────────
        let report = gan
            .train(&stories, &cfg.train_options(), &mut rng)
            .context("Training failed")?;

        // ── Step 4: Checkpoint ────────────────────────────────────────────────
        let model = gan.valid();
        let checkpoint = Path::new(&cfg.checkpoint);
        model
            .save(checkpoint)
            .with_context(|| format!("Cannot save checkpoint to '{}'", checkpoint.display()))?;

        // ── Step 5: Config + metrics ──────────────────────────────────────────
        let run_dir = cfg.run_dir();
        save_config(cfg, &run_dir)?;
        MetricsLogger::new(&run_dir)?.log_all(&report.epochs)?;

        // ── Step 6: Demo stories ──────────────────────────────────────────────
        let samples = (0..cfg.samples)
            .map(|_| model.generate(DEFAULT_TEMPERATURE, &mut rng))
            .collect::<crate::error::Result<Vec<_>>>()
            .context("Sampling demo stories failed")?;
        for (i, story) in samples.iter().enumerate() {
            tracing::info!("Sample {}: {}", i + 1, story);
        }

        Ok(TrainSummary { model, report, samples })
    }

    fn load_stories(&self) -> Result<Vec<String>> {
        if let Some(stories) = &self.stories {
            return Ok(stories.clone());
        }
        match &self.config.corpus {
            Some(path) => TextCorpusLoader::new(path).load_all(),
            None => {
                tracing::info!("No corpus given; using the built-in sample stories");
                SampleCorpus.load_all()
            }
        }
    }
}

fn save_config(cfg: &TrainConfig, dir: &Path) -> Result<()> {
    let path = dir.join("train_config.json");
    let json = serde_json::to_string_pretty(cfg)?;
    fs::write(&path, json)
        .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
    tracing::debug!("Saved training config to '{}'", path.display());
    Ok(())
}
