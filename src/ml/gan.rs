// ============================================================
// Layer 5 — StoryGan
// ============================================================
// Owns everything needed to train, sample and persist one model:
//
//   GanConfig ─┐
//   Vocabulary ┼─▶ StoryGan ─▶ generate / train / save / load
//   Generator ─┤
//   Discriminator
//
// Training runs on an autodiff backend; `valid()` drops the
// autodiff wrapper for serving.

use std::path::Path;

use burn::{module::AutodiffModule, prelude::*, tensor::backend::AutodiffBackend};
use rand::Rng;

use crate::data::{encoder::SequenceEncoder, segmenter::CjkSegmenter};
use crate::domain::traits::Segmenter;
use crate::domain::vocabulary::Vocabulary;
use crate::error::{GanError, Result};
use crate::infra::checkpoint;
use crate::ml::{
    config::{GanConfig, TrainOptions},
    discriminator::Discriminator,
    generator::Generator,
    sampler::sample_tokens,
    trainer::{AdversarialTrainer, TrainReport},
};

#[derive(Debug, Clone)]
pub struct StoryGan<B: Backend> {
    config:            GanConfig,
    vocab:             Vocabulary,
    segmenter:         CjkSegmenter,
    pub generator:     Generator<B>,
    pub discriminator: Discriminator<B>,
}

impl<B: Backend> StoryGan<B> {
    /// Fresh, randomly initialised model with only the reserved tokens.
    pub fn new(config: GanConfig, device: &B::Device) -> Result<Self> {
        config.validate()?;
        let generator     = config.init_generator(device);
        let discriminator = config.init_discriminator(device);
        Ok(Self::from_parts(config, Vocabulary::reserved(), generator, discriminator))
    }

    pub(crate) fn from_parts(
        config:        GanConfig,
        vocab:         Vocabulary,
        generator:     Generator<B>,
        discriminator: Discriminator<B>,
    ) -> Self {
        Self { config, vocab, segmenter: CjkSegmenter::new(), generator, discriminator }
    }

    pub fn config(&self) -> &GanConfig {
        &self.config
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Replace the vocabulary with one learned from `corpus`.
    pub fn build_vocabulary(&mut self, corpus: &[String]) -> Result<()> {
        self.vocab = self.learn_vocabulary(corpus)?;
        Ok(())
    }

    /// `<s>` + token indices + `</s>` for one text.
    pub fn encode(&self, text: &str) -> Result<Vec<usize>> {
        SequenceEncoder::new(&self.vocab, &self.segmenter).encode(text)
    }

    /// Sample token indices (end marker included when drawn).
    pub fn generate_tokens<R: Rng + ?Sized>(&self, temperature: f64, rng: &mut R) -> Result<Vec<usize>> {
        sample_tokens(&self.generator, self.config.max_length, temperature, rng)
    }

    /// Sample one story and decode it. Marker texts are left in place.
    pub fn generate<R: Rng + ?Sized>(&self, temperature: f64, rng: &mut R) -> Result<String> {
        let tokens = self.generate_tokens(temperature, rng)?;
        Ok(self.vocab.decode(&tokens))
    }

    /// Discriminator's P(real) for one text.
    pub fn classify(&self, text: &str) -> Result<f32> {
        let sequence = self.encode(text)?;
        let tokens = Tensor::<B, 1, Int>::from_ints(
            sequence.iter().map(|&t| t as i32).collect::<Vec<_>>().as_slice(),
            &self.discriminator.device(),
        )
        .unsqueeze::<2>();
        let prob: f32 = self.discriminator.classify(tokens).into_scalar().elem();
        Ok(prob)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        checkpoint::save(self, path)
    }

    /// `Ok(None)` when nothing exists at `path`.
    pub fn load(path: &Path, device: &B::Device) -> Result<Option<Self>> {
        checkpoint::load(path, device)
    }

    fn learn_vocabulary(&self, corpus: &[String]) -> Result<Vocabulary> {
        let segmented = corpus
            .iter()
            .map(|text| self.segmenter.segment(text))
            .collect::<Result<Vec<_>>>()?;
        Ok(Vocabulary::build(&segmented, self.config.vocab_size))
    }
}

impl<B: AutodiffBackend> StoryGan<B> {
    /// Learn a vocabulary from `corpus` and train both networks on it.
    ///
    /// The model is only replaced when every epoch succeeds.
    pub fn train<R: Rng + ?Sized>(
        &mut self,
        corpus:  &[String],
        options: &TrainOptions,
        rng:     &mut R,
    ) -> Result<TrainReport> {
        options.validate()?;
        if corpus.is_empty() {
            return Err(GanError::EmptyBatch { max_length: self.config.max_length });
        }

        let vocab = self.learn_vocabulary(corpus)?;
        tracing::info!("Vocabulary: {} tokens ({} learned)", vocab.len(), vocab.learned_len());

        let matrix = SequenceEncoder::new(&vocab, &self.segmenter)
            .encode_corpus(corpus, self.config.max_length)?;
        tracing::info!("Training matrix: {} x {}", matrix.len(), matrix.width());

        let trainer = AdversarialTrainer::new(options, &vocab, self.config.max_length);
        let (generator, discriminator, report) = trainer.run(
            self.generator.clone(),
            self.discriminator.clone(),
            &matrix,
            rng,
        )?;

        self.generator     = generator;
        self.discriminator = discriminator;
        self.vocab         = vocab;
        Ok(report)
    }

    /// Same model on the inner (non-autodiff) backend.
    pub fn valid(&self) -> StoryGan<B::InnerBackend> {
        StoryGan::from_parts(
            self.config.clone(),
            self.vocab.clone(),
            self.generator.valid(),
            self.discriminator.valid(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::vocabulary::{END_INDEX, START_INDEX};
    use crate::ml::{InferBackend, TrainBackend};
    use rand::{rngs::StdRng, SeedableRng};

    fn tiny() -> GanConfig {
        GanConfig::new()
            .with_vocab_size(40)
            .with_embedding_dim(8)
            .with_hidden_dim(8)
            .with_num_layers(2)
            .with_max_length(12)
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = StoryGan::<InferBackend>::new(tiny().with_num_layers(0), &Default::default());
        assert!(matches!(err, Err(GanError::InvalidOptions(_))));
    }

    #[test]
    fn test_build_vocabulary_and_encode() {
        let mut gan = StoryGan::<InferBackend>::new(tiny(), &Default::default()).unwrap();
        gan.build_vocabulary(&["我爱你".to_string(), "你爱我".to_string()]).unwrap();
        assert_eq!(gan.vocab().len(), 7);
        assert_eq!(gan.encode("我爱你").unwrap(), vec![START_INDEX, 4, 5, 6, END_INDEX]);
    }

    #[test]
    fn test_generate_respects_max_length() {
        let gan = StoryGan::<InferBackend>::new(tiny(), &Default::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let tokens = gan.generate_tokens(0.8, &mut rng).unwrap();
        assert!(!tokens.is_empty() && tokens.len() < 12);
        assert!(gan.generate(1.0, &mut rng).is_ok());
    }

    #[test]
    fn test_generate_rejects_zero_temperature() {
        let gan = StoryGan::<InferBackend>::new(tiny(), &Default::default()).unwrap();
        let err = gan.generate(0.0, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert!(matches!(err, GanError::InvalidTemperature(_)));
    }

    #[test]
    fn test_classify_is_a_probability() {
        let gan = StoryGan::<InferBackend>::new(tiny(), &Default::default()).unwrap();
        let p = gan.classify("春天来了").unwrap();
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn test_train_replaces_vocabulary_and_reports_losses() {
        let mut gan = StoryGan::<TrainBackend>::new(tiny(), &Default::default()).unwrap();
        let corpus = vec!["小猫很可爱。".to_string(), "春天来了。".to_string()];
        let options = TrainOptions::new().with_epochs(2).with_batch_size(2);

        let report = gan.train(&corpus, &options, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(report.epochs.len(), 2);
        assert!(gan.vocab().get("猫").is_some());

        let served = gan.valid();
        assert_eq!(served.vocab(), gan.vocab());
        assert!(served.generate(0.8, &mut StdRng::seed_from_u64(3)).is_ok());
    }

    #[test]
    fn test_train_with_only_over_long_stories_fails() {
        let mut gan = StoryGan::<TrainBackend>::new(tiny().with_max_length(4), &Default::default()).unwrap();
        let corpus = vec!["一二三四五六七八".to_string()];
        let before = gan.vocab().clone();

        let err = gan.train(&corpus, &TrainOptions::new().with_epochs(1), &mut StdRng::seed_from_u64(0));
        assert!(matches!(err, Err(GanError::EmptyBatch { max_length: 4 })));
        assert_eq!(gan.vocab(), &before, "failed training leaves the model unchanged");
    }
}
