// ============================================================
// Layer 5 — Adversarial Training Loop
// ============================================================
// One epoch = one discriminator update, then one generator update.
//
//   real rows (≤ batch_size) ──┐
//                              ├─▶ D ─▶ BCE(real→1, fake→0) ─▶ Adam(D)
//   G.valid() samples (T=1) ───┘
//
//   G relaxed rollout ─▶ D ─▶ BCE(fake→1) ─▶ Adam(G)
//
// Key points:
//   - the discriminator step samples from G.valid(), so no graph
//     is built through the generator and G cannot change
//   - the generator step builds gradients for both networks but
//     GradientsParams::from_grads keeps only the generator's, so
//     D is untouched
//   - a non-finite loss aborts training with TrainingInstability
//
// Reference: Goodfellow et al. (2014), Jang et al. (2017) Gumbel-softmax

use burn::{
    module::AutodiffModule,
    nn::loss::BinaryCrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::Rng;

use crate::data::batcher::SequenceBatcher;
use crate::data::encoder::PaddedBatch;
use crate::domain::vocabulary::{Vocabulary, PAD_INDEX};
use crate::error::{GanError, Result};
use crate::ml::{
    config::TrainOptions,
    discriminator::Discriminator,
    generator::Generator,
    sampler::{fake_batch, relaxed_rollout, sample_tokens},
};

/// Losses recorded after one epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochLosses {
    pub epoch:  usize,
    pub d_loss: f64,
    pub g_loss: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainReport {
    pub epochs: Vec<EpochLosses>,
}

impl TrainReport {
    pub fn last(&self) -> Option<&EpochLosses> {
        self.epochs.last()
    }
}

pub struct AdversarialTrainer<'a> {
    options:    &'a TrainOptions,
    vocab:      &'a Vocabulary,
    max_length: usize,
}

impl<'a> AdversarialTrainer<'a> {
    pub fn new(options: &'a TrainOptions, vocab: &'a Vocabulary, max_length: usize) -> Self {
        Self { options, vocab, max_length }
    }

    /// Run `options.epochs` epochs and hand back the trained networks.
    pub fn run<B: AutodiffBackend, R: Rng + ?Sized>(
        &self,
        mut generator:     Generator<B>,
        mut discriminator: Discriminator<B>,
        corpus:            &PaddedBatch,
        rng:               &mut R,
    ) -> Result<(Generator<B>, Discriminator<B>, TrainReport)> {
        self.options.validate()?;
        let opts = self.options;

        // Adam with the usual β1=0.9, β2=0.999; ε matches the common 1e-8
        let mut optim_g = AdamConfig::new().with_epsilon(1e-8).init::<B, Generator<B>>();
        let mut optim_d = AdamConfig::new().with_epsilon(1e-8).init::<B, Discriminator<B>>();

        let mut report = TrainReport::default();
        tracing::info!(
            "Adversarial training: {} epochs, {} real sequences, batch_size={}",
            opts.epochs, corpus.len(), opts.batch_size
        );

        for epoch in 0..opts.epochs {
            // ── Discriminator phase ───────────────────────────────────────────
            let real = corpus.sample_rows(opts.batch_size, rng);
            let (d, d_loss) = discriminator_step(
                &generator, discriminator, &mut optim_d,
                opts.lr_discriminator, &real, self.max_length, rng,
            )?;
            discriminator = d;
            ensure_finite(epoch, "discriminator", d_loss)?;

            // ── Generator phase ───────────────────────────────────────────────
            let (g, g_loss) = generator_step(
                generator, &discriminator, &mut optim_g,
                opts.lr_generator, real.len(), self.max_length, opts.gumbel_tau, rng,
            )?;
            generator = g;
            ensure_finite(epoch, "generator", g_loss)?;

            report.epochs.push(EpochLosses { epoch, d_loss, g_loss });

            if opts.report_every > 0 && epoch % opts.report_every == 0 {
                tracing::info!("Epoch {}: D_loss = {:.4}, G_loss = {:.4}", epoch, d_loss, g_loss);
                let sample = sample_tokens(&generator.valid(), self.max_length, 1.0, rng)?;
                tracing::info!("Sample: {}", self.vocab.decode(&sample));
            }
        }

        tracing::info!("Training complete!");
        Ok((generator, discriminator, report))
    }
}

/// One discriminator update. The generator is only read.
pub fn discriminator_step<B, O, R>(
    generator:     &Generator<B>,
    discriminator: Discriminator<B>,
    optim:         &mut O,
    lr:            f64,
    real_rows:     &[Vec<usize>],
    max_length:    usize,
    rng:           &mut R,
) -> Result<(Discriminator<B>, f64)>
where
    B: AutodiffBackend,
    O: Optimizer<Discriminator<B>, B>,
    R: Rng + ?Sized,
{
    let count = real_rows.len();
    if count == 0 {
        return Err(GanError::InvalidOptions("discriminator step needs at least one real row".into()));
    }

    let device  = discriminator.device();
    let batcher = SequenceBatcher::<B>::new(device.clone());

    // inner-backend generator: sampling builds no autodiff graph
    let fake_rows = fake_batch(&generator.valid(), count, max_length, rng)?;
    // both halves padded to the same width
    let real_rows: Vec<Vec<usize>> = real_rows
        .iter()
        .map(|row| {
            let mut row = row.clone();
            row.resize(max_length.max(row.len()), PAD_INDEX);
            row
        })
        .collect();

    let real_logits = discriminator.forward(batcher.batch(&real_rows)).reshape([count]);
    let fake_logits = discriminator.forward(batcher.batch(&fake_rows)).reshape([count]);

    let bce = BinaryCrossEntropyLossConfig::new().with_logits(true).init(&device);
    let loss = bce.forward(real_logits, Tensor::<B, 1, Int>::ones([count], &device))
             + bce.forward(fake_logits, Tensor::<B, 1, Int>::zeros([count], &device));

    let value: f64 = loss.clone().into_scalar().elem::<f64>();
    let grads = GradientsParams::from_grads(loss.backward(), &discriminator);
    Ok((optim.step(lr, discriminator, grads), value))
}

/// One generator update against a fixed discriminator.
#[allow(clippy::too_many_arguments)]
pub fn generator_step<B, O, R>(
    generator:     Generator<B>,
    discriminator: &Discriminator<B>,
    optim:         &mut O,
    lr:            f64,
    batch_size:    usize,
    max_length:    usize,
    tau:           f64,
    rng:           &mut R,
) -> Result<(Generator<B>, f64)>
where
    B: AutodiffBackend,
    O: Optimizer<Generator<B>, B>,
    R: Rng + ?Sized,
{
    if batch_size == 0 {
        return Err(GanError::InvalidOptions("generator step needs batch_size >= 1".into()));
    }

    let device  = generator.device();
    let rollout = relaxed_rollout(&generator, batch_size, max_length, tau, rng)?;
    let logits  = discriminator.forward_soft(rollout.soft).reshape([batch_size]);

    // non-saturating loss: push D(G(z)) towards "real"
    let bce  = BinaryCrossEntropyLossConfig::new().with_logits(true).init(&device);
    let loss = bce.forward(logits, Tensor::<B, 1, Int>::ones([batch_size], &device));

    let value: f64 = loss.clone().into_scalar().elem::<f64>();
    let grads = GradientsParams::from_grads(loss.backward(), &generator);
    Ok((optim.step(lr, generator, grads), value))
}

fn ensure_finite(epoch: usize, network: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        tracing::error!("{} loss became {} at epoch {}", network, value, epoch);
        Err(GanError::TrainingInstability { epoch, network, value })
    }
}
