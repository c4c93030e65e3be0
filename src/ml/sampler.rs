// ============================================================
// Layer 5 — Sampling
// ============================================================
// Two ways of drawing sequences from the generator:
//
//   sample_tokens     discrete, temperature-scaled categorical
//                     draws; used for inference and for the fake
//                     half of the discriminator batch
//
//   relaxed_rollout   Gumbel-softmax samples that stay attached to
//                     the autodiff graph; used for the generator's
//                     own update
//
//   <s> ─▶ G ─▶ softmax(logits / T) ─▶ draw ─▶ G ─▶ … ─▶ </s> | L-1 draws
//
// Every random draw comes from the caller's RNG, so a seeded
// StdRng reproduces a run exactly.

use burn::{prelude::*, tensor::{activation::softmax, TensorData}};
use rand::{distributions::WeightedIndex, prelude::Distribution, Rng};

use crate::data::batcher::SequenceBatcher;
use crate::domain::vocabulary::{END_INDEX, PAD_INDEX, START_INDEX};
use crate::error::{GanError, Result};
use crate::ml::generator::Generator;

/// Draw one sequence of at most `max_length - 1` tokens after `<s>`.
///
/// The start marker is not included; the end marker is, when it
/// was drawn.
pub fn sample_tokens<B: Backend, R: Rng + ?Sized>(
    generator:   &Generator<B>,
    max_length:  usize,
    temperature: f64,
    rng:         &mut R,
) -> Result<Vec<usize>> {
    check_temperature(temperature)?;

    let batcher = SequenceBatcher::<B>::new(generator.device());
    let mut emitted = Vec::with_capacity(max_length);
    let mut current = START_INDEX;
    let mut state   = None;

    for _ in 1..max_length {
        let (logits, next) = generator.step(batcher.single(current), state);
        state = Some(next);

        let logits = to_f32_vec(logits)?;
        current = match temperature_weights(&logits, temperature) {
            Some(weights) => WeightedIndex::new(&weights)
                .map_err(|e| GanError::Sampling(format!("invalid next-token distribution: {e}")))?
                .sample(rng),
            None => argmax(&logits),
        };
        emitted.push(current);
        if current == END_INDEX {
            break;
        }
    }

    Ok(emitted)
}

/// `count` rows of `<s>` + sampled tokens, right-padded to `max_length`.
pub fn fake_batch<B: Backend, R: Rng + ?Sized>(
    generator:  &Generator<B>,
    count:      usize,
    max_length: usize,
    rng:        &mut R,
) -> Result<Vec<Vec<usize>>> {
    (0..count)
        .map(|_| {
            let mut row = Vec::with_capacity(max_length);
            row.push(START_INDEX);
            row.extend(sample_tokens(generator, max_length, 1.0, rng)?);
            row.resize(max_length, PAD_INDEX);
            Ok(row)
        })
        .collect()
}

/// Output of `relaxed_rollout`.
pub struct Rollout<B: Backend> {
    /// [batch, max_length, vocab]; row 0 of every sequence is the one-hot `<s>`.
    pub soft:   Tensor<B, 3>,
    /// Hard tokens behind each relaxed step (argmax of the perturbed logits).
    pub tokens: Vec<Vec<usize>>,
}

/// Gumbel-softmax rollout of `count` sequences of exactly `max_length` steps.
///
/// Each step adds Gumbel noise g to the logits, takes the hard token
/// as argmax(logits + g) and feeds softmax((logits + g) / tau) back
/// into the generator. Once a row has produced `</s>` its remaining
/// steps are a constant one-hot `<PAD>`, so they carry no gradient.
pub fn relaxed_rollout<B: Backend, R: Rng + ?Sized>(
    generator:  &Generator<B>,
    count:      usize,
    max_length: usize,
    tau:        f64,
    rng:        &mut R,
) -> Result<Rollout<B>> {
    let device = generator.device();
    let vocab  = generator.vocab_size();

    let mut input    = one_hot_rows::<B>(START_INDEX, count, vocab, &device);
    let mut steps    = vec![input.clone()];
    let mut tokens   = vec![vec![START_INDEX]; count];
    let mut finished = vec![false; count];
    let mut state    = None;

    for _ in 1..max_length {
        if finished.iter().all(|&f| f) {
            steps.push(one_hot_rows::<B>(PAD_INDEX, count, vocab, &device));
            tokens.iter_mut().for_each(|row| row.push(PAD_INDEX));
            continue;
        }

        let (logits, next) = generator.step_soft(input, state);
        state = Some(next);

        let noise     = gumbel_noise(count * vocab, rng);
        let perturbed = logits + Tensor::from_data(TensorData::new(noise, [count, vocab]), &device);
        let values    = to_f32_vec(perturbed.clone())?;
        let relaxed   = softmax(perturbed.div_scalar(tau), 1);

        let mut keep = vec![1.0f32; count * vocab];
        let mut fill = vec![0.0f32; count * vocab];
        for row in 0..count {
            let span = row * vocab..(row + 1) * vocab;
            if finished[row] {
                keep[span].fill(0.0);
                fill[row * vocab + PAD_INDEX] = 1.0;
                tokens[row].push(PAD_INDEX);
                continue;
            }
            let token = argmax(&values[span]);
            tokens[row].push(token);
            finished[row] = token == END_INDEX;
        }

        let keep = Tensor::from_data(TensorData::new(keep, [count, vocab]), &device);
        let fill = Tensor::from_data(TensorData::new(fill, [count, vocab]), &device);
        let step = relaxed * keep + fill;
        steps.push(step.clone());
        input = step;
    }

    let soft = Tensor::cat(
        steps.into_iter().map(|s| s.unsqueeze_dim::<3>(1)).collect(),
        1,
    );
    Ok(Rollout { soft, tokens })
}

/// Unnormalised softmax(logits / T) weights, computed on the host in f64.
///
/// `None` when the distribution has collapsed onto one token or cannot
/// be formed; the caller then takes the argmax.
fn temperature_weights(logits: &[f32], temperature: f64) -> Option<Vec<f64>> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
    if !max.is_finite() {
        return None;
    }
    let weights: Vec<f64> = logits
        .iter()
        .map(|&l| ((l as f64 - max) / temperature).exp())
        .collect();
    let mass: f64 = weights.iter().sum();
    // a mass of exactly 1.0 means only the maximum survived the scaling
    if !mass.is_finite() || mass <= 1.0 || weights.iter().any(|w| !w.is_finite()) {
        return None;
    }
    Some(weights)
}

pub fn check_temperature(temperature: f64) -> Result<()> {
    if temperature.is_finite() && temperature > 0.0 {
        Ok(())
    } else {
        Err(GanError::InvalidTemperature(temperature))
    }
}

fn one_hot_rows<B: Backend>(index: usize, count: usize, vocab: usize, device: &B::Device) -> Tensor<B, 2> {
    let mut values = vec![0.0f32; count * vocab];
    for row in 0..count {
        values[row * vocab + index] = 1.0;
    }
    Tensor::from_data(TensorData::new(values, [count, vocab]), device)
}

/// Standard Gumbel noise: -ln(-ln(u)), u ~ U(0, 1).
fn gumbel_noise<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<f32> {
    (0..len)
        .map(|_| {
            let u: f64 = rng.gen_range(f64::MIN_POSITIVE..1.0);
            -(-u.ln()).ln() as f32
        })
        .collect()
}

fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
        .0
}

fn to_f32_vec<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| GanError::Sampling(format!("cannot read tensor: {e:?}")))
}
