// ============================================================
// Layer 4 — Sequence Encoder
// ============================================================
// text  ──segment──▶ tokens ──vocab──▶ [<s>, i1, i2, …, </s>]
//
// `pad_batch` then turns a list of such sequences into a
// rectangular matrix:
//   - sequences longer than max_length are dropped (not cut)
//   - the rest are right-padded with <PAD>=0 to the longest
//     surviving sequence
//   - if nothing survives the result is EmptyBatch, never an
//     empty matrix

use rand::{seq::index, Rng};

use crate::domain::traits::Segmenter;
use crate::domain::vocabulary::{Vocabulary, END_INDEX, PAD_INDEX, START_INDEX};
use crate::error::{GanError, Result};

pub struct SequenceEncoder<'a, S: Segmenter + ?Sized> {
    vocab:     &'a Vocabulary,
    segmenter: &'a S,
}

impl<'a, S: Segmenter + ?Sized> SequenceEncoder<'a, S> {
    pub fn new(vocab: &'a Vocabulary, segmenter: &'a S) -> Self {
        Self { vocab, segmenter }
    }

    /// Encode one text, bracketed by the start and end markers.
    pub fn encode(&self, text: &str) -> Result<Vec<usize>> {
        let tokens = self.segmenter.segment(text)?;
        let mut sequence = Vec::with_capacity(tokens.len() + 2);
        sequence.push(START_INDEX);
        sequence.extend(tokens.iter().map(|t| self.vocab.index_of(t)));
        sequence.push(END_INDEX);
        Ok(sequence)
    }

    /// Encode a whole corpus and pad it into a training matrix.
    pub fn encode_corpus(&self, texts: &[String], max_length: usize) -> Result<PaddedBatch> {
        let sequences = texts
            .iter()
            .map(|t| self.encode(t))
            .collect::<Result<Vec<_>>>()?;
        pad_batch(&sequences, max_length)
    }
}

/// Rectangular batch of token sequences, padded with `PAD_INDEX`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddedBatch {
    rows:  Vec<Vec<usize>>,
    width: usize,
}

impl PaddedBatch {
    pub fn rows(&self) -> &[Vec<usize>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Up to `batch_size` distinct rows chosen uniformly at random.
    pub fn sample_rows<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Vec<Vec<usize>> {
        let amount = batch_size.min(self.rows.len());
        index::sample(rng, self.rows.len(), amount)
            .into_iter()
            .map(|i| self.rows[i].clone())
            .collect()
    }
}

/// Drop over-long sequences and right-pad the rest.
pub fn pad_batch(sequences: &[Vec<usize>], max_length: usize) -> Result<PaddedBatch> {
    let kept: Vec<&Vec<usize>> = sequences.iter().filter(|s| s.len() <= max_length).collect();

    let width = kept
        .iter()
        .map(|s| s.len())
        .max()
        .ok_or(GanError::EmptyBatch { max_length })?;

    let dropped = sequences.len() - kept.len();
    if dropped > 0 {
        tracing::debug!("pad_batch dropped {} sequences longer than {}", dropped, max_length);
    }

    let rows = kept
        .into_iter()
        .map(|s| {
            let mut row = s.clone();
            row.resize(width, PAD_INDEX);
            row
        })
        .collect();

    Ok(PaddedBatch { rows, width })
}
