// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between raw story text and Int tensors:
//
//   corpus file / sample stories
//       │
//       ▼
//   TextCorpusLoader / SampleCorpus  → cleaned stories
//       │
//       ▼
//   CjkSegmenter                     → word-like tokens
//       │
//       ▼
//   Vocabulary (domain)              → token indices
//       │
//       ▼
//   SequenceEncoder / pad_batch      → padded training matrix
//       │
//       ▼
//   SequenceBatcher                  → [batch, seq_len] Int tensor

/// Reads corpus files and the built-in sample stories
pub mod loader;

/// Cleans raw corpus text
pub mod preprocessor;

/// tokenizers-backed CJK word segmentation
pub mod segmenter;

/// Text → index sequences, padding, random row selection
pub mod encoder;

/// Index rows → Burn Int tensors
pub mod batcher;
