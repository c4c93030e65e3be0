// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// Seams between the layers:
//   - CorpusSource: where training stories come from
//     (text file, built-in sample set)
//   - Segmenter: how raw text becomes word-like tokens
//     (tokenizers-backed CJK segmenter today; a dictionary
//     segmenter could be dropped in later)
//   - StoryTeller: anything that turns a temperature into a
//     GenerationOutcome (the loaded model handle, a stub in tests)

use anyhow::Result;

use crate::domain::story::GenerationOutcome;

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Any component that can provide training stories.
pub trait CorpusSource {
    /// One story per element, already cleaned.
    fn load_all(&self) -> Result<Vec<String>>;
}

// ─── Segmenter ────────────────────────────────────────────────────────────────
/// Splits text into the units the vocabulary is built from.
pub trait Segmenter {
    fn segment(&self, text: &str) -> crate::error::Result<Vec<String>>;
}

// ─── StoryTeller ──────────────────────────────────────────────────────────────
/// Produces a story outcome for a (clamped) temperature.
/// Never substitutes fallback text itself.
pub trait StoryTeller {
    fn tell(&self, temperature: f64) -> GenerationOutcome;
}
