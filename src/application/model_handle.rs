// ============================================================
// Layer 2 — Model Handle
// ============================================================
// The one place a loaded model lives while serving.
//
//   startup ─▶ load checkpoint ─▶ Some(model) | None
//   request ─▶ lock ─▶ sample ─▶ GenerationOutcome
//   retrain ─▶ train elsewhere ─▶ lock ─▶ swap
//
// Cloning a handle shares the same slot. Generation holds the
// lock for the whole sample, so a swap never lands mid-story.

use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::domain::{story::GenerationOutcome, traits::StoryTeller};
use crate::error::Result;
use crate::ml::{device, gan::StoryGan, InferBackend};

type ServedModel = StoryGan<InferBackend>;

#[derive(Clone, Default)]
pub struct ModelHandle {
    slot: Arc<Mutex<Option<ServedModel>>>,
}

impl ModelHandle {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_model(model: ServedModel) -> Self {
        Self { slot: Arc::new(Mutex::new(Some(model))) }
    }

    /// Load the checkpoint at `path`. A missing file gives an empty handle.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(match StoryGan::load(path, &device())? {
            Some(model) => Self::with_model(model),
            None => Self::empty(),
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.lock().is_some()
    }

    /// Install `model`, returning whatever was loaded before.
    pub fn swap(&self, model: ServedModel) -> Option<ServedModel> {
        self.lock().replace(model)
    }

    /// Sample one story with the caller's RNG.
    pub fn generate_with<R: Rng + ?Sized>(&self, temperature: f64, rng: &mut R) -> GenerationOutcome {
        let guard = self.lock();
        let Some(model) = guard.as_ref() else {
            return GenerationOutcome::ModelAbsent;
        };
        match model.generate(temperature, rng) {
            Ok(raw) => GenerationOutcome::from_raw(&raw),
            Err(e) => {
                tracing::warn!("Generation failed: {}", e);
                GenerationOutcome::Failed(e.to_string())
            }
        }
    }

    /// Keep the model locked, as an in-flight generation would.
    #[cfg(test)]
    pub(crate) fn hold(&self) -> MutexGuard<'_, Option<ServedModel>> {
        self.lock()
    }

    // A panic while holding the lock cannot leave a half-swapped
    // model behind, so a poisoned slot is still usable.
    fn lock(&self) -> MutexGuard<'_, Option<ServedModel>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StoryTeller for ModelHandle {
    fn tell(&self, temperature: f64) -> GenerationOutcome {
        self.generate_with(temperature, &mut StdRng::from_entropy())
    }
}
