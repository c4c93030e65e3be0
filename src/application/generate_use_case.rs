// ============================================================
// Layer 2 — GenerateUseCase
// ============================================================
// Turns a requested temperature into the story a user sees:
//
//   requested T ─▶ clamp [0.1, 2.0] ─▶ StoryTeller ─▶ outcome
//               ─▶ select_story ─▶ StoryResponse (JSON-ready)
//
// Shared by the CLI `generate` command and the HTTP handler.

use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::domain::{
    story::{clamp_temperature, select_story, GenerationOutcome, StoryResponse, DEFAULT_TEMPERATURE},
    traits::StoryTeller,
};

/// Reported by `/model_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelStatus {
    pub model_loaded: bool,
    pub model_type:   Option<String>,
}

/// Printed by the CLI `status` command; web clients read `model_available`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityStatus {
    pub model_available: bool,
    pub model_type:      Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error:           Option<String>,
}

pub const MODEL_TYPE: &str = "Chinese Story GAN";

pub struct GenerateUseCase<T: StoryTeller> {
    teller: T,
}

impl<T: StoryTeller> GenerateUseCase<T> {
    pub fn new(teller: T) -> Self {
        Self { teller }
    }

    /// Clamp, generate and map the outcome to a response.
    ///
    /// `None` uses the default temperature.
    pub fn generate(&self, temperature: Option<f64>) -> StoryResponse {
        let temperature = clamp_temperature(temperature.unwrap_or(DEFAULT_TEMPERATURE));
        let outcome = self.teller.tell(temperature);
        respond(outcome, temperature)
    }
}

/// Map an outcome computed elsewhere (e.g. on a worker thread).
pub fn respond(outcome: GenerationOutcome, temperature: f64) -> StoryResponse {
    select_story(outcome, temperature, &mut StdRng::from_entropy())
}

/// A checkpoint that exists but cannot be read: the error fallback,
/// with no model reported as available.
pub fn respond_unreadable(reason: String, temperature: f64) -> StoryResponse {
    StoryResponse {
        model_available: false,
        ..respond(GenerationOutcome::Failed(reason), temperature)
    }
}

pub fn status(model_loaded: bool) -> ModelStatus {
    ModelStatus {
        model_loaded,
        model_type: model_loaded.then(|| MODEL_TYPE.to_string()),
    }
}

pub fn availability(loaded: std::result::Result<bool, String>) -> AvailabilityStatus {
    match loaded {
        Ok(available) => AvailabilityStatus {
            model_available: available,
            model_type:      available.then(|| MODEL_TYPE.to_string()),
            error:           None,
        },
        Err(error) => AvailabilityStatus { model_available: false, model_type: None, error: Some(error) },
    }
}
