//! HTTP request handlers
//!
//! Every generation response carries a story: on failure the body
//! holds a fallback and an `error` field, with status 500.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::application::{
    generate_use_case::{respond, status, ModelStatus},
    train_use_case::TrainUseCase,
};
use crate::domain::{
    story::{clamp_temperature, GenerationOutcome, StoryResponse, DEFAULT_TEMPERATURE},
    traits::StoryTeller,
};
use crate::server::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct GenerateParams {
    /// Kept as text so a malformed value becomes a fallback, not a 400.
    pub temperature: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RetrainRequest {
    pub epochs:           Option<usize>,
    pub batch_size:       Option<usize>,
    pub lr_generator:     Option<f64>,
    pub lr_discriminator: Option<f64>,
    pub seed:             Option<u64>,
    /// Train on these stories instead of the configured corpus.
    pub stories:          Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RetrainResponse {
    pub status: String,
    pub epochs: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d_loss: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub g_loss: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error:  Option<String>,
}

impl RetrainResponse {
    fn failed(error: String) -> Self {
        Self { status: "error".into(), epochs: 0, d_loss: None, g_loss: None, error: Some(error) }
    }
}

/// GET /generate_story
pub async fn generate_story(
    State(state): State<AppState>,
    Query(params): Query<GenerateParams>,
) -> (StatusCode, Json<StoryResponse>) {
    let requested = match params.temperature.as_deref().map(str::parse::<f64>) {
        None => Ok(DEFAULT_TEMPERATURE),
        Some(Ok(t)) => Ok(t),
        Some(Err(e)) => Err(format!("invalid temperature: {e}")),
    };

    let (outcome, temperature) = match requested {
        Ok(t) => {
            let temperature = clamp_temperature(t);
            (tell_with_timeout(&state, temperature).await, temperature)
        }
        Err(reason) => (GenerationOutcome::Failed(reason), DEFAULT_TEMPERATURE),
    };

    let code = match outcome {
        GenerationOutcome::ModelAbsent | GenerationOutcome::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        GenerationOutcome::Generated(_) | GenerationOutcome::TooShort => StatusCode::OK,
    };
    (code, Json(respond(outcome, temperature)))
}

/// Bounds how long the response waits, not the generation itself:
/// a timed-out worker keeps sampling, and keeps the model lock, until
/// it finishes, so requests arriving meanwhile queue behind it.
async fn tell_with_timeout(state: &AppState, temperature: f64) -> GenerationOutcome {
    let handle = state.handle.clone();
    let work = tokio::task::spawn_blocking(move || handle.tell(temperature));
    match tokio::time::timeout(state.timeout(), work).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            tracing::error!("Generation task failed: {}", e);
            GenerationOutcome::Failed(format!("generation task failed: {e}"))
        }
        Err(_) => {
            tracing::warn!(
                "Generation exceeded {:?}; answering with a fallback while the worker runs on \
                 and holds the model until it finishes",
                state.timeout()
            );
            GenerationOutcome::Failed(format!("generation timed out after {:?}", state.timeout()))
        }
    }
}

/// GET /model_status
pub async fn model_status(State(state): State<AppState>) -> (StatusCode, Json<ModelStatus>) {
    (StatusCode::OK, Json(status(state.handle.is_loaded())))
}

/// GET /health
pub async fn health() -> (StatusCode, Json<HealthResponse>) {
    (StatusCode::OK, Json(HealthResponse { status: "healthy".into() }))
}

/// POST /admin/retrain
pub async fn retrain(
    State(state): State<AppState>,
    Json(req): Json<RetrainRequest>,
) -> (StatusCode, Json<RetrainResponse>) {
    let Some(guard) = state.begin_retrain() else {
        return (StatusCode::CONFLICT, Json(RetrainResponse::failed("a retrain is already running".into())));
    };

    let mut cfg = state.config.retrain.clone();
    cfg.checkpoint = state.config.checkpoint.display().to_string();
    cfg.epochs = req.epochs.unwrap_or(cfg.epochs);
    cfg.batch_size = req.batch_size.unwrap_or(cfg.batch_size);
    cfg.lr_generator = req.lr_generator.unwrap_or(cfg.lr_generator);
    cfg.lr_discriminator = req.lr_discriminator.unwrap_or(cfg.lr_discriminator);
    cfg.seed = req.seed.or(cfg.seed);
    let stories = req.stories;

    tracing::info!("Retraining for {} epochs", cfg.epochs);
    let result = tokio::task::spawn_blocking(move || {
        let _guard = guard;
        match stories {
            Some(stories) => TrainUseCase::with_stories(cfg, stories).execute(),
            None => TrainUseCase::new(cfg).execute(),
        }
    })
    .await;

    match result {
        Ok(Ok(summary)) => {
            let last = summary.report.last().copied();
            let epochs = summary.report.epochs.len();
            state.handle.swap(summary.model);
            tracing::info!("Retrained model is now being served");
            (
                StatusCode::OK,
                Json(RetrainResponse {
                    status: "ok".into(),
                    epochs,
                    d_loss: last.map(|l| l.d_loss),
                    g_loss: last.map(|l| l.g_loss),
                    error:  None,
                }),
            )
        }
        Ok(Err(e)) => {
            tracing::error!("Retrain failed: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(RetrainResponse::failed(format!("{e:#}"))))
        }
        Err(e) => {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(RetrainResponse::failed(format!("retrain task failed: {e}"))))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::model_handle::ModelHandle;
    use crate::domain::story::{StoryMethod, ERROR_FALLBACK, FALLBACK_STORIES, MAX_TEMPERATURE};
    use crate::server::ServerConfig;

    fn test_state() -> AppState {
        AppState::new(ServerConfig::default(), ModelHandle::empty())
    }

    fn params(t: Option<&str>) -> Query<GenerateParams> {
        Query(GenerateParams { temperature: t.map(str::to_string) })
    }

    #[tokio::test]
    async fn test_health() {
        let (status, Json(body)) = health().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "healthy");
    }

    #[tokio::test]
    async fn test_model_status_without_model() {
        let (status, Json(body)) = model_status(State(test_state())).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body.model_loaded);
        assert!(body.model_type.is_none());
    }

    #[tokio::test]
    async fn test_generate_without_model_serves_fallback() {
        let (status, Json(body)) = generate_story(State(test_state()), params(Some("3.5"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.method, StoryMethod::Fallback);
        assert!(FALLBACK_STORIES.contains(&body.story.as_str()));
        assert_eq!(body.temperature, MAX_TEMPERATURE);
        assert!(body.error.is_some());
    }

    #[tokio::test]
    async fn test_unparseable_temperature_is_an_error_fallback() {
        let (status, Json(body)) = generate_story(State(test_state()), params(Some("warm"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.story, ERROR_FALLBACK);
    }

    #[tokio::test]
    async fn test_generation_timeout_answers_with_fallback() {
        let mut config = ServerConfig::default();
        config.timeout_secs = 0;
        let state = AppState::new(config, ModelHandle::empty());

        // a busy model: the worker blocks on the lock past the deadline
        let busy = state.handle.hold();
        let (status, Json(body)) = generate_story(State(state.clone()), params(None)).await;
        drop(busy);

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.story, ERROR_FALLBACK);
        assert!(body.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_retrain_rejected_while_running() {
        let state = test_state();
        let _busy = state.begin_retrain().unwrap();
        let (status, Json(body)) = retrain(State(state), Json(RetrainRequest::default())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.status, "error");
    }

    #[tokio::test]
    async fn test_retrain_swaps_in_a_model() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServerConfig::default();
        config.checkpoint = dir.path().join("model.mpk");
        config.retrain.vocab_size = 100;
        config.retrain.embedding_dim = 8;
        config.retrain.hidden_dim = 8;
        config.retrain.num_layers = 1;
        config.retrain.max_length = 40;
        config.retrain.samples = 0;
        let state = AppState::new(config, ModelHandle::empty());

        let req = RetrainRequest { epochs: Some(1), batch_size: Some(2), seed: Some(5), ..Default::default() };
        let (status, Json(body)) = retrain(State(state.clone()), Json(req)).await;

        assert_eq!(status, StatusCode::OK, "{:?}", body.error);
        assert_eq!(body.epochs, 1);
        assert!(state.handle.is_loaded());
        assert!(dir.path().join("model.mpk").is_file());

        let (_, Json(status_body)) = model_status(State(state)).await;
        assert!(status_body.model_loaded);
    }
}
