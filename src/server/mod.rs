// ============================================================
// Layer 1b — HTTP Serving
// ============================================================
// A small axum service in front of the ModelHandle:
//
//   GET  /generate_story?temperature=0.8   story or fallback
//   GET  /model_status                     is a model loaded?
//   GET  /health                           liveness
//   POST /admin/retrain                    train, save, swap
//
// Model work runs on tokio's blocking pool. A generation response
// waits at most `timeout_secs`; retraining is not bounded, but only
// one retrain may run at a time.

pub mod handlers;

use std::{
    net::SocketAddr,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};

use crate::application::{model_handle::ModelHandle, train_use_case::TrainConfig};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address:      SocketAddr,
    pub checkpoint:   PathBuf,
    /// How long a generation response waits before falling back.
    pub timeout_secs: u64,
    /// Architecture and defaults used by /admin/retrain.
    pub retrain:      TrainConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let retrain = TrainConfig::default();
        Self {
            address:      SocketAddr::from(([0, 0, 0, 0], 5000)),
            checkpoint:   PathBuf::from(&retrain.checkpoint),
            timeout_secs: 30,
            retrain,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub handle:     ModelHandle,
    pub config:     Arc<ServerConfig>,
    pub retraining: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(config: ServerConfig, handle: ModelHandle) -> Self {
        Self {
            handle,
            config:     Arc::new(config),
            retraining: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    /// Claim the single retrain slot; released when the guard drops.
    pub fn begin_retrain(&self) -> Option<RetrainGuard> {
        self.retraining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RetrainGuard(self.retraining.clone()))
    }
}

pub struct RetrainGuard(Arc<AtomicBool>);

impl Drop for RetrainGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/generate_story", get(handlers::generate_story))
        .route("/model_status", get(handlers::model_status))
        .route("/health", get(handlers::health))
        .route("/admin/retrain", post(handlers::retrain))
        .with_state(state)
}

/// Load the checkpoint (if any) and serve until the process stops.
pub async fn run(config: ServerConfig) -> Result<()> {
    tracing::info!("Loading story model from '{}'", config.checkpoint.display());
    let handle = match ModelHandle::load(&config.checkpoint) {
        Ok(handle) if handle.is_loaded() => {
            tracing::info!("Model loaded successfully");
            handle
        }
        Ok(handle) => {
            tracing::warn!("Model not found. Please train the model first.");
            handle
        }
        Err(e) => {
            tracing::error!("Error loading model: {}", e);
            ModelHandle::empty()
        }
    };

    let address = config.address;
    let app = router(AppState::new(config, handle));
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("Cannot bind {address}"))?;
    tracing::info!("Serving on http://{}", address);
    axum::serve(listener, app).await.context("Server stopped with an error")?;
    Ok(())
}
