//! Application state shared across handlers

use super::ServerConfig;
use crate::predictor::Predictor;
use std::sync::Arc;

/// Read-only after startup, so no locking
pub struct AppState {
    pub config: ServerConfig,
    pub predictor: Arc<Predictor>,
}

impl AppState {
    pub fn new(config: ServerConfig, predictor: Predictor) -> Self {
        Self {
            config,
            predictor: Arc::new(predictor),
        }
    }
}
