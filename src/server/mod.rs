//! HTTP adapter
//!
//! Serves the loaded [`Predictor`](crate::predictor::Predictor) over a small
//! JSON API:
//! - `GET /` liveness check
//! - `POST /predict` price for one property

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use handlers::{parse_feature_row, round_price};
pub use state::AppState;

use crate::predictor::Predictor;
use crate::training::TrainingConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the model bundle
    pub model_dir: PathBuf,
    /// Dataset used when the bundle has to be trained first
    pub dataset_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5001),
            model_dir: std::env::var("MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./model")),
            dataset_path: std::env::var("DATASET_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./dataset.csv")),
        }
    }
}

impl ServerConfig {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = dir.into();
        self
    }

    pub fn with_dataset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset_path = path.into();
        self
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    /// Training settings pointing at this server's dataset and bundle
    pub fn training_config(&self) -> TrainingConfig {
        TrainingConfig::default()
            .with_dataset_path(self.dataset_path.clone())
            .with_model_dir(self.model_dir.clone())
    }
}

/// Serve `predictor` until ctrl+c
pub async fn run_server(config: ServerConfig, predictor: Predictor) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();

    let state = Arc::new(AppState::new(config.clone(), predictor));
    let app = create_router(state, &config);

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        address = %addr,
        model_dir = %config.model_dir.display(),
        pid = std::process::id(),
        started_at = %start_time.to_rfc3339(),
        "Server listening"
    );

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl+c");
            return;
        }
        let uptime = chrono::Utc::now().signed_duration_since(start_time);
        info!(uptime_secs = uptime.num_seconds(), "Shutdown signal received, stopping server");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_and_addr() {
        let config = ServerConfig::default()
            .with_host("127.0.0.1")
            .with_port(5001)
            .with_model_dir("/tmp/model")
            .with_dataset_path("/tmp/data.csv");

        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:5001");

        let training = config.training_config();
        assert_eq!(training.model_dir, PathBuf::from("/tmp/model"));
        assert_eq!(training.dataset_path, PathBuf::from("/tmp/data.csv"));
    }

    #[test]
    fn test_bad_host_is_rejected() {
        let config = ServerConfig::default().with_host("not a host");
        assert!(config.socket_addr().is_err());
    }
}
