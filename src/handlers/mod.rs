//! HTTP request handlers for the Pentamind API

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use crate::pipeline::Pipeline;
use crate::providers::ProviderRegistry;
use std::sync::Arc;

pub mod health;
pub mod infer;
pub mod metrics;
pub mod run;

/// Application state shared across all handlers
///
/// All fields are Arc'd for cheap cloning across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    pipeline: Arc<Pipeline>,
    metrics: Arc<Metrics>,
}

impl AppState {
    /// Create a new AppState, building provider adapters from configuration
    ///
    /// # Errors
    /// Returns an error if the metrics registry cannot be created.
    pub fn new(config: Config) -> AppResult<Self> {
        let registry = ProviderRegistry::from_config(&config);
        Self::with_registry(config, registry)
    }

    /// Create a new AppState over an explicit provider registry
    ///
    /// Tests use this to install scripted adapters.
    pub fn with_registry(config: Config, registry: ProviderRegistry) -> AppResult<Self> {
        let metrics = Arc::new(
            Metrics::new()
                .map_err(|e| AppError::Internal(format!("Failed to initialize metrics: {}", e)))?,
        );
        let config = Arc::new(config);
        let pipeline = Arc::new(Pipeline::from_config(
            config.clone(),
            registry,
            metrics.clone(),
        ));

        Ok(Self {
            config,
            pipeline,
            metrics,
        })
    }

    /// Get reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get reference to the pipeline
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Get reference to the metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}
