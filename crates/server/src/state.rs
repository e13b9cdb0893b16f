use std::sync::Arc;
use reliefmap_core::{Config, CountryCatalog, MapPipeline};

/// Shared application state
pub struct AppState {
    config: Config,
    pipeline: Arc<MapPipeline>,
}

impl AppState {
    pub fn new(config: Config, pipeline: Arc<MapPipeline>) -> Self {
        Self { config, pipeline }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pipeline(&self) -> &MapPipeline {
        self.pipeline.as_ref()
    }

    pub fn catalog(&self) -> &CountryCatalog {
        self.pipeline.catalog()
    }
}
