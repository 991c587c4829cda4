//! Application state management

use async_trait::async_trait;
use scout_core::ScoutConfig;
use scout_pipeline::{PipelineController, PipelineResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Builds a controller for the keys supplied with a request
#[async_trait]
pub trait ControllerFactory: Send + Sync {
    async fn create(&self, search_key: &str, llm_key: &str) -> PipelineResult<PipelineController>;
}

/// Network-backed controllers built from the server configuration
pub struct ConfiguredFactory {
    config: ScoutConfig,
}

impl ConfiguredFactory {
    pub fn new(config: ScoutConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ControllerFactory for ConfiguredFactory {
    async fn create(&self, search_key: &str, llm_key: &str) -> PipelineResult<PipelineController> {
        let mut config = self.config.clone();
        config.search.api_key = Some(search_key.to_string());
        config.llm.api_key = Some(llm_key.to_string());
        PipelineController::from_config(&config).await
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ScoutConfig>,
    pub factory: Arc<dyn ControllerFactory>,
    busy: Arc<AtomicBool>,
}

/// Holds the single-flight slot; releases it on drop
pub struct SearchSlot {
    busy: Arc<AtomicBool>,
}

impl Drop for SearchSlot {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

impl AppState {
    pub fn new(config: ScoutConfig) -> Self {
        let factory = Arc::new(ConfiguredFactory::new(config.clone()));
        Self::with_factory(config, factory)
    }

    pub fn with_factory(config: ScoutConfig, factory: Arc<dyn ControllerFactory>) -> Self {
        Self {
            config: Arc::new(config),
            factory,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Claim the single search slot, or `None` when a search is already running
    pub fn try_begin_search(&self) -> Option<SearchSlot> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SearchSlot {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_flight_slot() {
        let state = AppState::new(ScoutConfig::default());

        let slot = state.try_begin_search().unwrap();
        assert!(state.is_busy());
        assert!(state.try_begin_search().is_none());

        drop(slot);
        assert!(!state.is_busy());
        assert!(state.try_begin_search().is_some());
    }
}
