//! Dependency initialization and wiring for the index updater.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::batch::BatchProcessor;
use crate::builder::DocumentBuilder;
use crate::cache::{CacheSweeper, ResultCache, DEFAULT_SWEEP_INTERVAL};
use crate::config::UpdateConfigStore;
use crate::errors::UpdateError;
use crate::executor::DataSourceExecutor;
use crate::provider::ProviderRegistry;
use crate::transform::TransformationRegistry;
use index_updater_repository::{MemorySink, UpdateSink};

/// Default configuration file path.
const DEFAULT_CONFIG_FILE: &str = "config/collections.yaml";

/// Container for all initialized dependencies.
///
/// Must be constructed inside a Tokio runtime: the cache sweeper task is
/// spawned during initialization and stopped through
/// [`Dependencies::shutdown`].
pub struct Dependencies {
    /// Loaded collection configurations.
    pub config_store: UpdateConfigStore,
    /// The configured batch processor ready to run.
    pub processor: BatchProcessor,
    /// Shared data-source result cache.
    pub cache: Arc<ResultCache>,
    sweeper: CacheSweeper,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables, with no
    /// registered providers and an in-memory sink (dry-run mode).
    ///
    /// # Environment Variables
    ///
    /// - `CONFIG_FILE`: collection configuration YAML
    ///   (default: `config/collections.yaml`)
    /// - `CACHE_SWEEP_INTERVAL_SECS`: cache sweep interval (default: 60)
    pub fn new() -> Result<Self, UpdateError> {
        Self::with_components(
            ProviderRegistry::new(),
            TransformationRegistry::with_defaults(),
            Arc::new(MemorySink::new()),
        )
    }

    /// Initialize with caller-supplied providers, transformations, and
    /// sink. Embedding applications register their data providers here.
    pub fn with_components(
        providers: ProviderRegistry,
        transformations: TransformationRegistry,
        sink: Arc<dyn UpdateSink>,
    ) -> Result<Self, UpdateError> {
        let config_file =
            env::var("CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let config_store = UpdateConfigStore::from_file(&PathBuf::from(&config_file))?;
        info!(config_file = %config_file, "Configuration loaded");

        Ok(Self::from_parts(config_store, providers, transformations, sink))
    }

    /// Wire components around an already-loaded configuration store.
    pub fn from_parts(
        config_store: UpdateConfigStore,
        providers: ProviderRegistry,
        transformations: TransformationRegistry,
        sink: Arc<dyn UpdateSink>,
    ) -> Self {
        let sweep_interval = env::var("CACHE_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SWEEP_INTERVAL);

        let cache = Arc::new(ResultCache::new());
        let sweeper = CacheSweeper::spawn(cache.clone(), sweep_interval);

        let executor = DataSourceExecutor::new(Arc::new(providers), cache.clone());
        let builder = DocumentBuilder::new(executor, Arc::new(transformations));
        let processor = BatchProcessor::new(builder, sink);

        info!(
            sweep_interval_secs = sweep_interval.as_secs(),
            "Dependencies initialized"
        );

        Self {
            config_store,
            processor,
            cache,
            sweeper,
        }
    }

    /// Stop the background cache sweeper.
    pub async fn shutdown(self) {
        self.sweeper.stop().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_parts_wires_processor_and_cache() {
        let store = UpdateConfigStore::from_yaml_str(
            r#"
collections:
  orders:
    identifier:
      parts:
        - field: orderId
          trigger_path: orderId
"#,
        )
        .unwrap();

        let deps = Dependencies::from_parts(
            store,
            ProviderRegistry::new(),
            TransformationRegistry::with_defaults(),
            Arc::new(MemorySink::new()),
        );

        assert!(deps.config_store.collection("orders").is_ok());
        assert!(deps.cache.is_empty());
        deps.shutdown().await;
    }
}
