//! Data-source execution with caching, retries, and result extraction.
//!
//! One executor invocation covers a single configured data source for a
//! single trigger record: cache lookup, positional parameter assembly,
//! retry with backoff, result-path extraction, and the required/optional
//! fault-tolerance policy.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::cache::ResultCache;
use crate::config::{DataSourceDefinition, ResultShape};
use crate::errors::UpdateError;
use crate::provider::{DataProvider, ProviderRegistry};
use crate::resolver;
use index_updater_shared::DataValue;

/// Configuration for the data-source executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Base delay between retry attempts; attempt `n` waits `base * n`.
    pub backoff_base: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            backoff_base: Duration::from_secs(1),
        }
    }
}

/// Executes configured data sources against trigger records.
pub struct DataSourceExecutor {
    registry: Arc<ProviderRegistry>,
    cache: Arc<ResultCache>,
    config: ExecutorConfig,
}

impl DataSourceExecutor {
    /// Create an executor with default configuration.
    pub fn new(registry: Arc<ProviderRegistry>, cache: Arc<ResultCache>) -> Self {
        Self {
            registry,
            cache,
            config: ExecutorConfig::default(),
        }
    }

    /// Create an executor with custom configuration.
    pub fn with_config(
        registry: Arc<ProviderRegistry>,
        cache: Arc<ResultCache>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            registry,
            cache,
            config,
        }
    }

    /// Execute one data source for one trigger record.
    ///
    /// Returns `Ok(Some(value))` on success, `Ok(None)` when the result is
    /// absent or an optional source failed, and `Err` for required-source
    /// failures and configuration errors.
    pub async fn execute(
        &self,
        definition: &DataSourceDefinition,
        trigger: &Value,
    ) -> Result<Option<DataValue>, UpdateError> {
        let trigger_value = DataValue::Json(trigger.clone());

        let cache_key = if definition.cache_ttl_ms > 0 {
            let key = cache_key(definition, &trigger_value);
            if let Some(cached) = self.cache.get(&key) {
                debug!(source = %definition.name, "Returning cached data source result");
                return Ok(Some(cached));
            }
            Some(key)
        } else {
            None
        };

        // Configuration errors surface before any invocation and are
        // never retried.
        let provider = self
            .registry
            .lookup(&definition.provider, &definition.operation)?;

        let params = assemble_params(definition, &trigger_value);
        if provider.arity() != params.len() {
            return Err(UpdateError::configuration(format!(
                "data source '{}': provider '{}.{}' expects {} parameters, configuration supplies {}",
                definition.name,
                definition.provider,
                definition.operation,
                provider.arity(),
                params.len()
            )));
        }

        let raw = match self.invoke_with_retries(definition, &provider, &params).await {
            Ok(raw) => raw,
            Err(message) => {
                if definition.required {
                    return Err(UpdateError::data_source(&definition.name, message));
                }
                warn!(
                    source = %definition.name,
                    error = %message,
                    "Optional data source failed; continuing with absent result"
                );
                return Ok(None);
            }
        };

        let extracted = match &definition.result_path {
            Some(path) if !path.is_empty() => resolver::resolve(&raw, path),
            _ => (!raw.is_absent()).then_some(raw),
        };

        if let (Some(shape), Some(value)) = (definition.result_shape, &extracted) {
            if !matches_shape(value, shape) {
                let message = format!(
                    "result does not match expected shape {shape:?}"
                );
                if definition.required {
                    return Err(UpdateError::data_source(&definition.name, message));
                }
                warn!(source = %definition.name, error = %message, "Discarding mismatched result");
                return Ok(None);
            }
        }

        if let (Some(key), Some(value)) = (cache_key, &extracted) {
            self.cache.put(
                key,
                value.clone(),
                Duration::from_millis(definition.cache_ttl_ms),
            );
        }

        debug!(
            source = %definition.name,
            absent = extracted.is_none(),
            "Data source executed"
        );
        Ok(extracted)
    }

    /// Invoke the provider up to `retry_count + 1` times with backoff.
    async fn invoke_with_retries(
        &self,
        definition: &DataSourceDefinition,
        provider: &Arc<dyn DataProvider>,
        params: &[DataValue],
    ) -> Result<DataValue, String> {
        let attempts = definition.retry_count + 1;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match provider.fetch(params).await {
                Ok(raw) => return Ok(raw),
                Err(e) => {
                    last_error = e.to_string();
                    if attempt < attempts {
                        warn!(
                            source = %definition.name,
                            attempt = attempt,
                            error = %last_error,
                            "Data source attempt failed, retrying"
                        );
                        sleep(self.config.backoff_base * attempt).await;
                    }
                }
            }
        }

        Err(format!("failed after {attempts} attempts: {last_error}"))
    }
}

/// Assemble positional parameters: one value per input field resolved from
/// the trigger record (absent included as null), followed by static
/// parameters in configuration order.
fn assemble_params(definition: &DataSourceDefinition, trigger: &DataValue) -> Vec<DataValue> {
    let mut params =
        Vec::with_capacity(definition.input_fields.len() + definition.static_params.len());
    for field in &definition.input_fields {
        params.push(resolver::resolve(trigger, field).unwrap_or(DataValue::Json(Value::Null)));
    }
    for value in definition.static_params.values() {
        params.push(DataValue::Json(value.clone()));
    }
    params
}

/// Build the cache key: `name + ":" + sorted(inputField=value)` pairs.
fn cache_key(definition: &DataSourceDefinition, trigger: &DataValue) -> String {
    let mut pairs: Vec<String> = definition
        .input_fields
        .iter()
        .map(|field| {
            let rendered = resolver::resolve(trigger, field)
                .and_then(|value| value.render())
                .unwrap_or_else(|| "null".to_string());
            format!("{field}={rendered}")
        })
        .collect();
    pairs.sort();
    format!("{}:{}", definition.name, pairs.join(";"))
}

fn matches_shape(value: &DataValue, shape: ResultShape) -> bool {
    match (shape, value) {
        (ResultShape::List, DataValue::Json(Value::Array(_))) => true,
        (ResultShape::List, _) => false,
        (ResultShape::Map, DataValue::Json(Value::Object(_))) => true,
        (ResultShape::Map, DataValue::Opaque(_)) => true,
        (ResultShape::Map, _) => false,
        (ResultShape::Single, DataValue::Json(Value::Array(_))) => false,
        (ResultShape::Single, _) => true,
    }
}
