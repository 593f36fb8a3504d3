//! Data provider abstraction and registry.
//!
//! Providers are the callables behind configured data sources. They are
//! registered once at startup under a provider name and operation
//! identifier; looking up an unregistered pair is a configuration error.
//! This replaces the host-framework bean/method reflection of earlier
//! designs with explicit registration.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use index_updater_shared::DataValue;
use thiserror::Error;

use crate::errors::UpdateError;

/// Failure raised by a provider invocation. Subject to the data source's
/// retry policy.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ProviderError {
    message: String,
}

impl ProviderError {
    /// Create a provider error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A callable data provider.
///
/// Parameters are positional: one value per configured input field
/// (absent values passed as JSON null), followed by the static parameters
/// in configuration order.
#[async_trait]
pub trait DataProvider: Send + Sync + std::fmt::Debug {
    /// Number of positional parameters the provider expects.
    fn arity(&self) -> usize;

    /// Invoke the provider with the assembled parameters.
    async fn fetch(&self, params: &[DataValue]) -> Result<DataValue, ProviderError>;
}

/// Adapter exposing a plain closure as a [`DataProvider`].
pub struct FnProvider<F> {
    arity: usize,
    function: F,
}

impl<F> std::fmt::Debug for FnProvider<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnProvider")
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

impl<F> FnProvider<F>
where
    F: Fn(&[DataValue]) -> Result<DataValue, ProviderError> + Send + Sync,
{
    /// Wrap a closure taking `arity` positional parameters.
    pub fn new(arity: usize, function: F) -> Self {
        Self { arity, function }
    }
}

#[async_trait]
impl<F> DataProvider for FnProvider<F>
where
    F: Fn(&[DataValue]) -> Result<DataValue, ProviderError> + Send + Sync,
{
    fn arity(&self) -> usize {
        self.arity
    }

    async fn fetch(&self, params: &[DataValue]) -> Result<DataValue, ProviderError> {
        (self.function)(params)
    }
}

/// Registry mapping provider name and operation to a callable.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, HashMap<String, Arc<dyn DataProvider>>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callable under a provider name and operation identifier.
    /// A later registration for the same pair replaces the earlier one.
    pub fn register(
        &mut self,
        provider: impl Into<String>,
        operation: impl Into<String>,
        callable: Arc<dyn DataProvider>,
    ) {
        self.providers
            .entry(provider.into())
            .or_default()
            .insert(operation.into(), callable);
    }

    /// Look up a callable, failing with a configuration error when the
    /// provider or operation is unknown.
    pub fn lookup(
        &self,
        provider: &str,
        operation: &str,
    ) -> Result<Arc<dyn DataProvider>, UpdateError> {
        let operations = self.providers.get(provider).ok_or_else(|| {
            UpdateError::configuration(format!("unknown provider '{provider}'"))
        })?;
        operations.get(operation).cloned().ok_or_else(|| {
            UpdateError::configuration(format!(
                "provider '{provider}' has no operation '{operation}'"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo_provider() -> Arc<dyn DataProvider> {
        Arc::new(FnProvider::new(1, |params: &[DataValue]| {
            Ok(params[0].clone())
        }))
    }

    #[tokio::test]
    async fn test_register_and_invoke() {
        let mut registry = ProviderRegistry::new();
        registry.register("order_dao", "find_by_id", echo_provider());

        let provider = registry.lookup("order_dao", "find_by_id").unwrap();
        assert_eq!(provider.arity(), 1);

        let result = provider
            .fetch(&[DataValue::Json(json!("O1"))])
            .await
            .unwrap();
        assert_eq!(result, DataValue::json("O1"));
    }

    #[test]
    fn test_unknown_provider_is_configuration_error() {
        let registry = ProviderRegistry::new();

        let error = registry.lookup("missing", "op").unwrap_err();
        assert!(error.is_configuration());
    }

    #[test]
    fn test_unknown_operation_is_configuration_error() {
        let mut registry = ProviderRegistry::new();
        registry.register("order_dao", "find_by_id", echo_provider());

        let error = registry.lookup("order_dao", "missing").unwrap_err();
        assert!(error.is_configuration());
    }

    #[tokio::test]
    async fn test_later_registration_replaces_earlier() {
        let mut registry = ProviderRegistry::new();
        registry.register("dao", "op", echo_provider());
        registry.register(
            "dao",
            "op",
            Arc::new(FnProvider::new(0, |_: &[DataValue]| {
                Ok(DataValue::json("replacement"))
            })),
        );

        let provider = registry.lookup("dao", "op").unwrap();
        assert_eq!(provider.fetch(&[]).await.unwrap(), DataValue::json("replacement"));
    }
}
