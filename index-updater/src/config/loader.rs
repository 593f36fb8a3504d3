//! Configuration loading with environment variable substitution.
//!
//! The configuration file is YAML mapping collection names to
//! [`CollectionUpdateConfig`] entries. `${VAR}` references are substituted
//! from the environment before parsing; a missing variable is a
//! configuration error naming every unresolved reference.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::{validator, CollectionUpdateConfig};
use crate::errors::UpdateError;

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid env var regex"));

#[derive(Deserialize)]
struct ConfigFile {
    collections: HashMap<String, CollectionUpdateConfig>,
}

/// Process-wide store of collection update configurations.
///
/// Loaded once at startup; lookups for unconfigured collections fail with
/// a configuration error.
#[derive(Debug)]
pub struct UpdateConfigStore {
    collections: HashMap<String, CollectionUpdateConfig>,
}

impl UpdateConfigStore {
    /// Load and validate configurations from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, UpdateError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            UpdateError::configuration(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate configurations from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, UpdateError> {
        let substituted = substitute_env_vars(yaml)?;
        let file: ConfigFile = serde_yaml::from_str(&substituted)
            .map_err(|e| UpdateError::configuration(format!("invalid config YAML: {e}")))?;

        let mut collections = HashMap::with_capacity(file.collections.len());
        for (name, mut config) in file.collections {
            if config.collection_name.is_empty() {
                config.collection_name = name.clone();
            }
            validator::validate_collection(&config)?;
            debug!(
                collection = %config.collection_name,
                data_sources = config.data_sources.len(),
                field_mappings = config.field_mappings.len(),
                batch_size = config.batch_size,
                "Loaded collection configuration"
            );
            collections.insert(name, config);
        }

        info!(collections = collections.len(), "Configuration store loaded");
        Ok(Self { collections })
    }

    /// Look up the configuration for a collection name.
    pub fn collection(&self, name: &str) -> Result<&CollectionUpdateConfig, UpdateError> {
        self.collections.get(name).ok_or_else(|| {
            UpdateError::configuration(format!("no configuration for collection '{name}'"))
        })
    }

    /// Names of all configured collections.
    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(|name| name.as_str())
    }
}

/// Substitute `${VAR_NAME}` patterns with environment variable values.
pub fn substitute_env_vars(input: &str) -> Result<String, UpdateError> {
    let mut result = input.to_string();
    let mut missing = Vec::new();

    for cap in ENV_VAR_RE.captures_iter(input) {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(value) => {
                result = result.replace(&cap[0], &value);
            }
            Err(_) => missing.push(var_name.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(UpdateError::configuration(format!(
            "missing environment variable(s): {}",
            missing.join(", ")
        )));
    }

    Ok(result)
}
