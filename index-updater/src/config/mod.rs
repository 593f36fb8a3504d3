//! Declarative configuration for collection updates.
//!
//! One [`CollectionUpdateConfig`] per target collection describes how to
//! assemble partial-update documents: which data sources to invoke, how to
//! compose the document identifier, and how to map resolved values onto
//! index fields. Configurations are loaded once at startup and are
//! immutable afterwards; changes require a process restart.

pub mod dependencies;
pub mod loader;
pub mod validator;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

pub use dependencies::Dependencies;
pub use loader::UpdateConfigStore;

/// Reserved data-source name under which the trigger record itself is
/// available to source paths.
pub const TRIGGER_SOURCE: &str = "trigger";

fn default_true() -> bool {
    true
}

fn default_batch_size() -> usize {
    1000
}

fn default_separator() -> String {
    "_".to_string()
}

fn default_id_field() -> String {
    "id".to_string()
}

/// Configuration for updating one collection.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionUpdateConfig {
    /// Target collection name. Defaults to the key under which the
    /// configuration is registered.
    #[serde(default)]
    pub collection_name: String,
    /// How the composite document identifier is built.
    pub identifier: IdentifierRule,
    /// Field mappings applied in declaration order.
    #[serde(default)]
    pub field_mappings: Vec<FieldMapping>,
    /// Data sources executed per trigger record.
    #[serde(default)]
    pub data_sources: Vec<DataSourceDefinition>,
    /// Values applied to fields not otherwise present in the document.
    #[serde(default)]
    pub default_values: IndexMap<String, Value>,
    /// Fail-fast (`true`) or skip-on-error (`false`) per-record failure
    /// policy.
    #[serde(default = "default_true")]
    pub validate_before_update: bool,
    /// Number of trigger records per sink submission.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

/// Expected shape of a data-source result after extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultShape {
    /// A single value (anything but an ordered sequence).
    Single,
    /// An ordered sequence.
    List,
    /// A keyed map.
    Map,
}

/// One configured data source.
#[derive(Debug, Clone, Deserialize)]
pub struct DataSourceDefinition {
    /// Name, unique within the collection configuration.
    pub name: String,
    /// Provider reference resolved through the provider registry.
    pub provider: String,
    /// Operation identifier on the provider.
    pub operation: String,
    /// Paths into the trigger record supplying positional parameters.
    #[serde(default)]
    pub input_fields: Vec<String>,
    /// Static parameters appended after the input fields, in order.
    #[serde(default)]
    pub static_params: IndexMap<String, Value>,
    /// Expected result shape; mismatches are treated as source failures.
    #[serde(default)]
    pub result_shape: Option<ResultShape>,
    /// Path extracting the useful part of the raw provider result.
    #[serde(default)]
    pub result_path: Option<String>,
    /// Whether a failure of this source is fatal for the record.
    #[serde(default = "default_true")]
    pub required: bool,
    /// Number of retries after the first failed attempt.
    #[serde(default)]
    pub retry_count: u32,
    /// Cache time-to-live in milliseconds; zero disables caching.
    #[serde(default)]
    pub cache_ttl_ms: u64,
}

/// Target type a resolved value is converted to before emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Emit as a string (the default).
    #[default]
    String,
    /// Parse as a 64-bit integer.
    Integer,
    /// Parse as a 64-bit float.
    Double,
    /// Parse as a boolean (`true`/`false`/`1`/`0`).
    Boolean,
    /// Parse as a calendar date or RFC 3339 timestamp, emitted in RFC 3339.
    Date,
}

/// Mapping from resolved values to one target index field.
///
/// Exactly one value-source mode must be set: `static_value`,
/// `trigger_path`, `source_path`, or `source_paths`.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldMapping {
    /// Target field name in the index document.
    pub field: String,
    /// Fixed value, independent of the trigger record.
    #[serde(default)]
    pub static_value: Option<Value>,
    /// Path into the trigger record.
    #[serde(default)]
    pub trigger_path: Option<String>,
    /// Path into the aggregated data (first segment names a data source,
    /// or `trigger`).
    #[serde(default)]
    pub source_path: Option<String>,
    /// Multiple source paths for a composite value; absent paths
    /// contribute an empty string.
    #[serde(default)]
    pub source_paths: Vec<String>,
    /// Separator joining composite values when no combine function is set.
    #[serde(default = "default_separator")]
    pub separator: String,
    /// Named combiner applied to composite values.
    #[serde(default)]
    pub combine_function: Option<String>,
    /// Whether an unresolvable value is fatal for the record.
    #[serde(default)]
    pub required: bool,
    /// Fallback when the value resolves to nothing.
    #[serde(default)]
    pub default_value: Option<Value>,
    /// When non-empty, the transformed value must be one of these.
    #[serde(default)]
    pub allowed_values: Vec<String>,
    /// Target type conversion.
    #[serde(default)]
    pub target_type: FieldType,
    /// Named single-value transform applied before conversion.
    #[serde(default)]
    pub transform: Option<String>,
}

/// How the composite document identifier is assembled.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentifierRule {
    /// Ordered identifier parts. Parts never fall back to defaults.
    pub parts: Vec<FieldMapping>,
    /// Separator used when no composite function is configured.
    #[serde(default = "default_separator")]
    pub separator: String,
    /// Named identifier composer replacing the separator join.
    #[serde(default)]
    pub composite_function: Option<String>,
    /// Document field receiving the identifier.
    #[serde(default = "default_id_field")]
    pub target_field: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_yaml_defaults() {
        let yaml = r#"
identifier:
  parts:
    - field: orderId
      trigger_path: orderId
"#;
        let config: CollectionUpdateConfig = serde_yaml::from_str(yaml).unwrap();

        assert!(config.validate_before_update);
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.identifier.separator, "_");
        assert_eq!(config.identifier.target_field, "id");
        assert!(config.field_mappings.is_empty());
        assert!(config.data_sources.is_empty());
    }

    #[test]
    fn test_data_source_defaults() {
        let yaml = r#"
name: order
provider: order_dao
operation: find_by_id
"#;
        let source: DataSourceDefinition = serde_yaml::from_str(yaml).unwrap();

        assert!(source.required);
        assert_eq!(source.retry_count, 0);
        assert_eq!(source.cache_ttl_ms, 0);
        assert!(source.result_path.is_none());
        assert!(source.result_shape.is_none());
    }

    #[test]
    fn test_field_type_parsing() {
        let mapping: FieldMapping = serde_yaml::from_str(
            r#"
field: amount
source_path: order.amount
target_type: double
"#,
        )
        .unwrap();

        assert_eq!(mapping.target_type, FieldType::Double);
        assert!(!mapping.required);
        assert_eq!(mapping.separator, "_");
    }

    #[test]
    fn test_static_params_preserve_order() {
        let source: DataSourceDefinition = serde_yaml::from_str(
            r#"
name: lookup
provider: dao
operation: find
static_params:
  zeta: "1"
  alpha: "2"
"#,
        )
        .unwrap();

        let keys: Vec<&str> = source.static_params.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }
}
