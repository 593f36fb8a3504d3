//! Load-time validation of collection configurations.
//!
//! Catches configuration mistakes before any record is processed:
//! duplicate or undefined data-source references, ambiguous value-source
//! modes, and identifier parts that could silently fall back to defaults.

use std::collections::HashSet;

use crate::config::{CollectionUpdateConfig, FieldMapping, TRIGGER_SOURCE};
use crate::errors::UpdateError;

/// Validate one collection configuration.
pub fn validate_collection(config: &CollectionUpdateConfig) -> Result<(), UpdateError> {
    let collection = &config.collection_name;

    if collection.is_empty() {
        return Err(UpdateError::configuration("collection name must not be empty"));
    }
    if config.batch_size == 0 {
        return Err(UpdateError::configuration(format!(
            "collection '{collection}': batch_size must be at least 1"
        )));
    }

    let mut source_names = HashSet::new();
    for source in &config.data_sources {
        if source.name.is_empty() {
            return Err(UpdateError::configuration(format!(
                "collection '{collection}': data source with empty name"
            )));
        }
        if source.name == TRIGGER_SOURCE {
            return Err(UpdateError::configuration(format!(
                "collection '{collection}': data source name '{TRIGGER_SOURCE}' is reserved"
            )));
        }
        if !source_names.insert(source.name.as_str()) {
            return Err(UpdateError::configuration(format!(
                "collection '{collection}': duplicate data source name '{}'",
                source.name
            )));
        }
        if source.provider.is_empty() || source.operation.is_empty() {
            return Err(UpdateError::configuration(format!(
                "collection '{collection}': data source '{}' must set provider and operation",
                source.name
            )));
        }
    }

    if config.identifier.parts.is_empty() {
        return Err(UpdateError::configuration(format!(
            "collection '{collection}': identifier must have at least one part"
        )));
    }
    for part in &config.identifier.parts {
        validate_mapping(collection, part, &source_names, "identifier part")?;
        if part.default_value.is_some() {
            return Err(UpdateError::configuration(format!(
                "collection '{collection}': identifier part '{}' must not set a default value",
                part.field
            )));
        }
    }

    for mapping in &config.field_mappings {
        validate_mapping(collection, mapping, &source_names, "field mapping")?;
    }

    Ok(())
}

/// Validate one mapping: a non-empty target field, exactly one value-source
/// mode, and only defined data-source references in its paths.
fn validate_mapping(
    collection: &str,
    mapping: &FieldMapping,
    source_names: &HashSet<&str>,
    role: &str,
) -> Result<(), UpdateError> {
    if mapping.field.is_empty() {
        return Err(UpdateError::configuration(format!(
            "collection '{collection}': {role} with empty target field"
        )));
    }

    let modes = usize::from(mapping.static_value.is_some())
        + usize::from(mapping.trigger_path.is_some())
        + usize::from(mapping.source_path.is_some())
        + usize::from(!mapping.source_paths.is_empty());
    if modes != 1 {
        return Err(UpdateError::configuration(format!(
            "collection '{collection}': {role} '{}' must set exactly one of \
             static_value, trigger_path, source_path, source_paths (found {modes})",
            mapping.field
        )));
    }

    let referenced = mapping
        .source_path
        .iter()
        .chain(mapping.source_paths.iter());
    for path in referenced {
        let head = path.split('.').next().unwrap_or_default();
        if head != TRIGGER_SOURCE && !source_names.contains(head) {
            return Err(UpdateError::configuration(format!(
                "collection '{collection}': {role} '{}' references undefined data source '{head}'",
                mapping.field
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpdateConfigStore;

    fn load(yaml: &str) -> Result<UpdateConfigStore, UpdateError> {
        UpdateConfigStore::from_yaml_str(yaml)
    }

    #[test]
    fn test_duplicate_source_names_rejected() {
        let error = load(
            r#"
collections:
  orders:
    identifier:
      parts:
        - field: orderId
          trigger_path: orderId
    data_sources:
      - {name: order, provider: dao, operation: find}
      - {name: order, provider: dao, operation: find_other}
"#,
        )
        .unwrap_err();

        assert!(error.to_string().contains("duplicate data source name"));
    }

    #[test]
    fn test_undefined_source_reference_rejected() {
        let error = load(
            r#"
collections:
  orders:
    identifier:
      parts:
        - field: orderId
          source_path: order.orderId
"#,
        )
        .unwrap_err();

        assert!(error.to_string().contains("undefined data source 'order'"));
    }

    #[test]
    fn test_trigger_source_reference_is_allowed() {
        load(
            r#"
collections:
  orders:
    identifier:
      parts:
        - field: orderId
          source_path: trigger.orderId
"#,
        )
        .unwrap();
    }

    #[test]
    fn test_two_value_source_modes_rejected() {
        let error = load(
            r#"
collections:
  orders:
    identifier:
      parts:
        - field: orderId
          trigger_path: orderId
    field_mappings:
      - field: status
        static_value: NEW
        trigger_path: status
"#,
        )
        .unwrap_err();

        assert!(error.to_string().contains("exactly one of"));
    }

    #[test]
    fn test_no_value_source_mode_rejected() {
        let error = load(
            r#"
collections:
  orders:
    identifier:
      parts:
        - field: orderId
          trigger_path: orderId
    field_mappings:
      - field: status
"#,
        )
        .unwrap_err();

        assert!(error.to_string().contains("exactly one of"));
    }

    #[test]
    fn test_identifier_part_with_default_rejected() {
        let error = load(
            r#"
collections:
  orders:
    identifier:
      parts:
        - field: orderId
          trigger_path: orderId
          default_value: UNKNOWN
"#,
        )
        .unwrap_err();

        assert!(error.to_string().contains("must not set a default value"));
    }

    #[test]
    fn test_empty_identifier_rejected() {
        let error = load(
            r#"
collections:
  orders:
    identifier:
      parts: []
"#,
        )
        .unwrap_err();

        assert!(error.to_string().contains("at least one part"));
    }

    #[test]
    fn test_reserved_source_name_rejected() {
        let error = load(
            r#"
collections:
  orders:
    identifier:
      parts:
        - field: orderId
          trigger_path: orderId
    data_sources:
      - {name: trigger, provider: dao, operation: find}
"#,
        )
        .unwrap_err();

        assert!(error.to_string().contains("reserved"));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let error = load(
            r#"
collections:
  orders:
    batch_size: 0
    identifier:
      parts:
        - field: orderId
          trigger_path: orderId
"#,
        )
        .unwrap_err();

        assert!(error.to_string().contains("batch_size"));
    }
}
