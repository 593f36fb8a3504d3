//! Document assembly for one trigger record.
//!
//! The builder executes every configured data source into an
//! [`AggregatedContext`], composes the document identifier, resolves each
//! field mapping through transformation and type conversion, and injects
//! configured default values. Failures inside one record never touch
//! another record's context.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use serde_json::{Number, Value};
use tracing::{debug, instrument, warn};

use crate::config::{
    CollectionUpdateConfig, FieldMapping, FieldType, IdentifierRule, TRIGGER_SOURCE,
};
use crate::errors::UpdateError;
use crate::executor::DataSourceExecutor;
use crate::resolver;
use crate::transform::TransformationRegistry;
use index_updater_shared::{DataValue, UpdateDocument};

/// Per-record aggregation of the trigger record and data-source results.
///
/// Keyed by data-source name, with the trigger record under the reserved
/// `trigger` name. Owned exclusively by one build; never shared across
/// records.
pub struct AggregatedContext {
    entries: HashMap<String, Option<DataValue>>,
}

impl AggregatedContext {
    /// Create a context seeded with the trigger record.
    pub fn new(trigger: &Value) -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            TRIGGER_SOURCE.to_string(),
            Some(DataValue::Json(trigger.clone())),
        );
        Self { entries }
    }

    /// Store one data source's result (absent allowed).
    pub fn insert(&mut self, name: impl Into<String>, value: Option<DataValue>) {
        self.entries.insert(name.into(), value);
    }

    /// Resolve a source path whose first segment names a data source (or
    /// `trigger`), with the remaining segments navigating its result.
    pub fn resolve(&self, path: &str) -> Option<DataValue> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let entry = self.entries.get(head)?.as_ref()?;
        match rest {
            None => (!entry.is_absent()).then(|| entry.clone()),
            Some(rest) => resolver::resolve(entry, rest),
        }
    }

    /// Resolve a path relative to the trigger record.
    pub fn resolve_trigger(&self, path: &str) -> Option<DataValue> {
        let entry = self.entries.get(TRIGGER_SOURCE)?.as_ref()?;
        resolver::resolve(entry, path)
    }
}

/// Builds one update document per trigger record.
pub struct DocumentBuilder {
    executor: DataSourceExecutor,
    transformations: Arc<TransformationRegistry>,
}

impl DocumentBuilder {
    /// Create a builder with the given executor and transformations.
    pub fn new(executor: DataSourceExecutor, transformations: Arc<TransformationRegistry>) -> Self {
        Self {
            executor,
            transformations,
        }
    }

    /// Build the update document for one trigger record.
    #[instrument(skip(self, config, trigger), fields(collection = %config.collection_name))]
    pub async fn build(
        &self,
        config: &CollectionUpdateConfig,
        trigger: &Value,
    ) -> Result<UpdateDocument, UpdateError> {
        let mut context = AggregatedContext::new(trigger);
        for source in &config.data_sources {
            let result = self.executor.execute(source, trigger).await?;
            context.insert(source.name.clone(), result);
        }

        let id = self.compose_identifier(&config.identifier, &context)?;
        let mut document = UpdateDocument::new(&config.identifier.target_field, id);

        for mapping in &config.field_mappings {
            self.apply_mapping(&mut document, mapping, &context)?;
        }

        for (field, value) in &config.default_values {
            if !document.contains_field(field) {
                document.set_field(field, value.clone());
            }
        }

        debug!(
            id = %document.id(),
            fields = document.len(),
            "Built update document"
        );
        Ok(document)
    }

    /// Compose the document identifier. Identifier parts never fall back
    /// to defaults; any absent part aborts the record.
    fn compose_identifier(
        &self,
        rule: &IdentifierRule,
        context: &AggregatedContext,
    ) -> Result<String, UpdateError> {
        let mut parts = Vec::with_capacity(rule.parts.len());
        for part in &rule.parts {
            let value = self
                .resolve_mapping_value(part, context)?
                .ok_or_else(|| {
                    UpdateError::field_resolution(
                        &part.field,
                        "identifier part resolved to no value",
                    )
                })?;
            let rendered = value.render().ok_or_else(|| {
                UpdateError::field_resolution(
                    &part.field,
                    "identifier part has no string rendering",
                )
            })?;
            parts.push(rendered);
        }

        match &rule.composite_function {
            Some(name) => self.transformations.compose_identifier(name, &parts),
            None => Ok(parts.join(&rule.separator)),
        }
    }

    /// Resolve a mapping's value by precedence: static value, trigger
    /// path, composite source paths, single source path.
    fn resolve_mapping_value(
        &self,
        mapping: &FieldMapping,
        context: &AggregatedContext,
    ) -> Result<Option<DataValue>, UpdateError> {
        if let Some(value) = &mapping.static_value {
            return Ok(Some(DataValue::Json(value.clone())));
        }

        if let Some(path) = &mapping.trigger_path {
            return Ok(context.resolve_trigger(path));
        }

        if !mapping.source_paths.is_empty() {
            let values: Vec<String> = mapping
                .source_paths
                .iter()
                .map(|path| {
                    context
                        .resolve(path)
                        .and_then(|value| value.render())
                        .unwrap_or_default()
                })
                .collect();
            let combined = match &mapping.combine_function {
                Some(name) => self.transformations.combine_fields(name, &values)?,
                None => values.join(&mapping.separator),
            };
            return Ok(Some(DataValue::json(combined)));
        }

        if let Some(path) = &mapping.source_path {
            return Ok(context.resolve(path));
        }

        Ok(None)
    }

    /// Resolve, transform, convert, and emit one field mapping.
    fn apply_mapping(
        &self,
        document: &mut UpdateDocument,
        mapping: &FieldMapping,
        context: &AggregatedContext,
    ) -> Result<(), UpdateError> {
        let resolved = self.resolve_mapping_value(mapping, context)?;

        let value = match resolved {
            Some(value) => value,
            None => {
                if mapping.required {
                    return Err(UpdateError::field_resolution(
                        &mapping.field,
                        "required field resolved to no value and has no default",
                    ));
                }
                match &mapping.default_value {
                    Some(default) => DataValue::Json(default.clone()),
                    // No value, no default: the field is omitted entirely.
                    None => return Ok(()),
                }
            }
        };

        let Some(rendered) = value.render() else {
            if mapping.required {
                return Err(UpdateError::field_resolution(
                    &mapping.field,
                    "resolved value has no string rendering",
                ));
            }
            warn!(field = %mapping.field, "Skipping field whose value has no string rendering");
            return Ok(());
        };

        let rendered = match &mapping.transform {
            Some(name) => self.transformations.apply_single(name, &rendered)?,
            None => rendered,
        };

        if !mapping.allowed_values.is_empty() && !mapping.allowed_values.contains(&rendered) {
            if mapping.required {
                return Err(UpdateError::field_resolution(
                    &mapping.field,
                    format!("value '{rendered}' is not in the allowed set"),
                ));
            }
            warn!(
                field = %mapping.field,
                value = %rendered,
                "Skipping field with disallowed value"
            );
            return Ok(());
        }

        let converted = match convert_value(&rendered, mapping.target_type) {
            Ok(converted) => converted,
            Err(message) => {
                if mapping.required {
                    return Err(UpdateError::type_conversion(&mapping.field, message));
                }
                warn!(
                    field = %mapping.field,
                    error = %message,
                    "Skipping field after failed type conversion"
                );
                return Ok(());
            }
        };

        document.set_field(&mapping.field, converted);
        Ok(())
    }
}

/// Convert a rendered value to the mapping's declared target type.
fn convert_value(value: &str, target: FieldType) -> Result<Value, String> {
    let trimmed = value.trim();
    match target {
        FieldType::String => Ok(Value::String(value.to_string())),
        FieldType::Integer => trimmed
            .parse::<i64>()
            .map(Value::from)
            .map_err(|e| format!("'{trimmed}' is not an integer: {e}")),
        FieldType::Double => {
            let parsed = trimmed
                .parse::<f64>()
                .map_err(|e| format!("'{trimmed}' is not a double: {e}"))?;
            Number::from_f64(parsed)
                .map(Value::Number)
                .ok_or_else(|| format!("'{trimmed}' is not a finite double"))
        }
        FieldType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(format!("'{trimmed}' is not a boolean")),
        },
        FieldType::Date => parse_date(trimmed)
            .map(|dt| Value::String(dt.to_rfc3339_opts(SecondsFormat::Secs, true)))
            .ok_or_else(|| format!("'{trimmed}' is not an RFC 3339 timestamp or calendar date")),
    }
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}
