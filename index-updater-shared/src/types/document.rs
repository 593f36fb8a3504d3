//! Partial-update document types for the search index.
//!
//! An [`UpdateDocument`] expresses only the fields to be set on a target
//! document, not a full replacement. Field order follows insertion order so
//! that repeated builds of the same record produce identical documents.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// A single partial-update operation on one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOperation {
    /// Set the field to the given value.
    Set(Value),
}

impl FieldOperation {
    /// The value carried by this operation.
    pub fn value(&self) -> &Value {
        match self {
            Self::Set(value) => value,
        }
    }
}

/// A partial-update document for one target identifier.
///
/// Consists of the identifier field plus a set of field → operation pairs.
/// Immutable once built and handed to the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateDocument {
    id_field: String,
    id: String,
    fields: IndexMap<String, FieldOperation>,
}

impl UpdateDocument {
    /// Create an empty document for the given identifier.
    pub fn new(id_field: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id_field: id_field.into(),
            id: id.into(),
            fields: IndexMap::new(),
        }
    }

    /// The name of the identifier field.
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// The composite identifier value.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Add a `set` operation for a field. A later set for the same field
    /// replaces the earlier one without changing its position.
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), FieldOperation::Set(value));
    }

    /// Whether the document already carries an operation for `name`.
    pub fn contains_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterate field operations in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldOperation)> {
        self.fields.iter().map(|(name, op)| (name.as_str(), op))
    }

    /// Number of field operations (identifier excluded).
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the document carries no field operations.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The sink wire shape: `{"<id_field>": id, "<field>": {"set": value}}`.
    pub fn to_wire_json(&self) -> Value {
        let mut map = serde_json::Map::with_capacity(self.fields.len() + 1);
        map.insert(self.id_field.clone(), Value::String(self.id.clone()));
        for (name, op) in &self.fields {
            let FieldOperation::Set(value) = op;
            let mut operation = serde_json::Map::with_capacity(1);
            operation.insert("set".to_string(), value.clone());
            map.insert(name.clone(), Value::Object(operation));
        }
        Value::Object(map)
    }
}

impl Serialize for UpdateDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(&self.id_field, &self.id)?;
        for (name, op) in &self.fields {
            let FieldOperation::Set(value) = op;
            map.serialize_entry(name, &serde_json::json!({ "set": value }))?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_field_and_lookup() {
        let mut doc = UpdateDocument::new("id", "O1_C1");
        doc.set_field("status", json!("ACTIVE"));

        assert_eq!(doc.id(), "O1_C1");
        assert_eq!(doc.id_field(), "id");
        assert!(doc.contains_field("status"));
        assert!(!doc.contains_field("missing"));
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_wire_shape() {
        let mut doc = UpdateDocument::new("id", "O1_C1");
        doc.set_field("status", json!("ACTIVE"));
        doc.set_field("amount", json!(12.5));

        assert_eq!(
            doc.to_wire_json(),
            json!({
                "id": "O1_C1",
                "status": {"set": "ACTIVE"},
                "amount": {"set": 12.5},
            })
        );
    }

    #[test]
    fn test_field_order_is_insertion_order() {
        let mut doc = UpdateDocument::new("id", "X");
        doc.set_field("b", json!(1));
        doc.set_field("a", json!(2));
        doc.set_field("c", json!(3));

        let names: Vec<&str> = doc.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_repeated_set_replaces_value_in_place() {
        let mut doc = UpdateDocument::new("id", "X");
        doc.set_field("a", json!(1));
        doc.set_field("b", json!(2));
        doc.set_field("a", json!(9));

        let fields: Vec<(&str, &Value)> =
            doc.fields().map(|(name, op)| (name, op.value())).collect();
        assert_eq!(fields, vec![("a", &json!(9)), ("b", &json!(2))]);
    }

    #[test]
    fn test_serialize_matches_wire_json() {
        let mut doc = UpdateDocument::new("id", "X");
        doc.set_field("a", json!(1));

        let serialized = serde_json::to_value(&doc).unwrap();
        assert_eq!(serialized, doc.to_wire_json());
    }
}
