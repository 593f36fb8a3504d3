//! Path resolution against nested value graphs.
//!
//! A path is a sequence of dot-separated segments navigated one step at a
//! time: keyed containers by key, ordered sequences by non-negative integer
//! index, opaque objects through their [`PropertyAccess`] capability.
//! Missing data is a valid, silent outcome — resolution returns `None`,
//! never an error.
//!
//! [`PropertyAccess`]: index_updater_shared::PropertyAccess

use index_updater_shared::DataValue;
use serde_json::Value;

/// Resolve a dotted path against a value graph.
///
/// Short-circuits to `None` the moment any step yields no value. A final
/// value of `Null` also counts as absent. Out-of-range or non-numeric
/// sequence indices yield `None`, not an error.
pub fn resolve(root: &DataValue, path: &str) -> Option<DataValue> {
    let mut current = root.clone();
    for segment in path.split('.') {
        current = step(&current, segment)?;
    }
    (!current.is_absent()).then_some(current)
}

/// Resolve one segment against the current value.
fn step(current: &DataValue, segment: &str) -> Option<DataValue> {
    match current {
        DataValue::Json(Value::Object(map)) => map.get(segment).cloned().map(DataValue::Json),
        DataValue::Json(Value::Array(items)) => segment
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get(index))
            .cloned()
            .map(DataValue::Json),
        // Scalars and nulls have no navigable children.
        DataValue::Json(_) => None,
        DataValue::Opaque(object) => object.property(segment),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use index_updater_shared::PropertyAccess;
    use serde_json::json;
    use std::sync::Arc;

    fn root(value: serde_json::Value) -> DataValue {
        DataValue::Json(value)
    }

    #[test]
    fn test_resolve_nested_keys() {
        let data = root(json!({"user": {"address": {"city": "Wellington"}}}));

        assert_eq!(
            resolve(&data, "user.address.city"),
            Some(DataValue::json("Wellington"))
        );
    }

    #[test]
    fn test_resolve_list_index() {
        let data = root(json!({"items": [{"name": "first"}, {"name": "second"}]}));

        assert_eq!(
            resolve(&data, "items.1.name"),
            Some(DataValue::json("second"))
        );
    }

    #[test]
    fn test_missing_segment_is_absent_not_error() {
        let data = root(json!({"user": {"name": "A"}}));

        assert!(resolve(&data, "user.missing").is_none());
        assert!(resolve(&data, "missing.deeper.path").is_none());
    }

    #[test]
    fn test_out_of_range_index_is_absent() {
        let data = root(json!({"items": ["only"]}));

        assert!(resolve(&data, "items.5").is_none());
    }

    #[test]
    fn test_non_numeric_index_is_absent() {
        let data = root(json!({"items": ["only"]}));

        assert!(resolve(&data, "items.first").is_none());
    }

    #[test]
    fn test_scalar_mid_path_is_absent() {
        let data = root(json!({"user": "plain string"}));

        assert!(resolve(&data, "user.name").is_none());
    }

    #[test]
    fn test_null_leaf_is_absent() {
        let data = root(json!({"user": {"name": null}}));

        assert!(resolve(&data, "user.name").is_none());
    }

    struct Order {
        order_id: &'static str,
    }

    impl PropertyAccess for Order {
        fn property(&self, name: &str) -> Option<DataValue> {
            match name {
                "orderId" => Some(DataValue::json(self.order_id)),
                _ => None,
            }
        }
    }

    #[test]
    fn test_opaque_property_navigation() {
        let data = DataValue::opaque(Arc::new(Order { order_id: "O1" }));

        assert_eq!(resolve(&data, "orderId"), Some(DataValue::json("O1")));
        assert!(resolve(&data, "missing").is_none());
    }
}
