//! Dynamic value model for trigger records and data-source results.
//!
//! Values flowing through the update engine are either plain JSON trees
//! (keyed containers, ordered sequences, primitives) or opaque structured
//! objects that expose named-field lookup through [`PropertyAccess`].

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Named-field lookup capability for structured values.
///
/// Provider results that are not plain JSON implement this trait so that
/// path resolution can navigate into them without runtime introspection.
/// Returning `None` for an unknown field is a valid, silent outcome.
pub trait PropertyAccess: Send + Sync {
    /// Look up a named field, returning `None` if no such field exists.
    fn property(&self, name: &str) -> Option<DataValue>;
}

/// A value flowing through the update engine.
///
/// `Json` holds keyed containers, ordered sequences, and primitives.
/// `Opaque` holds a structured object navigable only through
/// [`PropertyAccess`]. `Json(Value::Null)` is treated as absent by path
/// resolution.
#[derive(Clone)]
pub enum DataValue {
    /// A plain JSON value tree.
    Json(Value),
    /// A structured object exposing named-field lookup.
    Opaque(Arc<dyn PropertyAccess>),
}

impl DataValue {
    /// Wrap a JSON value.
    pub fn json(value: impl Into<Value>) -> Self {
        Self::Json(value.into())
    }

    /// Wrap an opaque structured object.
    pub fn opaque(object: Arc<dyn PropertyAccess>) -> Self {
        Self::Opaque(object)
    }

    /// The underlying JSON value, if this is a `Json` variant.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Opaque(_) => None,
        }
    }

    /// Consume into the underlying JSON value, if this is a `Json` variant.
    pub fn into_json(self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Opaque(_) => None,
        }
    }

    /// Whether this value counts as absent (`Json(Null)`).
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Json(Value::Null))
    }

    /// Render this value as a plain string for identifier composition,
    /// composite fields, and cache keys.
    ///
    /// Strings render as-is (unquoted); numbers and booleans via their
    /// canonical display form; containers as compact JSON. `Null` and
    /// opaque objects have no string rendering and return `None`.
    pub fn render(&self) -> Option<String> {
        match self {
            Self::Json(Value::Null) => None,
            Self::Json(Value::String(s)) => Some(s.clone()),
            Self::Json(Value::Bool(b)) => Some(b.to_string()),
            Self::Json(Value::Number(n)) => Some(n.to_string()),
            Self::Json(value) => serde_json::to_string(value).ok(),
            Self::Opaque(_) => None,
        }
    }
}

impl From<Value> for DataValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl fmt::Debug for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(value) => write!(f, "Json({value})"),
            Self::Opaque(_) => write!(f, "Opaque(..)"),
        }
    }
}

impl PartialEq for DataValue {
    /// Opaque values never compare equal; JSON values compare structurally.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Json(a), Self::Json(b)) => a == b,
            _ => false,
        }
    }
}
