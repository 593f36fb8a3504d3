//! Named transformation functions for field values and identifiers.
//!
//! Three kinds are registered by name: single-value transforms, multi-value
//! combiners for composite fields, and identifier composers. Registration
//! is additive; looking up an unregistered name at use time is a
//! configuration error, not a silent no-op.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::errors::UpdateError;

type SingleFn = Arc<dyn Fn(&str) -> String + Send + Sync>;
type ManyFn = Arc<dyn Fn(&[String]) -> String + Send + Sync>;

/// A registered transformation.
#[derive(Clone)]
enum Transformation {
    Single(SingleFn),
    Combine(ManyFn),
    Identifier(ManyFn),
}

impl Transformation {
    fn kind(&self) -> &'static str {
        match self {
            Self::Single(_) => "single-value transform",
            Self::Combine(_) => "combiner",
            Self::Identifier(_) => "identifier composer",
        }
    }
}

/// Registry of named pure functions used during document assembly.
#[derive(Default)]
pub struct TransformationRegistry {
    transformations: HashMap<String, Transformation>,
}

impl TransformationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in functions registered:
    /// `uppercase`, `lowercase`, `trim` (single-value); `concat`
    /// (combiner); `hash` (identifier composer producing a stable 64-bit
    /// hex digest of the parts).
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_single("uppercase", |value| value.to_uppercase());
        registry.register_single("lowercase", |value| value.to_lowercase());
        registry.register_single("trim", |value| value.trim().to_string());
        registry.register_combine("concat", |values| values.concat());
        registry.register_identifier("hash", |parts| {
            let mut hasher = DefaultHasher::new();
            for part in parts {
                part.hash(&mut hasher);
            }
            format!("{:016x}", hasher.finish())
        });
        registry
    }

    /// Register a single-value transform under a name.
    pub fn register_single(
        &mut self,
        name: impl Into<String>,
        function: impl Fn(&str) -> String + Send + Sync + 'static,
    ) {
        self.transformations
            .insert(name.into(), Transformation::Single(Arc::new(function)));
    }

    /// Register a multi-value combiner under a name.
    pub fn register_combine(
        &mut self,
        name: impl Into<String>,
        function: impl Fn(&[String]) -> String + Send + Sync + 'static,
    ) {
        self.transformations
            .insert(name.into(), Transformation::Combine(Arc::new(function)));
    }

    /// Register an identifier composer under a name.
    pub fn register_identifier(
        &mut self,
        name: impl Into<String>,
        function: impl Fn(&[String]) -> String + Send + Sync + 'static,
    ) {
        self.transformations
            .insert(name.into(), Transformation::Identifier(Arc::new(function)));
    }

    /// Apply a single-value transform to a resolved field value.
    pub fn apply_single(&self, name: &str, value: &str) -> Result<String, UpdateError> {
        match self.get(name)? {
            Transformation::Single(function) => Ok(function(value)),
            other => Err(Self::wrong_kind(name, other, "single-value transform")),
        }
    }

    /// Combine independently resolved composite-field values.
    pub fn combine_fields(&self, name: &str, values: &[String]) -> Result<String, UpdateError> {
        match self.get(name)? {
            Transformation::Combine(function) => Ok(function(values)),
            other => Err(Self::wrong_kind(name, other, "combiner")),
        }
    }

    /// Compose identifier parts into a single identifier string.
    pub fn compose_identifier(&self, name: &str, parts: &[String]) -> Result<String, UpdateError> {
        match self.get(name)? {
            Transformation::Identifier(function) => Ok(function(parts)),
            other => Err(Self::wrong_kind(name, other, "identifier composer")),
        }
    }

    fn get(&self, name: &str) -> Result<&Transformation, UpdateError> {
        self.transformations.get(name).ok_or_else(|| {
            UpdateError::configuration(format!("unregistered transformation '{name}'"))
        })
    }

    fn wrong_kind(name: &str, actual: &Transformation, expected: &str) -> UpdateError {
        UpdateError::configuration(format!(
            "transformation '{name}' is registered as a {}, not a {expected}",
            actual.kind()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_builtin_single_transforms() {
        let registry = TransformationRegistry::with_defaults();

        assert_eq!(registry.apply_single("uppercase", "abc").unwrap(), "ABC");
        assert_eq!(registry.apply_single("lowercase", "ABC").unwrap(), "abc");
        assert_eq!(registry.apply_single("trim", "  x  ").unwrap(), "x");
    }

    #[test]
    fn test_builtin_concat_combiner() {
        let registry = TransformationRegistry::with_defaults();

        assert_eq!(
            registry.combine_fields("concat", &strings(&["a", "b", "c"])).unwrap(),
            "abc"
        );
    }

    #[test]
    fn test_hash_composer_is_deterministic() {
        let registry = TransformationRegistry::with_defaults();
        let parts = strings(&["O1", "C1"]);

        let first = registry.compose_identifier("hash", &parts).unwrap();
        let second = registry.compose_identifier("hash", &parts).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 16);
        assert_ne!(
            first,
            registry.compose_identifier("hash", &strings(&["O1", "C2"])).unwrap()
        );
    }

    #[test]
    fn test_unregistered_name_is_configuration_error() {
        let registry = TransformationRegistry::with_defaults();

        let error = registry.apply_single("missing", "x").unwrap_err();
        assert!(error.is_configuration());
    }

    #[test]
    fn test_wrong_kind_is_configuration_error() {
        let registry = TransformationRegistry::with_defaults();

        // `concat` is a combiner, not a single-value transform.
        let error = registry.apply_single("concat", "x").unwrap_err();
        assert!(error.is_configuration());
    }

    #[test]
    fn test_custom_registration_is_additive() {
        let mut registry = TransformationRegistry::with_defaults();
        registry.register_single("reverse", |value| value.chars().rev().collect());

        assert_eq!(registry.apply_single("reverse", "abc").unwrap(), "cba");
        assert_eq!(registry.apply_single("uppercase", "abc").unwrap(), "ABC");
    }
}
