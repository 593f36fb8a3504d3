//! Shared type definitions.

pub mod document;
pub mod value;

pub use document::{FieldOperation, UpdateDocument};
pub use value::{DataValue, PropertyAccess};
