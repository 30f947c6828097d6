//! FormKit - schema-driven form state
//!
//! Builds a parameter object from a declarative schema (defaults synthesized
//! per field type), validates it against the schema's constraints, and tracks
//! which fields the user has touched so callers can suppress errors on fields
//! that were never interacted with.
//!
//! # Example
//!
//! ```ignore
//! use formkit::{Form, FormSchema};
//!
//! let schema = FormSchema::from_json(&serde_json::json!({
//!     "type": "object",
//!     "properties": {
//!         "depth": { "type": "integer", "minimum": 1, "maximum": 10, "default": 3 }
//!     },
//!     "required": ["depth"]
//! }))?;
//!
//! let mut form = Form::new(schema);
//! form.set_value("depth", serde_json::json!(15));
//! form.touch("depth");
//! assert!(!form.validate());
//! assert!(form.visible_error("depth").is_some());
//! ```

mod form;
mod schema;

pub use form::Form;
pub use schema::{FieldSpec, FormSchema, PropertyKind, SchemaError};
