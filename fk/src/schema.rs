//! Parameter schema definitions
//!
//! A `FormSchema` is the declarative description of one parameter object: an
//! ordered list of typed fields with defaults and constraints. Schemas arrive
//! from the outside as JSON-Schema-style documents and are parsed exactly once
//! at the boundary; everything downstream works with typed variants and never
//! re-inspects raw type strings.

use serde_json::Value;
use thiserror::Error;

/// Errors raised while parsing a schema document
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Schema root must be a JSON object with a 'properties' map")]
    NotAnObject,

    #[error("Field '{field}' declares unknown type '{type_name}'")]
    UnknownType { field: String, type_name: String },

    #[error("Field '{field}' is malformed: {reason}")]
    Malformed { field: String, reason: String },
}

/// Typed constraint set per field kind
///
/// Each variant carries only the constraints that apply to it, so invalid
/// combinations (an enum constraint on a boolean field) are unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    String {
        /// Allowed members when the field is enum-constrained
        allowed: Option<Vec<String>>,
    },
    Number {
        minimum: Option<f64>,
        maximum: Option<f64>,
        allowed: Option<Vec<f64>>,
    },
    Integer {
        minimum: Option<f64>,
        maximum: Option<f64>,
    },
    Boolean,
    Array,
    Object,
}

impl PropertyKind {
    /// Zero value synthesized when a field declares no default
    pub fn zero_value(&self) -> Value {
        match self {
            Self::String { .. } => Value::String(String::new()),
            Self::Number { .. } | Self::Integer { .. } => Value::from(0),
            Self::Boolean => Value::Bool(false),
            Self::Array => Value::Array(Vec::new()),
            Self::Object => Value::Object(serde_json::Map::new()),
        }
    }
}

/// One declared field of a parameter object
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Field name (key in the parameter object)
    pub name: String,

    /// Typed kind with its constraints
    pub kind: PropertyKind,

    /// Human-readable description for form rendering
    pub description: Option<String>,

    /// Declared default value, if any
    pub default: Option<Value>,

    /// Whether the field is in the schema's required set
    pub required: bool,
}

/// Ordered set of declared fields
///
/// Immutable once built; drives both default synthesis and validation.
#[derive(Debug, Clone, Default)]
pub struct FormSchema {
    fields: Vec<FieldSpec>,
}

impl FormSchema {
    /// Build a schema from already-typed field specs
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Parse a JSON-Schema-style document
    ///
    /// Expects `{"type": "object", "properties": {...}, "required": [...]}`.
    /// Unknown property types are an error rather than silently skipped.
    pub fn from_json(value: &Value) -> Result<Self, SchemaError> {
        let Some(properties) = value.get("properties").and_then(Value::as_object) else {
            return Err(SchemaError::NotAnObject);
        };

        let required: Vec<&str> = value
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut fields = Vec::with_capacity(properties.len());
        for (name, prop) in properties {
            let kind = parse_kind(name, prop)?;
            fields.push(FieldSpec {
                name: name.clone(),
                kind,
                description: prop.get("description").and_then(Value::as_str).map(str::to_string),
                default: prop.get("default").cloned(),
                required: required.contains(&name.as_str()),
            });
        }

        Ok(Self { fields })
    }

    /// Declared fields in schema order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Look up one field by name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Number of declared fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the schema declares no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Parse one property's type string and constraints into a typed kind
fn parse_kind(name: &str, prop: &Value) -> Result<PropertyKind, SchemaError> {
    let type_name = prop.get("type").and_then(Value::as_str).unwrap_or("");
    let minimum = prop.get("minimum").and_then(Value::as_f64);
    let maximum = prop.get("maximum").and_then(Value::as_f64);

    match type_name {
        "string" => {
            let allowed = match prop.get("enum").and_then(Value::as_array) {
                Some(members) => {
                    let strings: Vec<String> = members
                        .iter()
                        .map(|m| {
                            m.as_str().map(str::to_string).ok_or_else(|| SchemaError::Malformed {
                                field: name.to_string(),
                                reason: format!("enum member {m} is not a string"),
                            })
                        })
                        .collect::<Result<_, _>>()?;
                    Some(strings)
                }
                None => None,
            };
            Ok(PropertyKind::String { allowed })
        }
        "number" => {
            let allowed = match prop.get("enum").and_then(Value::as_array) {
                Some(members) => {
                    let numbers: Vec<f64> = members
                        .iter()
                        .map(|m| {
                            m.as_f64().ok_or_else(|| SchemaError::Malformed {
                                field: name.to_string(),
                                reason: format!("enum member {m} is not a number"),
                            })
                        })
                        .collect::<Result<_, _>>()?;
                    Some(numbers)
                }
                None => None,
            };
            Ok(PropertyKind::Number {
                minimum,
                maximum,
                allowed,
            })
        }
        "integer" => Ok(PropertyKind::Integer { minimum, maximum }),
        "boolean" => Ok(PropertyKind::Boolean),
        "array" => Ok(PropertyKind::Array),
        "object" => Ok(PropertyKind::Object),
        other => Err(SchemaError::UnknownType {
            field: name.to_string(),
            type_name: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_parses_fields() {
        let schema = FormSchema::from_json(&json!({
            "type": "object",
            "properties": {
                "algorithm": { "type": "string", "enum": ["CLUSTER", "CRITERIA"] },
                "depth": { "type": "integer", "minimum": 1, "maximum": 10, "default": 3 },
                "dry_run": { "type": "boolean" }
            },
            "required": ["algorithm"]
        }))
        .unwrap();

        assert_eq!(schema.len(), 3);

        let algorithm = schema.field("algorithm").unwrap();
        assert!(algorithm.required);
        assert_eq!(
            algorithm.kind,
            PropertyKind::String {
                allowed: Some(vec!["CLUSTER".to_string(), "CRITERIA".to_string()])
            }
        );

        let depth = schema.field("depth").unwrap();
        assert!(!depth.required);
        assert_eq!(
            depth.kind,
            PropertyKind::Integer {
                minimum: Some(1.0),
                maximum: Some(10.0)
            }
        );
        assert_eq!(depth.default, Some(json!(3)));

        assert_eq!(schema.field("dry_run").unwrap().kind, PropertyKind::Boolean);
    }

    #[test]
    fn test_from_json_rejects_unknown_type() {
        let result = FormSchema::from_json(&json!({
            "type": "object",
            "properties": {
                "weird": { "type": "tuple" }
            }
        }));

        match result {
            Err(SchemaError::UnknownType { field, type_name }) => {
                assert_eq!(field, "weird");
                assert_eq!(type_name, "tuple");
            }
            other => panic!("Expected UnknownType, got {other:?}"),
        }
    }

    #[test]
    fn test_from_json_rejects_missing_properties() {
        assert!(matches!(
            FormSchema::from_json(&json!({ "type": "object" })),
            Err(SchemaError::NotAnObject)
        ));
        assert!(matches!(FormSchema::from_json(&json!("nope")), Err(SchemaError::NotAnObject)));
    }

    #[test]
    fn test_from_json_rejects_mixed_enum() {
        let result = FormSchema::from_json(&json!({
            "type": "object",
            "properties": {
                "mode": { "type": "string", "enum": ["a", 1] }
            }
        }));
        assert!(matches!(result, Err(SchemaError::Malformed { .. })));
    }

    #[test]
    fn test_zero_values() {
        assert_eq!(PropertyKind::String { allowed: None }.zero_value(), json!(""));
        assert_eq!(
            PropertyKind::Number {
                minimum: None,
                maximum: None,
                allowed: None
            }
            .zero_value(),
            json!(0)
        );
        assert_eq!(
            PropertyKind::Integer {
                minimum: None,
                maximum: None
            }
            .zero_value(),
            json!(0)
        );
        assert_eq!(PropertyKind::Boolean.zero_value(), json!(false));
        assert_eq!(PropertyKind::Array.zero_value(), json!([]));
        assert_eq!(PropertyKind::Object.zero_value(), json!({}));
    }

    #[test]
    fn test_empty_schema() {
        let schema = FormSchema::from_json(&json!({
            "type": "object",
            "properties": {}
        }))
        .unwrap();
        assert!(schema.is_empty());
    }
}
