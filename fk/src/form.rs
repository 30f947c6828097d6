//! Form state over a schema
//!
//! A `Form` owns the current field values, the per-field validation errors,
//! and the per-field touched flags. Values always cover exactly the declared
//! field set: defaults are synthesized at construction and on reset, and
//! writes to undeclared fields are rejected.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use tracing::debug;

use crate::schema::{FormSchema, PropertyKind};

/// Mutable form state derived from a [`FormSchema`]
#[derive(Debug, Clone)]
pub struct Form {
    schema: FormSchema,
    values: BTreeMap<String, Value>,
    errors: BTreeMap<String, String>,
    touched: BTreeSet<String>,
}

impl Form {
    /// Create a form with defaults synthesized from the schema
    pub fn new(schema: FormSchema) -> Self {
        let mut form = Self {
            schema,
            values: BTreeMap::new(),
            errors: BTreeMap::new(),
            touched: BTreeSet::new(),
        };
        form.synthesize_defaults();
        form
    }

    /// Clear all values, errors, and touched flags, then resynthesize defaults
    ///
    /// No stale field survives: the value map is rebuilt from the schema.
    pub fn reset(&mut self) {
        debug!(fields = self.schema.len(), "Form::reset");
        self.values.clear();
        self.errors.clear();
        self.touched.clear();
        self.synthesize_defaults();
    }

    fn synthesize_defaults(&mut self) {
        for field in self.schema.fields() {
            let value = field.default.clone().unwrap_or_else(|| field.kind.zero_value());
            self.values.insert(field.name.clone(), value);
        }
    }

    /// Validate every declared field, replacing the whole error map
    ///
    /// Pure with respect to values: repeated calls are side-effect free apart
    /// from the error map itself. Returns overall validity.
    pub fn validate(&mut self) -> bool {
        let mut errors = BTreeMap::new();

        for field in self.schema.fields() {
            let value = self.values.get(&field.name);

            if is_empty(value) {
                // Empty is an error only for required fields, and the
                // required check preempts everything else
                if field.required {
                    errors.insert(field.name.clone(), "This field is required".to_string());
                }
                continue;
            }

            if let Some(value) = value
                && let Some(message) = check_constraints(&field.kind, value)
            {
                errors.insert(field.name.clone(), message);
            }
        }

        let valid = errors.is_empty();
        debug!(errors = errors.len(), valid, "Form::validate");
        self.errors = errors;
        valid
    }

    /// Mark a field as interacted with
    ///
    /// Unknown field names are ignored: touched never grows beyond the
    /// declared field set.
    pub fn touch(&mut self, field: &str) {
        if self.schema.field(field).is_some() {
            self.touched.insert(field.to_string());
        }
    }

    /// Whether the user has interacted with a field
    pub fn is_touched(&self, field: &str) -> bool {
        self.touched.contains(field)
    }

    /// Error for a field, gated on touched state
    ///
    /// Untouched fields never surface errors even when `validate` recorded
    /// one, so users are not shown errors before first interaction.
    pub fn visible_error(&self, field: &str) -> Option<&str> {
        if self.is_touched(field) { self.error(field) } else { None }
    }

    /// Raw error for a field, regardless of touched state
    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    /// Full error map from the last `validate` call
    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    /// Current value of a field
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Set a field value; returns false (and stores nothing) for undeclared fields
    pub fn set_value(&mut self, field: &str, value: Value) -> bool {
        if self.schema.field(field).is_none() {
            debug!(field, "Form::set_value: undeclared field rejected");
            return false;
        }
        self.values.insert(field.to_string(), value);
        true
    }

    /// All current values, one entry per declared field
    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    /// The schema this form was built from
    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }
}

/// Missing, null, and empty-string values all count as "not provided"
fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Check a non-empty value against its field kind, returning the error message
fn check_constraints(kind: &PropertyKind, value: &Value) -> Option<String> {
    match kind {
        PropertyKind::Number {
            minimum,
            maximum,
            allowed,
        } => match value.as_f64() {
            Some(number) => check_bounds(number, *minimum, *maximum).or_else(|| {
                allowed.as_ref().and_then(|members| {
                    (!members.contains(&number)).then(|| "Value is not one of the allowed options".to_string())
                })
            }),
            None => Some("Must be a number".to_string()),
        },
        PropertyKind::Integer { minimum, maximum } => match value.as_f64() {
            Some(number) => check_bounds(number, *minimum, *maximum),
            None => Some("Must be a number".to_string()),
        },
        PropertyKind::String { allowed } => match value.as_str() {
            Some(s) => allowed.as_ref().and_then(|members| {
                (!members.iter().any(|m| m == s)).then(|| "Value is not one of the allowed options".to_string())
            }),
            None => Some("Must be a string".to_string()),
        },
        // Boolean/array/object fields get only the required check
        PropertyKind::Boolean | PropertyKind::Array | PropertyKind::Object => None,
    }
}

fn check_bounds(number: f64, minimum: Option<f64>, maximum: Option<f64>) -> Option<String> {
    if let Some(min) = minimum
        && number < min
    {
        return Some(format!("Minimum value is {min}"));
    }
    if let Some(max) = maximum
        && number > max
    {
        return Some(format!("Maximum value is {max}"));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FormSchema;
    use serde_json::json;

    fn plan_schema() -> FormSchema {
        FormSchema::from_json(&json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "mode": { "type": "string", "enum": ["fast", "thorough"], "default": "fast" },
                "threshold": { "type": "number", "minimum": 0, "maximum": 100 },
                "depth": { "type": "integer", "minimum": 1, "maximum": 10, "default": 3 },
                "recursive": { "type": "boolean" },
                "extensions": { "type": "array" },
                "weights": { "type": "object" }
            },
            "required": ["name", "mode"]
        }))
        .unwrap()
    }

    #[test]
    fn test_defaults_synthesized_per_kind() {
        let form = Form::new(plan_schema());

        assert_eq!(form.value("name"), Some(&json!("")));
        assert_eq!(form.value("mode"), Some(&json!("fast"))); // declared default wins
        assert_eq!(form.value("threshold"), Some(&json!(0)));
        assert_eq!(form.value("depth"), Some(&json!(3)));
        assert_eq!(form.value("recursive"), Some(&json!(false)));
        assert_eq!(form.value("extensions"), Some(&json!([])));
        assert_eq!(form.value("weights"), Some(&json!({})));
        assert_eq!(form.values().len(), 7);
    }

    #[test]
    fn test_reset_discards_everything() {
        let mut form = Form::new(plan_schema());
        form.set_value("name", json!("holiday photos"));
        form.touch("name");
        form.validate();

        form.reset();

        assert_eq!(form.value("name"), Some(&json!("")));
        assert!(form.errors().is_empty());
        assert!(!form.is_touched("name"));
    }

    #[test]
    fn test_untouched_errors_stay_hidden() {
        let mut form = Form::new(plan_schema());

        // "name" is required and defaults to "" - internally invalid
        assert!(!form.validate());
        assert!(form.error("name").is_some());

        // But nothing was touched, so nothing is shown
        for field in ["name", "mode", "threshold", "depth"] {
            assert_eq!(form.visible_error(field), None);
        }

        form.touch("name");
        assert_eq!(form.visible_error("name"), Some("This field is required"));
    }

    #[test]
    fn test_required_check_runs_first() {
        let mut form = Form::new(plan_schema());
        form.set_value("name", json!(""));
        form.validate();
        assert_eq!(form.error("name"), Some("This field is required"));
    }

    #[test]
    fn test_optional_empty_field_is_valid() {
        let schema = FormSchema::from_json(&json!({
            "type": "object",
            "properties": {
                "label": { "type": "string", "enum": ["a", "b"] }
            }
        }))
        .unwrap();
        let mut form = Form::new(schema);

        // Default "" is empty and the field is optional: skipped entirely,
        // the enum constraint does not fire
        assert!(form.validate());
    }

    #[test]
    fn test_numeric_above_maximum() {
        let mut form = Form::new(plan_schema());
        form.set_value("name", json!("x"));
        form.set_value("threshold", json!(150));

        assert!(!form.validate());
        assert_eq!(form.error("threshold"), Some("Maximum value is 100"));
    }

    #[test]
    fn test_numeric_below_minimum() {
        let mut form = Form::new(plan_schema());
        form.set_value("name", json!("x"));
        form.set_value("depth", json!(0));

        assert!(!form.validate());
        assert_eq!(form.error("depth"), Some("Minimum value is 1"));
    }

    #[test]
    fn test_numeric_type_mismatch() {
        let mut form = Form::new(plan_schema());
        form.set_value("name", json!("x"));
        form.set_value("threshold", json!("lots"));

        assert!(!form.validate());
        assert_eq!(form.error("threshold"), Some("Must be a number"));
    }

    #[test]
    fn test_string_enum_membership() {
        let mut form = Form::new(plan_schema());
        form.set_value("name", json!("x"));
        form.set_value("mode", json!("sloppy"));

        assert!(!form.validate());
        assert_eq!(form.error("mode"), Some("Value is not one of the allowed options"));

        form.set_value("mode", json!("thorough"));
        assert!(form.validate());
        assert_eq!(form.error("mode"), None);
    }

    #[test]
    fn test_string_type_mismatch() {
        let mut form = Form::new(plan_schema());
        form.set_value("name", json!(7));

        assert!(!form.validate());
        assert_eq!(form.error("name"), Some("Must be a string"));
    }

    #[test]
    fn test_validate_does_not_mutate_values() {
        let mut form = Form::new(plan_schema());
        form.set_value("name", json!("x"));
        form.set_value("threshold", json!(150));

        let before = form.values().clone();
        form.validate();
        form.validate();
        assert_eq!(form.values(), &before);
    }

    #[test]
    fn test_validate_replaces_error_map() {
        let mut form = Form::new(plan_schema());
        form.set_value("name", json!("x"));
        form.set_value("threshold", json!(150));
        form.validate();
        assert!(form.error("threshold").is_some());

        form.set_value("threshold", json!(50));
        assert!(form.validate());
        assert!(form.errors().is_empty());
    }

    #[test]
    fn test_set_value_rejects_undeclared_field() {
        let mut form = Form::new(plan_schema());
        assert!(!form.set_value("bogus", json!(1)));
        assert_eq!(form.value("bogus"), None);

        form.touch("bogus");
        assert!(!form.is_touched("bogus"));
    }
}
