//! Schema validation helpers.
//!
//! Validates a `serde_json::Value` against a [`Schema`]: presence of required
//! attributes, attribute types, and each attribute's [`Constraint`]s.
//!
//! # Example
//!
//! ```
//! use hemmer_provider_datahub::schema::{Attribute, Constraint, Schema};
//! use hemmer_provider_datahub::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("name", Attribute::required_string())
//!     .with_attribute(
//!         "life_cycle",
//!         Attribute::required_int64().with_constraint(Constraint::IntRange { min: 1, max: 7 }),
//!     );
//!
//! assert!(validate(&schema, &json!({"name": "t", "life_cycle": 3})).is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"name": "t", "life_cycle": 9}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("life_cycle".to_string()));
//! ```

use crate::error::ProviderError;
use crate::schema::{Attribute, AttributeType, Constraint, Diagnostic, Schema};
use serde_json::Value;

/// Validate a JSON value against a schema.
///
/// Returns a list of diagnostics for any validation errors found.
/// An empty list means the value is valid.
///
/// # Validation Rules
///
/// - The value must be an object
/// - Required attributes must be present and non-null
/// - Optional attributes may be absent or null
/// - Computed-only attributes are skipped (provider sets these)
/// - Attribute types must match the schema
/// - Constraints are checked only once the type matches
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let obj = match value {
        Value::Object(map) => map,
        _ => {
            diagnostics.push(
                Diagnostic::error("Expected object")
                    .with_detail(format!("Got {}", value_type_name(value))),
            );
            return diagnostics;
        },
    };

    for (name, attr) in &schema.attributes {
        validate_attribute(attr, obj.get(name), name, &mut diagnostics);
    }

    diagnostics
}

/// Validate and convert the first error diagnostic into a [`ProviderError`].
pub fn validate_strict(schema: &Schema, value: &Value) -> Result<(), ProviderError> {
    match validate(schema, value).into_iter().find(Diagnostic::is_error) {
        None => Ok(()),
        Some(diag) => Err(diagnostic_to_error(diag)),
    }
}

/// Convert a diagnostic into a [`ProviderError::Validation`].
pub fn diagnostic_to_error(diag: Diagnostic) -> ProviderError {
    let message = match diag.detail {
        Some(detail) => format!("{}: {}", diag.summary, detail),
        None => diag.summary,
    };
    ProviderError::Validation {
        attribute: diag.attribute.unwrap_or_default(),
        message,
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if attr.flags.is_computed_only() {
        return;
    }

    match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(path),
                );
            }
        },
        Some(v) => {
            let before = diagnostics.len();
            validate_attribute_type(&attr.attr_type, v, path, diagnostics);
            if diagnostics.len() == before {
                for constraint in &attr.constraints {
                    if let Some(detail) = check_constraint(constraint, v) {
                        diagnostics.push(
                            Diagnostic::error(format!("Invalid value for attribute '{}'", path))
                                .with_detail(detail)
                                .with_attribute(path),
                        );
                    }
                }
            }
        },
    }
}

fn validate_attribute_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match attr_type {
        AttributeType::String => {
            if !value.is_string() {
                diagnostics.push(type_error(path, "string", value));
            }
        },
        AttributeType::Int64 => {
            if !is_int64(value) {
                diagnostics.push(type_error(path, "int64", value));
            }
        },
        AttributeType::Map(value_type) => {
            if let Some(obj) = value.as_object() {
                for (key, val) in obj {
                    let key_path = format!("{}.{}", path, key);
                    validate_attribute_type(value_type, val, &key_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "map", value));
            }
        },
    }
}

/// Returns a description of the violation, if any.
fn check_constraint(constraint: &Constraint, value: &Value) -> Option<String> {
    match constraint {
        Constraint::StringLength { min, max } => {
            let len = value.as_str()?.chars().count();
            if len < *min || len > *max {
                Some(format!(
                    "length must be between {} and {}, got {}",
                    min, max, len
                ))
            } else {
                None
            }
        },
        Constraint::IntRange { min, max } => {
            let n = as_int64(value)?;
            if n < *min || n > *max {
                Some(format!("must be between {} and {}, got {}", min, max, n))
            } else {
                None
            }
        },
        Constraint::OneOf { values } => {
            let s = value.as_str()?;
            if values.iter().any(|v| v == s) {
                None
            } else {
                Some(format!("must be one of {:?}, got '{}'", values, s))
            }
        },
        Constraint::Identifier { min, max } => {
            let s = value.as_str()?;
            let len = s.chars().count();
            if len < *min || len > *max {
                return Some(format!(
                    "length must be between {} and {}, got {}",
                    min, max, len
                ));
            }
            if is_identifier(s) {
                None
            } else {
                Some(format!(
                    "'{}' must start with a letter and contain only letters, digits and underscores",
                    s
                ))
            }
        },
        Constraint::MapValuesOneOf { values } => {
            let obj = value.as_object()?;
            obj.iter().find_map(|(key, val)| {
                let s = val.as_str().unwrap_or_default();
                if values.iter().any(|v| v == s) {
                    None
                } else {
                    Some(format!(
                        "value for key '{}' must be one of {:?}, got '{}'",
                        key, values, s
                    ))
                }
            })
        },
    }
}

// Helper functions

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        },
        _ => false,
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn as_int64(value: &Value) -> Option<i64> {
    // `4.0` is a float, not an int64
    value.as_i64()
}

fn is_int64(value: &Value) -> bool {
    as_int64(value).is_some()
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic::error(format!("Invalid type for attribute '{}'", path))
        .with_detail(format!(
            "Expected {}, got {}",
            expected,
            value_type_name(got)
        ))
        .with_attribute(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, Constraint, Schema};
    use serde_json::json;

    #[test]
    fn test_validate_required_string() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        let diagnostics = validate(&schema, &json!({"name": "test"}));
        assert!(diagnostics.is_empty());

        // Missing required
        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("name".to_string()));

        // Null value
        let diagnostics = validate(&schema, &json!({"name": null}));
        assert_eq!(diagnostics.len(), 1);

        // Wrong type
        let diagnostics = validate(&schema, &json!({"name": 123}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Invalid type"));
    }

    #[test]
    fn test_validate_optional_attribute() {
        let schema = Schema::v0().with_attribute("count", Attribute::optional_int64());

        assert!(validate(&schema, &json!({"count": 42})).is_empty());
        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"count": null})).is_empty());
        assert_eq!(validate(&schema, &json!({"count": "not a number"})).len(), 1);
    }

    #[test]
    fn test_validate_computed_attribute_skipped() {
        let schema = Schema::v0().with_attribute("create_time", Attribute::computed_string());

        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"create_time": 123})).is_empty());
    }

    #[test]
    fn test_validate_int64() {
        let schema = Schema::v0().with_attribute("count", Attribute::required_int64());

        assert!(validate(&schema, &json!({"count": 42})).is_empty());
        assert_eq!(validate(&schema, &json!({"count": 42.5})).len(), 1);
        assert_eq!(validate(&schema, &json!({"count": u64::MAX})).len(), 1);

        let diagnostics = validate(&schema, &json!({"count": 42.0}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("count".to_string()));
        assert!(diagnostics[0].summary.contains("Invalid type"));
        assert_eq!(validate(&schema, &json!({"count": "42"})).len(), 1);
    }

    #[test]
    fn test_validate_int_range() {
        let schema = Schema::v0().with_attribute(
            "shard_count",
            Attribute::required_int64().with_constraint(Constraint::IntRange { min: 1, max: 256 }),
        );

        assert!(validate(&schema, &json!({"shard_count": 1})).is_empty());
        assert!(validate(&schema, &json!({"shard_count": 256})).is_empty());

        let diagnostics = validate(&schema, &json!({"shard_count": 0}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("shard_count".to_string()));
        assert!(diagnostics[0]
            .detail
            .as_deref()
            .unwrap()
            .contains("between 1 and 256"));

        assert_eq!(validate(&schema, &json!({"shard_count": 257})).len(), 1);
    }

    #[test]
    fn test_validate_string_length() {
        let schema = Schema::v0().with_attribute(
            "comment",
            Attribute::optional_string().with_constraint(Constraint::StringLength { min: 0, max: 5 }),
        );

        assert!(validate(&schema, &json!({"comment": ""})).is_empty());
        assert!(validate(&schema, &json!({"comment": "héllo"})).is_empty());
        assert_eq!(validate(&schema, &json!({"comment": "too long"})).len(), 1);
    }

    #[test]
    fn test_validate_one_of() {
        let schema = Schema::v0().with_attribute(
            "record_type",
            Attribute::required_string().with_constraint(Constraint::one_of(&["TUPLE", "BLOB"])),
        );

        assert!(validate(&schema, &json!({"record_type": "TUPLE"})).is_empty());
        let diagnostics = validate(&schema, &json!({"record_type": "tuple"}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].detail.as_deref().unwrap().contains("'tuple'"));
    }

    #[test]
    fn test_validate_identifier() {
        let schema = Schema::v0().with_attribute(
            "project_name",
            Attribute::required_string().with_constraint(Constraint::Identifier { min: 3, max: 32 }),
        );

        assert!(validate(&schema, &json!({"project_name": "Proj_1"})).is_empty());
        assert_eq!(validate(&schema, &json!({"project_name": "ab"})).len(), 1);
        assert_eq!(validate(&schema, &json!({"project_name": "1proj"})).len(), 1);
        assert_eq!(validate(&schema, &json!({"project_name": "pro-j"})).len(), 1);
        assert_eq!(validate(&schema, &json!({"project_name": "a".repeat(33)})).len(), 1);
    }

    #[test]
    fn test_validate_map_values() {
        let schema = Schema::v0().with_attribute(
            "record_schema",
            Attribute::optional_string_map()
                .with_constraint(Constraint::map_values_one_of(&["STRING", "BIGINT"])),
        );

        assert!(validate(&schema, &json!({"record_schema": {"f1": "STRING"}})).is_empty());

        let diagnostics = validate(&schema, &json!({"record_schema": {"f1": "BLOB"}}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].detail.as_deref().unwrap().contains("'f1'"));

        // Wrong element type is a type error, constraints are not checked
        let diagnostics = validate(&schema, &json!({"record_schema": {"f1": 1}}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("record_schema.f1".to_string()));
    }

    #[test]
    fn test_validate_multiple_errors() {
        let schema = Schema::v0()
            .with_attribute("name", Attribute::required_string())
            .with_attribute("count", Attribute::required_int64())
            .with_attribute(
                "life_cycle",
                Attribute::required_int64().with_constraint(Constraint::IntRange { min: 1, max: 7 }),
            );

        let diagnostics = validate(
            &schema,
            &json!({"name": 123, "count": "not a number", "life_cycle": 0}),
        );
        assert_eq!(diagnostics.len(), 3);
    }

    #[test]
    fn test_validate_strict_names_attribute() {
        let schema = Schema::v0().with_attribute(
            "life_cycle",
            Attribute::required_int64().with_constraint(Constraint::IntRange { min: 1, max: 7 }),
        );

        assert!(validate_strict(&schema, &json!({"life_cycle": 7})).is_ok());

        let err = validate_strict(&schema, &json!({"life_cycle": 8})).unwrap_err();
        assert_eq!(err.attribute(), Some("life_cycle"));
        assert!(err.to_string().contains("between 1 and 7"));
    }

    #[test]
    fn test_validate_root_not_object() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        let diagnostics = validate(&schema, &json!("not an object"));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Expected object"));
    }
}
