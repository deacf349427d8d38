//! Attribute diffing driven by each attribute's [`DiffPolicy`].
//!
//! The engine walks the schema rather than the values, so attributes that are
//! not declared never produce changes, and computed-only attributes are
//! skipped because the operator never supplies them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::{DiffPolicy, Schema};

/// One attribute whose value differs between prior and proposed state.
///
/// `before` is `None` when the attribute is being set for the first time and
/// `after` is `None` when it is being cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// Attribute name.
    pub path: String,
    /// Prior value.
    pub before: Option<Value>,
    /// Proposed value.
    pub after: Option<Value>,
}

impl AttributeChange {
    /// Create a change for `path`.
    pub fn new(path: impl Into<String>, before: Option<Value>, after: Option<Value>) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }

    /// Whether the attribute forces replacement under `schema`.
    pub fn forces_replacement(&self, schema: &Schema) -> bool {
        schema
            .attribute(&self.path)
            .map(|attr| attr.force_new)
            .unwrap_or(false)
    }
}

/// Compute the attribute changes between `prior` and `proposed`.
///
/// Absent and null are the same. Non-object inputs are treated as empty.
/// When nothing is proposed (a delete), [`DiffPolicy::IgnoreIf`] predicates
/// see the prior object instead.
pub fn diff(schema: &Schema, prior: &Value, proposed: &Value) -> Vec<AttributeChange> {
    let empty = Map::new();
    let context = proposed.as_object().or(prior.as_object()).unwrap_or(&empty);
    let prior = prior.as_object().unwrap_or(&empty);
    let proposed = proposed.as_object().unwrap_or(&empty);

    schema
        .attributes
        .iter()
        .filter(|(_, attr)| !attr.flags.is_computed_only())
        .filter_map(|(name, attr)| {
            let before = non_null(prior.get(name));
            let after = non_null(proposed.get(name));
            if equivalent(attr.diff, before, after, context) {
                return None;
            }
            Some(AttributeChange::new(
                name.clone(),
                before.cloned(),
                after.cloned(),
            ))
        })
        .collect()
}

/// Whether any change touches a force-new attribute.
pub fn requires_replace(schema: &Schema, changes: &[AttributeChange]) -> bool {
    changes.iter().any(|change| change.forces_replacement(schema))
}

/// Compare two values under `policy`.
pub fn equivalent(
    policy: DiffPolicy,
    before: Option<&Value>,
    after: Option<&Value>,
    proposed: &Map<String, Value>,
) -> bool {
    match policy {
        DiffPolicy::Exact => before == after,
        DiffPolicy::CaseInsensitive => match (before, after) {
            (Some(Value::String(a)), Some(Value::String(b))) => a.to_lowercase() == b.to_lowercase(),
            _ => before == after,
        },
        DiffPolicy::IgnoreIf(predicate) => predicate(proposed) || before == after,
    }
}

fn non_null(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}
