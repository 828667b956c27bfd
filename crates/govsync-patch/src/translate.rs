//! The patch operation translator.
//!
//! Maps each [`RawChange`] to exactly one [`PatchOperation`], except where a
//! field carries a [`FieldPolicy`] that reshapes or drops the change.

use govsync_document::Value;
use govsync_pointer::PathPattern;

use crate::types::{PatchOperation, RawChange};

/// Per-field adjustments required by the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPolicy {
    /// The API rejects null (and removal) for this field but accepts `""`.
    /// Clearing is sent as the empty string, and a clear against a field
    /// already holding `""` produces no operation at all.
    ClearWithEmptyString,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPolicies {
    entries: Vec<(PathPattern, FieldPolicy)>,
}

impl FieldPolicies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, pattern: &str, policy: FieldPolicy) -> Self {
        self.entries.push((PathPattern::from_pointer(pattern), policy));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The first policy whose pattern matches `path` exactly.
    pub fn lookup(&self, path: &[String]) -> Option<FieldPolicy> {
        self.entries
            .iter()
            .find(|(pattern, _)| pattern.matches(path))
            .map(|(_, policy)| *policy)
    }
}

/// Translates changes into operations, preserving their order.
pub fn translate(changes: &[RawChange], policies: &FieldPolicies) -> Vec<PatchOperation> {
    changes
        .iter()
        .filter_map(|change| match policies.lookup(&change.path) {
            Some(FieldPolicy::ClearWithEmptyString) => clear_with_empty_string(change),
            None => Some(plain(change)),
        })
        .collect()
}

fn plain(change: &RawChange) -> PatchOperation {
    let path = change.path.clone();
    match (&change.previous, &change.desired) {
        (None, Some(value)) => PatchOperation::Add {
            path,
            value: value.clone(),
        },
        (Some(_), Some(value)) => PatchOperation::Replace {
            path,
            value: value.clone(),
        },
        (_, None) => PatchOperation::Remove { path },
    }
}

fn clear_with_empty_string(change: &RawChange) -> Option<PatchOperation> {
    let clearing = matches!(change.desired, None | Some(Value::Null));
    if !clearing {
        return Some(plain(change));
    }
    let empty = Value::String(String::new());
    match &change.previous {
        Some(previous) if *previous == empty => None,
        Some(_) => Some(PatchOperation::Replace {
            path: change.path.clone(),
            value: empty,
        }),
        None => Some(PatchOperation::Add {
            path: change.path.clone(),
            value: empty,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn description(previous: Option<Value>, desired: Option<Value>) -> RawChange {
        RawChange {
            path: vec!["description".into()],
            previous,
            desired,
        }
    }

    fn policies() -> FieldPolicies {
        FieldPolicies::new().with("/description", FieldPolicy::ClearWithEmptyString)
    }

    #[test]
    fn one_change_one_operation_without_policies() {
        let changes = vec![
            description(None, Some("x".into())),
            description(Some("x".into()), Some("y".into())),
            description(Some("y".into()), None),
        ];
        let ops = translate(&changes, &FieldPolicies::new());
        let names: Vec<&str> = ops.iter().map(PatchOperation::op_name).collect();
        assert_eq!(names, vec!["add", "replace", "remove"]);
    }

    #[test]
    fn explicit_null_is_sent_as_null_without_policy() {
        let ops = translate(&[description(Some("x".into()), Some(Value::Null))], &FieldPolicies::new());
        assert_eq!(
            ops,
            vec![PatchOperation::Replace {
                path: vec!["description".into()],
                value: Value::Null
            }]
        );
    }

    #[test]
    fn clearing_becomes_empty_string() {
        let ops = translate(&[description(Some("x".into()), None)], &policies());
        assert_eq!(ops[0].op_name(), "replace");
        assert_eq!(ops[0].value(), Some(&Value::from("")));

        let ops = translate(&[description(None, Some(Value::Null))], &policies());
        assert_eq!(ops[0].op_name(), "add");
        assert_eq!(ops[0].value(), Some(&Value::from("")));
    }

    #[test]
    fn clearing_an_empty_field_is_dropped() {
        let ops = translate(&[description(Some("".into()), Some(Value::Null))], &policies());
        assert!(ops.is_empty());
    }

    #[test]
    fn policy_leaves_real_values_alone() {
        let ops = translate(&[description(Some("".into()), Some("text".into()))], &policies());
        assert_eq!(ops[0].value(), Some(&Value::from("text")));
    }

    #[test]
    fn policy_matches_exact_paths_only() {
        let nested = RawChange {
            path: vec!["owner".into(), "description".into()],
            previous: Some("x".into()),
            desired: None,
        };
        let ops = translate(&[nested], &policies());
        assert_eq!(ops[0].op_name(), "remove");
    }
}
