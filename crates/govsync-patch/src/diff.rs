//! The diff engine.
//!
//! Computes the ordered list of [`RawChange`]s that turns a previous
//! document into a desired one. Object keys are visited in sorted order so
//! that the same pair of documents always yields the same sequence,
//! whatever order the server or the configuration listed the fields in.

use std::collections::BTreeSet;

use govsync_document::{CanonicalDocument, Fields, Value};
use govsync_pointer::{child, Path, PathPattern, ValidationError};

use crate::types::{DiffError, RawChange};

// ── Ignore rules ──────────────────────────────────────────────────────────

/// Paths excluded from comparison: server-computed identifiers, timestamps
/// and read-only sub-objects. A pattern also covers everything below it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    patterns: BTreeSet<PathPattern>,
}

impl IgnoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_patterns<'a>(
        patterns: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ValidationError> {
        let mut set = Self::new();
        for pattern in patterns {
            set.insert(PathPattern::parse(pattern)?);
        }
        Ok(set)
    }

    /// Builds a set from static, well-formed patterns.
    pub fn of(patterns: &[&str]) -> Self {
        Self {
            patterns: patterns.iter().map(|p| PathPattern::from_pointer(p)).collect(),
        }
    }

    pub fn insert(&mut self, pattern: PathPattern) -> bool {
        self.patterns.insert(pattern)
    }

    pub fn extend(&mut self, other: &IgnoreSet) {
        self.patterns.extend(other.patterns.iter().cloned());
    }

    pub fn patterns(&self) -> impl Iterator<Item = &PathPattern> {
        self.patterns.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn covers(&self, path: &[String]) -> bool {
        self.patterns.iter().any(|pattern| pattern.covers(path))
    }

    /// Copies `fields` without any ignored field.
    pub fn prune(&self, fields: &Fields) -> Fields {
        if self.is_empty() {
            return fields.clone();
        }
        let mut path = Vec::new();
        self.prune_fields(&mut path, fields)
    }

    fn prune_fields(&self, path: &mut Path, fields: &Fields) -> Fields {
        let mut out = Fields::with_capacity(fields.len());
        for (key, value) in fields {
            path.push(key.clone());
            if !self.covers(path) {
                out.insert(key.clone(), self.prune_value(path, value));
            }
            path.pop();
        }
        out
    }

    fn prune_value(&self, path: &mut Path, value: &Value) -> Value {
        match value {
            Value::Object(fields) => Value::Object(self.prune_fields(path, fields)),
            Value::List(items) => Value::List(self.prune_items(path, items)),
            Value::Set(items) => Value::Set(self.prune_items(path, items)),
            scalar => scalar.clone(),
        }
    }

    fn prune_items(&self, path: &mut Path, items: &[Value]) -> Vec<Value> {
        // Elements are never dropped here, that would shift indices. Changes
        // to ignored elements are filtered once the diff is done.
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                path.push(i.to_string());
                let pruned = self.prune_value(path, item);
                path.pop();
                pruned
            })
            .collect()
    }
}

// ── Public API ────────────────────────────────────────────────────────────

/// Diffs `previous` against `desired`, skipping everything `ignore` covers.
///
/// * a field only in `desired` is an add, only in `previous` a remove, in
///   both with different values a replace;
/// * an explicit `null` is a value, so `{description: null}` against `{}`
///   is a remove while against `{description: "x"}` it is a replace;
/// * nested objects and ordered lists recurse; sets are compared by
///   membership and replaced as a whole when they differ.
pub fn diff(
    previous: &CanonicalDocument,
    desired: &CanonicalDocument,
    ignore: &IgnoreSet,
) -> Result<Vec<RawChange>, DiffError> {
    if !previous.same_shape(desired) {
        return Err(DiffError::ShapeMismatch {
            previous: previous.kind(),
            desired: desired.kind(),
        });
    }
    let previous = ignore.prune(previous.fields());
    let desired = ignore.prune(desired.fields());
    let mut changes = Vec::new();
    diff_fields(&mut changes, &[], &previous, &desired);
    changes.retain(|change| !ignore.covers(&change.path));
    Ok(changes)
}

// ── Core recursive differ ─────────────────────────────────────────────────

fn diff_fields(changes: &mut Vec<RawChange>, path: &[String], src: &Fields, dst: &Fields) {
    let keys: BTreeSet<&String> = src.keys().chain(dst.keys()).collect();
    for key in keys {
        let p = child(path, key.as_str());
        match (src.get(key), dst.get(key)) {
            (None, Some(d)) => changes.push(RawChange {
                path: p,
                previous: None,
                desired: Some(d.clone()),
            }),
            (Some(s), None) => changes.push(RawChange {
                path: p,
                previous: Some(s.clone()),
                desired: None,
            }),
            (Some(s), Some(d)) => diff_value(changes, &p, s, d),
            (None, None) => {}
        }
    }
}

fn diff_value(changes: &mut Vec<RawChange>, path: &[String], src: &Value, dst: &Value) {
    if src == dst {
        return;
    }
    match (src, dst) {
        (Value::Object(s), Value::Object(d)) => diff_fields(changes, path, s, d),
        (Value::List(s), Value::List(d)) => diff_list(changes, path, s, d),
        _ => changes.push(RawChange {
            path: path.to_vec(),
            previous: Some(src.clone()),
            desired: Some(dst.clone()),
        }),
    }
}

/// Positional list diff: recurse over the common prefix, then append the
/// tail of `dst` in ascending order or drop the tail of `src` in descending
/// order, so each emitted index is valid once the earlier changes applied.
fn diff_list(changes: &mut Vec<RawChange>, path: &[String], src: &[Value], dst: &[Value]) {
    let common = src.len().min(dst.len());
    for i in 0..common {
        diff_value(changes, &child(path, i.to_string()), &src[i], &dst[i]);
    }
    for (i, item) in dst.iter().enumerate().skip(common) {
        changes.push(RawChange {
            path: child(path, i.to_string()),
            previous: None,
            desired: Some(item.clone()),
        });
    }
    for i in (common..src.len()).rev() {
        changes.push(RawChange {
            path: child(path, i.to_string()),
            previous: Some(src[i].clone()),
            desired: None,
        });
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
