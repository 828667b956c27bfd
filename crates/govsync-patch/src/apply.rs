//! Local application of patch operations.
//!
//! Operations are applied to the JSON form of a document, one after the
//! other, so each path resolves against the result of everything before it.

use govsync_document::{CanonicalDocument, Shape};
use govsync_pointer::{format_pointer, parse_index};
use serde_json::Value;

use crate::types::{PatchError, PatchOperation};

// ── Path navigation ───────────────────────────────────────────────────────

fn get_mut_at<'a>(doc: &'a mut Value, path: &[String]) -> Result<&'a mut Value, PatchError> {
    doc.pointer_mut(&format_pointer(path))
        .ok_or_else(|| PatchError::NotFound(format_pointer(path)))
}

fn index_at(key: &str, path: &[String]) -> Result<usize, PatchError> {
    parse_index(key).map_err(|_| PatchError::InvalidIndex(format_pointer(path)))
}

// ── Individual operation applicators ─────────────────────────────────────

fn apply_add(doc: &mut Value, path: &[String], value: Value) -> Result<Option<Value>, PatchError> {
    let Some((key, parent_path)) = path.split_last() else {
        return Ok(Some(std::mem::replace(doc, value)));
    };
    match get_mut_at(doc, parent_path)? {
        Value::Object(map) => Ok(map.insert(key.clone(), value)),
        Value::Array(arr) => {
            if key == "-" {
                arr.push(value);
                return Ok(None);
            }
            let idx = index_at(key, path)?;
            if idx > arr.len() {
                return Err(PatchError::InvalidIndex(format_pointer(path)));
            }
            arr.insert(idx, value);
            Ok(None)
        }
        _ => Err(PatchError::InvalidTarget(format_pointer(path))),
    }
}

fn apply_remove(doc: &mut Value, path: &[String]) -> Result<Option<Value>, PatchError> {
    let Some((key, parent_path)) = path.split_last() else {
        return Err(PatchError::InvalidTarget(String::new()));
    };
    match get_mut_at(doc, parent_path)? {
        Value::Object(map) => map
            .shift_remove(key)
            .map(Some)
            .ok_or_else(|| PatchError::NotFound(format_pointer(path))),
        Value::Array(arr) => {
            let idx = index_at(key, path)?;
            if idx >= arr.len() {
                return Err(PatchError::NotFound(format_pointer(path)));
            }
            Ok(Some(arr.remove(idx)))
        }
        _ => Err(PatchError::InvalidTarget(format_pointer(path))),
    }
}

fn apply_replace(doc: &mut Value, path: &[String], value: Value) -> Result<Option<Value>, PatchError> {
    if path.is_empty() {
        return Ok(Some(std::mem::replace(doc, value)));
    }
    let target = get_mut_at(doc, path)?;
    Ok(Some(std::mem::replace(target, value)))
}

// ── Main apply functions ──────────────────────────────────────────────────

/// Applies one operation in place, returning the value it displaced.
pub fn apply_op(doc: &mut Value, op: &PatchOperation) -> Result<Option<Value>, PatchError> {
    match op {
        PatchOperation::Add { path, value } => apply_add(doc, path, value.to_json()),
        PatchOperation::Remove { path } => apply_remove(doc, path),
        PatchOperation::Replace { path, value } => apply_replace(doc, path, value.to_json()),
    }
}

/// Applies a batch in order. The batch is all-or-nothing: on error the
/// original document is untouched because the work happens on a copy.
pub fn apply_ops(doc: &Value, ops: &[PatchOperation]) -> Result<Value, PatchError> {
    let mut working = doc.clone();
    for op in ops {
        apply_op(&mut working, op)?;
    }
    Ok(working)
}

/// Applies a batch to a canonical document and re-reads the result with `shape`.
pub fn apply_to_document(
    doc: &CanonicalDocument,
    ops: &[PatchOperation],
    shape: &Shape,
) -> Result<CanonicalDocument, PatchError> {
    let patched = apply_ops(&doc.to_json(), ops)?;
    Ok(CanonicalDocument::from_json(doc.kind(), &patched, shape)?)
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use govsync_document::Value as DocValue;
    use govsync_pointer::parse_pointer;
    use serde_json::json;

    fn add(ptr: &str, value: serde_json::Value) -> PatchOperation {
        PatchOperation::Add {
            path: parse_pointer(ptr),
            value: DocValue::from_json(&value),
        }
    }

    #[test]
    fn add_to_object_and_list() {
        let doc = json!({"a": 1, "l": [1, 3]});
        let out = apply_ops(&doc, &[add("/b", json!(2)), add("/l/1", json!(2)), add("/l/-", json!(4))]).unwrap();
        assert_eq!(out, json!({"a": 1, "l": [1, 2, 3, 4], "b": 2}));
    }

    #[test]
    fn remove_keeps_field_order() {
        let doc = json!({"a": 1, "b": 2, "c": 3});
        let out = apply_ops(&doc, &[PatchOperation::Remove { path: parse_pointer("/b") }]).unwrap();
        assert_eq!(serde_json::to_string(&out).unwrap(), r#"{"a":1,"c":3}"#);
    }

    #[test]
    fn replace_requires_existing_target() {
        let doc = json!({"a": 1});
        let op = PatchOperation::Replace {
            path: parse_pointer("/missing"),
            value: DocValue::Null,
        };
        assert_eq!(apply_ops(&doc, &[op]), Err(PatchError::NotFound("/missing".into())));
    }

    #[test]
    fn failed_batch_leaves_input_untouched() {
        let doc = json!({"a": 1});
        let ops = [
            add("/b", json!(2)),
            PatchOperation::Remove { path: parse_pointer("/zzz") },
        ];
        assert!(apply_ops(&doc, &ops).is_err());
        assert_eq!(doc, json!({"a": 1}));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let doc = json!({"l": [1]});
        assert_eq!(
            apply_ops(&doc, &[add("/l/5", json!(0))]),
            Err(PatchError::InvalidIndex("/l/5".into()))
        );
        assert_eq!(
            apply_ops(&doc, &[PatchOperation::Remove { path: parse_pointer("/l/01") }]),
            Err(PatchError::InvalidIndex("/l/01".into()))
        );
    }

    #[test]
    fn child_of_scalar_is_invalid_target() {
        let doc = json!({"a": 1});
        assert_eq!(
            apply_ops(&doc, &[add("/a/b", json!(0))]),
            Err(PatchError::InvalidTarget("/a/b".into()))
        );
    }
}
