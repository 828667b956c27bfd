//! JSON codec for patch operations.
//!
//! The remote store accepts the RFC 6902 subset `add` / `remove` /
//! `replace`, e.g. `{"op": "replace", "path": "/enabled", "value": true}`.

use govsync_document::Value as DocValue;
use govsync_pointer::{format_pointer, parse_pointer, validate_path, validate_pointer};
use serde_json::{json, Value};

use crate::types::{PatchError, PatchOperation};

fn decode_path(v: Option<&Value>) -> Result<Vec<String>, PatchError> {
    let s = v
        .and_then(Value::as_str)
        .ok_or_else(|| PatchError::InvalidOp("path must be a string".into()))?;
    validate_pointer(s).map_err(|e| PatchError::InvalidOp(e.to_string()))?;
    let path = parse_pointer(s);
    validate_path(&path).map_err(|e| PatchError::InvalidOp(e.to_string()))?;
    Ok(path)
}

fn decode_value(v: Option<&Value>, op: &str) -> Result<DocValue, PatchError> {
    v.map(DocValue::from_json)
        .ok_or_else(|| PatchError::InvalidOp(format!("\"{op}\" requires a value")))
}

/// Serializes one operation.
pub fn to_json(op: &PatchOperation) -> Value {
    match op {
        PatchOperation::Add { path, value } => json!({
            "op": "add",
            "path": format_pointer(path),
            "value": value.to_json()
        }),
        PatchOperation::Remove { path } => json!({
            "op": "remove",
            "path": format_pointer(path)
        }),
        PatchOperation::Replace { path, value } => json!({
            "op": "replace",
            "path": format_pointer(path),
            "value": value.to_json()
        }),
    }
}

/// Deserializes one operation.
pub fn from_json(v: &Value) -> Result<PatchOperation, PatchError> {
    let map = v
        .as_object()
        .ok_or_else(|| PatchError::InvalidOp("operation must be an object".into()))?;
    let op = map
        .get("op")
        .and_then(Value::as_str)
        .ok_or_else(|| PatchError::InvalidOp("missing \"op\"".into()))?;
    let path = decode_path(map.get("path"))?;
    match op {
        "add" => Ok(PatchOperation::Add {
            path,
            value: decode_value(map.get("value"), op)?,
        }),
        "remove" => Ok(PatchOperation::Remove { path }),
        "replace" => Ok(PatchOperation::Replace {
            path,
            value: decode_value(map.get("value"), op)?,
        }),
        other => Err(PatchError::InvalidOp(format!("unsupported op: {other}"))),
    }
}

/// Serializes a batch as a JSON array.
pub fn to_json_patch(ops: &[PatchOperation]) -> Value {
    Value::Array(ops.iter().map(to_json).collect())
}

/// Deserializes a batch.
pub fn from_json_patch(v: &Value) -> Result<Vec<PatchOperation>, PatchError> {
    v.as_array()
        .ok_or_else(|| PatchError::InvalidOp("patch must be an array".into()))?
        .iter()
        .map(from_json)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_wire_format() {
        let op = PatchOperation::Replace {
            path: vec!["enabled".into()],
            value: DocValue::Bool(true),
        };
        assert_eq!(to_json(&op), json!({"op": "replace", "path": "/enabled", "value": true}));
        assert_eq!(
            to_json(&PatchOperation::Remove { path: vec!["a/b".into()] }),
            json!({"op": "remove", "path": "/a~1b"})
        );
    }

    #[test]
    fn decodes_explicit_null_value() {
        let op = from_json(&json!({"op": "add", "path": "/description", "value": null})).unwrap();
        assert_eq!(
            op,
            PatchOperation::Add {
                path: vec!["description".into()],
                value: DocValue::Null
            }
        );
    }

    #[test]
    fn rejects_malformed_operations() {
        let cases = [
            json!({"op": "add", "path": "/a"}),
            json!({"op": "move", "path": "/a", "from": "/b"}),
            json!({"op": "remove", "path": "a"}),
            json!({"path": "/a"}),
            json!("remove"),
        ];
        for case in cases {
            assert!(matches!(from_json(&case), Err(PatchError::InvalidOp(_))), "{case}");
        }
        assert!(from_json_patch(&json!({})).is_err());
    }

    #[test]
    fn rejects_overly_deep_paths() {
        let deep = "/a".repeat(65);
        let result = from_json(&json!({"op": "remove", "path": deep}));
        assert!(matches!(result, Err(PatchError::InvalidOp(_))), "{result:?}");
        assert!(from_json(&json!({"op": "remove", "path": "/a".repeat(64)})).is_ok());
    }
}
