//! Values of the canonical document tree.

use indexmap::IndexMap;
use serde_json::{Map, Number};

use govsync_pointer::{child, Path};

use crate::shape::Shape;

/// Named fields of an object, kept in the order they were read.
pub type Fields = IndexMap<String, Value>;

/// A node of a canonical document.
///
/// `Null` is a value in its own right: a field holding `Null` is present,
/// which is not the same as the field being absent from its parent.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Object(Fields),
    /// Ordered; compared position by position.
    List(Vec<Value>),
    /// Unordered; compared by membership.
    Set(Vec<Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) => "object",
            Value::List(_) => "list",
            Value::Set(_) => "set",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Fields> {
        match self {
            Value::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Elements of a list or a set.
    pub fn as_elements(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Field or element lookup by a single step.
    pub fn get(&self, step: &str) -> Option<&Value> {
        match self {
            Value::Object(fields) => fields.get(step),
            Value::List(items) | Value::Set(items) => {
                step.parse::<usize>().ok().and_then(|i| items.get(i))
            }
            _ => None,
        }
    }

    pub fn get_mut(&mut self, step: &str) -> Option<&mut Value> {
        match self {
            Value::Object(fields) => fields.get_mut(step),
            Value::List(items) | Value::Set(items) => {
                step.parse::<usize>().ok().and_then(move |i| items.get_mut(i))
            }
            _ => None,
        }
    }

    /// Converts JSON without shape information: every array is a list.
    pub fn from_json(json: &serde_json::Value) -> Value {
        Value::from_json_shaped(json, &Shape::default(), &mut Vec::new())
    }

    /// Converts JSON, turning arrays found at set paths of `shape` into sets.
    ///
    /// `path` is the location of `json` within the whole document; it is
    /// used as scratch space while descending and restored on return.
    pub fn from_json_shaped(json: &serde_json::Value, shape: &Shape, path: &mut Path) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.clone()),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                let values = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        path.push(i.to_string());
                        let v = Value::from_json_shaped(item, shape, path);
                        path.pop();
                        v
                    })
                    .collect();
                if shape.is_set(path) {
                    Value::Set(values)
                } else {
                    Value::List(values)
                }
            }
            serde_json::Value::Object(map) => {
                let mut fields = Fields::with_capacity(map.len());
                for (key, item) in map {
                    path.push(key.clone());
                    fields.insert(key.clone(), Value::from_json_shaped(item, shape, path));
                    path.pop();
                }
                Value::Object(fields)
            }
        }
    }

    /// Converts back to JSON. Lists and sets both become arrays, in stored order.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) | Value::Set(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(fields) => {
                let mut map = Map::with_capacity(fields.len());
                for (key, v) in fields {
                    map.insert(key.clone(), v.to_json());
                }
                serde_json::Value::Object(map)
            }
        }
    }

    /// Visits every node with its path, parents before children.
    pub fn walk<'a>(&'a self, path: &[String], visit: &mut impl FnMut(&[String], &'a Value)) {
        visit(path, self);
        match self {
            Value::Object(fields) => {
                for (key, v) in fields {
                    v.walk(&child(path, key.as_str()), visit);
                }
            }
            Value::List(items) | Value::Set(items) => {
                for (i, v) in items.iter().enumerate() {
                    v.walk(&child(path, i.to_string()), visit);
                }
            }
            _ => {}
        }
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if a == b {
        return true;
    }
    if a.is_f64() || b.is_f64() {
        // 1 and 1.0 are the same value once the server has normalized them
        return matches!((a.as_f64(), b.as_f64()), (Some(x), Some(y)) if x == y);
    }
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => x == y,
        // at least one side is beyond i64, so both must agree as u64
        _ => a.as_u64().is_some() && a.as_u64() == b.as_u64(),
    }
}

/// Multiset comparison: every element of `a` pairs off with a distinct
/// equal element of `b`.
fn same_members(a: &[Value], b: &[Value]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut taken = vec![false; b.len()];
    'outer: for item in a {
        for (j, candidate) in b.iter().enumerate() {
            if !taken[j] && item == candidate {
                taken[j] = true;
                continue 'outer;
            }
        }
        return false;
    }
    true
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => same_members(a, b),
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
            }
            // A list and a set are different shapes even with equal elements
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<Fields> for Value {
    fn from(fields: Fields) -> Self {
        Value::Object(fields)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
