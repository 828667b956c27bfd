//! Role membership criteria.
//!
//! A criteria tree is at most three levels deep. Each level is its own type:
//!
//! * level 1: [`CriteriaLevel1`] = `Criteria<CriteriaLevel2>`
//! * level 2: [`CriteriaLevel2`] = `Criteria<CriteriaLevel3>`
//! * level 3: [`CriteriaLevel3`] = [`Comparison`]
//!
//! so a composite can only hold nodes of the level below it and the bottom
//! level has no way to express children at all. The canonical form is the
//! nested object the service uses:
//!
//! ```json
//! {"operation": "AND", "children": [
//!   {"operation": "EQUALS",
//!    "key": {"type": "ACCOUNT", "property": "status", "sourceId": "src1"},
//!    "stringValue": "active"}
//! ]}
//! ```
//!
//! Conversion is total for trees built from these types and lossless in
//! both directions. Child order is kept, and is significant when two trees
//! are compared.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use govsync_document::{Fields, Value};
use govsync_pointer::{child, format_pointer};

pub const MAX_DEPTH: usize = 3;

// ── Errors ────────────────────────────────────────────────────────────────

/// A malformed node. `path` locates it within the document being read.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CriteriaError {
    #[error("criteria node at {path} must be an object, found {found}")]
    NotAnObject { path: String, found: &'static str },

    #[error("criteria node at {path}: {field} must be a {expected}, found {found}")]
    WrongType {
        path: String,
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("criteria node at {path}: missing {field}")]
    Missing { path: String, field: &'static str },

    #[error("criteria node at {path}: unknown {field} {value:?}")]
    UnknownValue {
        path: String,
        field: &'static str,
        value: String,
    },

    #[error("criteria node at {path}: {operation} must not carry {field}")]
    CompositeWithLeafField {
        path: String,
        operation: LogicalOperator,
        field: &'static str,
    },

    #[error("criteria node at {path}: {operation} needs at least one child")]
    EmptyComposite {
        path: String,
        operation: LogicalOperator,
    },

    #[error("criteria node at {path}: {operation} comparison must not have children")]
    LeafWithChildren { path: String, operation: Comparator },

    #[error("criteria node at {path}: criteria nest at most {MAX_DEPTH} levels deep")]
    TooDeep { path: String },

    #[error("criteria node at {path}: sourceId is required for {key_type} keys")]
    MissingSourceId { path: String, key_type: KeyType },

    #[error("criteria node at {path}: sourceId is not allowed for IDENTITY keys")]
    ForbiddenSourceId { path: String },
}

// ── Vocabulary ────────────────────────────────────────────────────────────

wire_enum!(LogicalOperator {
    And => "AND",
    Or => "OR",
});

wire_enum!(Comparator {
    Equals => "EQUALS",
    NotEquals => "NOT_EQUALS",
    Contains => "CONTAINS",
    StartsWith => "STARTS_WITH",
    EndsWith => "ENDS_WITH",
});

wire_enum!(KeyType {
    Identity => "IDENTITY",
    Account => "ACCOUNT",
    Entitlement => "ENTITLEMENT",
});

/// The attribute a comparison reads. Account and entitlement attributes
/// belong to a source, identity attributes never do. A source id is never
/// empty: `sourceId: ""` reads as a missing source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CriteriaKey {
    Identity { property: String },
    Account { property: String, source_id: String },
    Entitlement { property: String, source_id: String },
}

impl CriteriaKey {
    pub fn identity(property: impl Into<String>) -> Self {
        CriteriaKey::Identity {
            property: property.into(),
        }
    }

    /// `None` if `source_id` is empty.
    pub fn account(property: impl Into<String>, source_id: impl Into<String>) -> Option<Self> {
        let source_id = source_id.into();
        (!source_id.is_empty()).then(|| CriteriaKey::Account {
            property: property.into(),
            source_id,
        })
    }

    /// `None` if `source_id` is empty.
    pub fn entitlement(
        property: impl Into<String>,
        source_id: impl Into<String>,
    ) -> Option<Self> {
        let source_id = source_id.into();
        (!source_id.is_empty()).then(|| CriteriaKey::Entitlement {
            property: property.into(),
            source_id,
        })
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            CriteriaKey::Identity { .. } => KeyType::Identity,
            CriteriaKey::Account { .. } => KeyType::Account,
            CriteriaKey::Entitlement { .. } => KeyType::Entitlement,
        }
    }

    pub fn property(&self) -> &str {
        match self {
            CriteriaKey::Identity { property }
            | CriteriaKey::Account { property, .. }
            | CriteriaKey::Entitlement { property, .. } => property,
        }
    }

    pub fn source_id(&self) -> Option<&str> {
        match self {
            CriteriaKey::Identity { .. } => None,
            CriteriaKey::Account { source_id, .. } | CriteriaKey::Entitlement { source_id, .. } => {
                Some(source_id)
            }
        }
    }

    fn to_canonical(&self) -> Value {
        let mut fields = Fields::new();
        fields.insert("type".into(), self.key_type().as_str().into());
        fields.insert("property".into(), self.property().into());
        if let Some(source_id) = self.source_id() {
            fields.insert("sourceId".into(), source_id.into());
        }
        Value::Object(fields)
    }

    fn from_canonical(key: &Value, path: &[String]) -> Result<Self, CriteriaError> {
        let at = || format_pointer(path);
        let fields = key.as_object().ok_or_else(|| CriteriaError::WrongType {
            path: at(),
            field: "key",
            expected: "object",
            found: key.type_name(),
        })?;
        let key_type = required_str(fields, "type", "key.type", path)?;
        let key_type = KeyType::parse(key_type).ok_or_else(|| CriteriaError::UnknownValue {
            path: at(),
            field: "key.type",
            value: key_type.to_string(),
        })?;
        let property = required_str(fields, "property", "key.property", path)?.to_string();
        // "" is how an unset source id sometimes comes back; it is not an id
        let source_id = optional_str(fields, "sourceId", "key.sourceId", path)?
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        match (key_type, source_id) {
            (KeyType::Identity, None) => Ok(CriteriaKey::Identity { property }),
            (KeyType::Identity, Some(_)) => Err(CriteriaError::ForbiddenSourceId { path: at() }),
            (KeyType::Account, Some(source_id)) => Ok(CriteriaKey::Account {
                property,
                source_id,
            }),
            (KeyType::Entitlement, Some(source_id)) => Ok(CriteriaKey::Entitlement {
                property,
                source_id,
            }),
            (key_type, None) => Err(CriteriaError::MissingSourceId {
                path: at(),
                key_type,
            }),
        }
    }
}

// ── Nodes ─────────────────────────────────────────────────────────────────

/// A leaf comparison: `key <operation> string_value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Comparison {
    pub operation: Comparator,
    pub key: CriteriaKey,
    pub string_value: String,
}

impl Comparison {
    pub fn new(operation: Comparator, key: CriteriaKey, string_value: impl Into<String>) -> Self {
        Self {
            operation,
            key,
            string_value: string_value.into(),
        }
    }

    pub fn equals(key: CriteriaKey, string_value: impl Into<String>) -> Self {
        Self::new(Comparator::Equals, key, string_value)
    }

    fn from_node(node: RawNode<'_>, operation: Comparator, path: &[String]) -> Result<Self, CriteriaError> {
        if !node.children.is_empty() {
            return Err(CriteriaError::LeafWithChildren {
                path: format_pointer(path),
                operation,
            });
        }
        let key = node.key.ok_or_else(|| CriteriaError::Missing {
            path: format_pointer(path),
            field: "key",
        })?;
        let string_value = node.string_value.ok_or_else(|| CriteriaError::Missing {
            path: format_pointer(path),
            field: "stringValue",
        })?;
        Ok(Self {
            operation,
            key: CriteriaKey::from_canonical(key, path)?,
            string_value: string_value.to_string(),
        })
    }
}

/// A node at level 1 or 2: a comparison, or an AND/OR over nodes of the
/// next level down.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Criteria<C> {
    Leaf(Comparison),
    Composite {
        operation: LogicalOperator,
        children: Vec<C>,
    },
}

impl<C> Criteria<C> {
    pub fn and(children: Vec<C>) -> Self {
        Criteria::Composite {
            operation: LogicalOperator::And,
            children,
        }
    }

    pub fn or(children: Vec<C>) -> Self {
        Criteria::Composite {
            operation: LogicalOperator::Or,
            children,
        }
    }
}

impl<C> From<Comparison> for Criteria<C> {
    fn from(comparison: Comparison) -> Self {
        Criteria::Leaf(comparison)
    }
}

pub type CriteriaLevel3 = Comparison;
pub type CriteriaLevel2 = Criteria<CriteriaLevel3>;
pub type CriteriaLevel1 = Criteria<CriteriaLevel2>;

/// The root of a role's membership criteria.
pub type MembershipCriteria = CriteriaLevel1;

// ── Conversion ────────────────────────────────────────────────────────────

/// Two-way conversion between a criteria level and its canonical form.
pub trait CriteriaNode: Sized {
    /// How many levels this node type spans, itself included.
    const HEIGHT: usize;

    fn to_canonical(&self) -> Value;

    /// Reads a node located at `path` of some larger document. Errors carry
    /// `path` extended to the offending node.
    fn from_canonical_at(value: &Value, path: &[String]) -> Result<Self, CriteriaError>;

    fn from_canonical(value: &Value) -> Result<Self, CriteriaError> {
        Self::from_canonical_at(value, &[])
    }
}

impl CriteriaNode for Comparison {
    const HEIGHT: usize = 1;

    fn to_canonical(&self) -> Value {
        let mut fields = Fields::new();
        fields.insert("operation".into(), self.operation.as_str().into());
        fields.insert("key".into(), self.key.to_canonical());
        fields.insert("stringValue".into(), self.string_value.as_str().into());
        Value::Object(fields)
    }

    fn from_canonical_at(value: &Value, path: &[String]) -> Result<Self, CriteriaError> {
        let node = RawNode::read(value, path)?;
        match node.operation {
            // any children here would sit below the last level
            Operation::Logical(_) => Err(CriteriaError::TooDeep {
                path: format_pointer(path),
            }),
            Operation::Compare(_) if !node.children.is_empty() => Err(CriteriaError::TooDeep {
                path: format_pointer(&child(path, "children")),
            }),
            Operation::Compare(operation) => Comparison::from_node(node, operation, path),
        }
    }
}

impl<C: CriteriaNode> CriteriaNode for Criteria<C> {
    const HEIGHT: usize = C::HEIGHT + 1;

    fn to_canonical(&self) -> Value {
        match self {
            Criteria::Leaf(comparison) => comparison.to_canonical(),
            Criteria::Composite {
                operation,
                children,
            } => {
                let mut fields = Fields::new();
                fields.insert("operation".into(), operation.as_str().into());
                fields.insert(
                    "children".into(),
                    Value::List(children.iter().map(C::to_canonical).collect()),
                );
                Value::Object(fields)
            }
        }
    }

    fn from_canonical_at(value: &Value, path: &[String]) -> Result<Self, CriteriaError> {
        let node = RawNode::read(value, path)?;
        let operation = match node.operation {
            Operation::Compare(operation) => {
                return Comparison::from_node(node, operation, path).map(Criteria::Leaf);
            }
            Operation::Logical(operation) => operation,
        };
        let misplaced = [
            ("key", node.key.is_some()),
            ("stringValue", node.string_value.is_some()),
        ];
        if let Some((field, _)) = misplaced.into_iter().find(|(_, present)| *present) {
            return Err(CriteriaError::CompositeWithLeafField {
                path: format_pointer(path),
                operation,
                field,
            });
        }
        if node.children.is_empty() {
            return Err(CriteriaError::EmptyComposite {
                path: format_pointer(path),
                operation,
            });
        }
        let children_path = child(path, "children");
        let children = node
            .children
            .iter()
            .enumerate()
            .map(|(i, c)| C::from_canonical_at(c, &child(&children_path, i.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Criteria::Composite {
            operation,
            children,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Logical(LogicalOperator),
    Compare(Comparator),
}

/// The fields of a node before the shape rules are checked. `null` and
/// absence are treated alike.
struct RawNode<'a> {
    operation: Operation,
    key: Option<&'a Value>,
    string_value: Option<&'a str>,
    children: &'a [Value],
}

impl<'a> RawNode<'a> {
    fn read(value: &'a Value, path: &[String]) -> Result<Self, CriteriaError> {
        let fields = value.as_object().ok_or_else(|| CriteriaError::NotAnObject {
            path: format_pointer(path),
            found: value.type_name(),
        })?;
        let operation = required_str(fields, "operation", "operation", path)?;
        let operation = LogicalOperator::parse(operation)
            .map(Operation::Logical)
            .or_else(|| Comparator::parse(operation).map(Operation::Compare))
            .ok_or_else(|| CriteriaError::UnknownValue {
                path: format_pointer(path),
                field: "operation",
                value: operation.to_string(),
            })?;
        let children = match present(fields, "children") {
            None => &[][..],
            Some(v) => v.as_elements().ok_or_else(|| CriteriaError::WrongType {
                path: format_pointer(path),
                field: "children",
                expected: "list",
                found: v.type_name(),
            })?,
        };
        Ok(Self {
            operation,
            key: present(fields, "key"),
            string_value: optional_str(fields, "stringValue", "stringValue", path)?,
            children,
        })
    }
}

fn present<'a>(fields: &'a Fields, name: &str) -> Option<&'a Value> {
    fields.get(name).filter(|v| !v.is_null())
}

fn optional_str<'a>(
    fields: &'a Fields,
    name: &str,
    field: &'static str,
    path: &[String],
) -> Result<Option<&'a str>, CriteriaError> {
    match present(fields, name) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(CriteriaError::WrongType {
            path: format_pointer(path),
            field,
            expected: "string",
            found: other.type_name(),
        }),
    }
}

fn required_str<'a>(
    fields: &'a Fields,
    name: &str,
    field: &'static str,
    path: &[String],
) -> Result<&'a str, CriteriaError> {
    optional_str(fields, name, field, path)?.ok_or_else(|| CriteriaError::Missing {
        path: format_pointer(path),
        field,
    })
}

// ── Serde ─────────────────────────────────────────────────────────────────

impl Serialize for Comparison {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_canonical().to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Comparison {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Self::from_canonical(&Value::from_json(&json)).map_err(serde::de::Error::custom)
    }
}

impl<C: CriteriaNode> Serialize for Criteria<C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_canonical().to_json().serialize(serializer)
    }
}

impl<'de, C: CriteriaNode> Deserialize<'de> for Criteria<C> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Self::from_canonical(&Value::from_json(&json)).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read(json: serde_json::Value) -> Result<MembershipCriteria, CriteriaError> {
        MembershipCriteria::from_canonical(&Value::from_json(&json))
    }

    #[test]
    fn heights_follow_levels() {
        assert_eq!(CriteriaLevel3::HEIGHT, 1);
        assert_eq!(CriteriaLevel2::HEIGHT, 2);
        assert_eq!(CriteriaLevel1::HEIGHT, MAX_DEPTH);
    }

    #[test]
    fn identity_key_omits_source_id() {
        let leaf = Comparison::equals(CriteriaKey::identity("department"), "Eng");
        assert_eq!(
            leaf.to_canonical().to_json(),
            json!({
                "operation": "EQUALS",
                "key": {"type": "IDENTITY", "property": "department"},
                "stringValue": "Eng"
            })
        );
    }

    #[test]
    fn sourced_keys_need_a_source_id() {
        assert_eq!(CriteriaKey::account("status", ""), None);
        assert_eq!(CriteriaKey::entitlement("name", ""), None);

        let key = CriteriaKey::account("status", "src1").unwrap();
        let leaf = Comparison::equals(key.clone(), "active");
        let back = Comparison::from_canonical(&leaf.to_canonical()).unwrap();
        assert_eq!(back.key, key);
    }

    #[test]
    fn null_fields_read_as_absent() {
        let tree = read(json!({
            "operation": "OR",
            "key": null,
            "stringValue": null,
            "children": [{
                "operation": "EQUALS",
                "key": {"type": "IDENTITY", "property": "city", "sourceId": null},
                "stringValue": "Oslo",
                "children": []
            }]
        }))
        .unwrap();
        assert_eq!(
            tree,
            Criteria::or(vec![Criteria::Leaf(Comparison::equals(
                CriteriaKey::identity("city"),
                "Oslo"
            ))])
        );
    }

    #[test]
    fn errors_point_at_the_offending_node() {
        let err = read(json!({
            "operation": "AND",
            "children": [
                {"operation": "EQUALS", "key": {"type": "IDENTITY", "property": "a"}, "stringValue": "x"},
                {"operation": "EQUALS", "key": {"type": "ACCOUNT", "property": "b"}, "stringValue": "y"}
            ]
        }))
        .unwrap_err();
        assert_eq!(
            err,
            CriteriaError::MissingSourceId {
                path: "/children/1".into(),
                key_type: KeyType::Account
            }
        );
    }

    #[test]
    fn unknown_operation_is_rejected() {
        let err = read(json!({"operation": "XOR", "children": []})).unwrap_err();
        assert!(matches!(err, CriteriaError::UnknownValue { field: "operation", .. }));
    }

    #[test]
    fn serde_goes_through_canonical_form() {
        let tree: MembershipCriteria = serde_json::from_value(json!({
            "operation": "AND",
            "children": [{"operation": "CONTAINS", "key": {"type": "ENTITLEMENT", "property": "name", "sourceId": "s"}, "stringValue": "admin"}]
        }))
        .unwrap();
        let back = serde_json::to_value(&tree).unwrap();
        assert_eq!(back["children"][0]["key"]["sourceId"], json!("s"));
    }
}
