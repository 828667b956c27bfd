//! Approval schemes: who approves an access or revocation request.
//!
//! Only a governance group is named by id. For every other approver type
//! the id is meaningless and is always sent as `null`, whatever was
//! supplied, so that a stray id or an empty string never shows up as a
//! difference.

use serde::{Deserialize, Serialize};

use govsync_document::{CanonicalDocument, Fields, Value};
use govsync_pointer::{child, format_pointer, parse_pointer};

use super::EntityError;

wire_enum!(ApproverType {
    AppOwner => "APP_OWNER",
    Owner => "OWNER",
    SourceOwner => "SOURCE_OWNER",
    Manager => "MANAGER",
    GovernanceGroup => "GOVERNANCE_GROUP",
});

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "WireScheme", into = "WireScheme")]
pub enum ApprovalScheme {
    AppOwner,
    Owner,
    SourceOwner,
    Manager,
    GovernanceGroup { id: String },
}

impl ApprovalScheme {
    /// Builds a scheme from its wire parts. `approver_id` is kept for a
    /// governance group, where it is required, and dropped otherwise.
    pub fn from_parts(
        approver_type: ApproverType,
        approver_id: Option<&str>,
    ) -> Result<Self, String> {
        Ok(match approver_type {
            ApproverType::AppOwner => ApprovalScheme::AppOwner,
            ApproverType::Owner => ApprovalScheme::Owner,
            ApproverType::SourceOwner => ApprovalScheme::SourceOwner,
            ApproverType::Manager => ApprovalScheme::Manager,
            ApproverType::GovernanceGroup => match approver_id.filter(|id| !id.is_empty()) {
                Some(id) => ApprovalScheme::GovernanceGroup { id: id.to_string() },
                None => return Err("GOVERNANCE_GROUP requires an approverId".into()),
            },
        })
    }

    pub fn approver_type(&self) -> ApproverType {
        match self {
            ApprovalScheme::AppOwner => ApproverType::AppOwner,
            ApprovalScheme::Owner => ApproverType::Owner,
            ApprovalScheme::SourceOwner => ApproverType::SourceOwner,
            ApprovalScheme::Manager => ApproverType::Manager,
            ApprovalScheme::GovernanceGroup { .. } => ApproverType::GovernanceGroup,
        }
    }

    pub fn approver_id(&self) -> Option<&str> {
        match self {
            ApprovalScheme::GovernanceGroup { id } => Some(id),
            _ => None,
        }
    }

    pub fn to_canonical(&self) -> Value {
        let mut fields = Fields::new();
        fields.insert("approverType".into(), self.approver_type().as_str().into());
        fields.insert(
            "approverId".into(),
            self.approver_id().map_or(Value::Null, Value::from),
        );
        Value::Object(fields)
    }

    pub fn from_canonical(value: &Value) -> Result<Self, String> {
        let fields = value
            .as_object()
            .ok_or_else(|| format!("expected an object, found {}", value.type_name()))?;
        let name = fields
            .get("approverType")
            .and_then(Value::as_str)
            .ok_or("missing approverType")?;
        let approver_type =
            ApproverType::parse(name).ok_or_else(|| format!("unknown approverType {name:?}"))?;
        let approver_id = fields.get("approverId").and_then(Value::as_str);
        Self::from_parts(approver_type, approver_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireScheme {
    approver_type: String,
    #[serde(default)]
    approver_id: Option<String>,
}

impl TryFrom<WireScheme> for ApprovalScheme {
    type Error = String;

    fn try_from(wire: WireScheme) -> Result<Self, Self::Error> {
        let approver_type = ApproverType::parse(&wire.approver_type)
            .ok_or_else(|| format!("unknown approverType {:?}", wire.approver_type))?;
        Self::from_parts(approver_type, wire.approver_id.as_deref())
    }
}

impl From<ApprovalScheme> for WireScheme {
    fn from(scheme: ApprovalScheme) -> Self {
        WireScheme {
            approver_type: scheme.approver_type().as_str().to_string(),
            approver_id: scheme.approver_id().map(str::to_string),
        }
    }
}

/// Where approval schemes live in access profile and role documents.
pub const SCHEME_LISTS: [&str; 2] = [
    "/accessRequestConfig/approvalSchemes",
    "/revocationRequestConfig/approvalSchemes",
];

fn scheme_paths() -> impl Iterator<Item = Vec<String>> {
    SCHEME_LISTS.iter().map(|p| parse_pointer(p))
}

/// Rejects unknown approver types and governance groups without an id.
pub fn validate_schemes(document: &CanonicalDocument) -> Result<(), EntityError> {
    for list_path in scheme_paths() {
        let Some(schemes) = document.get(&list_path).and_then(Value::as_elements) else {
            continue;
        };
        for (i, scheme) in schemes.iter().enumerate() {
            ApprovalScheme::from_canonical(scheme).map_err(|message| EntityError::Approval {
                path: format_pointer(&child(&list_path, i.to_string())),
                message,
            })?;
        }
    }
    Ok(())
}

/// Rewrites every well-formed scheme into its canonical form, which nulls
/// the id of non-group approvers.
pub fn normalize_schemes(document: &mut CanonicalDocument) {
    for list_path in scheme_paths() {
        let Some(Value::List(schemes) | Value::Set(schemes)) = document.get_mut(&list_path) else {
            continue;
        };
        for scheme in schemes.iter_mut() {
            if let Ok(parsed) = ApprovalScheme::from_canonical(scheme) {
                *scheme = parsed.to_canonical();
            }
        }
    }
}
