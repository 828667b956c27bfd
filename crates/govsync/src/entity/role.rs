use serde::{Deserialize, Serialize};

use govsync_document::{CanonicalDocument, EntityKind};

use super::approval::ApprovalScheme;
use super::criteria::MembershipCriteria;
use super::{from_document, to_document, EntityError, ObjectRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipType {
    #[default]
    Standard,
    IdentityList,
}

/// Who holds the role: everyone matching `criteria` (`STANDARD`) or the
/// listed `identities` (`IDENTITY_LIST`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleMembership {
    #[serde(rename = "type", default)]
    pub membership_type: MembershipType,
    #[serde(default)]
    pub criteria: Option<MembershipCriteria>,
    #[serde(default)]
    pub identities: Vec<ObjectRef>,
}

impl RoleMembership {
    pub fn criteria(criteria: MembershipCriteria) -> Self {
        Self {
            membership_type: MembershipType::Standard,
            criteria: Some(criteria),
            identities: Vec::new(),
        }
    }

    pub fn identities(identities: Vec<ObjectRef>) -> Self {
        Self {
            membership_type: MembershipType::IdentityList,
            criteria: None,
            identities,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRequestConfig {
    #[serde(default)]
    pub comments_required: bool,
    #[serde(default)]
    pub denial_comments_required: bool,
    #[serde(default)]
    pub approval_schemes: Vec<ApprovalScheme>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRequestConfig {
    #[serde(default)]
    pub approval_schemes: Vec<ApprovalScheme>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub owner: ObjectRef,
    #[serde(default)]
    pub access_profiles: Vec<ObjectRef>,
    #[serde(default)]
    pub entitlements: Vec<ObjectRef>,
    #[serde(default)]
    pub membership: Option<RoleMembership>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub requestable: bool,
    #[serde(default)]
    pub access_request_config: Option<AccessRequestConfig>,
    #[serde(default)]
    pub revocation_request_config: Option<RevocationRequestConfig>,
    #[serde(default)]
    pub segments: Vec<String>,
}

impl Role {
    pub fn new(name: impl Into<String>, owner: ObjectRef) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            owner,
            access_profiles: Vec::new(),
            entitlements: Vec::new(),
            membership: None,
            enabled: true,
            requestable: false,
            access_request_config: None,
            revocation_request_config: None,
            segments: Vec::new(),
        }
    }

    pub fn to_canonical(&self) -> Result<CanonicalDocument, EntityError> {
        to_document(EntityKind::Role, self)
    }

    pub fn from_canonical(document: &CanonicalDocument) -> Result<Self, EntityError> {
        from_document(EntityKind::Role, document)
    }
}
