use serde::{Deserialize, Serialize};

use govsync_document::{CanonicalDocument, EntityKind};

use super::role::{AccessRequestConfig, RevocationRequestConfig};
use super::{from_document, to_document, EntityError, ObjectRef};

/// A bundle of entitlements from one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub owner: ObjectRef,
    pub source: ObjectRef,
    #[serde(default)]
    pub entitlements: Vec<ObjectRef>,
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

impl AccessProfile {
    pub fn new(name: impl Into<String>, owner: ObjectRef, source: ObjectRef) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            owner,
            source,
            entitlements: Vec::new(),
            enabled: true,
            requestable: true,
            access_request_config: None,
            revocation_request_config: None,
            segments: Vec::new(),
        }
    }

    pub fn to_canonical(&self) -> Result<CanonicalDocument, EntityError> {
        to_document(EntityKind::AccessProfile, self)
    }

    pub fn from_canonical(document: &CanonicalDocument) -> Result<Self, EntityError> {
        from_document(EntityKind::AccessProfile, document)
    }
}
