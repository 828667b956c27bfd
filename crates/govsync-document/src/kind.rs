//! The entity kinds managed by the provider.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

/// Tags a document with the entity type it describes.
///
/// Two documents are only comparable when their kinds agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    AccessProfile,
    Role,
    Entitlement,
    GovernanceGroup,
    Segment,
    Application,
    MetadataAttribute,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::AccessProfile,
        EntityKind::Role,
        EntityKind::Entitlement,
        EntityKind::GovernanceGroup,
        EntityKind::Segment,
        EntityKind::Application,
        EntityKind::MetadataAttribute,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::AccessProfile => "access_profile",
            EntityKind::Role => "role",
            EntityKind::Entitlement => "entitlement",
            EntityKind::GovernanceGroup => "governance_group",
            EntityKind::Segment => "segment",
            EntityKind::Application => "application",
            EntityKind::MetadataAttribute => "metadata_attribute",
        }
    }

    /// The remote collection holding entities of this kind.
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::AccessProfile => "access-profiles",
            EntityKind::Role => "roles",
            EntityKind::Entitlement => "entitlements",
            EntityKind::GovernanceGroup => "workgroups",
            EntityKind::Segment => "segments",
            EntityKind::Application => "source-apps",
            EntityKind::MetadataAttribute => "access-model-metadata/attributes",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| DocumentError::UnknownKind(s.to_string()))
    }
}
