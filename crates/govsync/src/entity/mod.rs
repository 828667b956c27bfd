//! Entity knowledge: per-kind profiles and the typed models of the entities
//! whose shape matters to reconciliation.

/// A closed set of upper-case wire names.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $($wire => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub mod access_profile;
pub mod approval;
pub mod criteria;
pub mod profile;
pub mod role;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use govsync_document::{CanonicalDocument, DocumentError, EntityKind};

pub use access_profile::AccessProfile;
pub use approval::{ApprovalScheme, ApproverType};
pub use criteria::{
    Comparator, Comparison, Criteria, CriteriaError, CriteriaKey, CriteriaLevel1, CriteriaLevel2,
    CriteriaLevel3, CriteriaNode, KeyType, LogicalOperator, MembershipCriteria,
};
pub use profile::EntityProfile;
pub use role::Role;

#[derive(Debug, Error)]
pub enum EntityError {
    #[error(transparent)]
    Criteria(#[from] CriteriaError),

    #[error("approval scheme at {path}: {message}")]
    Approval { path: String, message: String },

    #[error("expected a {expected} document, got {found}")]
    WrongKind {
        expected: EntityKind,
        found: EntityKind,
    },

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("malformed {kind} document: {source}")]
    Malformed {
        kind: EntityKind,
        #[source]
        source: serde_json::Error,
    },
}

/// A reference to another object: `{type, id, name}`. The name is filled in
/// by the service and is never compared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    #[serde(rename = "type")]
    pub ref_type: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ObjectRef {
    pub fn new(ref_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            ref_type: ref_type.into(),
            id: id.into(),
            name: None,
        }
    }

    pub fn identity(id: impl Into<String>) -> Self {
        Self::new("IDENTITY", id)
    }

    pub fn access_profile(id: impl Into<String>) -> Self {
        Self::new("ACCESS_PROFILE", id)
    }

    pub fn entitlement(id: impl Into<String>) -> Self {
        Self::new("ENTITLEMENT", id)
    }

    pub fn source(id: impl Into<String>) -> Self {
        Self::new("SOURCE", id)
    }
}

/// Renders a typed model with the shape of `kind`'s profile.
pub(crate) fn to_document<T: Serialize>(
    kind: EntityKind,
    model: &T,
) -> Result<CanonicalDocument, EntityError> {
    let json =
        serde_json::to_value(model).map_err(|source| EntityError::Malformed { kind, source })?;
    Ok(EntityProfile::for_kind(kind).parse(&json)?)
}

/// Reads a typed model back from a document of `kind`.
pub(crate) fn from_document<T: DeserializeOwned>(
    kind: EntityKind,
    document: &CanonicalDocument,
) -> Result<T, EntityError> {
    if document.kind() != kind {
        return Err(EntityError::WrongKind {
            expected: kind,
            found: document.kind(),
        });
    }
    EntityProfile::for_kind(kind).validate(document)?;
    serde_json::from_value(document.to_json()).map_err(|source| EntityError::Malformed { kind, source })
}
