//! Per-kind reconciliation profiles.
//!
//! A profile is everything the driver needs to know about one entity kind:
//! which arrays are sets, which paths the service owns, which fields need
//! special treatment on the wire, and how to check a desired document
//! before anything is sent.

use govsync_document::{CanonicalDocument, DocumentError, EntityKind, Shape, Value};
use govsync_patch::{FieldPolicies, FieldPolicy, IgnoreSet};
use govsync_pointer::{parse_pointer, Path};

use super::approval::{normalize_schemes, validate_schemes};
use super::criteria::{CriteriaNode, MembershipCriteria};
use super::EntityError;

pub type Validator = fn(&CanonicalDocument) -> Result<(), EntityError>;
pub type Normalizer = fn(&mut CanonicalDocument);

/// Paths the service computes for every kind.
const SERVER_FIELDS: [&str; 3] = ["/id", "/created", "/modified"];

const MEMBERSHIP_CRITERIA: &str = "/membership/criteria";

#[derive(Debug, Clone)]
pub struct EntityProfile {
    pub kind: EntityKind,
    /// Field holding the server-side identifier.
    pub id_field: &'static str,
    pub shape: Shape,
    pub ignore: IgnoreSet,
    pub policies: FieldPolicies,
    /// `(path, sentinel)`: a `null` at `path` is read as `sentinel`.
    pub null_sentinels: Vec<(Path, Value)>,
    pub validators: Vec<Validator>,
    /// Rewrites equivalent spellings into one form before comparison.
    pub normalizers: Vec<Normalizer>,
}

impl EntityProfile {
    fn base(kind: EntityKind, extra_ignore: &[&str]) -> Self {
        let mut ignore = IgnoreSet::of(&SERVER_FIELDS);
        ignore.extend(&IgnoreSet::of(extra_ignore));
        Self {
            kind,
            id_field: "id",
            shape: Shape::new(),
            ignore,
            policies: FieldPolicies::new(),
            null_sentinels: Vec::new(),
            validators: Vec::new(),
            normalizers: Vec::new(),
        }
    }

    fn with_sets(mut self, paths: &[&str]) -> Self {
        for path in paths {
            self.shape = self.shape.with_set(path);
        }
        self
    }

    fn clearing_description(mut self) -> Self {
        self.policies = self
            .policies
            .with("/description", FieldPolicy::ClearWithEmptyString);
        self
    }

    /// The built-in profile of `kind`.
    pub fn for_kind(kind: EntityKind) -> Self {
        match kind {
            EntityKind::AccessProfile => Self::base(
                kind,
                &["/owner/name", "/source/name", "/entitlements/*/name"],
            )
            .with_sets(&["/entitlements", "/segments"])
            .clearing_description()
            .with_schemes(),

            // The role API rejects a null description but takes "", so the
            // null is rewritten rather than patched through a policy.
            EntityKind::Role => {
                let mut profile = Self::base(
                    kind,
                    &[
                        "/owner/name",
                        "/accessProfiles/*/name",
                        "/entitlements/*/name",
                        "/membership/identities/*/name",
                        "/membership/identities/*/aliasName",
                        "/legacyMembershipInfo",
                    ],
                )
                .with_sets(&[
                    "/accessProfiles",
                    "/entitlements",
                    "/segments",
                    "/membership/identities",
                ])
                .with_schemes();
                profile
                    .null_sentinels
                    .push((parse_pointer("/description"), Value::String(String::new())));
                profile.validators.push(validate_criteria);
                profile.normalizers.push(normalize_criteria);
                profile
            }

            EntityKind::Entitlement => Self::base(
                kind,
                &[
                    "/owner/name",
                    "/source",
                    "/attribute",
                    "/value",
                    "/directPermissions",
                    "/manuallyUpdatedFields",
                ],
            )
            .with_sets(&["/segments"])
            .clearing_description(),

            EntityKind::GovernanceGroup => Self::base(
                kind,
                &[
                    "/owner/name",
                    "/owner/displayName",
                    "/owner/emailAddress",
                    "/memberCount",
                    "/connectionCount",
                ],
            )
            .clearing_description(),

            EntityKind::Segment => Self::base(kind, &["/owner/name"]).clearing_description(),

            EntityKind::Application => Self::base(
                kind,
                &[
                    "/cloudAppId",
                    "/owner/name",
                    "/accountSource/name",
                    "/accountSource/passwordPolicies",
                ],
            )
            .clearing_description(),

            EntityKind::MetadataAttribute => {
                let mut profile = Self::base(kind, &[]).with_sets(&["/objectTypes"]);
                profile.id_field = "key";
                profile
            }
        }
    }

    fn with_schemes(mut self) -> Self {
        self.validators.push(validate_schemes);
        self.normalizers.push(normalize_schemes);
        self
    }

    pub fn with_extra_ignore(mut self, extra: &IgnoreSet) -> Self {
        self.ignore.extend(extra);
        self
    }

    /// Parses a server or configuration document with this kind's shape.
    pub fn parse(&self, json: &serde_json::Value) -> Result<CanonicalDocument, DocumentError> {
        CanonicalDocument::from_json(self.kind, json, &self.shape)
    }

    pub fn id_of<'a>(&self, document: &'a CanonicalDocument) -> Option<&'a str> {
        document
            .fields()
            .get(self.id_field)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }

    pub fn validate(&self, document: &CanonicalDocument) -> Result<(), EntityError> {
        if document.kind() != self.kind {
            return Err(EntityError::WrongKind {
                expected: self.kind,
                found: document.kind(),
            });
        }
        self.validators
            .iter()
            .try_for_each(|validate| validate(document))
    }

    /// The form both sides are brought to before they are compared:
    /// sentinels substituted for nulls, then normalizers applied.
    pub fn prepare(&self, document: &CanonicalDocument) -> CanonicalDocument {
        let mut prepared = document.clone();
        for (path, sentinel) in &self.null_sentinels {
            if let Some(slot) = prepared.get_mut(path) {
                if slot.is_null() {
                    *slot = sentinel.clone();
                }
            }
        }
        for normalize in &self.normalizers {
            normalize(&mut prepared);
        }
        prepared
    }
}

fn validate_criteria(document: &CanonicalDocument) -> Result<(), EntityError> {
    let path = parse_pointer(MEMBERSHIP_CRITERIA);
    match document.get(&path) {
        None | Some(Value::Null) => Ok(()),
        Some(criteria) => {
            MembershipCriteria::from_canonical_at(criteria, &path)?;
            Ok(())
        }
    }
}

fn normalize_criteria(document: &mut CanonicalDocument) {
    let path = parse_pointer(MEMBERSHIP_CRITERIA);
    let Some(slot) = document.get_mut(&path) else {
        return;
    };
    if slot.is_null() {
        return;
    }
    if let Ok(criteria) = MembershipCriteria::from_canonical_at(slot, &path) {
        *slot = criteria.to_canonical();
    }
}
