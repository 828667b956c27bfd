#![allow(dead_code)]

use std::sync::Arc;

use govsync::entity::criteria::{Comparison, Criteria, CriteriaKey};
use govsync::entity::role::RoleMembership;
use govsync::entity::{ObjectRef, Role};
use govsync::{CanonicalDocument, EntityKind, EntityProfile, MemoryStore, Reconciler};
use serde_json::json;

pub fn role_profile() -> EntityProfile {
    EntityProfile::for_kind(EntityKind::Role)
}

pub fn role_doc(json: serde_json::Value) -> CanonicalDocument {
    role_profile().parse(&json).expect("role document is an object")
}

/// What the service returns for role `r1` before any cycle ran.
pub fn server_role() -> serde_json::Value {
    json!({
        "id": "r1",
        "created": "2023-06-01T10:00:00Z",
        "modified": "2023-06-01T10:00:00Z",
        "name": "Engineering",
        "description": "old text",
        "owner": {"type": "IDENTITY", "id": "owner-1", "name": "Ada"},
        "accessProfiles": [{"type": "ACCESS_PROFILE", "id": "ap-1", "name": "VPN"}],
        "entitlements": [],
        "membership": null,
        "enabled": false,
        "requestable": false,
        "accessRequestConfig": null,
        "revocationRequestConfig": null,
        "segments": []
    })
}

pub fn engineering_role() -> Role {
    let mut role = Role::new("Engineering", ObjectRef::identity("owner-1"));
    role.access_profiles = vec![
        ObjectRef::access_profile("ap-2"),
        ObjectRef::access_profile("ap-1"),
    ];
    role.membership = Some(RoleMembership::criteria(Criteria::and(vec![
        Criteria::Leaf(Comparison::equals(CriteriaKey::identity("department"), "Eng")),
        Criteria::Leaf(Comparison::equals(
            CriteriaKey::account("status", "src1").unwrap(),
            "active",
        )),
    ])));
    role
}

pub async fn seeded_store(document: serde_json::Value) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.seed(EntityKind::Role, document).await;
    store
}

pub fn reconciler(store: &Arc<MemoryStore>) -> Reconciler<MemoryStore> {
    Reconciler::new(Arc::clone(store))
}
