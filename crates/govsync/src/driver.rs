//! The reconciliation driver.
//!
//! One cycle takes the last known server document (`previous`) and the
//! document the configuration asks for (`desired`) through
//!
//! ```text
//! Created → Diffing → Applying → Reparsing → Settled
//!                        └──────────→ Failed
//! ```
//!
//! and returns the server's own view of the entity afterwards. The locally
//! computed desired document is never taken as the new state: the next
//! cycle diffs against what the service actually stored.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use govsync_document::{CanonicalDocument, EntityKind};
use govsync_patch::{diff, translate, PatchOperation};

use crate::entity::EntityProfile;
use crate::error::ReconcileError;
use crate::store::{RemoteError, RemoteObjectStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReconcileState {
    Created,
    Diffing,
    Applying,
    Reparsing,
    Settled,
    Failed,
}

impl ReconcileState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReconcileState::Settled | ReconcileState::Failed)
    }
}

impl fmt::Display for ReconcileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReconcileState::Created => "created",
            ReconcileState::Diffing => "diffing",
            ReconcileState::Applying => "applying",
            ReconcileState::Reparsing => "reparsing",
            ReconcileState::Settled => "settled",
            ReconcileState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// The states one cycle went through, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub kind: EntityKind,
    pub transitions: Vec<ReconcileState>,
}

impl CycleReport {
    fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            transitions: Vec::new(),
        }
    }

    fn enter(&mut self, state: ReconcileState) {
        debug!(kind = %self.kind, state = %state, "reconcile state");
        self.transitions.push(state);
    }

    pub fn state(&self) -> Option<ReconcileState> {
        self.transitions.last().copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reconciled {
    /// The entity as the service now has it, with the operations that were
    /// sent. No operations means nothing was sent and `document` is the
    /// previous document.
    Settled {
        document: CanonicalDocument,
        operations: Vec<PatchOperation>,
    },
    /// The entity no longer exists; the caller should drop its state.
    Deleted,
}

impl Reconciled {
    pub fn document(&self) -> Option<&CanonicalDocument> {
        match self {
            Reconciled::Settled { document, .. } => Some(document),
            Reconciled::Deleted => None,
        }
    }

    pub fn operations(&self) -> &[PatchOperation] {
        match self {
            Reconciled::Settled { operations, .. } => operations,
            Reconciled::Deleted => &[],
        }
    }
}

/// The operations that would take `previous` to `desired`, without
/// contacting the service.
pub fn plan(
    previous: &CanonicalDocument,
    desired: &CanonicalDocument,
    profile: &EntityProfile,
) -> Result<Vec<PatchOperation>, ReconcileError> {
    profile
        .validate(desired)
        .map_err(|source| ReconcileError::Invalid {
            kind: profile.kind,
            source,
        })?;
    let changes = diff(
        &profile.prepare(previous),
        &profile.prepare(desired),
        &profile.ignore,
    )?;
    let operations = translate(&changes, &profile.policies);
    debug!(kind = %profile.kind, changes = changes.len(), operations = operations.len(), "planned");
    Ok(operations)
}

pub struct Reconciler<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for Reconciler<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: RemoteObjectStore + ?Sized> Reconciler<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub async fn reconcile(
        &self,
        previous: &CanonicalDocument,
        desired: &CanonicalDocument,
        profile: &EntityProfile,
    ) -> Result<Reconciled, ReconcileError> {
        self.reconcile_with_report(previous, desired, profile).await.1
    }

    /// Runs one cycle and also returns the states it went through.
    #[instrument(skip_all, fields(kind = %profile.kind, id = profile.id_of(previous).unwrap_or_default()))]
    pub async fn reconcile_with_report(
        &self,
        previous: &CanonicalDocument,
        desired: &CanonicalDocument,
        profile: &EntityProfile,
    ) -> (CycleReport, Result<Reconciled, ReconcileError>) {
        let mut report = CycleReport::new(profile.kind);
        let result = self.cycle(&mut report, previous, desired, profile).await;
        if let Err(err) = &result {
            warn!(kind = %profile.kind, error = %err, "reconcile failed");
            report.enter(ReconcileState::Failed);
        }
        (report, result)
    }

    async fn cycle(
        &self,
        report: &mut CycleReport,
        previous: &CanonicalDocument,
        desired: &CanonicalDocument,
        profile: &EntityProfile,
    ) -> Result<Reconciled, ReconcileError> {
        let kind = profile.kind;
        report.enter(ReconcileState::Created);
        profile
            .validate(desired)
            .map_err(|source| ReconcileError::Invalid { kind, source })?;

        report.enter(ReconcileState::Diffing);
        let changes = diff(
            &profile.prepare(previous),
            &profile.prepare(desired),
            &profile.ignore,
        )?;
        let operations = translate(&changes, &profile.policies);
        debug!(changes = changes.len(), operations = operations.len(), "diffed");

        report.enter(ReconcileState::Applying);
        if operations.is_empty() {
            report.enter(ReconcileState::Settled);
            return Ok(Reconciled::Settled {
                document: previous.clone(),
                operations,
            });
        }
        let id = profile
            .id_of(previous)
            .ok_or(ReconcileError::MissingId {
                kind,
                field: profile.id_field,
            })?
            .to_string();
        let response = self
            .store
            .patch(kind, &id, &operations)
            .await
            .map_err(|err| ReconcileError::remote("patch", kind, &id, err))?;
        info!(kind = %kind, id = %id, operations = operations.len(), "patch applied");

        report.enter(ReconcileState::Reparsing);
        let json = if carries_document(&response) {
            response
        } else {
            match self.store.get(kind, &id).await {
                Ok(json) => json,
                Err(RemoteError::NotFound { .. }) => {
                    info!(kind = %kind, id = %id, "entity disappeared after patch");
                    report.enter(ReconcileState::Settled);
                    return Ok(Reconciled::Deleted);
                }
                Err(err) => return Err(ReconcileError::remote("get", kind, &id, err)),
            }
        };
        let document = profile
            .parse(&json)
            .map_err(|source| ReconcileError::Reparse { kind, source })?;

        report.enter(ReconcileState::Settled);
        Ok(Reconciled::Settled {
            document,
            operations,
        })
    }

    /// Reads the server document, `None` if it does not exist.
    #[instrument(skip(self, profile), fields(kind = %profile.kind))]
    pub async fn read(
        &self,
        id: &str,
        profile: &EntityProfile,
    ) -> Result<Option<CanonicalDocument>, ReconcileError> {
        match self.store.get(profile.kind, id).await {
            Ok(json) => profile
                .parse(&json)
                .map(Some)
                .map_err(|source| ReconcileError::Reparse {
                    kind: profile.kind,
                    source,
                }),
            Err(RemoteError::NotFound { .. }) => Ok(None),
            Err(err) => Err(ReconcileError::remote("get", profile.kind, id, err)),
        }
    }

    /// Creates the entity and returns the server's document for it. Ignored
    /// paths such as `id` are not sent.
    #[instrument(skip_all, fields(kind = %profile.kind))]
    pub async fn create(
        &self,
        desired: &CanonicalDocument,
        profile: &EntityProfile,
    ) -> Result<CanonicalDocument, ReconcileError> {
        let kind = profile.kind;
        profile
            .validate(desired)
            .map_err(|source| ReconcileError::Invalid { kind, source })?;
        let prepared = profile.prepare(desired);
        let body = CanonicalDocument::new(kind, profile.ignore.prune(prepared.fields()));
        let created = self
            .store
            .create(kind, &body.to_json())
            .await
            .map_err(|err| ReconcileError::remote("create", kind, "", err))?;
        let document = profile
            .parse(&created)
            .map_err(|source| ReconcileError::Reparse { kind, source })?;
        info!(kind = %kind, id = profile.id_of(&document).unwrap_or_default(), "entity created");
        Ok(document)
    }

    /// Deletes the entity. An entity that is already gone counts as deleted.
    #[instrument(skip(self, profile), fields(kind = %profile.kind))]
    pub async fn delete(&self, id: &str, profile: &EntityProfile) -> Result<(), ReconcileError> {
        match self.store.delete(profile.kind, id).await {
            Ok(()) | Err(RemoteError::NotFound { .. }) => Ok(()),
            Err(err) => Err(ReconcileError::remote("delete", profile.kind, id, err)),
        }
    }
}

/// An empty body (or `{}`) means the service did not echo the document.
fn carries_document(response: &Value) -> bool {
    match response {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_responses_do_not_carry_a_document() {
        assert!(!carries_document(&Value::Null));
        assert!(!carries_document(&json!({})));
        assert!(carries_document(&json!({"id": "r1"})));
    }

    #[test]
    fn plan_skips_ignored_paths() {
        let profile = EntityProfile::for_kind(EntityKind::Segment);
        let previous = profile
            .parse(&json!({"id": "s1", "modified": "t1", "name": "EU", "owner": {"id": "o", "name": "Ann"}}))
            .unwrap();
        let desired = profile
            .parse(&json!({"name": "EU", "owner": {"id": "o"}}))
            .unwrap();
        assert!(plan(&previous, &desired, &profile).unwrap().is_empty());
    }

    #[test]
    fn terminal_states() {
        assert!(ReconcileState::Settled.is_terminal());
        assert!(ReconcileState::Failed.is_terminal());
        assert!(!ReconcileState::Applying.is_terminal());
    }
}
