//! In-process object store.
//!
//! Keeps documents as JSON, applies patches with the same applier the test
//! suites use, stamps `id`/`created`/`modified` the way the service does and
//! records every call. Failures can be primed per operation.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::debug;

use govsync_document::EntityKind;
use govsync_patch::{apply_ops, PatchOperation};

use super::{ApiErrorPayload, RemoteError, RemoteObjectStore, RemoteResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Get,
    Create,
    Patch,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Get {
        kind: EntityKind,
        id: String,
    },
    Create {
        kind: EntityKind,
    },
    Patch {
        kind: EntityKind,
        id: String,
        operations: Vec<PatchOperation>,
    },
    Delete {
        kind: EntityKind,
        id: String,
    },
}

impl StoreCall {
    pub fn op(&self) -> StoreOp {
        match self {
            StoreCall::Get { .. } => StoreOp::Get,
            StoreCall::Create { .. } => StoreOp::Create,
            StoreCall::Patch { .. } => StoreOp::Patch,
            StoreCall::Delete { .. } => StoreOp::Delete,
        }
    }
}

#[derive(Default)]
struct Inner {
    objects: HashMap<(EntityKind, String), Value>,
    calls: Vec<StoreCall>,
    failures: VecDeque<(StoreOp, RemoteError)>,
    sequence: u64,
    bodyless_patch: bool,
}

impl Inner {
    fn take_failure(&mut self, op: StoreOp) -> Option<RemoteError> {
        let at = self.failures.iter().position(|(o, _)| *o == op)?;
        self.failures.remove(at).map(|(_, err)| err)
    }

    fn timestamp(&mut self) -> String {
        self.sequence += 1;
        format!("2024-01-01T00:00:{:02}Z", self.sequence % 60)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch responses carry no body, so callers must re-read.
    pub fn with_bodyless_patch(self) -> Self {
        Self {
            inner: Mutex::new(Inner {
                bodyless_patch: true,
                ..self.inner.into_inner()
            }),
        }
    }

    /// Stores `document` under its `id` as-is, bypassing call recording.
    pub async fn seed(&self, kind: EntityKind, document: Value) -> Option<String> {
        let id = document.get("id")?.as_str()?.to_string();
        self.inner
            .lock()
            .await
            .objects
            .insert((kind, id.clone()), document);
        Some(id)
    }

    /// The next call of `op` fails with `error`. Primed failures are consumed
    /// in the order they were added.
    pub async fn fail_next(&self, op: StoreOp, error: RemoteError) {
        self.inner.lock().await.failures.push_back((op, error));
    }

    /// Removes an object behind the caller's back, as another actor would.
    pub async fn forget(&self, kind: EntityKind, id: &str) -> Option<Value> {
        self.inner.lock().await.objects.remove(&(kind, id.to_string()))
    }

    pub async fn object(&self, kind: EntityKind, id: &str) -> Option<Value> {
        self.inner
            .lock()
            .await
            .objects
            .get(&(kind, id.to_string()))
            .cloned()
    }

    pub async fn calls(&self) -> Vec<StoreCall> {
        self.inner.lock().await.calls.clone()
    }

    pub async fn call_count(&self, op: StoreOp) -> usize {
        self.inner
            .lock()
            .await
            .calls
            .iter()
            .filter(|call| call.op() == op)
            .count()
    }
}

#[async_trait]
impl RemoteObjectStore for MemoryStore {
    async fn get(&self, kind: EntityKind, id: &str) -> RemoteResult<Value> {
        let mut inner = self.inner.lock().await;
        inner.calls.push(StoreCall::Get {
            kind,
            id: id.to_string(),
        });
        if let Some(err) = inner.take_failure(StoreOp::Get) {
            return Err(err);
        }
        inner
            .objects
            .get(&(kind, id.to_string()))
            .cloned()
            .ok_or_else(|| RemoteError::NotFound {
                kind,
                id: id.to_string(),
            })
    }

    async fn create(&self, kind: EntityKind, document: &Value) -> RemoteResult<Value> {
        let mut inner = self.inner.lock().await;
        inner.calls.push(StoreCall::Create { kind });
        if let Some(err) = inner.take_failure(StoreOp::Create) {
            return Err(err);
        }
        let Value::Object(mut fields) = document.clone() else {
            return Err(RemoteError::api(
                400,
                ApiErrorPayload::new("request body must be an object").with_code(400),
            ));
        };
        let stamp = inner.timestamp();
        let id = format!("{}-{:04}", kind.as_str(), inner.sequence);
        fields.insert("id".into(), json!(id));
        fields.insert("created".into(), json!(stamp));
        fields.insert("modified".into(), json!(stamp));
        let stored = Value::Object(fields);
        inner.objects.insert((kind, id.clone()), stored.clone());
        debug!(kind = %kind, id = %id, "memory store created object");
        Ok(stored)
    }

    async fn patch(
        &self,
        kind: EntityKind,
        id: &str,
        operations: &[PatchOperation],
    ) -> RemoteResult<Value> {
        let mut inner = self.inner.lock().await;
        inner.calls.push(StoreCall::Patch {
            kind,
            id: id.to_string(),
            operations: operations.to_vec(),
        });
        if let Some(err) = inner.take_failure(StoreOp::Patch) {
            return Err(err);
        }
        let key = (kind, id.to_string());
        let current = inner.objects.get(&key).ok_or_else(|| RemoteError::NotFound {
            kind,
            id: id.to_string(),
        })?;
        let mut patched = apply_ops(current, operations).map_err(|err| {
            RemoteError::api(400, ApiErrorPayload::new(err.to_string()).with_code(400))
        })?;
        let stamp = inner.timestamp();
        if let Value::Object(fields) = &mut patched {
            fields.insert("modified".into(), json!(stamp));
        }
        inner.objects.insert(key, patched.clone());
        debug!(kind = %kind, id = %id, operations = operations.len(), "memory store patched object");
        if inner.bodyless_patch {
            Ok(Value::Null)
        } else {
            Ok(patched)
        }
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> RemoteResult<()> {
        let mut inner = self.inner.lock().await;
        inner.calls.push(StoreCall::Delete {
            kind,
            id: id.to_string(),
        });
        if let Some(err) = inner.take_failure(StoreOp::Delete) {
            return Err(err);
        }
        inner
            .objects
            .remove(&(kind, id.to_string()))
            .map(|_| ())
            .ok_or_else(|| RemoteError::NotFound {
                kind,
                id: id.to_string(),
            })
    }
}
