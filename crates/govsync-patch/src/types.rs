//! Core types shared by the diff engine, the translator and the codec.

use govsync_document::{DocumentError, EntityKind, Value};
use govsync_pointer::{format_pointer, Path};
use thiserror::Error;

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DiffError {
    /// Comparing documents of two different entity kinds is a caller bug.
    #[error("cannot diff a {previous} document against a {desired} document")]
    ShapeMismatch {
        previous: EntityKind,
        desired: EntityKind,
    },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PatchError {
    #[error("no value at {0}")]
    NotFound(String),
    #[error("invalid list index at {0}")]
    InvalidIndex(String),
    #[error("cannot address a child of a scalar at {0}")]
    InvalidTarget(String),
    #[error("invalid operation: {0}")]
    InvalidOp(String),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

// ── Raw changes ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Add,
    Remove,
    Replace,
}

/// One field-level difference. `None` means the field is absent on that side;
/// `Some(Value::Null)` means it is present and explicitly null.
#[derive(Debug, Clone, PartialEq)]
pub struct RawChange {
    pub path: Path,
    pub previous: Option<Value>,
    pub desired: Option<Value>,
}

impl RawChange {
    pub fn kind(&self) -> ChangeKind {
        match (&self.previous, &self.desired) {
            (None, _) => ChangeKind::Add,
            (Some(_), None) => ChangeKind::Remove,
            (Some(_), Some(_)) => ChangeKind::Replace,
        }
    }

    pub fn pointer(&self) -> String {
        format_pointer(&self.path)
    }
}

// ── Patch operations ──────────────────────────────────────────────────────

/// An addressable instruction accepted by the remote object store.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOperation {
    Add { path: Path, value: Value },
    Remove { path: Path },
    Replace { path: Path, value: Value },
}

impl PatchOperation {
    pub fn op_name(&self) -> &'static str {
        match self {
            PatchOperation::Add { .. } => "add",
            PatchOperation::Remove { .. } => "remove",
            PatchOperation::Replace { .. } => "replace",
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            PatchOperation::Add { path, .. }
            | PatchOperation::Remove { path }
            | PatchOperation::Replace { path, .. } => path,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            PatchOperation::Add { value, .. } | PatchOperation::Replace { value, .. } => Some(value),
            PatchOperation::Remove { .. } => None,
        }
    }

    pub fn pointer(&self) -> String {
        format_pointer(self.path())
    }
}
