use thiserror::Error;

use govsync_document::{DocumentError, EntityKind};
use govsync_patch::DiffError;

use crate::config::ConfigError;
use crate::entity::EntityError;
use crate::store::{ApiErrorPayload, RemoteError};

/// Why a reconciliation cycle failed. No step is retried; the caller
/// decides whether to run the cycle again.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Diff(#[from] DiffError),

    /// The desired document breaks a rule of its kind. Raised before any
    /// request is made.
    #[error("invalid {kind} document: {source}")]
    Invalid {
        kind: EntityKind,
        #[source]
        source: EntityError,
    },

    #[error("{kind} document has no {field}; it cannot be patched")]
    MissingId {
        kind: EntityKind,
        field: &'static str,
    },

    /// The service rejected the request. Displays the service's own message.
    #[error("{}", payload.message)]
    Api {
        operation: &'static str,
        kind: EntityKind,
        id: String,
        status: u16,
        payload: ApiErrorPayload,
    },

    #[error(
        "{operation} {kind} {id} failed: {message} \
         (set RUST_LOG=govsync::store::http=debug to see the raw exchange)"
    )]
    Transport {
        operation: &'static str,
        kind: EntityKind,
        id: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{operation} {kind} {id} was cancelled")]
    Cancelled {
        operation: &'static str,
        kind: EntityKind,
        id: String,
    },

    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: String },

    #[error("the service returned an unusable {kind} document: {source}")]
    Reparse {
        kind: EntityKind,
        #[source]
        source: DocumentError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ReconcileError {
    pub(crate) fn remote(
        operation: &'static str,
        kind: EntityKind,
        id: &str,
        error: RemoteError,
    ) -> Self {
        let id = id.to_string();
        match error {
            RemoteError::NotFound { kind, id } => ReconcileError::NotFound { kind, id },
            RemoteError::Api { status, payload } => ReconcileError::Api {
                operation,
                kind,
                id,
                status,
                payload,
            },
            RemoteError::Transport { message, source } => ReconcileError::Transport {
                operation,
                kind,
                id,
                message,
                source,
            },
            RemoteError::Cancelled => ReconcileError::Cancelled {
                operation,
                kind,
                id,
            },
        }
    }

    /// The service's error payload, when the failure came with one.
    pub fn payload(&self) -> Option<&ApiErrorPayload> {
        match self {
            ReconcileError::Api { payload, .. } => Some(payload),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ReconcileError::Cancelled { .. })
    }
}
