//! The remote object store seam.
//!
//! The driver talks to the identity-governance service only through
//! [`RemoteObjectStore`]. [`HttpStore`] is the production implementation;
//! [`MemoryStore`] replays patches locally and is what the test suites use.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use govsync_document::EntityKind;
use govsync_patch::PatchOperation;

pub use http::HttpStore;
pub use memory::{MemoryStore, StoreCall, StoreOp};

/// Structured error body returned by the service for rejected requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorPayload {
    #[serde(default)]
    pub code: Option<i64>,
    pub message: String,
    #[serde(default)]
    pub error_code: Option<i64>,
}

impl ApiErrorPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            error_code: None,
        }
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_error_code(mut self, error_code: i64) -> Self {
        self.error_code = Some(error_code);
        self
    }

    /// Parses a response body. Anything that is not a JSON object with a
    /// string `message` is not a structured error.
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: String },

    /// The service rejected the request and said why.
    #[error("{}", payload.message)]
    Api { status: u16, payload: ApiErrorPayload },

    #[error("{message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("request cancelled")]
    Cancelled,
}

impl RemoteError {
    pub fn api(status: u16, payload: ApiErrorPayload) -> Self {
        RemoteError::Api { status, payload }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        RemoteError::Transport {
            message: message.into(),
            source: None,
        }
    }

    pub fn transport_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RemoteError::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound { .. })
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// CRUD over entity documents, addressed by kind and server id.
///
/// Documents cross this boundary as plain JSON; the caller parses them with
/// the shape of the entity's profile.
#[async_trait]
pub trait RemoteObjectStore: Send + Sync {
    async fn get(&self, kind: EntityKind, id: &str) -> RemoteResult<serde_json::Value>;

    async fn create(
        &self,
        kind: EntityKind,
        document: &serde_json::Value,
    ) -> RemoteResult<serde_json::Value>;

    /// Applies `operations` as one batch. The response is the updated
    /// document, or `Null` when the service answers without a body.
    async fn patch(
        &self,
        kind: EntityKind,
        id: &str,
        operations: &[PatchOperation],
    ) -> RemoteResult<serde_json::Value>;

    async fn delete(&self, kind: EntityKind, id: &str) -> RemoteResult<()>;
}
