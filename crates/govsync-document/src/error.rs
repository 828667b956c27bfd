use thiserror::Error;

use crate::kind::EntityKind;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DocumentError {
    #[error("{kind} document must be a JSON object, got {found}")]
    NotAnObject { kind: EntityKind, found: &'static str },
    #[error("unknown entity kind: {0}")]
    UnknownKind(String),
    #[error("no value at {path}")]
    NotFound { path: String },
}
