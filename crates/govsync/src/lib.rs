//! govsync — declarative reconciliation of identity-governance entities.
//!
//! A cycle compares the document the service last returned with the one
//! the configuration asks for, sends the difference as one batch of patch
//! operations and re-reads the service's answer:
//!
//! * [`entity`] — per-kind profiles and the typed Role / AccessProfile
//!   models, including the membership criteria tree;
//! * [`driver`] — the [`Reconciler`] state machine;
//! * [`store`] — the [`RemoteObjectStore`] seam and its HTTP and in-memory
//!   implementations;
//! * [`config`] — TOML configuration.
//!
//! The diff engine and wire codec live in `govsync-patch`, the document
//! model in `govsync-document`.

pub mod cli;
pub mod config;
pub mod driver;
pub mod entity;
pub mod error;
pub mod store;

pub use config::{ConfigError, GovsyncConfig, StoreConfig};
pub use driver::{plan, CycleReport, ReconcileState, Reconciled, Reconciler};
pub use entity::{EntityError, EntityProfile};
pub use error::ReconcileError;
pub use store::{HttpStore, MemoryStore, RemoteError, RemoteObjectStore};

pub use govsync_document::{CanonicalDocument, EntityKind, Value};
pub use govsync_patch::PatchOperation;
