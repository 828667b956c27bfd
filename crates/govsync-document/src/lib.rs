//! govsync-document — the canonical document model.
//!
//! A [`CanonicalDocument`] is one entity's full server-side shape: a tree of
//! named fields holding scalars, explicit nulls, nested objects, ordered
//! lists and unordered sets. Documents are built fresh each reconciliation
//! cycle, either parsed from a server response or produced from a desired
//! configuration, and are never mutated across cycles.

pub mod document;
pub mod error;
pub mod kind;
pub mod shape;
pub mod value;

pub use document::CanonicalDocument;
pub use error::DocumentError;
pub use kind::EntityKind;
pub use shape::Shape;
pub use value::{Fields, Value};
