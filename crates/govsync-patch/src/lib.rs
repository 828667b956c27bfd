//! govsync-patch — computing and expressing changes between documents.
//!
//! The pipeline is `diff` → `translate` → wire codec:
//!
//! * [`diff`] compares a previous and a desired [`CanonicalDocument`] and
//!   yields [`RawChange`]s in a fixed visitation order;
//! * [`translate`] turns those into [`PatchOperation`]s, applying per-field
//!   policies the remote API needs;
//! * [`codec::json`] renders operations in the RFC 6902 wire format.
//!
//! [`apply`] replays operations locally, which is how the in-memory store
//! and the test suites check that a patch really produces its target.
//!
//! [`CanonicalDocument`]: govsync_document::CanonicalDocument

pub mod apply;
pub mod codec;
pub mod diff;
pub mod translate;
pub mod types;

pub use apply::{apply_op, apply_ops, apply_to_document};
pub use codec::json::{from_json, from_json_patch, to_json, to_json_patch};
pub use diff::{diff, IgnoreSet};
pub use translate::{translate, FieldPolicies, FieldPolicy};
pub use types::{ChangeKind, DiffError, PatchError, PatchOperation, RawChange};
