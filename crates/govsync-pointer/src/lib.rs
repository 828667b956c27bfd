//! Field locators for canonical documents.
//!
//! A locator is a slash-delimited string in the RFC 6901 style (`/owner/id`,
//! `/accessProfiles/0`). Internally it is held as a [`Path`], one component
//! per step, so that escaping only happens at the edges.
//!
//! # Example
//!
//! ```
//! use govsync_pointer::{format_pointer, parse_pointer};
//!
//! let path = parse_pointer("/owner/id");
//! assert_eq!(path, vec!["owner".to_string(), "id".to_string()]);
//! assert_eq!(format_pointer(&path), "/owner/id");
//! ```

use thiserror::Error;

pub mod pattern;
pub mod validate;

pub use pattern::{PathPattern, PatternStep};
pub use validate::{validate_path, validate_pointer, ValidationError};

/// A single step of a path: an object key or a list index in decimal.
pub type PathStep = String;

/// A parsed locator.
pub type Path = Vec<PathStep>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PointerError {
    #[error("root path has no parent")]
    NoParent,
    #[error("invalid list index: {0}")]
    InvalidIndex(String),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Unescapes a path component: `~1` becomes `/`, `~0` becomes `~`.
///
/// Decoding is a single left-to-right scan, so `~01` is `~` followed by
/// `1`, never `/`. A `~` not followed by `0` or `1` is kept as is;
/// [`validate_pointer`] is where such input gets rejected.
///
/// ```
/// use govsync_pointer::unescape_component;
///
/// assert_eq!(unescape_component("a~0b"), "a~b");
/// assert_eq!(unescape_component("c~1d"), "c/d");
/// assert_eq!(unescape_component("~01"), "~1");
/// ```
pub fn unescape_component(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    let mut chars = component.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('~', Some('0')) => {
                chars.next();
                out.push('~');
            }
            ('~', Some('1')) => {
                chars.next();
                out.push('/');
            }
            _ => out.push(c),
        }
    }
    out
}

/// Escapes a path component: `~` becomes `~0`, `/` becomes `~1`.
///
/// ```
/// use govsync_pointer::escape_component;
///
/// assert_eq!(escape_component("a~b"), "a~0b");
/// assert_eq!(escape_component("c/d"), "c~1d");
/// ```
pub fn escape_component(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    for c in component.chars() {
        match c {
            '~' => out.push_str("~0"),
            '/' => out.push_str("~1"),
            _ => out.push(c),
        }
    }
    out
}

/// Parses a locator string into its components.
///
/// The empty string is the root. A leading `/` is required for anything
/// else; callers that accept user input should run [`validate_pointer`] first.
///
/// ```
/// use govsync_pointer::parse_pointer;
///
/// assert_eq!(parse_pointer(""), Vec::<String>::new());
/// assert_eq!(parse_pointer("/"), vec![""]);
/// assert_eq!(parse_pointer("/a~0b/c~1d"), vec!["a~b", "c/d"]);
/// ```
pub fn parse_pointer(pointer: &str) -> Path {
    match pointer.strip_prefix('/') {
        Some(rest) => rest.split('/').map(unescape_component).collect(),
        None => Vec::new(),
    }
}

/// Like [`parse_pointer`] but tolerates a missing leading `/`.
///
/// Configuration files tend to write ignore paths as `owner/name`.
pub fn parse_pointer_relaxed(pointer: &str) -> Path {
    if pointer.is_empty() {
        return Vec::new();
    }
    let rest = pointer.strip_prefix('/').unwrap_or(pointer);
    rest.split('/').map(unescape_component).collect()
}

/// Formats components into a locator string. The root formats as `""`.
pub fn format_pointer(path: &[String]) -> String {
    path.iter()
        .map(|component| format!("/{}", escape_component(component)))
        .collect()
}

/// Returns a copy of `path` extended by one step.
pub fn child(path: &[String], step: impl Into<String>) -> Path {
    let mut out = Vec::with_capacity(path.len() + 1);
    out.extend_from_slice(path);
    out.push(step.into());
    out
}

/// True if `child` lies strictly below `parent`.
///
/// ```
/// use govsync_pointer::is_child;
///
/// let parent = vec!["owner".to_string()];
/// let child = vec!["owner".to_string(), "name".to_string()];
/// assert!(is_child(&parent, &child));
/// assert!(!is_child(&child, &parent));
/// ```
pub fn is_child(parent: &[String], child: &[String]) -> bool {
    parent.len() < child.len() && child[..parent.len()] == *parent
}

/// True if `path` equals `prefix` or lies below it.
pub fn starts_with(path: &[String], prefix: &[String]) -> bool {
    path.len() >= prefix.len() && path[..prefix.len()] == *prefix
}

pub fn parent(path: &[String]) -> Result<Path, PointerError> {
    if path.is_empty() {
        return Err(PointerError::NoParent);
    }
    Ok(path[..path.len() - 1].to_vec())
}

/// Checks that a step is a canonical list index: digits, no leading zero.
///
/// ```
/// use govsync_pointer::is_valid_index;
///
/// assert!(is_valid_index("0"));
/// assert!(is_valid_index("12"));
/// assert!(!is_valid_index("01"));
/// assert!(!is_valid_index("-1"));
/// ```
pub fn is_valid_index(step: &str) -> bool {
    if step.is_empty() {
        return false;
    }
    let bytes = step.as_bytes();
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|b| b.is_ascii_digit())
}

/// Parses a list index step.
pub fn parse_index(step: &str) -> Result<usize, PointerError> {
    if !is_valid_index(step) {
        return Err(PointerError::InvalidIndex(step.to_string()));
    }
    step.parse()
        .map_err(|_| PointerError::InvalidIndex(step.to_string()))
}
