//! Validation of locator strings coming from configuration or the wire.

use thiserror::Error;

const MAX_POINTER_LENGTH: usize = 1024;

const MAX_PATH_LENGTH: usize = 64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("pointer must be empty or start with '/': {0:?}")]
    PointerInvalid(String),
    #[error("pointer longer than {MAX_POINTER_LENGTH} characters")]
    PointerTooLong,
    #[error("path deeper than {MAX_PATH_LENGTH} steps")]
    PathTooLong,
    #[error("invalid escape sequence in {0:?}")]
    InvalidEscape(String),
}

/// Validates a locator string.
///
/// ```
/// use govsync_pointer::validate_pointer;
///
/// assert!(validate_pointer("").is_ok());
/// assert!(validate_pointer("/owner/id").is_ok());
/// assert!(validate_pointer("owner/id").is_err());
/// assert!(validate_pointer("/a~2").is_err());
/// ```
pub fn validate_pointer(pointer: &str) -> Result<(), ValidationError> {
    if pointer.is_empty() {
        return Ok(());
    }
    if !pointer.starts_with('/') {
        return Err(ValidationError::PointerInvalid(pointer.to_string()));
    }
    if pointer.len() > MAX_POINTER_LENGTH {
        return Err(ValidationError::PointerTooLong);
    }
    let mut chars = pointer.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '~' && !matches!(chars.peek(), Some('0') | Some('1')) {
            return Err(ValidationError::InvalidEscape(pointer.to_string()));
        }
    }
    Ok(())
}

/// Validates a parsed path.
pub fn validate_path(path: &[String]) -> Result<(), ValidationError> {
    if path.len() > MAX_PATH_LENGTH {
        return Err(ValidationError::PathTooLong);
    }
    Ok(())
}
