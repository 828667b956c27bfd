//! Shape declarations.
//!
//! JSON has a single array type, but the canonical model distinguishes
//! ordered lists from unordered sets. A [`Shape`] records which paths of an
//! entity hold sets; every other array is an ordered list.

use govsync_pointer::PathPattern;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shape {
    set_paths: Vec<PathPattern>,
}

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the array at `pattern` to be an unordered set.
    pub fn with_set(mut self, pattern: &str) -> Self {
        self.set_paths.push(PathPattern::from_pointer(pattern));
        self
    }

    pub fn set_paths(&self) -> &[PathPattern] {
        &self.set_paths
    }

    pub fn is_set(&self, path: &[String]) -> bool {
        self.set_paths.iter().any(|pattern| pattern.matches(path))
    }
}
