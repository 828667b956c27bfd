//! Locator patterns.
//!
//! A pattern is a locator in which a `*` step matches any single step. It
//! is how entity profiles name "the `name` of every element of
//! `accessProfiles`" (`/accessProfiles/*/name`) without knowing list sizes.

use std::fmt;

use crate::{
    escape_component, parse_pointer_relaxed, validate_path, validate_pointer, Path, ValidationError,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PatternStep {
    Key(String),
    Any,
}

impl PatternStep {
    fn matches(&self, step: &str) -> bool {
        match self {
            PatternStep::Key(key) => key == step,
            PatternStep::Any => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathPattern {
    steps: Vec<PatternStep>,
}

impl PathPattern {
    /// Parses a pattern. The leading `/` may be omitted.
    ///
    /// ```
    /// use govsync_pointer::PathPattern;
    ///
    /// let pattern = PathPattern::parse("accessProfiles/*/name").unwrap();
    /// assert_eq!(pattern.to_string(), "/accessProfiles/*/name");
    /// ```
    pub fn parse(pattern: &str) -> Result<Self, ValidationError> {
        let path = parse_pointer_relaxed(pattern);
        let normalized = if pattern.starts_with('/') || pattern.is_empty() {
            pattern.to_string()
        } else {
            format!("/{pattern}")
        };
        validate_pointer(&normalized)?;
        validate_path(&path)?;
        Ok(Self::from_steps(path))
    }

    /// Builds a pattern from a locator known to be well formed, such as the
    /// static declarations of entity profiles. Escapes are not validated.
    pub fn from_pointer(pattern: &str) -> Self {
        Self::from_steps(parse_pointer_relaxed(pattern))
    }

    /// Builds a pattern from already-parsed steps; `*` becomes a wildcard.
    pub fn from_steps(path: Path) -> Self {
        let steps = path
            .into_iter()
            .map(|s| if s == "*" { PatternStep::Any } else { PatternStep::Key(s) })
            .collect();
        Self { steps }
    }

    pub fn steps(&self) -> &[PatternStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// True if `path` matches this pattern step for step.
    pub fn matches(&self, path: &[String]) -> bool {
        path.len() == self.steps.len()
            && self.steps.iter().zip(path).all(|(p, s)| p.matches(s))
    }

    /// True if `path` matches this pattern or lies below a match.
    ///
    /// ```
    /// use govsync_pointer::{parse_pointer, PathPattern};
    ///
    /// let owner = PathPattern::parse("/owner").unwrap();
    /// assert!(owner.covers(&parse_pointer("/owner")));
    /// assert!(owner.covers(&parse_pointer("/owner/name")));
    /// assert!(!owner.covers(&parse_pointer("/ownerId")));
    /// ```
    pub fn covers(&self, path: &[String]) -> bool {
        path.len() >= self.steps.len()
            && self.steps.iter().zip(path).all(|(p, s)| p.matches(s))
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            match step {
                PatternStep::Key(key) => write!(f, "/{}", escape_component(key))?,
                PatternStep::Any => f.write_str("/*")?,
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for PathPattern {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
