//! Dual-location identity.
//!
//! `PathPair` is the single chokepoint every file and directory handle is
//! built through. Once a pair exists, these hold for its whole lifetime:
//! - neither path is empty
//! - the two paths differ
//! - both paths end in the same terminal name
//!
//! Child names are checked separately by `validate_child_name` before they
//! are joined onto a pair.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::errors::{DualTierError, Result};

/// An ordered (primary, secondary) pair of candidate locations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathPair {
    primary: PathBuf,
    secondary: PathBuf,
}

impl PathPair {
    pub fn new(primary: impl Into<PathBuf>, secondary: impl Into<PathBuf>) -> Result<Self> {
        let primary = primary.into();
        let secondary = secondary.into();

        if primary.as_os_str().is_empty() {
            return Err(DualTierError::invalid("primary path must not be empty"));
        }
        if secondary.as_os_str().is_empty() {
            return Err(DualTierError::invalid("secondary path must not be empty"));
        }
        if primary == secondary {
            return Err(DualTierError::invalid(format!(
                "primary and secondary paths must be different, both are '{}'",
                primary.display()
            )));
        }
        match (primary.file_name(), secondary.file_name()) {
            (Some(p), Some(s)) if p == s => {}
            (Some(_), Some(_)) => {
                return Err(DualTierError::invalid(format!(
                    "both paths must share the same name in different parents: '{}' vs '{}'",
                    primary.display(),
                    secondary.display()
                )));
            }
            _ => {
                return Err(DualTierError::invalid(format!(
                    "both paths must end in a named entry: '{}' vs '{}'",
                    primary.display(),
                    secondary.display()
                )));
            }
        }

        Ok(Self { primary, secondary })
    }

    /// Pair for the entry `name` directly under both locations of `self`.
    pub fn child(&self, name: &str) -> Result<Self> {
        validate_child_name(name)?;
        Self::new(self.primary.join(name), self.secondary.join(name))
    }

    pub fn primary(&self) -> &Path {
        &self.primary
    }

    pub fn secondary(&self) -> &Path {
        &self.secondary
    }

    /// Terminal name shared by both locations.
    pub fn name(&self) -> Cow<'_, str> {
        // Construction guarantees a file name is present.
        self.primary
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or(Cow::Borrowed(""))
    }

    pub fn primary_parent(&self) -> Option<&Path> {
        self.primary.parent()
    }

    pub fn secondary_parent(&self) -> Option<&Path> {
        self.secondary.parent()
    }
}

/// Reject names that are not a single plain path component.
pub fn validate_child_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(DualTierError::invalid("child name must not be empty"));
    }
    if name == "." || name == ".." {
        return Err(DualTierError::invalid(format!(
            "child name '{name}' must be a plain name, not a relative reference"
        )));
    }
    if let Some(bad) = name.chars().find(|c| is_forbidden(*c)) {
        return Err(DualTierError::invalid(format!(
            "child name '{name}' must be only a name, without a path; contains {bad:?}"
        )));
    }
    Ok(())
}

fn is_forbidden(c: char) -> bool {
    if std::path::is_separator(c) || c == '\0' {
        return true;
    }
    cfg!(windows) && (c.is_control() || matches!(c, '<' | '>' | ':' | '"' | '|' | '?' | '*'))
}
