//! Typed error definitions for dual_tier.
//! Provides a small set of well-known failure modes for better logs and tests.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::fs_ops::helpers::hint_for;

#[derive(Debug, Error)]
pub enum DualTierError {
    /// Invalid construction (empty/equal/mismatched paths) or invalid child name.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Neither location holds the entity.
    #[error("Not found in either location: '{primary}' or '{secondary}'")]
    NotFound { primary: PathBuf, secondary: PathBuf },

    #[error("{op} '{}': {source}{}", path.display(), hint_for(source))]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to decode content of '{}': {reason}", path.display())]
    Codec { path: PathBuf, reason: String },

    #[error("Operation interrupted by user")]
    Interrupted,
}

impl DualTierError {
    /// Stable numeric code for structured logging and exit statuses.
    pub fn code(&self) -> i32 {
        match self {
            DualTierError::InvalidArgument(_) => 2,
            DualTierError::NotFound { .. } => 3,
            DualTierError::Io { .. } => 4,
            DualTierError::Codec { .. } => 5,
            DualTierError::Interrupted => 130,
        }
    }

    /// Short machine-friendly label used as the `kind` log field.
    pub fn kind(&self) -> &'static str {
        match self {
            DualTierError::InvalidArgument(_) => "invalid_argument",
            DualTierError::NotFound { .. } => "not_found",
            DualTierError::Io { .. } => "io",
            DualTierError::Codec { .. } => "codec",
            DualTierError::Interrupted => "interrupted",
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        DualTierError::InvalidArgument(msg.into())
    }

    pub(crate) fn not_found(primary: impl Into<PathBuf>, secondary: impl Into<PathBuf>) -> Self {
        DualTierError::NotFound {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }

    /// True when this is an I/O error whose kind is `NotFound`.
    pub fn is_io_not_found(&self) -> bool {
        matches!(self, DualTierError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, DualTierError>;
