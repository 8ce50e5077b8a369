//! A single file that lives in either the primary or the secondary location.
//!
//! The handle holds only the two candidate paths and an I/O priority hint.
//! Every query goes back to the filesystem.
//!
//! When both locations are populated at the same time (a transient state left
//! by a race), queries resolve the primary copy first: `read`, `size` and
//! `current_path` all prefer primary. `write` is different only in where the
//! new content lands: it follows a relocation into secondary and then removes
//! the primary copy, so after it returns there is a single copy again.

use bytesize::ByteSize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::codec::{Codec, Content};
use crate::errors::{DualTierError, Result};
use crate::fs_ops;
use crate::identity::PathPair;
use crate::priority::IoPriority;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DualFile {
    pair: PathPair,
    priority: IoPriority,
}

impl DualFile {
    /// Handle for a file that may live at `primary` or `secondary`.
    pub fn new(primary: impl Into<PathBuf>, secondary: impl Into<PathBuf>) -> Result<Self> {
        Self::with_priority(primary, secondary, IoPriority::default())
    }

    pub fn with_priority(
        primary: impl Into<PathBuf>,
        secondary: impl Into<PathBuf>,
        priority: IoPriority,
    ) -> Result<Self> {
        Ok(Self::from_pair(PathPair::new(primary, secondary)?, priority))
    }

    pub(crate) fn from_pair(pair: PathPair, priority: IoPriority) -> Self {
        Self { pair, priority }
    }

    pub fn name(&self) -> Cow<'_, str> {
        self.pair.name()
    }

    pub fn primary_path(&self) -> &Path {
        self.pair.primary()
    }

    pub fn secondary_path(&self) -> &Path {
        self.pair.secondary()
    }

    pub fn primary_parent(&self) -> Option<&Path> {
        self.pair.primary_parent()
    }

    pub fn secondary_parent(&self) -> Option<&Path> {
        self.pair.secondary_parent()
    }

    pub fn pair(&self) -> &PathPair {
        &self.pair
    }

    pub fn priority(&self) -> IoPriority {
        self.priority
    }

    pub fn set_priority(&mut self, priority: IoPriority) {
        self.priority = priority;
    }

    pub fn exists(&self) -> bool {
        self.is_in_primary() || fs_ops::file_exists(self.secondary_path(), self.priority)
    }

    pub fn is_in_primary(&self) -> bool {
        fs_ops::file_exists(self.primary_path(), self.priority)
    }

    pub fn is_only_in_secondary(&self) -> bool {
        fs_ops::file_exists(self.secondary_path(), self.priority) && !self.is_in_primary()
    }

    /// Byte length of the primary copy, else the secondary copy, else 0.
    /// A stat failure on one side falls through to the other.
    pub fn size(&self) -> u64 {
        if self.is_in_primary() {
            match fs_ops::file_len(self.primary_path(), self.priority) {
                Ok(len) => return len,
                Err(e) => debug!(error = %e, "primary stat failed; trying secondary"),
            }
        }
        fs_ops::file_len(self.secondary_path(), self.priority).unwrap_or(0)
    }

    pub fn human_size(&self) -> ByteSize {
        ByteSize::b(self.size())
    }

    /// Full path of whichever copy exists, primary first.
    pub fn current_path(&self) -> Result<PathBuf> {
        if self.is_in_primary() {
            return Ok(self.primary_path().to_path_buf());
        }
        if fs_ops::file_exists(self.secondary_path(), self.priority) {
            return Ok(self.secondary_path().to_path_buf());
        }
        Err(self.not_found())
    }

    /// Raw text content, primary first, falling back to secondary.
    pub fn read_text(&self) -> Result<String> {
        self.read_resolved().map(|(_, text)| text)
    }

    pub fn read<T: Content>(&self) -> Result<T> {
        let (path, text) = self.read_resolved()?;
        T::decode(&text).map_err(|reason| DualTierError::Codec { path, reason })
    }

    /// Read a structured value through a specific codec.
    pub fn read_with<C: Codec, T: DeserializeOwned>(&self) -> Result<T> {
        let (path, text) = self.read_resolved()?;
        C::from_text(&text).map_err(|reason| DualTierError::Codec { path, reason })
    }

    pub fn write<T: Content>(&self, content: &T) -> Result<()> {
        let text = content.encode().map_err(|reason| DualTierError::Codec {
            path: self.primary_path().to_path_buf(),
            reason,
        })?;
        self.write_text(&text)
    }

    pub fn write_with<C: Codec, T: Serialize>(&self, content: &T) -> Result<()> {
        let text = C::to_text(content).map_err(|reason| DualTierError::Codec {
            path: self.primary_path().to_path_buf(),
            reason,
        })?;
        self.write_text(&text)
    }

    /// Write `content` wherever the file currently lives.
    ///
    /// If the file is already in secondary, the write goes there and any stale
    /// primary copy is removed. Otherwise it goes to primary; if secondary
    /// shows up while that write was in flight, the fresh primary copy is moved
    /// over it. This narrows the window for divergent copies but does not close
    /// it: two writers, or a writer racing two movers, can still leave both
    /// copies or lose one writer's content.
    pub fn write_text(&self, content: &str) -> Result<()> {
        let primary = self.primary_path();
        let secondary = self.secondary_path();

        if fs_ops::file_exists(secondary, self.priority) {
            fs_ops::write_text(secondary, content, self.priority)?;
            match fs_ops::remove_file(primary, self.priority) {
                Ok(()) => debug!(path = %primary.display(), "Removed stale primary copy"),
                Err(e) if e.is_io_not_found() => {}
                Err(e) => return Err(e),
            }
            debug!(path = %secondary.display(), bytes = content.len(), "Wrote to secondary");
            return Ok(());
        }

        fs_ops::write_text(primary, content, self.priority)?;
        debug!(path = %primary.display(), bytes = content.len(), "Wrote to primary");

        if fs_ops::file_exists(secondary, self.priority) {
            warn!(
                primary = %primary.display(),
                secondary = %secondary.display(),
                "Secondary copy appeared during write; moving fresh content after it"
            );
            match fs_ops::move_file(primary, secondary, self.priority) {
                Ok(()) => {}
                // Someone else already relocated our copy.
                Err(e) if e.is_io_not_found() => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Remove both copies. Fails with `NotFound` only when neither was there.
    pub fn delete(&self) -> Result<()> {
        let from_primary = fs_ops::remove_file(self.primary_path(), self.priority);
        let from_secondary = fs_ops::remove_file(self.secondary_path(), self.priority);

        match (from_primary, from_secondary) {
            (Ok(()), _) | (_, Ok(())) => {
                info!(primary = %self.primary_path().display(), "Deleted file");
                Ok(())
            }
            (Err(p), Err(s)) => {
                if p.is_io_not_found() && s.is_io_not_found() {
                    Err(self.not_found())
                } else if p.is_io_not_found() {
                    Err(s)
                } else {
                    Err(p)
                }
            }
        }
    }

    /// Relocate the secondary copy to primary, replacing any primary copy.
    /// No-op when there is nothing in secondary.
    pub fn move_to_primary(&self) -> Result<()> {
        self.relocate(self.secondary_path(), self.primary_path(), "primary")
    }

    /// Relocate the primary copy to secondary, replacing any secondary copy.
    /// No-op when there is nothing in primary.
    pub fn move_to_secondary(&self) -> Result<()> {
        self.relocate(self.primary_path(), self.secondary_path(), "secondary")
    }

    fn relocate(&self, from: &Path, to: &Path, tier: &'static str) -> Result<()> {
        if !fs_ops::file_exists(from, self.priority) {
            return Ok(());
        }
        match fs_ops::move_file(from, to, self.priority) {
            Ok(()) => {
                info!(src = %from.display(), dest = %to.display(), tier, "Moved file");
                Ok(())
            }
            Err(e) if e.is_io_not_found() => {
                debug!(src = %from.display(), "Source vanished before move; another actor got there first");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn read_resolved(&self) -> Result<(PathBuf, String)> {
        let primary = self.primary_path();
        let secondary = self.secondary_path();

        let primary_err = match fs_ops::read_text(primary, self.priority) {
            Ok(text) => return Ok((primary.to_path_buf(), text)),
            Err(e) => e,
        };
        debug!(error = %primary_err, "primary unreadable; trying secondary");

        match fs_ops::read_text(secondary, self.priority) {
            Ok(text) => Ok((secondary.to_path_buf(), text)),
            Err(e) if e.is_io_not_found() && primary_err.is_io_not_found() => Err(self.not_found()),
            Err(e) if e.is_io_not_found() => Err(primary_err),
            Err(e) => Err(e),
        }
    }

    fn not_found(&self) -> DualTierError {
        DualTierError::not_found(self.primary_path(), self.secondary_path())
    }
}
