//! A directory tree that lives in the primary location, the secondary
//! location, or partly in each.
//!
//! Children are never cached. `files()` and `directories()` list both sides on
//! every call and merge by name, so each child shows up once as a handle that
//! spans both locations. A side that cannot be listed (typically because it
//! does not exist yet) contributes nothing.
//!
//! `create_directory` only builds a handle. Nothing appears on disk until a
//! file is written underneath it or a move materializes it; `create_file`, by
//! contrast, writes immediately.

use bytesize::ByteSize;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::codec::Content;
use crate::errors::{DualTierError, Result};
use crate::file::DualFile;
use crate::fs_ops;
use crate::identity::PathPair;
use crate::priority::IoPriority;
use crate::shutdown;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DualDirectory {
    pair: PathPair,
    priority: IoPriority,
}

impl DualDirectory {
    pub fn new(primary: impl Into<PathBuf>, secondary: impl Into<PathBuf>) -> Result<Self> {
        Self::with_priority(primary, secondary, IoPriority::default())
    }

    pub fn with_priority(
        primary: impl Into<PathBuf>,
        secondary: impl Into<PathBuf>,
        priority: IoPriority,
    ) -> Result<Self> {
        Ok(Self {
            pair: PathPair::new(primary, secondary)?,
            priority,
        })
    }

    /// Subdirectory `name` of `parent`, inheriting its priority.
    pub fn child_of(parent: &DualDirectory, name: &str) -> Result<Self> {
        parent.directory(name)
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
        fs_ops::dir_exists(self.primary_path(), self.priority)
            || fs_ops::dir_exists(self.secondary_path(), self.priority)
    }

    /// Handle for file `name` in this directory. No I/O.
    pub fn file(&self, name: &str) -> Result<DualFile> {
        self.file_with_priority(name, self.priority)
    }

    pub fn file_with_priority(&self, name: &str, priority: IoPriority) -> Result<DualFile> {
        Ok(DualFile::from_pair(self.pair.child(name)?, priority))
    }

    /// Handle for subdirectory `name`. No I/O.
    pub fn directory(&self, name: &str) -> Result<DualDirectory> {
        self.directory_with_priority(name, self.priority)
    }

    pub fn directory_with_priority(&self, name: &str, priority: IoPriority) -> Result<DualDirectory> {
        Ok(DualDirectory {
            pair: self.pair.child(name)?,
            priority,
        })
    }

    /// Build the file handle and write `content` through it right away.
    pub fn create_file<T: Content>(&self, name: &str, content: &T) -> Result<DualFile> {
        let file = self.file(name)?;
        file.write(content)?;
        Ok(file)
    }

    /// Build the subdirectory handle without touching the filesystem.
    /// The directory exists on disk only once something is written under it.
    pub fn create_directory(&self, name: &str) -> Result<DualDirectory> {
        self.directory(name)
    }

    /// Files directly in this directory, merged by name across both locations.
    pub fn files(&self) -> Vec<DualFile> {
        self.merged_names(fs_ops::list_file_names)
            .into_iter()
            .filter_map(|name| match self.file(&name) {
                Ok(f) => Some(f),
                Err(e) => {
                    warn!(dir = %self.primary_path().display(), %name, error = %e, "Skipping unusable file name");
                    None
                }
            })
            .collect()
    }

    /// Subdirectories, merged by name across both locations.
    pub fn directories(&self) -> Vec<DualDirectory> {
        self.directories_with(|d| d)
    }

    /// Subdirectories, each passed through `factory` to build the caller's type.
    pub fn directories_with<D>(&self, factory: impl Fn(DualDirectory) -> D) -> Vec<D> {
        self.merged_names(fs_ops::list_dir_names)
            .into_iter()
            .filter_map(|name| match self.directory(&name) {
                Ok(d) => Some(factory(d)),
                Err(e) => {
                    warn!(dir = %self.primary_path().display(), %name, error = %e, "Skipping unusable directory name");
                    None
                }
            })
            .collect()
    }

    /// Every file in this tree, depth-first. Order is not significant.
    pub fn all_files(&self) -> Vec<DualFile> {
        let mut out = self.files();
        for dir in self.directories() {
            out.extend(dir.all_files());
        }
        out
    }

    /// Sum of all file sizes in the tree.
    pub fn size(&self) -> u64 {
        let nested: u64 = self.directories().iter().map(DualDirectory::size).sum();
        let direct: u64 = self.files().iter().map(DualFile::size).sum();
        nested + direct
    }

    pub fn human_size(&self) -> ByteSize {
        ByteSize::b(self.size())
    }

    /// Primary side exists and nothing anywhere below is stranded only in secondary.
    pub fn is_in_primary(&self) -> bool {
        fs_ops::dir_exists(self.primary_path(), self.priority) && !self.has_secondary_only_descendant()
    }

    fn has_secondary_only_descendant(&self) -> bool {
        self.files().iter().any(DualFile::is_only_in_secondary)
            || self
                .directories()
                .iter()
                .any(|d| d.is_only_in_secondary() || d.has_secondary_only_descendant())
    }

    /// Primary side absent, secondary present, and every child only in secondary.
    pub fn is_only_in_secondary(&self) -> bool {
        if fs_ops::dir_exists(self.primary_path(), self.priority)
            || !fs_ops::dir_exists(self.secondary_path(), self.priority)
        {
            return false;
        }
        self.files().iter().all(DualFile::is_only_in_secondary)
            && self.directories().iter().all(DualDirectory::is_only_in_secondary)
    }

    /// Remove the secondary tree, then the primary tree. Missing sides are fine.
    pub fn delete(&self) -> Result<()> {
        let secondary = fs_ops::remove_tree(self.secondary_path(), self.priority)?;
        let primary = fs_ops::remove_tree(self.primary_path(), self.priority)?;
        info!(
            primary = %self.primary_path().display(),
            removed_primary = primary,
            removed_secondary = secondary,
            "Deleted directory"
        );
        Ok(())
    }

    /// Relocate the whole tree into primary.
    ///
    /// Stops with `Interrupted` between children once `shutdown::request` has
    /// been called. The flag is process-wide and stays set, so an embedding
    /// application that requests shutdown gets `Interrupted` from every later
    /// directory move as well. File moves never check it.
    pub fn move_to_primary(&self) -> Result<()> {
        self.relocate(Tier::Primary)
    }

    /// Relocate the whole tree into secondary. Same shutdown behaviour as
    /// `move_to_primary`.
    pub fn move_to_secondary(&self) -> Result<()> {
        self.relocate(Tier::Secondary)
    }

    // Ensure the target node, move subdirectories then files, then drop the
    // now-empty source node without recursing. The first error aborts.
    fn relocate(&self, tier: Tier) -> Result<()> {
        let (source, target) = match tier {
            Tier::Primary => (self.secondary_path(), self.primary_path()),
            Tier::Secondary => (self.primary_path(), self.secondary_path()),
        };

        if !fs_ops::dir_exists(target, self.priority) {
            fs_ops::create_dir(target, self.priority)?;
        }

        for dir in self.directories() {
            check_shutdown()?;
            match tier {
                Tier::Primary => dir.move_to_primary()?,
                Tier::Secondary => dir.move_to_secondary()?,
            }
        }
        for file in self.files() {
            check_shutdown()?;
            match tier {
                Tier::Primary => file.move_to_primary()?,
                Tier::Secondary => file.move_to_secondary()?,
            }
        }

        if fs_ops::dir_exists(source, self.priority) {
            fs_ops::remove_stale_temp_files(source, self.priority)?;
            fs_ops::remove_dir(source, self.priority)?;
        }
        info!(src = %source.display(), dest = %target.display(), %tier, "Moved directory");
        Ok(())
    }

    fn merged_names(&self, list: fn(&Path, IoPriority) -> Result<Vec<String>>) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for side in [self.primary_path(), self.secondary_path()] {
            match list(side, self.priority) {
                Ok(found) => names.extend(found),
                Err(e) if e.is_io_not_found() => {
                    debug!(dir = %side.display(), "Location not present; contributes nothing");
                }
                Err(e) => {
                    warn!(dir = %side.display(), error = %e, "Listing failed; treating location as empty");
                }
            }
        }
        names
    }
}

#[derive(Debug, Clone, Copy)]
enum Tier {
    Primary,
    Secondary,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tier::Primary => "primary",
            Tier::Secondary => "secondary",
        })
    }
}

fn check_shutdown() -> Result<()> {
    if shutdown::is_requested() {
        return Err(DualTierError::Interrupted);
    }
    Ok(())
}

/// A `DualDirectory` whose subdirectories are produced by a caller-supplied
/// factory, so a whole tree can be walked as the caller's own type.
pub struct TypedDirectory<D> {
    dir: DualDirectory,
    factory: Arc<dyn Fn(DualDirectory) -> D + Send + Sync>,
}

impl<D> TypedDirectory<D> {
    pub fn new(dir: DualDirectory, factory: impl Fn(DualDirectory) -> D + Send + Sync + 'static) -> Self {
        Self {
            dir,
            factory: Arc::new(factory),
        }
    }

    pub fn dir(&self) -> &DualDirectory {
        &self.dir
    }

    pub fn into_dir(self) -> DualDirectory {
        self.dir
    }

    /// Subdirectories built through the factory.
    pub fn directories(&self) -> Vec<D> {
        self.dir.directories_with(|d| (self.factory)(d))
    }

    /// Subdirectory `name` built through the factory. No I/O.
    pub fn directory(&self, name: &str) -> Result<D> {
        self.dir.directory(name).map(|d| (self.factory)(d))
    }

    /// Same as `directory`; creating a directory never touches the filesystem.
    pub fn create_directory(&self, name: &str) -> Result<D> {
        self.directory(name)
    }
}

impl<D> Clone for TypedDirectory<D> {
    fn clone(&self) -> Self {
        Self {
            dir: self.dir.clone(),
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<D> fmt::Debug for TypedDirectory<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedDirectory").field("dir", &self.dir).finish_non_exhaustive()
    }
}

impl<D> AsRef<DualDirectory> for TypedDirectory<D> {
    fn as_ref(&self) -> &DualDirectory {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    fn tree(root: &assert_fs::TempDir) -> DualDirectory {
        DualDirectory::new(root.child("p").child("d").path(), root.child("s").child("d").path()).unwrap()
    }

    #[test]
    fn create_directory_is_lazy_create_file_is_eager() {
        let root = assert_fs::TempDir::new().unwrap();
        let d = tree(&root);
        let sub = d.create_directory("sub").unwrap();
        assert!(!sub.exists());
        assert!(!d.exists());

        sub.create_file("f.txt", &"x".to_string()).unwrap();
        assert!(sub.exists());
        assert!(root.child("p/d/sub/f.txt").path().is_file());
    }

    #[test]
    fn files_merge_by_name_without_duplicates() {
        let root = assert_fs::TempDir::new().unwrap();
        root.child("p/d/only_p.txt").write_str("1").unwrap();
        root.child("s/d/only_s.txt").write_str("22").unwrap();
        root.child("p/d/both.txt").write_str("333").unwrap();
        root.child("s/d/both.txt").write_str("4444").unwrap();
        let d = tree(&root);

        let names: Vec<String> = d.files().iter().map(|f| f.name().into_owned()).collect();
        assert_eq!(names, vec!["both.txt", "only_p.txt", "only_s.txt"]);
        // both.txt resolves primary first.
        assert_eq!(d.size(), 1 + 2 + 3);
    }

    #[test]
    fn directories_merge_and_factory_is_applied() {
        let root = assert_fs::TempDir::new().unwrap();
        root.child("p/d/a").create_dir_all().unwrap();
        root.child("s/d/a").create_dir_all().unwrap();
        root.child("s/d/b").create_dir_all().unwrap();
        let d = tree(&root);
        let names: Vec<String> = d.directories_with(|c| c.name().to_uppercase());
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn missing_sides_yield_empty_listing() {
        let root = assert_fs::TempDir::new().unwrap();
        let d = tree(&root);
        assert!(d.files().is_empty());
        assert!(d.directories().is_empty());
        assert_eq!(d.size(), 0);
        assert!(!d.is_in_primary());
        assert!(!d.is_only_in_secondary());
    }

    #[test]
    fn residency_is_recursive() {
        let root = assert_fs::TempDir::new().unwrap();
        root.child("p/d/top.txt").write_str("t").unwrap();
        root.child("s/d/nested/deep.txt").write_str("n").unwrap();
        let d = tree(&root);
        // nested exists only in secondary, so d is not fully in primary.
        assert!(!d.is_in_primary());
        assert!(!d.is_only_in_secondary());

        d.directory("nested").unwrap().move_to_primary().unwrap();
        assert!(d.is_in_primary());
    }

    #[test]
    fn moves_round_trip_a_nested_tree() {
        let root = assert_fs::TempDir::new().unwrap();
        let d = tree(&root);
        d.create_file("one.txt", &1u8).unwrap();
        d.directory("x").unwrap().directory("y").unwrap().create_file("two.txt", &2u8).unwrap();

        d.move_to_secondary().unwrap();
        assert!(!d.primary_path().exists());
        assert!(d.is_only_in_secondary());
        assert_eq!(d.all_files().len(), 2);
        assert!(d.all_files().iter().all(DualFile::is_only_in_secondary));

        d.move_to_primary().unwrap();
        assert!(!d.secondary_path().exists());
        assert!(d.is_in_primary());
        assert_eq!(d.file("one.txt").unwrap().read::<u8>().unwrap(), 1);
        assert_eq!(d.directory("x").unwrap().directory("y").unwrap().file("two.txt").unwrap().read::<u8>().unwrap(), 2);
    }

    #[test]
    fn delete_removes_both_trees_and_tolerates_missing() {
        let root = assert_fs::TempDir::new().unwrap();
        root.child("p/d/a.txt").write_str("a").unwrap();
        root.child("s/d/sub/b.txt").write_str("b").unwrap();
        let d = tree(&root);
        d.delete().unwrap();
        assert!(!d.exists());
        d.delete().unwrap();
    }

    #[test]
    fn child_accessors_reject_paths() {
        let root = assert_fs::TempDir::new().unwrap();
        let d = tree(&root);
        assert!(matches!(d.file("a/b"), Err(DualTierError::InvalidArgument(_))));
        assert!(matches!(d.directory(".."), Err(DualTierError::InvalidArgument(_))));
        assert!(matches!(d.create_file("", &1u8), Err(DualTierError::InvalidArgument(_))));
        assert!(DualDirectory::child_of(&d, "ok").is_ok());
    }

    #[derive(Debug)]
    struct Album {
        dir: DualDirectory,
    }

    #[test]
    fn typed_directory_produces_caller_type() {
        let root = assert_fs::TempDir::new().unwrap();
        root.child("p/d/2023").create_dir_all().unwrap();
        root.child("s/d/2024").create_dir_all().unwrap();
        let typed = TypedDirectory::new(tree(&root), |dir| Album { dir });

        let albums = typed.directories();
        let names: Vec<String> = albums.iter().map(|a| a.dir.name().into_owned()).collect();
        assert_eq!(names, vec!["2023", "2024"]);
        assert_eq!(typed.create_directory("2025").unwrap().dir.name(), "2025");
        assert!(typed.clone().dir().exists());
    }
}
