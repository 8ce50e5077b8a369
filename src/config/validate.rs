//! Config validation logic.
//! Verifies both tier roots are usable directories and that they are disjoint.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

use super::types::Config;

impl Config {
    /// Validate existence, readability and canonical disjointness of the roots.
    ///
    /// The primary root is created when missing; the secondary root must exist.
    pub fn validate(&self) -> Result<()> {
        let pr = &self.primary_root;
        let sr = &self.secondary_root;

        ensure_dir_is_or_create(pr, "primary_root")?;
        ensure_readable(pr, "primary_root")?;

        ensure_dir_exists_and_is_dir(sr, "secondary_root")?;
        ensure_readable(sr, "secondary_root")?;

        let pr_real = dunce::canonicalize(pr).unwrap_or_else(|_| pr.clone());
        let sr_real = dunce::canonicalize(sr).unwrap_or_else(|_| sr.clone());

        if pr_real == sr_real {
            bail!(
                "primary_root and secondary_root resolve to the same path: '{}'",
                pr_real.display()
            );
        }
        if pr_real.starts_with(&sr_real) {
            bail!(
                "primary_root '{}' must not be inside secondary_root '{}'",
                pr_real.display(),
                sr_real.display()
            );
        }
        if sr_real.starts_with(&pr_real) {
            bail!(
                "secondary_root '{}' must not be inside primary_root '{}'",
                sr_real.display(),
                pr_real.display()
            );
        }

        info!(
            "Config validated: primary='{}' secondary='{}' io_priority={}",
            pr.display(),
            sr.display(),
            self.io_priority
        );
        Ok(())
    }
}

fn ensure_dir_exists_and_is_dir(path: &Path, name: &str) -> Result<()> {
    if !path.exists() {
        error!("{name} does not exist: {}", path.display());
        bail!("{name} does not exist: {}", path.display());
    }
    if !path.is_dir() {
        error!("{name} is not a directory: {}", path.display());
        bail!("{name} is not a directory: {}", path.display());
    }
    Ok(())
}

fn ensure_readable(path: &Path, name: &str) -> Result<()> {
    fs::read_dir(path).with_context(|| {
        format!("Cannot read {name} directory '{}'; check permissions", path.display())
    })?;
    debug!("{name} readable: {}", path.display());
    Ok(())
}

fn ensure_dir_is_or_create(path: &Path, name: &str) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            error!("{name} exists but isn't a directory: {}", path.display());
            bail!("{name} exists but isn't a directory: {}", path.display());
        }
    } else {
        fs::create_dir_all(path).with_context(|| {
            format!("Failed to create {name} directory '{}'", path.display())
        })?;
        info!("Created {name} directory: {}", path.display());
    }
    Ok(())
}
