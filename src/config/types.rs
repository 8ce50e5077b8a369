//! Core configuration types.
//! - Config holds runtime settings with sensible defaults.
//! - LogLevel represents verbosity with simple parsing helpers.

use anyhow::{bail, Result};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use super::paths;
use super::{PRIMARY_ROOT_DEFAULT, SECONDARY_ROOT_DEFAULT};
use crate::priority::IoPriority;

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Informational output (default)
    #[default]
    Normal,
    /// More info (like verbose)
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime configuration for the command-line tool.
#[derive(Debug, Clone)]
pub struct Config {
    /// Preferred tier
    pub primary_root: PathBuf,
    /// Alternate tier items get relocated to
    pub secondary_root: PathBuf,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
    /// Hint forwarded to every filesystem primitive
    pub io_priority: IoPriority,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            primary_root: PathBuf::from(PRIMARY_ROOT_DEFAULT),
            secondary_root: PathBuf::from(SECONDARY_ROOT_DEFAULT),
            log_level: LogLevel::Normal,
            log_file: paths::default_log_path(),
            io_priority: IoPriority::Inherit,
        }
    }
}

impl Config {
    /// Construct a Config with explicit roots; other fields use defaults.
    pub fn new(primary_root: impl Into<PathBuf>, secondary_root: impl Into<PathBuf>) -> Self {
        Self {
            primary_root: primary_root.into(),
            secondary_root: secondary_root.into(),
            ..Default::default()
        }
    }

    /// Map a path relative to both roots onto its (primary, secondary) locations.
    /// The path must name an item below the roots; absolute paths and ".." are refused.
    pub fn locate(&self, rel: &Path) -> Result<(PathBuf, PathBuf)> {
        let mut clean = PathBuf::new();
        for comp in rel.components() {
            match comp {
                Component::Normal(part) => clean.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    bail!("path '{}' must not contain '..'", rel.display())
                }
                Component::RootDir | Component::Prefix(_) => {
                    bail!("path '{}' must be relative to the tier roots", rel.display())
                }
            }
        }
        if clean.as_os_str().is_empty() {
            bail!("path '{}' must name an item below the tier roots", rel.display());
        }
        Ok((self.primary_root.join(&clean), self.secondary_root.join(&clean)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_joins_relative_paths_on_both_roots() {
        let cfg = Config::new("/p", "/s");
        let (p, s) = cfg.locate(Path::new("photos/./2023")).unwrap();
        assert_eq!(p, PathBuf::from("/p/photos/2023"));
        assert_eq!(s, PathBuf::from("/s/photos/2023"));
    }

    #[test]
    fn locate_refuses_escapes() {
        let cfg = Config::new("/p", "/s");
        assert!(cfg.locate(Path::new("../etc")).is_err());
        assert!(cfg.locate(Path::new("/etc/passwd")).is_err());
        assert!(cfg.locate(Path::new(".")).is_err());
    }

    #[test]
    fn log_level_parse_is_case_insensitive() {
        assert_eq!(LogLevel::parse("DEBUG"), Some(LogLevel::Debug));
        assert_eq!("quiet".parse::<LogLevel>().unwrap(), LogLevel::Quiet);
        assert!(LogLevel::parse("loud").is_none());
    }
}
