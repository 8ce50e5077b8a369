//! CLI definition and parsing.
//! Defines Args and provides parse() for command-line handling.
//!
//! Notes:
//! - Item commands take a path relative to both tier roots.
//! - --debug is a shorthand for --log-level debug.

use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

use crate::config::types::{Config, LogLevel};
use crate::priority::IoPriority;

/// Inspect and relocate items stored across a primary and a secondary tier.
/// CLI flags override config values (which are loaded from XML if present).
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Inspect and relocate items across two storage tiers")]
pub struct Args {
    /// Explicit config file (overrides DUAL_TIER_CONFIG and the default location).
    #[arg(long, global = true, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Override the primary tier root.
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub primary_root: Option<PathBuf>,

    /// Override the secondary tier root.
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub secondary_root: Option<PathBuf>,

    /// Enable debug logging (shorthand for --log-level debug).
    #[arg(long, global = true)]
    pub debug: bool,

    #[arg(long, global = true, help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<String>,

    /// I/O priority hint for filesystem work: inherit, idle, low, normal, high.
    #[arg(long, global = true, value_parser = clap::value_parser!(IoPriority))]
    pub io_priority: Option<IoPriority>,

    /// Emit logs in structured JSON (includes timestamp, level, and structured fields).
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show where an item currently lives and how large it is.
    Status {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Move a file or directory tree into the primary tier.
    Promote {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Move a file or directory tree into the secondary tier.
    Demote {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// List files of a directory merged across both tiers.
    Ls {
        #[arg(value_name = "PATH")]
        path: PathBuf,
        /// Include files of all nested directories.
        #[arg(long, short = 'r')]
        recursive: bool,
    },
    /// Print the text content of a file from whichever tier holds it.
    Cat {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Write text to a file in whichever tier it currently lives in.
    Put {
        #[arg(value_name = "PATH")]
        path: PathBuf,
        #[arg(value_name = "TEXT")]
        text: String,
    },
    /// Delete a file or directory tree from both tiers.
    Rm {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Print the config file location in use, then exit.
    PrintConfig,
}

impl Args {
    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(p) = &self.primary_root {
            cfg.primary_root = p.clone();
        }
        if let Some(s) = &self.secondary_root {
            cfg.secondary_root = s.clone();
        }
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if let Some(hint) = self.io_priority {
            cfg.io_priority = hint;
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_win_over_config() {
        let args = Args::try_parse_from([
            "dual_tier",
            "--primary-root",
            "/fast",
            "--debug",
            "--io-priority",
            "idle",
            "demote",
            "photos/2023",
        ])
        .unwrap();
        let mut cfg = Config::new("/p", "/s");
        args.apply_overrides(&mut cfg);
        assert_eq!(cfg.primary_root, PathBuf::from("/fast"));
        assert_eq!(cfg.secondary_root, PathBuf::from("/s"));
        assert_eq!(cfg.log_level, LogLevel::Debug);
        assert_eq!(cfg.io_priority, IoPriority::Idle);
        assert_eq!(
            args.command,
            Command::Demote {
                path: PathBuf::from("photos/2023")
            }
        );
    }

    #[test]
    fn status_requires_a_path() {
        assert!(Args::try_parse_from(["dual_tier", "status"]).is_err());
        let args = Args::try_parse_from(["dual_tier", "status", "a.txt"]).unwrap();
        assert_eq!(args.command, Command::Status { path: PathBuf::from("a.txt") });
    }

    #[test]
    fn global_flags_accepted_after_subcommand() {
        let args = Args::try_parse_from(["dual_tier", "ls", "albums", "-r", "--log-level", "quiet"]).unwrap();
        assert_eq!(args.effective_log_level(), Some(LogLevel::Quiet));
        assert!(matches!(args.command, Command::Ls { recursive: true, .. }));
    }

    #[test]
    fn bad_priority_is_rejected() {
        assert!(Args::try_parse_from(["dual_tier", "--io-priority", "warp", "status"]).is_err());
    }
}
