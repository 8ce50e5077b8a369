//! Core library for `dual_tier`.
//!
//! Addresses files and directory trees whose content may sit in either of two
//! fixed roots, a primary tier and a secondary tier, without the caller
//! knowing which one holds it right now.
//!
//! - `DualFile`: resolve, read, write (with race reconciliation), move, delete.
//! - `DualDirectory`: the same model for trees, with merged child listings,
//!   recursive residency checks and recursive moves.
//! - `PathPair`: the identity checks both are built through.
//!
//! Nothing is cached; every query re-reads the filesystem. There is no locking.
//! Concurrent movers and writers are reconciled on a best-effort basis only.

pub mod cli;
pub mod codec;
pub mod config;
pub mod directory;
pub mod errors;
pub mod file;
pub mod fs_ops;
pub mod identity;
pub mod output;
pub mod priority;
pub mod shutdown;

pub use codec::{Codec, Content, Json, JsonCodec};
pub use config::{default_config_path, default_log_path, path_has_symlink_ancestor, Config, LogLevel};
pub use directory::{DualDirectory, TypedDirectory};
pub use errors::{DualTierError, Result};
pub use file::DualFile;
pub use identity::{validate_child_name, PathPair};
pub use priority::IoPriority;

/// Convenient imports for library users.
pub mod prelude {
    pub use crate::codec::{Codec, Content, Json, JsonCodec};
    pub use crate::directory::{DualDirectory, TypedDirectory};
    pub use crate::errors::{DualTierError as Error, Result as DTResult};
    pub use crate::file::DualFile;
    pub use crate::identity::PathPair;
    pub use crate::priority::IoPriority;
    pub use crate::shutdown::request as request_shutdown;
}
