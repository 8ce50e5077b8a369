//! Config module.
//! Provides configuration types, default paths, XML loading, and validation.

pub mod paths;
pub mod types;
mod validate;
pub mod xml;

pub use paths::{default_config_path, default_log_path, path_has_symlink_ancestor};
pub use types::{Config, LogLevel};
pub use xml::{load_config, load_config_from_xml_path};

/// Roots used when neither the config file nor the CLI names one.
pub const PRIMARY_ROOT_DEFAULT: &str = "/srv/dual_tier/primary";
pub const SECONDARY_ROOT_DEFAULT: &str = "/srv/dual_tier/secondary";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "DUAL_TIER_CONFIG";
