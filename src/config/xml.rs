//! XML configuration support.
//! - Loads settings from config.xml (quick_xml + serde).
//! - Unknown fields are rejected so typos surface instead of silently falling back.
//!
//! Example:
//! <config>
//!   <primary_root>/mnt/fast/library</primary_root>
//!   <secondary_root>/mnt/archive/library</secondary_root>
//!   <log_level>normal</log_level>
//!   <log_file>/var/log/dual_tier.log</log_file>
//!   <io_priority>low</io_priority>
//! </config>

use anyhow::{anyhow, Context, Result};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::paths::default_config_path;
use super::types::{Config, LogLevel};
use crate::priority::IoPriority;

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    primary_root: Option<String>,
    secondary_root: Option<String>,
    log_level: Option<String>,
    log_file: Option<String>,
    io_priority: Option<String>,
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|t| !t.is_empty())
}

// Map XmlConfig -> Config; missing fields keep their defaults.
fn xml_to_config(parsed: XmlConfig) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(p) = non_empty(parsed.primary_root.as_deref()) {
        cfg.primary_root = PathBuf::from(p);
    }
    if let Some(s) = non_empty(parsed.secondary_root.as_deref()) {
        cfg.secondary_root = PathBuf::from(s);
    }
    if let Some(f) = non_empty(parsed.log_file.as_deref()) {
        cfg.log_file = Some(PathBuf::from(f));
    }
    if let Some(l) = non_empty(parsed.log_level.as_deref()) {
        cfg.log_level = l.parse::<LogLevel>().map_err(|e| anyhow!(e))?;
    }
    if let Some(h) = non_empty(parsed.io_priority.as_deref()) {
        cfg.io_priority = h.parse::<IoPriority>().map_err(|e| anyhow!(e))?;
    }

    Ok(cfg)
}

/// Load a Config from a specific XML file path.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    xml_to_config(parsed).with_context(|| format!("invalid value in '{}'", path.display()))
}

/// Load the config file in use (see `default_config_path`).
/// Ok(None) when there is no file; a present but broken file is an error.
pub fn load_config() -> Result<Option<Config>> {
    let Some(path) = default_config_path() else {
        debug!("No config path could be determined; using defaults");
        return Ok(None);
    };
    if !path.exists() {
        debug!(path = %path.display(), "Config file not present; using defaults");
        return Ok(None);
    }
    load_config_from_xml_path(&path).map(Some)
}
