//! Subcommand implementations.

pub mod batch;
pub mod config;
pub mod output;
pub mod parse;
pub mod process;

use std::path::{Path, PathBuf};

use rcpt_core::RcptConfig;
use tracing::debug;

/// `<config dir>/rcpt/config.json`, or `./rcpt/config.json` when the platform
/// has no config directory.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rcpt")
        .join("config.json")
}

/// Config file a command should use: the `--config` argument if given.
pub fn config_file(config_path: Option<&str>) -> PathBuf {
    config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path)
}

/// Load configuration.
///
/// An explicit `--config` path must exist. Otherwise the default file is read
/// when present and built-in defaults are used when it is not.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<RcptConfig> {
    if let Some(path) = config_path {
        debug!("Loading config from {}", path);
        return Ok(RcptConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Loading config from {}", default_path.display());
        Ok(RcptConfig::from_file(&default_path)?)
    } else {
        Ok(RcptConfig::default())
    }
}
