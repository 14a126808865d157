//! Package config file source: `pkgio.toml` in the package directory.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::{Path, PathBuf};

/// Name of the per-package config file.
pub const PACKAGE_CONFIG_FILE: &str = "pkgio.toml";

/// Location of the package config file for a package root (directory or single file).
pub fn package_config_path(root: &Path) -> PathBuf {
    let dir = if root.is_dir() {
        root
    } else {
        root.parent().unwrap_or(root)
    };
    dir.join(PACKAGE_CONFIG_FILE)
}

/// Add the package config file to builder if it exists.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let path = package_config_path(root);
    if path.is_file() {
        return Ok(builder.add_source(File::from(path).required(false)));
    }
    Ok(builder)
}
