//! Merge rules: defaults and override order.
//!
//! Sources are layered lowest to highest: built-in defaults, the global config
//! file, the package's `pkgio.toml`, then `PKGIO_` environment variables.

use crate::ignore::DEFAULT_IGNORE_FILE_NAME;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment};

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("package.package_file_name", "")?
        .set_default("package.include_subpackages", false)?
        .set_default("package.ignore_file_name", DEFAULT_IGNORE_FILE_NAME)
}

/// Environment overrides, e.g. `PKGIO_PACKAGE__INCLUDE_SUBPACKAGES=true`.
pub fn environment() -> Environment {
    Environment::with_prefix("PKGIO")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("package.match_files_glob")
}
