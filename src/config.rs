//! Configuration System
//!
//! Layered configuration for package reading and writing plus logging. Values
//! come from built-in defaults, the global config file, the package's
//! `pkgio.toml`, and `PKGIO_` environment variables, in increasing priority.

use crate::error::PackageError;
use crate::ignore::DEFAULT_IGNORE_FILE_NAME;
use crate::logging::LoggingConfig;
use crate::package::PackageReadWriter;
use crate::tree::reader::compile_globs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

mod merge;
mod sources;

pub use sources::global_file::global_config_path;
pub use sources::package_file::{package_config_path, PACKAGE_CONFIG_FILE};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PkgioConfig {
    /// Package reading and writing options
    #[serde(default)]
    pub package: PackageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Package options, mirroring [`PackageReadWriter`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PackageConfig {
    /// Package root. Usually supplied on the command line instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// File marking a directory as a nested package (e.g. `Kptfile`). Empty disables nesting.
    pub package_file_name: String,

    /// File name patterns to read. Empty means `*.yaml` and `*.yml`.
    pub match_files_glob: Vec<String>,

    pub include_subpackages: bool,
    pub error_if_non_resources: bool,
    pub omit_reader_annotations: bool,

    /// Annotations stamped on read and cleared on write.
    pub set_annotations: BTreeMap<String, String>,

    pub no_delete_files: bool,
    pub keep_reader_annotations: bool,

    /// Per-directory ignore file. Empty disables ignore files.
    pub ignore_file_name: String,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            path: None,
            package_file_name: String::new(),
            match_files_glob: Vec::new(),
            include_subpackages: false,
            error_if_non_resources: false,
            omit_reader_annotations: false,
            set_annotations: BTreeMap::new(),
            no_delete_files: false,
            keep_reader_annotations: false,
            ignore_file_name: DEFAULT_IGNORE_FILE_NAME.to_string(),
        }
    }
}

impl PackageConfig {
    /// Validate package options
    pub fn validate(&self) -> Result<(), PackageError> {
        if let Some(ref path) = self.path {
            if path.as_os_str().is_empty() {
                return Err(PackageError::Config("package path cannot be empty".to_string()));
            }
        }
        if self.package_file_name.contains(['/', '\\']) {
            return Err(PackageError::Config(format!(
                "package file name '{}' must be a plain file name",
                self.package_file_name
            )));
        }
        compile_globs(&self.match_files_glob)?;
        Ok(())
    }

    /// Build a read-writer for the package at `root`, or at the configured path.
    pub fn read_writer(&self, root: Option<&Path>) -> Result<PackageReadWriter, PackageError> {
        let path = root
            .map(Path::to_path_buf)
            .or_else(|| self.path.clone())
            .ok_or_else(|| PackageError::Config("must specify package path".to_string()))?;

        let mut rw = PackageReadWriter::new(path);
        rw.package_file_name = self.package_file_name.clone();
        rw.match_files_glob = self.match_files_glob.clone();
        rw.include_subpackages = self.include_subpackages;
        rw.error_if_non_resources = self.error_if_non_resources;
        rw.omit_reader_annotations = self.omit_reader_annotations;
        rw.set_annotations = self.set_annotations.clone();
        rw.no_delete_files = self.no_delete_files;
        rw.keep_reader_annotations = self.keep_reader_annotations;
        rw.ignore_file_name = Some(self.ignore_file_name.clone());
        Ok(rw)
    }
}

impl PkgioConfig {
    pub fn validate(&self) -> Result<(), PackageError> {
        self.package.validate()
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, PackageError> {
        toml::to_string_pretty(self)
            .map_err(|e| PackageError::Config(format!("Failed to render configuration: {}", e)))
    }
}

/// Loads [`PkgioConfig`] from its layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for the package at `root`.
    pub fn load(root: &Path) -> Result<PkgioConfig, PackageError> {
        let builder = merge::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::package_file::add_to_builder(builder, root)?;
        let builder = builder.add_source(merge::environment());
        Self::finish(builder)
    }

    /// Load configuration from an explicit file, still honoring environment overrides.
    pub fn load_from_file(path: &Path) -> Result<PkgioConfig, PackageError> {
        if !path.is_file() {
            return Err(PackageError::Config(format!(
                "configuration file {} does not exist",
                path.display()
            )));
        }
        let builder = merge::builder_with_defaults()?
            .add_source(config::File::from(path.to_path_buf()))
            .add_source(merge::environment());
        Self::finish(builder)
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<PkgioConfig, PackageError> {
        let config: PkgioConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        debug!(?config, "Loaded configuration");
        Ok(config)
    }
}
