//! CLI route: single route table and run context.

use crate::cli::parse::{Commands, PackageArgs};
use crate::codec::{self, Format};
use crate::config::{ConfigLoader, PkgioConfig};
use crate::document::Document;
use crate::error::PackageError;
use crate::package::{file_set, PackageReadWriter};
use std::path::{Path, PathBuf};
use tracing::info;

/// Runtime context for CLI execution: the effective configuration.
pub struct RunContext {
    config: PkgioConfig,
}

impl RunContext {
    /// Load configuration for `root`, or from `config_path` when given.
    pub fn new(root: &Path, config_path: Option<PathBuf>) -> Result<Self, PackageError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(root)?,
        };
        Ok(Self { config })
    }

    pub fn from_config(config: PkgioConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PkgioConfig {
        &self.config
    }

    /// Execute a command, returning what should be printed.
    pub fn execute(&self, command: &Commands) -> Result<String, PackageError> {
        match command {
            Commands::Cat { package } => {
                let docs = self.read_writer(package)?.read()?;
                render_stream(&docs)
            }
            Commands::Ls { package } => {
                let mut rw = self.read_writer(package)?;
                let docs = rw.read()?;
                let files = match rw.known_files() {
                    Some(files) => files.clone(),
                    None => file_set(&docs)?,
                };
                Ok(files.into_iter().collect::<Vec<_>>().join("\n"))
            }
            Commands::Fmt { package } => {
                let mut rw = self.read_writer(package)?;
                let docs = rw.read()?;
                rw.write(&docs)?;
                Ok(format!("formatted {} documents", docs.len()))
            }
            Commands::Rm {
                package,
                kind,
                name,
            } => {
                let mut rw = self.read_writer(package)?;
                let docs = rw.read()?;
                let before = docs.len();
                let kept: Vec<Document> = docs
                    .into_iter()
                    .filter(|d| !matches_target(d, kind, name.as_deref()))
                    .collect();
                let removed = before - kept.len();
                rw.write(&kept)?;
                info!(removed, kind = %kind, "Removed documents");
                Ok(format!("removed {} documents", removed))
            }
            Commands::Config { .. } => self.config.to_toml(),
        }
    }

    fn read_writer(&self, args: &PackageArgs) -> Result<PackageReadWriter, PackageError> {
        let mut rw = self.config.package.read_writer(Some(&args.path))?;
        if let Some(ref name) = args.package_file_name {
            rw.package_file_name = name.clone();
        }
        if args.include_subpackages {
            rw.include_subpackages = true;
        }
        if !args.match_files_glob.is_empty() {
            rw.match_files_glob = args.match_files_glob.clone();
        }
        if args.error_if_non_resources {
            rw.error_if_non_resources = true;
        }
        Ok(rw)
    }
}

fn matches_target(doc: &Document, kind: &str, name: Option<&str>) -> bool {
    doc.kind() == Some(kind) && name.map_or(true, |n| doc.name() == Some(n))
}

fn render_stream(docs: &[Document]) -> Result<String, PackageError> {
    let out = codec::encode(docs, Format::Yaml, &[]).map_err(|e| PackageError::Encode {
        path: PathBuf::from("<stdout>"),
        message: e.to_string(),
    })?;
    Ok(out.trim_end().to_string())
}
