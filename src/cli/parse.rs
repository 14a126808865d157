//! CLI parse: clap types for pkgio. No behavior; definitions only.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// pkgio - read and rewrite packages of configuration documents
#[derive(Parser, Debug)]
#[command(name = "pkgio")]
#[command(about = "Read and rewrite packages of configuration documents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,
}

/// Options shared by every command that reads a package
#[derive(Args, Debug, Clone)]
pub struct PackageArgs {
    /// Package directory, or a single file
    pub path: PathBuf,

    /// File marking a directory as a nested package (e.g. Kptfile)
    #[arg(long)]
    pub package_file_name: Option<String>,

    /// Read nested packages too
    #[arg(long)]
    pub include_subpackages: bool,

    /// File name pattern to read (repeatable; default *.yaml and *.yml)
    #[arg(long = "match", value_name = "GLOB")]
    pub match_files_glob: Vec<String>,

    /// Fail on documents without apiVersion or kind
    #[arg(long)]
    pub error_if_non_resources: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print every document as a YAML stream, annotations included
    Cat {
        #[command(flatten)]
        package: PackageArgs,
    },
    /// List the files documents were read from
    Ls {
        #[command(flatten)]
        package: PackageArgs,
    },
    /// Read the package and write it back in canonical form
    Fmt {
        #[command(flatten)]
        package: PackageArgs,
    },
    /// Remove documents by kind and optional name; emptied files are deleted
    Rm {
        #[command(flatten)]
        package: PackageArgs,

        /// Kind of the documents to remove
        #[arg(long)]
        kind: String,

        /// Name of the document to remove
        #[arg(long)]
        name: Option<String>,
    },
    /// Print the effective configuration as TOML
    Config {
        /// Package whose pkgio.toml should be layered in
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

impl Commands {
    /// Package root the command operates on.
    pub fn package_path(&self) -> &Path {
        match self {
            Commands::Cat { package }
            | Commands::Ls { package }
            | Commands::Fmt { package }
            | Commands::Rm { package, .. } => &package.path,
            Commands::Config { path } => path,
        }
    }
}
