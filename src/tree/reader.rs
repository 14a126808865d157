//! Package tree reader
//!
//! Walks a package directory depth-first in lexical order and decodes every
//! matching file into documents stamped with their provenance.

use crate::codec::{self, DecodeOptions, Format};
use crate::document::Document;
use crate::error::PackageError;
use crate::ignore::{IgnoreScope, DEFAULT_IGNORE_FILE_NAME};
use crate::kio::Reader;
use crate::tree::path::{normalize_root, package_base, relative_slash_path};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Default file patterns: YAML files.
pub const DEFAULT_MATCH: &[&str] = &["*.yaml", "*.yml"];

/// JSON file patterns.
pub const JSON_MATCH: &[&str] = &["*.json"];

/// YAML and JSON file patterns.
pub const MATCH_ALL: &[&str] = &["*.yaml", "*.yml", "*.json"];

/// Reads documents from a package on the local filesystem.
#[derive(Debug, Clone)]
pub struct PackageReader {
    /// Package directory, or a single file treated as a one-file package.
    pub path: PathBuf,

    /// Name of the file marking a directory as a nested package. Empty disables nesting.
    pub package_file_name: String,

    /// Only files whose base name matches one of these patterns are read.
    /// Defaults to [`DEFAULT_MATCH`] when empty; `["*"]` reads every file.
    pub match_files_glob: Vec<String>,

    /// Descend into nested packages instead of skipping them.
    pub include_subpackages: bool,

    /// Fail on documents without `apiVersion` or `kind` instead of dropping them.
    pub error_if_non_resources: bool,

    /// Do not stamp path and index annotations.
    pub omit_reader_annotations: bool,

    /// Annotations stamped on every document read.
    pub set_annotations: BTreeMap<String, String>,

    /// Name of the per-directory ignore file. Empty disables ignore files.
    pub ignore_file_name: String,
}

impl Default for PackageReader {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            package_file_name: String::new(),
            match_files_glob: Vec::new(),
            include_subpackages: false,
            error_if_non_resources: false,
            omit_reader_annotations: false,
            set_annotations: BTreeMap::new(),
            ignore_file_name: DEFAULT_IGNORE_FILE_NAME.to_string(),
        }
    }
}

/// What to do with a directory met during the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirDecision {
    /// Descend, extending the current ignore scope.
    Descend,
    /// Descend into a nested package with a fresh ignore scope.
    DescendPackage,
    /// Leave the whole subtree alone.
    Skip,
}

impl PackageReader {
    /// Create a reader for the package at `path` with default settings.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Read every matching document of the package.
    ///
    /// Documents come out in walk order: lexical within a directory, and in
    /// decode order within a file.
    pub fn read(&self) -> Result<Vec<Document>, PackageError> {
        let root = normalize_root(&self.path)?;
        let globs = compile_globs(&self.match_files_glob)?;

        // The writer and the deleter resolve paths against this same base.
        let base = package_base(&root);
        let mut walk = Walk {
            reader: self,
            globs,
            base: base.clone(),
            documents: Vec::new(),
            files_read: 0,
        };

        if base == root {
            let scope = IgnoreScope::package(&self.ignore_file_name, &root)?;
            walk.visit_dir(&root, &scope)?;
        } else {
            // A lone file is a one-file package.
            let scope = IgnoreScope::empty(&self.ignore_file_name);
            walk.visit_file(&root, &scope)?;
        }

        info!(
            root = %root.display(),
            files = walk.files_read,
            documents = walk.documents.len(),
            "Read package"
        );
        Ok(walk.documents)
    }

    fn dir_decision(&self, dir: &Path, scope: &IgnoreScope<'_>) -> Result<DirDecision, PackageError> {
        if self.package_file_name.is_empty() {
            return Ok(if scope.match_dir(dir) {
                DirDecision::Skip
            } else {
                DirDecision::Descend
            });
        }

        let marker = dir.join(&self.package_file_name);
        match fs::metadata(&marker) {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(if scope.match_dir(dir) {
                    DirDecision::Skip
                } else {
                    DirDecision::Descend
                });
            }
            Err(source) => {
                return Err(PackageError::Traversal {
                    path: marker,
                    source,
                })
            }
        }

        // Nested packages are never skipped because of the enclosing package's
        // ignore rules; only the include flag decides.
        Ok(if self.include_subpackages {
            DirDecision::DescendPackage
        } else {
            DirDecision::Skip
        })
    }
}

impl Reader for PackageReader {
    fn read(&mut self) -> Result<Vec<Document>, PackageError> {
        PackageReader::read(self)
    }
}

/// State of one traversal.
struct Walk<'r> {
    reader: &'r PackageReader,
    globs: GlobSet,
    base: PathBuf,
    documents: Vec<Document>,
    files_read: usize,
}

impl Walk<'_> {
    fn visit_dir(&mut self, dir: &Path, scope: &IgnoreScope<'_>) -> Result<(), PackageError> {
        let entries = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for entry in entries {
            let entry = entry.map_err(|e| walk_error(dir, e))?;
            let path = entry.path();

            if !entry.file_type().is_dir() {
                self.visit_file(path, scope)?;
                continue;
            }

            let reader = self.reader;
            match reader.dir_decision(path, scope)? {
                DirDecision::Skip => {
                    debug!(path = %path.display(), "Skipping directory");
                }
                DirDecision::Descend => {
                    let child = scope.enter(path)?;
                    self.visit_dir(path, &child)?;
                }
                DirDecision::DescendPackage => {
                    debug!(path = %path.display(), "Entering nested package");
                    let child = IgnoreScope::package(&reader.ignore_file_name, path)?;
                    self.visit_dir(path, &child)?;
                }
            }
        }
        Ok(())
    }

    fn visit_file(&mut self, path: &Path, scope: &IgnoreScope<'_>) -> Result<(), PackageError> {
        if scope.match_file(path) {
            debug!(path = %path.display(), "Skipping ignored file");
            return Ok(());
        }
        let matched = path
            .file_name()
            .is_some_and(|name| self.globs.is_match(Path::new(name)));
        if !matched {
            return Ok(());
        }

        let rel = relative_slash_path(&self.base, path)?;
        let docs = self.read_file(path, rel)?;
        debug!(path = %path.display(), documents = docs.len(), "Read file");
        self.files_read += 1;
        self.documents.extend(docs);
        Ok(())
    }

    fn read_file(&self, path: &Path, rel: String) -> Result<Vec<Document>, PackageError> {
        let contents = fs::read_to_string(path).map_err(|source| {
            if source.kind() == ErrorKind::InvalidData {
                PackageError::Decode {
                    path: path.to_path_buf(),
                    message: source.to_string(),
                }
            } else {
                PackageError::Traversal {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let options = DecodeOptions {
            format: Some(Format::for_path(path)),
            path: Some(rel),
            omit_reader_annotations: self.reader.omit_reader_annotations,
            error_if_non_resources: self.reader.error_if_non_resources,
            set_annotations: self.reader.set_annotations.clone(),
        };
        codec::decode(&contents, &options).map_err(|e| match e {
            codec::CodecError::NonResource { index } => PackageError::NonResource {
                path: path.to_path_buf(),
                index,
            },
            other => PackageError::Decode {
                path: path.to_path_buf(),
                message: other.to_string(),
            },
        })
    }
}

fn walk_error(dir: &Path, err: walkdir::Error) -> PackageError {
    let path = err.path().unwrap_or(dir).to_path_buf();
    let message = err.to_string();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::new(ErrorKind::Other, message));
    PackageError::Traversal { path, source }
}

/// Compile file name patterns, falling back to [`DEFAULT_MATCH`].
pub fn compile_globs(patterns: &[String]) -> Result<GlobSet, PackageError> {
    let defaults: Vec<String>;
    let patterns = if patterns.is_empty() {
        defaults = DEFAULT_MATCH.iter().map(|s| s.to_string()).collect();
        &defaults
    } else {
        patterns
    };

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(cfg!(windows))
            .literal_separator(true)
            .build()
            .map_err(|e| PackageError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| PackageError::InvalidPattern {
        pattern: patterns.join(","),
        message: e.to_string(),
    })
}
