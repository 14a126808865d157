//! Ignore rules for package traversal.
//!
//! Any directory may hold an ignore file (`.krmignore` by default) written in
//! gitignore syntax. Rules are scoped to the directory holding the file and its
//! descendants. Scopes form a chain that is passed down the walk: entering a
//! directory derives a child scope from its parent, and a path is excluded when
//! any scope on the chain excludes it. A negated rule only re-includes paths
//! excluded earlier in the same file; it never lifts an ancestor's exclusion.
//!
//! A nested package starts a new chain, so the enclosing package's rules stop at
//! its boundary.

use crate::error::PackageError;
use ::ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Default ignore file name.
pub const DEFAULT_IGNORE_FILE_NAME: &str = ".krmignore";

/// One link of the ignore scope chain.
#[derive(Debug)]
pub struct IgnoreScope<'a> {
    file_name: &'a str,
    parent: Option<&'a IgnoreScope<'a>>,
    rules: Option<Gitignore>,
}

impl<'a> IgnoreScope<'a> {
    /// An empty scope that excludes nothing. An empty `file_name` disables ignore files.
    pub fn empty(file_name: &'a str) -> Self {
        Self {
            file_name,
            parent: None,
            rules: None,
        }
    }

    /// Start a new chain at a package root, loading the root's ignore file.
    pub fn package(file_name: &'a str, dir: &Path) -> Result<Self, PackageError> {
        Ok(Self {
            file_name,
            parent: None,
            rules: load_rules(file_name, dir)?,
        })
    }

    /// Derive the scope for a sub-directory, loading its ignore file if present.
    pub fn enter(&'a self, dir: &Path) -> Result<IgnoreScope<'a>, PackageError> {
        Ok(IgnoreScope {
            file_name: self.file_name,
            parent: Some(self),
            rules: load_rules(self.file_name, dir)?,
        })
    }

    /// Whether `path` (a file) is excluded by any scope on the chain.
    pub fn match_file(&self, path: &Path) -> bool {
        self.matches(path, false)
    }

    /// Whether `path` (a directory) is excluded by any scope on the chain.
    pub fn match_dir(&self, path: &Path) -> bool {
        self.matches(path, true)
    }

    fn matches(&self, path: &Path, is_dir: bool) -> bool {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(ref rules) = current.rules {
                if rules.matched(path, is_dir).is_ignore() {
                    return true;
                }
            }
            scope = current.parent;
        }
        false
    }
}

fn load_rules(file_name: &str, dir: &Path) -> Result<Option<Gitignore>, PackageError> {
    if file_name.is_empty() {
        return Ok(None);
    }
    let path = dir.join(file_name);
    match std::fs::metadata(&path) {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => return Ok(None),
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(PackageError::Traversal { path, source }),
    }

    let mut builder = GitignoreBuilder::new(dir);
    if let Some(err) = builder.add(&path) {
        return Err(PackageError::Ignore {
            path,
            message: err.to_string(),
        });
    }
    let rules = builder.build().map_err(|e| PackageError::Ignore {
        path: path.clone(),
        message: e.to_string(),
    })?;
    debug!(path = %path.display(), rules = rules.num_ignores(), "Loaded ignore file");
    Ok(Some(rules))
}
