//! Path normalization for package roots and provenance paths
//!
//! Provenance paths are always relative to the package base directory and use
//! forward slashes, whatever the platform separator.

use crate::error::PackageError;
use std::path::{Component, Path, PathBuf};

/// Resolve a package root to an absolute path.
///
/// An empty root is a configuration error. Trailing separators are dropped and
/// the result uses the platform's native form (no `\\?\` prefixes on Windows).
pub fn normalize_root(root: &Path) -> Result<PathBuf, PackageError> {
    if root.as_os_str().is_empty() {
        return Err(PackageError::Config("must specify package path".to_string()));
    }
    dunce::canonicalize(root).map_err(|source| PackageError::Traversal {
        path: root.to_path_buf(),
        source,
    })
}

/// Express `path` relative to `base` with `/` separators.
pub fn relative_slash_path(base: &Path, path: &Path) -> Result<String, PackageError> {
    let rel = path.strip_prefix(base).map_err(|_| {
        PackageError::Config(format!(
            "{} is not inside {}",
            path.display(),
            base.display()
        ))
    })?;
    Ok(to_slash(rel))
}

/// Join path components with `/`.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Turn a slash-separated provenance path back into a path under `base`.
///
/// Rejects absolute paths and paths that climb out of `base`.
pub fn resolve_slash_path(base: &Path, slash_path: &str) -> Result<PathBuf, PackageError> {
    let rel = Path::new(slash_path);
    let mut out = base.to_path_buf();
    let mut depth = 0usize;
    for component in rel.components() {
        match component {
            Component::Normal(name) => {
                out.push(name);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(PackageError::Annotation(format!(
                    "path annotation '{}' must be relative to the package and stay inside it",
                    slash_path
                )));
            }
        }
    }
    if depth == 0 {
        return Err(PackageError::Annotation(format!(
            "path annotation '{}' does not name a file",
            slash_path
        )));
    }
    Ok(out)
}

/// Directory that provenance paths are relative to: the root itself, or the
/// parent of a root that is a single file.
pub fn package_base(root: &Path) -> PathBuf {
    if root.is_dir() {
        root.to_path_buf()
    } else {
        root.parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| root.to_path_buf())
    }
}
