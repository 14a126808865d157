//! Package tree writer
//!
//! Groups documents by their path annotation, orders each group by the index
//! annotation, and writes one file per group under the package base directory.

use crate::codec::{self, Format};
use crate::document::{describe, file_annotations, Document, READER_ANNOTATIONS};
use crate::error::PackageError;
use crate::kio::Writer;
use crate::tree::path::{normalize_root, package_base, resolve_slash_path};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// Writes documents back to a package on the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct PackageWriter {
    /// Package directory, or the single file the package was read from.
    pub path: PathBuf,

    /// Write the path and index annotations into the files.
    pub keep_reader_annotations: bool,

    /// Annotations removed from every document before it is written.
    pub clear_annotations: Vec<String>,
}

impl PackageWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Write every document to the file named by its path annotation.
    ///
    /// Returns the slash-separated paths of the files written.
    pub fn write(&self, documents: &[Document]) -> Result<Vec<String>, PackageError> {
        let root = normalize_root(&self.path)?;
        let base = package_base(&root);

        let mut files: BTreeMap<String, Vec<(usize, &Document)>> = BTreeMap::new();
        for doc in documents {
            let (path, index) = file_annotations(doc)?;
            let index = parse_index(doc, index)?;
            files.entry(path).or_default().push((index, doc));
        }

        let mut skip: Vec<&str> = self.clear_annotations.iter().map(String::as_str).collect();
        if !self.keep_reader_annotations {
            skip.extend_from_slice(READER_ANNOTATIONS);
        }

        let mut written = Vec::with_capacity(files.len());
        for (rel, mut entries) in files {
            entries.sort_by_key(|(index, _)| *index);
            let target = resolve_slash_path(&base, &rel)?;
            let contents = codec::encode(
                entries.iter().map(|(_, doc)| *doc),
                Format::for_path(&target),
                &skip,
            )
            .map_err(|e| PackageError::Encode {
                path: target.clone(),
                message: e.to_string(),
            })?;

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|source| PackageError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::write(&target, contents).map_err(|source| PackageError::Write {
                path: target.clone(),
                source,
            })?;
            debug!(path = %target.display(), documents = entries.len(), "Wrote file");
            written.push(rel);
        }

        info!(root = %base.display(), files = written.len(), "Wrote package");
        Ok(written)
    }
}

impl Writer for PackageWriter {
    fn write(&mut self, documents: &[Document]) -> Result<(), PackageError> {
        PackageWriter::write(self, documents).map(|_| ())
    }
}

fn parse_index(doc: &Document, index: Option<String>) -> Result<usize, PackageError> {
    let index = index.ok_or_else(|| {
        PackageError::Annotation(format!(
            "document {} is missing the index annotation",
            describe(doc)
        ))
    })?;
    index.trim().parse().map_err(|_| {
        PackageError::Annotation(format!(
            "document {} has a non-numeric index annotation '{}'",
            describe(doc),
            index
        ))
    })
}
