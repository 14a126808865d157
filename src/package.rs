//! Round-trip coordination for a local package
//!
//! [`PackageReadWriter`] remembers which files the last read produced documents
//! from. When the documents are written back, files that no document points at
//! any more are deleted. Files that were never read are never touched.

use crate::document::{file_annotations, Document};
use crate::error::PackageError;
use crate::kio::{Reader, Writer};
use crate::tree::path::{normalize_root, package_base, resolve_slash_path};
use crate::tree::reader::PackageReader;
use crate::tree::writer::PackageWriter;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Reads a local package and writes it back, deleting emptied files.
#[derive(Debug, Clone, Default)]
pub struct PackageReadWriter {
    /// Package directory, or a single file treated as a one-file package.
    pub path: PathBuf,
    pub package_file_name: String,
    pub match_files_glob: Vec<String>,
    pub include_subpackages: bool,
    pub error_if_non_resources: bool,
    /// Do not stamp path and index annotations. Deletion tracking needs them.
    pub omit_reader_annotations: bool,
    /// Stamped on read, cleared again on write.
    pub set_annotations: BTreeMap<String, String>,
    /// Write path and index annotations into the files.
    pub keep_reader_annotations: bool,
    /// Never delete files on write.
    pub no_delete_files: bool,
    /// `None` keeps the reader's default.
    pub ignore_file_name: Option<String>,

    files: Option<BTreeSet<String>>,
}

impl PackageReadWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Files seen by the last successful read, if there was one.
    pub fn known_files(&self) -> Option<&BTreeSet<String>> {
        self.files.as_ref()
    }

    fn deletion_tracking(&self) -> bool {
        !self.no_delete_files && !self.omit_reader_annotations
    }

    fn reader(&self) -> PackageReader {
        let mut reader = PackageReader {
            path: self.path.clone(),
            package_file_name: self.package_file_name.clone(),
            match_files_glob: self.match_files_glob.clone(),
            include_subpackages: self.include_subpackages,
            error_if_non_resources: self.error_if_non_resources,
            omit_reader_annotations: self.omit_reader_annotations,
            set_annotations: self.set_annotations.clone(),
            ..Default::default()
        };
        if let Some(ref name) = self.ignore_file_name {
            reader.ignore_file_name = name.clone();
        }
        reader
    }

    fn writer(&self) -> PackageWriter {
        PackageWriter {
            path: self.path.clone(),
            keep_reader_annotations: self.keep_reader_annotations,
            clear_annotations: self.set_annotations.keys().cloned().collect(),
        }
    }

    /// Read the package and remember the files it came from.
    pub fn read(&mut self) -> Result<Vec<Document>, PackageError> {
        let documents = self.reader().read()?;
        if self.deletion_tracking() {
            let files = file_set(&documents)?;
            debug!(files = files.len(), "Tracking package files");
            self.files = Some(files);
        }
        Ok(documents)
    }

    /// Write documents back, then delete files no document points at any more.
    ///
    /// Every stale file is attempted; the first failure is returned afterwards.
    /// Files already written stay written when a deletion fails.
    pub fn write(&mut self, documents: &[Document]) -> Result<(), PackageError> {
        let tracking = self.deletion_tracking();
        let new_files = if tracking {
            Some(file_set(documents)?)
        } else {
            None
        };

        self.writer().write(documents)?;

        let Some(new_files) = new_files else {
            return Ok(());
        };
        // Tracking starts with a successful read.
        let Some(ref previous) = self.files else {
            return Ok(());
        };
        let stale: Vec<String> = previous.difference(&new_files).cloned().collect();
        self.files = Some(new_files);
        if stale.is_empty() {
            return Ok(());
        }

        let base = package_base(&normalize_root(&self.path)?);
        let mut first_error = None;
        for rel in &stale {
            if let Err(e) = delete_file(&base, rel) {
                warn!(path = %rel, error = %e, "Failed to delete emptied file");
                first_error.get_or_insert(e);
            }
        }
        info!(deleted = stale.len(), "Removed emptied package files");
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Reader for PackageReadWriter {
    fn read(&mut self) -> Result<Vec<Document>, PackageError> {
        PackageReadWriter::read(self)
    }
}

impl Writer for PackageReadWriter {
    fn write(&mut self, documents: &[Document]) -> Result<(), PackageError> {
        PackageReadWriter::write(self, documents)
    }
}

/// Set of path annotations across `documents`.
pub fn file_set(documents: &[Document]) -> Result<BTreeSet<String>, PackageError> {
    documents
        .iter()
        .map(|doc| file_annotations(doc).map(|(path, _)| path))
        .collect()
}

fn delete_file(base: &std::path::Path, rel: &str) -> Result<(), PackageError> {
    let path = resolve_slash_path(base, rel)?;
    match fs::remove_file(&path) {
        Ok(()) => {
            debug!(path = %path.display(), "Deleted file");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(PackageError::Delete { path, source }),
    }
}
