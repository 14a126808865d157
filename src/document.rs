//! Documents and their annotation side channel
//!
//! A [`Document`] pairs the decoded body of one configuration resource with an
//! ordered annotation mapping. Provenance (the originating file and the position
//! within it) travels in that mapping, so any transform that keeps unknown
//! annotation keys keeps the document writable to its original location.

use crate::error::PackageError;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

/// Annotation holding the document's file path, relative to the package root.
pub const PATH_ANNOTATION: &str = "config.kubernetes.io/path";

/// Annotation holding the document's zero-based position within its file.
pub const INDEX_ANNOTATION: &str = "config.kubernetes.io/index";

/// Annotations stamped by the reader and required by the writer.
pub const READER_ANNOTATIONS: &[&str] = &[PATH_ANNOTATION, INDEX_ANNOTATION];

/// One decoded configuration unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    /// Semantic content, exactly as decoded.
    pub body: Value,
    /// Side-channel annotations, ordered by key.
    pub annotations: BTreeMap<String, String>,
    source: Option<Source>,
}

/// The text a document was decoded from, with the body it decoded to.
#[derive(Debug, Clone, PartialEq)]
struct Source {
    text: String,
    body: Value,
}

impl Document {
    pub fn new(body: Value) -> Self {
        Self {
            body,
            annotations: BTreeMap::new(),
            source: None,
        }
    }

    /// A document decoded from `text`. The text is reused on encode while the
    /// rendered body still equals what was decoded.
    pub fn from_source(body: Value, text: impl Into<String>) -> Self {
        Self {
            source: Some(Source {
                text: text.into(),
                body: body.clone(),
            }),
            ..Self::new(body)
        }
    }

    /// Original text, if the document was decoded and `rendered` matches its decoded body.
    pub fn unchanged_source(&self, rendered: &Value) -> Option<&str> {
        self.source
            .as_ref()
            .filter(|source| source.body == *rendered)
            .map(|source| source.text.as_str())
    }

    /// Extend the original text, e.g. with comments that belong to no document.
    pub(crate) fn append_source(&mut self, text: &str) {
        if let Some(ref mut source) = self.source {
            source.text.push_str(text);
        }
    }

    /// Prepend to the original text.
    pub(crate) fn prepend_source(&mut self, text: &str) {
        if let Some(ref mut source) = self.source {
            source.text.insert_str(0, text);
        }
    }

    /// Get an annotation value.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    /// Set an annotation, replacing any previous value.
    pub fn set_annotation(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.annotations.insert(key.into(), value.into());
    }

    /// Remove an annotation, returning the previous value.
    pub fn clear_annotation(&mut self, key: &str) -> Option<String> {
        self.annotations.remove(key)
    }

    /// The `kind` field of the body, if it is a string.
    pub fn kind(&self) -> Option<&str> {
        self.str_field("kind")
    }

    /// The `apiVersion` field of the body, if it is a string.
    pub fn api_version(&self) -> Option<&str> {
        self.str_field("apiVersion")
    }

    /// The `metadata.name` field of the body, if it is a string.
    pub fn name(&self) -> Option<&str> {
        self.body
            .get("metadata")
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
    }

    /// Whether the body identifies itself as a resource (non-empty `apiVersion` and `kind`).
    pub fn is_resource(&self) -> bool {
        let present = |v: Option<&str>| v.is_some_and(|s| !s.is_empty());
        present(self.api_version()) && present(self.kind())
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.body.get(key).and_then(Value::as_str)
    }

    /// Body with annotations merged into `metadata.annotations`.
    ///
    /// Keys in `skip` are left out. Bodies that are not mappings are returned unchanged.
    pub fn body_with_annotations(&self, skip: &[&str]) -> Value {
        let mut body = self.body.clone();
        let merged: Vec<(&String, &String)> = self
            .annotations
            .iter()
            .filter(|(k, _)| !skip.contains(&k.as_str()))
            .collect();
        if merged.is_empty() {
            return body;
        }
        if let Some(annotations) = annotations_mut(&mut body) {
            for (k, v) in merged {
                annotations.insert(Value::from(k.as_str()), Value::from(v.as_str()));
            }
        }
        body
    }
}

/// `metadata.annotations` of a mapping body, created when absent or null.
fn annotations_mut(body: &mut Value) -> Option<&mut Mapping> {
    let metadata = child_mapping(body.as_mapping_mut()?, "metadata")?;
    child_mapping(metadata, "annotations")
}

fn child_mapping<'a>(parent: &'a mut Mapping, key: &str) -> Option<&'a mut Mapping> {
    let child = parent.entry(Value::from(key)).or_insert(Value::Null);
    if child.is_null() {
        *child = Value::Mapping(Mapping::new());
    }
    child.as_mapping_mut()
}

/// Read the provenance annotations of a document.
///
/// The path annotation is required; the index annotation is returned when present.
pub fn file_annotations(doc: &Document) -> Result<(String, Option<String>), PackageError> {
    let path = doc.annotation(PATH_ANNOTATION).ok_or_else(|| {
        PackageError::Annotation(format!(
            "document {} is missing the {} annotation",
            describe(doc),
            PATH_ANNOTATION
        ))
    })?;
    let index = doc.annotation(INDEX_ANNOTATION).map(str::to_string);
    Ok((path.to_string(), index))
}

/// Short human-readable identity of a document for error messages.
pub fn describe(doc: &Document) -> String {
    match (doc.kind(), doc.name()) {
        (Some(kind), Some(name)) => format!("{}/{}", kind, name),
        (Some(kind), None) => kind.to_string(),
        _ => "<unnamed>".to_string(),
    }
}
