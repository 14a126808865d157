//! Document codec: byte streams to documents and back.
//!
//! YAML files hold a stream of `---` separated documents. JSON files hold exactly
//! one document. Empty documents are skipped on decode and never consume an index.

use crate::document::{Document, INDEX_ANNOTATION, PATH_ANNOTATION};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Codec-level failures. The reader and writer attach the file path.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document {index} is not a resource")]
    NonResource { index: usize },

    #[error("a JSON file holds exactly one document, got {0}")]
    JsonDocumentCount(usize),
}

/// Serialization format of a file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    pub fn for_path(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }
}

/// Options applied to every document decoded from one file.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    pub format: Option<Format>,
    /// Path annotation value for this file; `None` skips provenance entirely.
    pub path: Option<String>,
    /// Skip stamping the path and index annotations.
    pub omit_reader_annotations: bool,
    /// Fail instead of dropping documents without `apiVersion`/`kind`.
    pub error_if_non_resources: bool,
    /// Extra annotations stamped on every document.
    pub set_annotations: BTreeMap<String, String>,
}

/// Decode all documents from `input`.
///
/// Each document keeps the text it was decoded from. Text holding no document
/// (leading comments, empty documents) is kept with the neighbouring document so
/// an unchanged file encodes back to the same bytes.
pub fn decode(input: &str, options: &DecodeOptions) -> Result<Vec<Document>, CodecError> {
    let chunks = match options.format.unwrap_or(Format::Yaml) {
        Format::Yaml => decode_yaml_stream(input)?,
        Format::Json => decode_json(input)?,
    };

    let mut docs: Vec<Document> = Vec::with_capacity(chunks.len());
    let mut leading = String::new();
    let mut position = 0;
    for (text, body) in chunks {
        if body.is_null() {
            match docs.last_mut() {
                Some(prev) => prev.append_source(text),
                None => leading.push_str(text),
            }
            continue;
        }

        let mut doc = Document::from_source(body, text);
        if !doc.is_resource() {
            if options.error_if_non_resources {
                return Err(CodecError::NonResource { index: position });
            }
            debug!(position, "Dropping document without apiVersion or kind");
            position += 1;
            continue;
        }
        position += 1;

        if !leading.is_empty() {
            doc.prepend_source(&leading);
            leading.clear();
        }
        for (k, v) in &options.set_annotations {
            doc.set_annotation(k.as_str(), v.as_str());
        }
        if !options.omit_reader_annotations {
            if let Some(ref path) = options.path {
                doc.set_annotation(PATH_ANNOTATION, path.as_str());
            }
            doc.set_annotation(INDEX_ANNOTATION, docs.len().to_string());
        }
        docs.push(doc);
    }
    Ok(docs)
}

/// Split a YAML stream at its document markers and decode each piece.
/// Pieces holding no document decode to `Value::Null`.
fn decode_yaml_stream(input: &str) -> Result<Vec<(&str, Value)>, CodecError> {
    split_documents(input)
        .into_iter()
        .map(|text| {
            if is_blank_document(text) {
                return Ok((text, Value::Null));
            }
            let body: Value = serde_yaml::from_str(text)?;
            Ok((text, body))
        })
        .collect()
}

fn decode_json(input: &str) -> Result<Vec<(&str, Value)>, CodecError> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }
    let value: Value = serde_json::from_str(input)?;
    Ok(vec![(input, value)])
}

/// Pieces of `input`, each starting at a `---` line except the first.
/// Concatenating the pieces gives back `input`.
fn split_documents(input: &str) -> Vec<&str> {
    let mut starts = vec![0];
    let mut offset = 0;
    for line in input.split_inclusive('\n') {
        if offset > 0 && is_document_marker(line) {
            starts.push(offset);
        }
        offset += line.len();
    }
    starts.push(input.len());
    starts.windows(2).map(|w| &input[w[0]..w[1]]).collect()
}

fn is_document_marker(line: &str) -> bool {
    line.strip_prefix("---")
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

/// Only markers, directives, comments, and blank lines.
fn is_blank_document(text: &str) -> bool {
    text.lines().all(|line| {
        let line = if is_document_marker(line) {
            &line[3..]
        } else {
            line
        };
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line.starts_with('%') || line == "..."
    })
}

/// Encode documents into the bytes of one file.
///
/// Annotations listed in `skip` are not written; every other annotation is
/// merged into `metadata.annotations` of its document. A document whose
/// rendered body is unchanged since decode is written as its original text.
pub fn encode<'d, I>(docs: I, format: Format, skip: &[&str]) -> Result<String, CodecError>
where
    I: IntoIterator<Item = &'d Document>,
{
    let docs: Vec<&Document> = docs.into_iter().collect();
    match format {
        Format::Yaml => {
            let mut out = String::new();
            for doc in docs {
                let body = doc.body_with_annotations(skip);
                match doc.unchanged_source(&body) {
                    Some(text) => push_document(&mut out, text),
                    None => push_document(&mut out, &serde_yaml::to_string(&body)?),
                }
            }
            Ok(out)
        }
        Format::Json => {
            let [doc] = docs.as_slice() else {
                return Err(CodecError::JsonDocumentCount(docs.len()));
            };
            let body = doc.body_with_annotations(skip);
            if let Some(text) = doc.unchanged_source(&body) {
                return Ok(text.to_string());
            }
            let mut out = serde_json::to_string_pretty(&body)?;
            out.push('\n');
            Ok(out)
        }
    }
}

/// Append one document, adding a `---` separator unless the text brings its own.
fn push_document(out: &mut String, text: &str) {
    if !out.is_empty() {
        if !out.ends_with('\n') {
            out.push('\n');
        }
        if !text.lines().next().is_some_and(is_document_marker) {
            out.push_str("---\n");
        }
    }
    out.push_str(text);
}
