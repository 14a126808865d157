//! Reader and writer seams for document collections.

use crate::document::Document;
use crate::error::PackageError;

/// Source of documents.
pub trait Reader {
    fn read(&mut self) -> Result<Vec<Document>, PackageError>;
}

/// Sink for documents.
pub trait Writer {
    fn write(&mut self, documents: &[Document]) -> Result<(), PackageError>;
}

/// In-memory reader and writer: `read` returns what the last `write` stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageBuffer {
    pub documents: Vec<Document>,
}

impl PackageBuffer {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }
}

impl Reader for PackageBuffer {
    fn read(&mut self) -> Result<Vec<Document>, PackageError> {
        Ok(self.documents.clone())
    }
}

impl Writer for PackageBuffer {
    fn write(&mut self, documents: &[Document]) -> Result<(), PackageError> {
        self.documents = documents.to_vec();
        Ok(())
    }
}

/// Read everything from `reader` and hand it to `writer` after `filter`.
pub fn pipe<R, W, F>(reader: &mut R, writer: &mut W, filter: F) -> Result<usize, PackageError>
where
    R: Reader + ?Sized,
    W: Writer + ?Sized,
    F: FnOnce(Vec<Document>) -> Vec<Document>,
{
    let documents = filter(reader.read()?);
    writer.write(&documents)?;
    Ok(documents.len())
}
