//! pkgio: package-aware configuration trees
//!
//! Reads a directory tree of configuration documents into one ordered
//! collection, tagging each document with the file it came from and its
//! position in that file, and writes the collection back to the same layout.
//! Files whose documents were all removed are deleted on write.

pub mod cli;
pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod ignore;
pub mod kio;
pub mod logging;
pub mod package;
pub mod tree;

pub use document::{Document, INDEX_ANNOTATION, PATH_ANNOTATION};
pub use error::PackageError;
pub use kio::{PackageBuffer, Reader, Writer};
pub use package::PackageReadWriter;
pub use tree::reader::PackageReader;
pub use tree::writer::PackageWriter;
