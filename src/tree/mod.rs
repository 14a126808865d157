//! Package Tree
//!
//! Walking a package directory into documents and writing documents back
//! to files, keyed by their provenance annotations.

pub mod path;
pub mod reader;
pub mod writer;
