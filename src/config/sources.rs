//! Config file sources.

pub mod global_file;
pub mod package_file;
