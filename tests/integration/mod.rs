//! Integration tests for reading and writing configuration packages

pub mod test_utils;

mod config_layering;
mod package_reader;
