//! CLI domain: parse and route only.
//! Package behavior lives in the library; the route table just wires it up.

mod parse;
mod route;

pub use parse::{Cli, Commands, PackageArgs};
pub use route::RunContext;
