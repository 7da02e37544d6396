//! Command-line entry points.

pub mod extract;
pub mod process;
pub mod schema;
