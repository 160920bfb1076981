//! Command-line interface for pwcscrape.

mod commands;
mod output;

pub use commands::{is_verbose, run};
