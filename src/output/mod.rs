//! Output formatting module
//!
//! Renders results for the terminal and for files.

mod formatter;

pub use formatter::{write_run_to_file, OutputFormat, ResultFormatter};
