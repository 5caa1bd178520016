//! Command-line interface.

mod commands;

pub use commands::{default_log_filter, is_verbose, run};
