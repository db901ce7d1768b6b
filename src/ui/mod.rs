// Terminal output helpers

pub mod formatters;

pub use formatters::{colorize_pct, format_bytes, print_process_table};
