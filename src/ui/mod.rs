//! Terminal presentation: prompts, tables and the progress bar.
//!
//! The library half of the crate never prints; everything user-facing lives
//! here and is driven by the CLI.

pub mod display;
pub mod progress;
pub mod prompt;

pub use display::{clear_screen, print_banner, show_error, show_file_info, show_source_deleted, show_success};
