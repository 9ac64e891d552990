//! Report rendering and file exports.

pub mod export;
pub mod generator;

pub use export::export_all;
pub use generator::{generate_json_report, generate_markdown_report};
