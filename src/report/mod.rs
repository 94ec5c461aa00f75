//! Report rendering.

pub mod generator;

pub use generator::{
    generate_comment_block, generate_json_report, generate_markdown_report, generate_view,
    Report, ReportMetadata,
};
