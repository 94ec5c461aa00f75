//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::CategoryFilter;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// sentiscope - sentiment breakdown of YouTube comments
///
/// Sends a video URL to a comment analysis service and summarizes the
/// classified comments as counts, percentages and a filterable list.
///
/// Examples:
///   sentiscope https://www.youtube.com/watch?v=dQw4w9WgXcQ
///   sentiscope https://www.youtube.com/watch?v=dQw4w9WgXcQ --filter negative
///   sentiscope https://www.youtube.com/watch?v=dQw4w9WgXcQ --format json -o report.json
///   sentiscope --interactive
///   sentiscope --text "This is an amazing video!"
///   sentiscope --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// YouTube video URL to analyze
    ///
    /// Passed to the analysis service as given.
    #[arg(
        value_name = "URL",
        required_unless_present_any = ["interactive", "text", "init_config"]
    )]
    pub url: Option<String>,

    /// Base URL of the comment analysis service
    #[arg(long, value_name = "URL", env = "SENTISCOPE_SERVICE_URL")]
    pub service_url: Option<String>,

    /// Show only comments of this category
    #[arg(short, long, value_name = "CATEGORY")]
    pub filter: Option<CategoryFilter>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Width of the probability bar in characters
    #[arg(long, value_name = "CHARS")]
    pub bar_width: Option<usize>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .sentiscope.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Read URLs and commands from stdin
    ///
    /// Commands: `:filter <category>`, `:show`, `:cancel`, `:quit`.
    /// Ctrl-C cancels a running analysis.
    #[arg(short, long, conflicts_with = "text")]
    pub interactive: bool,

    /// Classify a single piece of text instead of a video's comments
    #[arg(long, value_name = "TEXT")]
    pub text: Option<String>,

    /// Generate a default .sentiscope.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    ///
    /// An empty URL is left for the session to reject.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.service_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Service URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(width) = self.bar_width {
            if width == 0 {
                return Err("Bar width must be at least 1".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
