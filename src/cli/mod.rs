//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{GraphCommand, MergeCommand, RenderCommand, ValidateCommand};
use std::ffi::OsString;

/// Compose CI pipeline definitions from reusable fragments
#[derive(Debug, Parser, Clone)]
#[command(name = "ol-concourse")]
#[command(version)]
#[command(about = "Compose CI pipeline definitions from reusable fragments", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render a pipeline definition from a configuration file
    Render(RenderCommand),

    /// Check a pipeline document for integrity issues
    Validate(ValidateCommand),

    /// Merge several pipeline documents into one
    Merge(MergeCommand),

    /// Print the job dependency edges of a pipeline document
    Graph(GraphCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
