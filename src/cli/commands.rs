//! CLI command definitions

use clap::Args;

/// Render a pipeline definition
#[derive(Debug, Args, Clone)]
pub struct RenderCommand {
    /// Path to pipeline configuration YAML file
    #[arg(short, long)]
    pub file: String,

    /// Where to write the rendered definition
    #[arg(short, long, default_value = "definition.json")]
    pub output: String,

    /// Print the definition to stdout instead of writing a file
    #[arg(long, conflicts_with = "output")]
    pub stdout: bool,
}

/// Validate a pipeline document
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to a JSON or YAML pipeline document
    #[arg(short, long)]
    pub file: String,

    /// Output issues in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Merge pipeline documents
#[derive(Debug, Args, Clone)]
pub struct MergeCommand {
    /// Where to write the merged definition
    #[arg(short, long)]
    pub output: String,

    /// Documents to merge, in order
    #[arg(required = true)]
    pub files: Vec<String>,
}

/// Print job dependency edges
#[derive(Debug, Args, Clone)]
pub struct GraphCommand {
    /// Path to a JSON or YAML pipeline document
    #[arg(short, long)]
    pub file: String,
}
