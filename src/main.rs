use anyhow::{Context, Result};
use ol_concourse::cli::commands::{GraphCommand, MergeCommand, RenderCommand, ValidateCommand};
use ol_concourse::cli::output::*;
use ol_concourse::cli::{Cli, Command};
use ol_concourse::config::PipelineConfig;
use ol_concourse::model::{merge_named, Pipeline, PipelineFragment};
use tracing::{debug, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging; stdout is reserved for rendered output
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Render(cmd) => render_pipeline(cmd)?,
        Command::Validate(cmd) => validate_document(cmd)?,
        Command::Merge(cmd) => merge_documents(cmd)?,
        Command::Graph(cmd) => show_graph(cmd)?,
    }

    Ok(())
}

fn render_pipeline(cmd: &RenderCommand) -> Result<()> {
    let config = PipelineConfig::from_file(&cmd.file)
        .context("Failed to load pipeline config")?;
    let pipeline = config.to_pipeline()?;

    if cmd.stdout {
        println!("{}", pipeline.to_json_pretty()?);
        return Ok(());
    }

    pipeline
        .write_json(&cmd.output)
        .with_context(|| format!("Failed to write {}", cmd.output))?;

    println!(
        "{} Rendered {} to {}",
        CHECK,
        style(&config.name).bold(),
        style(&cmd.output).cyan()
    );
    println!("  {}", format_pipeline_summary(&pipeline));
    println!("\n{} Apply it with:", INFO);
    println!("  {}", style(config.fly_command(&cmd.output)).bold());

    Ok(())
}

fn load_document(path: &str) -> Result<Pipeline> {
    Pipeline::from_file(path).with_context(|| format!("Failed to load pipeline document {}", path))
}

fn validate_document(cmd: &ValidateCommand) -> Result<()> {
    let pipeline = load_document(&cmd.file)?;
    let report = pipeline.check();

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.is_valid() {
        println!("{} Pipeline document is valid!", CHECK);
        println!("  {}", format_pipeline_summary(&pipeline));
    } else {
        println!(
            "{} Validation failed with {} issue(s):",
            CROSS,
            style(report.issues.len()).red()
        );
        println!("{}", format_report(&report));
    }

    if !report.is_valid() {
        std::process::exit(1);
    }
    Ok(())
}

fn merge_documents(cmd: &MergeCommand) -> Result<()> {
    let mut fragments = Vec::with_capacity(cmd.files.len());
    let mut groups = Vec::new();
    let mut display = None;

    for file in &cmd.files {
        let mut document = load_document(file)?;
        debug!("Loaded {} with {} jobs", file, document.jobs.len());
        groups.append(&mut document.groups);
        display = display.or(document.display.take());
        fragments.push(PipelineFragment::from(document));
    }

    let mut pipeline = PipelineFragment::combine(fragments)
        .context("Failed to merge pipeline documents")?
        .to_pipeline()
        .with_groups(merge_named(groups)?);
    pipeline.display = display;

    let report = pipeline.check();
    if !report.is_valid() {
        println!(
            "{} Merged pipeline has {} issue(s):",
            CROSS,
            style(report.issues.len()).red()
        );
        println!("{}", format_report(&report));
        std::process::exit(1);
    }

    pipeline
        .write_json(&cmd.output)
        .with_context(|| format!("Failed to write {}", cmd.output))?;
    println!(
        "{} Merged {} documents into {}",
        CHECK,
        style(cmd.files.len()).cyan(),
        style(&cmd.output).cyan()
    );
    println!("  {}", format_pipeline_summary(&pipeline));

    Ok(())
}

fn show_graph(cmd: &GraphCommand) -> Result<()> {
    let pipeline = load_document(&cmd.file)?;
    let edges = pipeline.dependency_edges();

    println!("{} Entry jobs:", INFO);
    for root in format_roots(&pipeline, &edges) {
        println!("  {}", root);
    }

    if edges.is_empty() {
        println!("{} No passed constraints found", WARN);
        return Ok(());
    }

    println!("\n{} Dependencies:", INFO);
    for edge in &edges {
        println!("  {}", format_edge(edge));
    }

    Ok(())
}
