use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use xmigen_core::{Config, Report, Severity};
use xmigen_engine::{check_document, derive_instance_with, derive_metadata_with, Pipeline, PipelineOptions};
use xmigen_xmi::{load_model, ContainmentTree};

/// xmigen - sample configuration and metadata from XMI class models
#[derive(Parser)]
#[command(name = "xmigen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: xmigen.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the instance and metadata documents (default)
    Generate {
        /// Model document to read
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Directory to write the artifacts to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Print the sample instance document
    Instance {
        /// Model document to read
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Print the metadata document
    Meta {
        /// Model document to read
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Check the model for dangling references, conflicts and cycles
    Check {
        /// Model document to read
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Save the report as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the containment tree below the root class
    Tree {
        /// Model document to read
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Write a config file with the default settings
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    let command = cli.command.unwrap_or(Commands::Generate { input: None, output_dir: None });

    if let Commands::Init { force } = command {
        let path = cli.config.unwrap_or_else(|| PathBuf::from(Config::FILE_NAME));
        return init_command(&path, force);
    }

    let config = load_config(cli.config.as_deref())?;

    match command {
        Commands::Generate { input, output_dir } => {
            generate_command(&config, input.as_deref(), output_dir.as_deref())
        }
        Commands::Instance { input } => {
            let text = read_model(&config, input.as_deref())?;
            let classes = load_model(&text)?;
            print!("{}", derive_instance_with(&classes, PipelineOptions::from_config(&config).instance)?);
            Ok(())
        }
        Commands::Meta { input } => {
            let text = read_model(&config, input.as_deref())?;
            let classes = load_model(&text)?;
            println!("{}", derive_metadata_with(&classes, PipelineOptions::from_config(&config).metadata)?);
            Ok(())
        }
        Commands::Check { input, output } => {
            let report = check_command(&config, input.as_deref(), output.as_deref())?;
            print_report_summary(&report);

            if report.has_errors() || (config.check.fail_on_warnings && report.has_warnings()) {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Tree { input } => tree_command(&config, input.as_deref()),
        // Handled before the config is loaded
        Commands::Init { .. } => Ok(()),
    }
}

/// Load config from the given path, or xmigen.toml if present
fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        return Config::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }

    let default_path = Path::new(Config::FILE_NAME);
    if default_path.exists() {
        tracing::debug!(path = %default_path.display(), "using config file");
        Config::from_file(default_path)
            .with_context(|| format!("Failed to load config {}", default_path.display()))
    } else {
        tracing::debug!("no config file found, using defaults");
        Ok(Config::default())
    }
}

/// Init command - write the default config
fn init_command(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    Config::default()
        .save_to_file(path)
        .with_context(|| format!("Failed to write config {}", path.display()))?;

    println!("{} {}", "Config written to:".green(), path.display());
    Ok(())
}

/// Read the model document named on the command line, or in the config
fn read_model(config: &Config, input: Option<&Path>) -> Result<String> {
    let path = input.map(Path::to_path_buf).unwrap_or_else(|| config.input_path());
    tracing::debug!(path = %path.display(), "reading model");

    std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read model document {}", path.display()))
}

/// Generate command - derive both artifacts and write them
fn generate_command(config: &Config, input: Option<&Path>, output_dir: Option<&Path>) -> Result<()> {
    let text = read_model(config, input)?;

    let artifacts = Pipeline::new(PipelineOptions::from_config(config))
        .run(&text)
        .context("Failed to generate artifacts")?;

    let dir = output_dir.map(Path::to_path_buf).unwrap_or_else(|| config.output_path());
    let (instance_path, metadata_path) = artifacts
        .write_to(&dir, &config.instance_file, &config.metadata_file)
        .with_context(|| format!("Failed to write artifacts to {}", dir.display()))?;

    println!("{} {}", "Instance written to:".green(), instance_path.display());
    println!("{} {}", "Metadata written to:".green(), metadata_path.display());

    Ok(())
}

/// Check command - run model checks and optionally save the report
fn check_command(config: &Config, input: Option<&Path>, output: Option<&Path>) -> Result<Report> {
    let text = read_model(config, input)?;
    let report = check_document(&text, &config.check.severity)?;

    if let Some(path) = output {
        report
            .save_to_file(path)
            .with_context(|| format!("Failed to save report to {}", path.display()))?;
        println!("{} {}", "Report saved to:".green(), path.display());
    }

    Ok(report)
}

/// Tree command - print the containment outline
fn tree_command(config: &Config, input: Option<&Path>) -> Result<()> {
    let text = read_model(config, input)?;
    let classes = load_model(&text)?;
    let root = classes
        .root()
        .ok_or_else(|| anyhow::anyhow!("No class is marked isRoot=\"true\""))?;

    print!("{}", render_tree(&ContainmentTree::new(&classes), &root.name));
    Ok(())
}

/// Render the containment outline, one class per line
fn render_tree<'a>(tree: &ContainmentTree<'a>, root: &'a str) -> String {
    let mut out = String::new();

    for node in tree.outline(root) {
        let indent = "  ".repeat(node.depth);
        let bounds = node
            .multiplicity
            .map(|m| format!(" [{}]", m))
            .unwrap_or_default();

        if node.cyclic {
            out.push_str(&format!("{}{}{} {}\n", indent, node.class, bounds, "(cycle)".red()));
        } else {
            out.push_str(&format!("{}{}{}\n", indent, node.class.bold(), bounds.dimmed()));
        }
    }

    out
}

/// Print report summary to stdout
fn print_report_summary(report: &Report) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Model Check Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Version: {}", report.version);
    println!("Timestamp: {}", report.timestamp);
    if let Some(fingerprint) = &report.fingerprint {
        println!("Document: sha256:{}", fingerprint);
    }
    println!();

    println!("{}", "Summary:".bold());
    println!("  Classes:      {}", report.summary.classes);
    println!("  Aggregations: {}", report.summary.aggregations);

    if report.summary.errors > 0 {
        println!("  Errors:   {}", format!("{}", report.summary.errors).red().bold());
    } else {
        println!("  Errors:   {}", format!("{}", report.summary.errors).green());
    }

    if report.summary.warnings > 0 {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).yellow());
    } else {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).green());
    }

    println!("  Info:     {}", report.summary.info);
    println!();

    if report.diagnostics.is_empty() {
        println!("{}", "✓ No issues found!".green().bold());
    } else {
        println!("{}", "Diagnostics:".bold());
        for diag in &report.diagnostics {
            let severity_str = match diag.severity {
                Severity::Error => "ERROR".red().bold(),
                Severity::Warn => "WARN".yellow().bold(),
                Severity::Info => "INFO".cyan(),
            };

            println!("  [{}] {}: {}", severity_str, diag.code, diag.message);

            if let Some(exp) = &diag.expected {
                println!("    Expected: {}", exp);
            }
            if let Some(act) = &diag.actual {
                println!("    Actual:   {}", act);
            }
            if !diag.related.is_empty() {
                println!("    Related:  {}", diag.related.join(", "));
            }
        }
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());
}
