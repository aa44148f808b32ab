//! abtab - Abundance table CLI
//!
//! Command-line interface for transposing, merging and core-filtering
//! hierarchical abundance tables.

use abundance_tables::error::{Result, TableError};
use abundance_tables::filter::{filter_core_file, CoreOptions, CoreSummary, PresenceRule};
use abundance_tables::merge::{merge_files, ConflictPolicy, MergeOptions};
use abundance_tables::pipeline::{Workflow, WorkflowConfig};
use abundance_tables::transpose::{transpose_file, TransposeOptions};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

/// CLI-friendly conflict policy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliConflict {
    /// Later inputs overwrite earlier values
    LastWins,
    /// Keep the first value seen
    FirstWins,
    /// Abort on disagreeing values
    Error,
}

impl From<CliConflict> for ConflictPolicy {
    fn from(policy: CliConflict) -> Self {
        match policy {
            CliConflict::LastWins => ConflictPolicy::LastWins,
            CliConflict::FirstWins => ConflictPolicy::FirstWins,
            CliConflict::Error => ConflictPolicy::Error,
        }
    }
}

/// CLI-friendly presence rule enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliPresence {
    /// Any value other than the literal "0" is present
    Literal,
    /// Any value parsing to a non-zero number is present
    Numeric,
}

impl From<CliPresence> for PresenceRule {
    fn from(rule: CliPresence) -> Self {
        match rule {
            CliPresence::Literal => PresenceRule::Literal,
            CliPresence::Numeric => PresenceRule::Numeric,
        }
    }
}

/// Hierarchical abundance table toolkit
#[derive(Parser)]
#[command(name = "abtab")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn a long abundance list into a table of categories x samples
    Transpose {
        /// Long-format abundance list
        #[arg(short, long)]
        input: PathBuf,

        /// Output path for the wide table
        #[arg(short, long)]
        output: PathBuf,

        /// Number of hierarchy levels to bin abundances by (1-4)
        #[arg(
            short,
            long,
            default_value = "4",
            value_parser = clap::value_parser!(u8).range(1..=4)
        )]
        depth: u8,
    },

    /// Merge two or more wide tables on their key columns
    Merge {
        /// Paths to two or more wide tables
        #[arg(required = true, num_args = 2..)]
        tables: Vec<PathBuf>,

        /// Output path for the merged table
        #[arg(short, long, default_value = "merged_table.txt")]
        output: PathBuf,

        /// Number of leading key columns
        #[arg(short, long, default_value = "1")]
        key_columns: usize,

        /// What to do when inputs disagree on a cell
        #[arg(long, value_enum, default_value = "last-wins")]
        conflict: CliConflict,
    },

    /// Extract rows present in a minimum number of samples
    Core {
        /// Wide abundance table
        #[arg(short, long)]
        input: PathBuf,

        /// Output path for the core table
        #[arg(short, long)]
        output: PathBuf,

        /// 1-based column of the first sample; the identifier column is the one before it
        #[arg(short, long)]
        sample_start_column: usize,

        /// Minimum number of samples a row must be present in
        #[arg(short = 'n', long, conflicts_with = "min_fraction")]
        min_samples: Option<usize>,

        /// Minimum fraction of samples (rounded down) a row must be present in [default: 0.8]
        #[arg(short = 'p', long)]
        min_fraction: Option<f64>,

        /// How a cell is judged present
        #[arg(long, value_enum, default_value = "literal")]
        presence: CliPresence,

        /// Print a summary: text, json, or yaml
        #[arg(long)]
        summary: Option<String>,
    },

    /// Run a workflow from a YAML configuration file
    Run {
        /// Path to workflow configuration YAML
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Generate an example workflow configuration
    Example {
        /// Output path for the example YAML
        #[arg(short, long, default_value = "workflow.yaml")]
        output: PathBuf,
    },
}

fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Transpose {
            input,
            output,
            depth,
        } => cmd_transpose(&input, &output, depth as usize),

        Commands::Merge {
            tables,
            output,
            key_columns,
            conflict,
        } => cmd_merge(&tables, &output, key_columns, conflict.into()),

        Commands::Core {
            input,
            output,
            sample_start_column,
            min_samples,
            min_fraction,
            presence,
            summary,
        } => cmd_core(
            &input,
            &output,
            sample_start_column,
            min_samples,
            min_fraction,
            presence.into(),
            summary.as_deref(),
        ),

        Commands::Run { config } => cmd_run(&config),

        Commands::Example { output } => cmd_example(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Pivot a long abundance list
fn cmd_transpose(input: &Path, output: &Path, depth: usize) -> Result<()> {
    eprintln!("Transposing {:?} at depth {}...", input, depth);
    let matrix = transpose_file(input, output, &TransposeOptions { depth })?;
    eprintln!(
        "Done! {} categories x {} samples written to {:?}",
        matrix.n_keys(),
        matrix.n_samples(),
        output
    );
    Ok(())
}

/// Merge wide tables
fn cmd_merge(
    tables: &[PathBuf],
    output: &Path,
    key_columns: usize,
    conflict: ConflictPolicy,
) -> Result<()> {
    eprintln!("Merging {} tables on {} key column(s)...", tables.len(), key_columns);
    let merged = merge_files(
        tables,
        output,
        &MergeOptions {
            key_columns,
            conflict,
        },
    )?;
    eprintln!(
        "Done! {} rows x {} sample columns written to {:?}",
        merged.n_rows(),
        merged.n_columns() - key_columns,
        output
    );
    Ok(())
}

/// Extract the core set
fn cmd_core(
    input: &Path,
    output: &Path,
    sample_start_column: usize,
    min_samples: Option<usize>,
    min_fraction: Option<f64>,
    presence: PresenceRule,
    summary_format: Option<&str>,
) -> Result<()> {
    let options =
        CoreOptions::from_column_number(sample_start_column, min_samples, min_fraction, presence)?;
    let summary = filter_core_file(input, output, &options)?;

    match summary_format {
        Some(format) => print_summary(&summary, format)?,
        None => eprintln!(
            "Done! {} of {} rows in the core written to {:?}",
            summary.n_core, summary.n_rows_before, output
        ),
    }
    Ok(())
}

fn print_summary(summary: &CoreSummary, format: &str) -> Result<()> {
    match format.to_lowercase().as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(summary)?),
        "yaml" => print!("{}", serde_yaml::to_string(summary)?),
        "text" => print!("{}", summary),
        other => {
            return Err(TableError::InvalidParameter(format!(
                "Unknown summary format '{}': expected text, json or yaml",
                other
            )))
        }
    }
    Ok(())
}

/// Run a workflow from configuration
fn cmd_run(config_path: &Path) -> Result<()> {
    eprintln!("Loading workflow configuration from {:?}...", config_path);
    let config = WorkflowConfig::from_path(config_path)?;

    let mut workflow = Workflow::from_config(&config);
    if let Some(dir) = config_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        workflow = workflow.base_dir(dir);
    }

    eprintln!("Running workflow '{}'...", config.name);
    let reports = workflow.run()?;
    for report in &reports {
        eprintln!("  {}", report);
    }
    eprintln!("Done! {} steps completed", reports.len());
    Ok(())
}

/// Write an example workflow configuration
fn cmd_example(output: &Path) -> Result<()> {
    let yaml = WorkflowConfig::example().to_yaml()?;
    std::fs::write(output, yaml)?;
    eprintln!("Example workflow written to {:?}", output);
    Ok(())
}
