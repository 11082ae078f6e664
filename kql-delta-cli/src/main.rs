//! CLI entry point for the kql-delta schema delta tool.
//! Provides clap-based command routing for the delta, export and check
//! subcommands, and exit code mapping based on error type.

mod output;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use kql_delta_core::config::{normalize_extensions, CliOverrides, KqlDeltaConfig, OutputConfig};
use kql_delta_core::error::DeltaError;
use kql_delta_core::{KqlDelta, Side};

/// Top-level CLI definition with global flags and subcommand dispatch.
#[derive(Parser)]
#[command(
    name = "kql-delta",
    about = "Compute the control commands that take one Kusto database schema to another",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file path (default: kql-delta.toml if present)
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<String>,

    /// Current schema scripts: files or folders, comma-separated (overrides config)
    #[arg(long, value_name = "PATHS", global = true, conflicts_with = "current_schema")]
    current: Option<String>,

    /// Current schema as a `.show database schema as json` document (overrides config)
    #[arg(long, value_name = "FILE", global = true)]
    current_schema: Option<PathBuf>,

    /// Target schema scripts: files or folders, comma-separated (overrides config)
    #[arg(long, value_name = "PATHS", global = true, conflicts_with = "target_schema")]
    target: Option<String>,

    /// Target schema as a `.show database schema as json` document (overrides config)
    #[arg(long, value_name = "FILE", global = true)]
    target_schema: Option<PathBuf>,

    /// Script file extensions picked up in folders, comma-separated (default: kql,csl)
    #[arg(long, value_name = "EXTS", global = true)]
    extensions: Option<String>,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable verbose/debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where a delta or export is written.
#[derive(clap::Args, Default)]
struct OutputArgs {
    /// Write the script to this file
    #[arg(short, long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Write one file per command under this folder
    #[arg(long, value_name = "DIR")]
    out_folder: Option<PathBuf>,

    /// Print the script to standard output
    #[arg(long)]
    console: bool,
}

/// Schema side selectable on the command line.
#[derive(Clone, Copy, ValueEnum)]
enum SideArg {
    Current,
    Target,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Current => Side::Current,
            SideArg::Target => Side::Target,
        }
    }
}

/// All available kql-delta subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Compute the delta script from the current to the target schema
    Delta {
        #[command(flatten)]
        output: OutputArgs,

        /// Fail instead of emitting commands that drop tables, or drop or retype columns
        #[arg(long)]
        fail_if_data_loss: bool,
    },

    /// Render one schema as the script that recreates it
    Export {
        /// Schema to export
        #[arg(long, value_enum, default_value = "target")]
        side: SideArg,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Parse and validate schema sources without computing a delta
    Check {
        /// Check only this side (default: both)
        #[arg(long, value_enum)]
        side: Option<SideArg>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Set up logging (suppress when JSON output is requested)
    let filter = if cli.json {
        "error"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    env_logger::Builder::new()
        .parse_env(env_logger::Env::default().default_filter_or(filter))
        .format_target(false)
        .format_timestamp(None)
        .init();

    if let Err(e) = run(cli).await {
        print_error(&e);
        process::exit(exit_code(&e));
    }
}

/// Map error types to differentiated exit codes.
fn exit_code(error: &DeltaError) -> i32 {
    match error {
        DeltaError::ConfigError(_) => 2,
        DeltaError::UnsupportedCommandType { .. }
        | DeltaError::DuplicateObjectName { .. }
        | DeltaError::MalformedFunctionBody { .. }
        | DeltaError::ValidationFailed(_)
        | DeltaError::ScriptParse { .. }
        | DeltaError::ScriptFile { .. }
        | DeltaError::SchemaParse(_) => 3,
        DeltaError::IoError(_) => 4,
        DeltaError::DataLoss { .. } => 5,
    }
}

fn split_paths(value: &str) -> Vec<PathBuf> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Build configuration and dispatch the chosen subcommand.
async fn run(cli: Cli) -> Result<(), DeltaError> {
    let json_output = cli.json;
    let quiet = cli.quiet;

    let (output_args, fail_if_data_loss) = match &cli.command {
        Commands::Delta {
            output,
            fail_if_data_loss,
        } => (Some(output), *fail_if_data_loss),
        Commands::Export { output, .. } => (Some(output), false),
        Commands::Check { .. } => (None, false),
    };

    let overrides = CliOverrides {
        current_scripts: cli.current.as_deref().map(split_paths),
        current_schema: cli.current_schema.clone(),
        target_scripts: cli.target.as_deref().map(split_paths),
        target_schema: cli.target_schema.clone(),
        output_file: output_args.and_then(|o| o.out.clone()),
        output_folder: output_args.and_then(|o| o.out_folder.clone()),
        console: output_args.and_then(|o| o.console.then_some(true)),
        extensions: cli
            .extensions
            .as_deref()
            .map(|e| normalize_extensions(e.split(',').map(str::to_string).collect())),
        fail_if_data_loss: fail_if_data_loss.then_some(true),
    };

    // Load config
    let config = KqlDeltaConfig::load(cli.config.as_deref(), &overrides)?;
    let kd = KqlDelta::new(config);

    match &cli.command {
        Commands::Delta { .. } => {
            let report = kd.delta().await?;
            if json_output {
                println!("{}", to_json(&report)?);
            } else {
                if prints_script(&kd.config.output) {
                    output::print_script(&report.script);
                }
                if !quiet {
                    output::print_delta_report(&report);
                    output::print_outputs(&report.outputs);
                }
            }
        }
        Commands::Export { side, .. } => {
            let report = kd.export((*side).into()).await?;
            if json_output {
                println!("{}", to_json(&report)?);
            } else {
                if prints_script(&kd.config.output) {
                    output::print_script(&report.script);
                }
                if !quiet {
                    output::print_export_report(&report);
                }
            }
        }
        Commands::Check { side } => {
            let sides = match side {
                Some(side) => vec![(*side).into()],
                None => vec![Side::Current, Side::Target],
            };
            let report = kd.check(&sides).await?;
            if json_output {
                println!("{}", to_json(&report)?);
            } else {
                output::print_check_report(&report);
            }
        }
    }

    Ok(())
}

/// The script goes to stdout when asked for, or when it is written nowhere else.
fn prints_script(output: &OutputConfig) -> bool {
    output.console || (output.file.is_none() && output.folder.is_none())
}

fn to_json<T: serde::Serialize>(report: &T) -> Result<String, DeltaError> {
    serde_json::to_string_pretty(report)
        .map_err(|e| DeltaError::IoError(std::io::Error::other(e)))
}

/// Print a formatted error message with actionable hints to stderr.
fn print_error(error: &DeltaError) {
    eprintln!("{} {}", "ERROR:".red().bold(), error);

    // Provide actionable guidance
    match error {
        DeltaError::ConfigError(_) => {
            eprintln!(
                "{}",
                "Hint: Check your kql-delta.toml, or pass --current/--target on the command line."
                    .dimmed()
            );
        }
        DeltaError::UnsupportedCommandType { .. } => {
            eprintln!(
                "{}",
                "Hint: Schema scripts may only declare objects (.create function, .create table); move drops and alters out of them."
                    .dimmed()
            );
        }
        DeltaError::DuplicateObjectName { .. } | DeltaError::ValidationFailed(_) => {
            eprintln!(
                "{}",
                "Hint: Each function and table must be declared exactly once across all scripts of a schema."
                    .dimmed()
            );
        }
        DeltaError::ScriptParse { .. } | DeltaError::ScriptFile { .. } => {
            eprintln!(
                "{}",
                "Hint: Run 'kql-delta check' to validate scripts without computing a delta."
                    .dimmed()
            );
        }
        DeltaError::DataLoss { .. } => {
            eprintln!(
                "{}",
                "Hint: Review the dropped tables and columns, or rerun without --fail-if-data-loss."
                    .dimmed()
            );
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prints_script() {
        assert!(prints_script(&OutputConfig::default()));
        let to_file = OutputConfig {
            file: Some(PathBuf::from("delta.kql")),
            ..Default::default()
        };
        assert!(!prints_script(&to_file));
        assert!(prints_script(&OutputConfig {
            console: true,
            ..to_file
        }));
    }

    #[test]
    fn test_console_flag_parses() {
        let cli = Cli::try_parse_from(["kql-delta", "--quiet", "delta", "--console"]).unwrap();
        match cli.command {
            Commands::Delta { output, .. } => assert!(output.console),
            _ => panic!("expected delta"),
        }
        assert!(cli.quiet);
    }
}
