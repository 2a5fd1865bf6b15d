mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::analysis::AnalyzeArgs;
use commands::returns::CalcArgs;
use perf_engine_core::returns::CalculatorKind;

/// Investment performance calculations
#[derive(Parser)]
#[command(
    name = "perf",
    version,
    about = "Investment performance calculations",
    long_about = "Computes investment returns with decimal precision from a JSON or YAML \
                  request: simple return, Modified Dietz, true time-weighted return, \
                  linked Modified Dietz TWR, and periodic performance reports."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Point-to-point simple return
    Simple(CalcArgs),
    /// Modified Dietz money-weighted return
    Dietz(CalcArgs),
    /// True time-weighted return from valuations at every flow date
    Twr(CalcArgs),
    /// Monthly linked Modified Dietz time-weighted return
    LinkedTwr(CalcArgs),
    /// Periodic performance report (TWR, MWR, trailing figures)
    Analyze(AnalyzeArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Simple(args) => commands::returns::run_calc(CalculatorKind::Simple, args),
        Commands::Dietz(args) => commands::returns::run_calc(CalculatorKind::ModifiedDietz, args),
        Commands::Twr(args) => commands::returns::run_calc(CalculatorKind::TrueTwr, args),
        Commands::LinkedTwr(args) => {
            commands::returns::run_calc(CalculatorKind::LinkedDietzTwr, args)
        }
        Commands::Analyze(args) => commands::analysis::run_analyze(args),
        Commands::Version => {
            println!("perf {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
