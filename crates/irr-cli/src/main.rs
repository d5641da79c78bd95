mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::irr::{AnalyzeArgs, NpvArgs, ReportArgs, SolveArgs};

/// Internal Rate of Return calculations
#[derive(Parser)]
#[command(
    name = "irr",
    version,
    about = "Internal Rate of Return calculations",
    long_about = "A CLI for solving the Internal Rate of Return of periodic cash flows \
                  with decimal precision. Uses Newton-Raphson with a bisection fallback \
                  and reports NPV, MIRR, payback and a qualitative reading of the result."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log solver diagnostics to stderr (RUST_LOG overrides the level)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve for the IRR of a cash-flow series
    Solve(SolveArgs),
    /// Classify an IRR and phrase a recommendation
    Analyze(AnalyzeArgs),
    /// Net Present Value at a given discount rate
    Npv(NpvArgs),
    /// IRR, analysis and companion metrics in one report
    Report(ReportArgs),
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

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Solve(args) => commands::irr::run_solve(args),
        Commands::Analyze(args) => commands::irr::run_analyze(args),
        Commands::Npv(args) => commands::irr::run_npv(args),
        Commands::Report(args) => commands::irr::run_report(args),
        Commands::Version => {
            println!("irr {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            debug!("command failed: {e:?}");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
