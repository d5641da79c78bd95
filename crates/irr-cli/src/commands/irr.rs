use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use irr_core::analysis::AnalysisInput;
use irr_core::report::{self, IrrInput, IrrReportInput, NpvInput};
use irr_core::{analyze_irr, CashFlowSequence, SolverConfig};

use crate::input;

/// Solver overrides shared by the commands that search for a rate
#[derive(Args)]
pub struct SolverArgs {
    /// Starting rate for Newton-Raphson (default 0.10)
    #[arg(long)]
    pub guess: Option<Decimal>,

    /// Convergence tolerance on |NPV| and step size (default 1e-7)
    #[arg(long)]
    pub tolerance: Option<Decimal>,

    /// Newton-Raphson iteration budget (default 100)
    #[arg(long)]
    pub max_iterations: Option<u32>,
}

impl SolverArgs {
    fn apply(&self, mut config: SolverConfig) -> SolverConfig {
        if let Some(guess) = self.guess {
            config = config.with_initial_guess(guess);
        }
        if let Some(tolerance) = self.tolerance {
            config = config.with_tolerance(tolerance);
        }
        if let Some(max_iterations) = self.max_iterations {
            config = config.with_max_iterations(max_iterations);
        }
        config
    }
}

/// Arguments for an IRR solve
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct SolveArgs {
    /// Periodic cash flows, first one at t=0 (e.g. -1000,300,400,500)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    #[command(flatten)]
    pub solver: SolverArgs,

    /// Path to JSON input file (overrides --cash-flows)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for IRR analysis
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct AnalyzeArgs {
    /// IRR to classify; omit to analyse an undefined IRR
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Required rate of return to compare against
    #[arg(long, alias = "hurdle-rate")]
    pub hurdle: Option<Decimal>,

    /// Path to JSON input file with `rate` and `hurdle_rate`
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for NPV at a single rate
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct NpvArgs {
    /// Discount rate per period (e.g. 0.08 for 8%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Periodic cash flows, first one at t=0
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the full IRR report
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ReportArgs {
    /// Periodic cash flows, first one at t=0
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Required rate of return to compare the IRR against
    #[arg(long, alias = "hurdle-rate")]
    pub hurdle: Option<Decimal>,

    /// Rate for NPV and discounted payback (defaults to the hurdle)
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// Reinvestment rate for MIRR (defaults to the discount rate)
    #[arg(long)]
    pub reinvestment_rate: Option<Decimal>,

    #[command(flatten)]
    pub solver: SolverArgs,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

fn required_flows(flows: Option<Vec<Decimal>>) -> Result<CashFlowSequence, Box<dyn std::error::Error>> {
    let flows = flows.ok_or("--cash-flows is required (or provide --input)")?;
    Ok(CashFlowSequence::new(flows))
}

pub fn run_solve(args: SolveArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut irr_input: IrrInput = match input::load(args.input.as_deref())? {
        Some(data) => data,
        None => IrrInput {
            cash_flows: required_flows(args.cash_flows)?,
            solver: SolverConfig::default(),
        },
    };
    irr_input.solver = args.solver.apply(irr_input.solver);

    let result = report::calculate_irr(&irr_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let analysis_input: AnalysisInput = match input::load(args.input.as_deref())? {
        Some(data) => data,
        None => AnalysisInput {
            rate: args.rate,
            hurdle_rate: args.hurdle,
        },
    };

    let result = analyze_irr(analysis_input.rate, analysis_input.hurdle_rate);
    Ok(serde_json::to_value(result)?)
}

pub fn run_npv(args: NpvArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let npv_input: NpvInput = match input::load(args.input.as_deref())? {
        Some(data) => data,
        None => NpvInput {
            rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            cash_flows: required_flows(args.cash_flows)?,
        },
    };

    let result = report::calculate_npv(&npv_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_report(args: ReportArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut report_input: IrrReportInput = match input::load(args.input.as_deref())? {
        Some(data) => data,
        None => IrrReportInput {
            cash_flows: required_flows(args.cash_flows)?,
            hurdle_rate: args.hurdle,
            discount_rate: args.discount_rate,
            reinvestment_rate: args.reinvestment_rate,
            solver: SolverConfig::default(),
        },
    };
    report_input.solver = args.solver.apply(report_input.solver);

    let result = report::build_irr_report(&report_input)?;
    Ok(serde_json::to_value(result)?)
}
