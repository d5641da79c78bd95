use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::analysis::{analyze_irr, AnalysisResult};
use crate::cash_flows::{lenient_rate, CashFlowSequence};
use crate::config::SolverConfig;
use crate::error::IrrError;
use crate::metrics;
use crate::npv::{npv, npv_and_derivative};
use crate::solver::{solve_irr, SolveMethod};
use crate::types::*;
use crate::IrrResult;

/// Input for a bare IRR solve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrInput {
    pub cash_flows: CashFlowSequence,
    #[serde(default)]
    pub solver: SolverConfig,
}

/// Solver result with diagnostics; `irr` is null when undefined
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrOutput {
    pub irr: Option<Rate>,
    pub method: Option<SolveMethod>,
    pub iterations: Option<u32>,
    /// NPV at the returned rate
    pub residual: Option<Money>,
    pub failure: Option<String>,
}

/// Run the hybrid solver and wrap the outcome in the standard envelope.
pub fn calculate_irr(input: &IrrInput) -> IrrResult<ComputationOutput<IrrOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.solver.validate()?;
    if input.cash_flows.dropped() > 0 {
        warnings.push(dropped_warning(input.cash_flows.dropped()));
    }

    let output = match solve_irr(&input.cash_flows, &input.solver) {
        Ok(solution) => IrrOutput {
            irr: Some(solution.rate),
            method: Some(solution.method),
            iterations: Some(solution.iterations),
            residual: solution.residual,
            failure: None,
        },
        Err(failure) => {
            warnings.push(format!("IRR calculation warning: {failure}"));
            IrrOutput {
                irr: None,
                method: None,
                iterations: None,
                residual: None,
                failure: Some(failure.to_string()),
            }
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "IRR: hybrid Newton-Raphson with bisection fallback",
        &input.solver,
        warnings,
        elapsed,
        output,
    ))
}

/// Input for NPV at a single rate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpvInput {
    pub rate: Rate,
    pub cash_flows: CashFlowSequence,
}

/// NPV and its rate sensitivity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpvOutput {
    pub npv: Money,
    /// d(NPV)/d(rate)
    pub derivative: Decimal,
}

/// Net Present Value at the given rate.
pub fn calculate_npv(input: &NpvInput) -> IrrResult<ComputationOutput<NpvOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.rate <= Decimal::NEGATIVE_ONE {
        return Err(IrrError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }
    if input.cash_flows.dropped() > 0 {
        warnings.push(dropped_warning(input.cash_flows.dropped()));
    }

    let point = npv_and_derivative(input.rate, input.cash_flows.as_slice()).ok_or_else(|| {
        IrrError::InvalidInput {
            field: "rate".into(),
            reason: format!("Discount factors overflow at rate {}", input.rate),
        }
    })?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "NPV: sum CF_t / (1+r)^t",
        &serde_json::json!({ "rate": input.rate.to_string() }),
        warnings,
        elapsed,
        NpvOutput {
            npv: point.npv,
            derivative: point.derivative,
        },
    ))
}

fn dropped_warning(dropped: usize) -> String {
    format!(
        "{} non-numeric cash flow entr{} ignored",
        dropped,
        if dropped == 1 { "y was" } else { "ies were" }
    )
}

/// Input for a full IRR report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrReportInput {
    /// Periodic cash flows (index 0 = initial period, typically negative)
    pub cash_flows: CashFlowSequence,
    /// Required rate of return to compare the IRR against
    #[serde(default, deserialize_with = "lenient_rate")]
    pub hurdle_rate: Option<Rate>,
    /// Rate for NPV, profitability index and discounted payback.
    /// Defaults to the hurdle rate.
    #[serde(default, deserialize_with = "lenient_rate")]
    pub discount_rate: Option<Rate>,
    /// Reinvestment rate for MIRR. Defaults to the discount rate.
    #[serde(default, deserialize_with = "lenient_rate")]
    pub reinvestment_rate: Option<Rate>,
    #[serde(default)]
    pub solver: SolverConfig,
}

/// Output of the IRR report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrReport {
    /// Internal Rate of Return, absent when undefined
    pub irr: Option<Rate>,
    pub method: Option<SolveMethod>,
    pub iterations: Option<u32>,
    /// Why the IRR is undefined, when it is
    pub failure: Option<String>,
    pub analysis: AnalysisResult,
    pub npv: Option<Money>,
    pub profitability_index: Option<Decimal>,
    pub mirr: Option<Rate>,
    pub payback_period: Option<Years>,
    pub discounted_payback_period: Option<Years>,
    /// Absent when the total does not fit in a decimal
    pub total_outflows: Option<Money>,
    pub total_inflows: Option<Money>,
    pub sign_changes: usize,
    pub periods: usize,
}

/// Solve for the IRR, analyse it, and compute companion metrics.
pub fn build_irr_report(input: &IrrReportInput) -> IrrResult<ComputationOutput<IrrReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.solver.validate()?;

    let cash_flows = &input.cash_flows;
    let flows = cash_flows.as_slice();

    if cash_flows.dropped() > 0 {
        warnings.push(dropped_warning(cash_flows.dropped()));
    }
    if !cash_flows.has_outflow() {
        warnings.push("Cash flows contain no outflow (negative amount)".into());
    }
    if !cash_flows.has_inflow() {
        warnings.push("Cash flows contain no inflow (positive amount)".into());
    }
    let sign_changes = metrics::sign_changes(flows);
    if sign_changes > 1 {
        warnings.push(format!(
            "Cash flows change sign {sign_changes} times; the IRR may not be unique"
        ));
    }

    let (irr, method, iterations, failure) = match solve_irr(cash_flows, &input.solver) {
        Ok(solution) => {
            if solution.method == SolveMethod::RelaxedTolerance {
                warnings.push(format!(
                    "IRR accepted under relaxed tolerance {} after {} iterations",
                    input.solver.relaxed_tolerance(),
                    solution.iterations
                ));
            }
            if !solution.converged {
                warnings.push(
                    "Bisection budget exhausted; IRR is the last bracket midpoint".into(),
                );
            }
            (
                Some(solution.rate),
                Some(solution.method),
                Some(solution.iterations),
                None,
            )
        }
        Err(failure) => {
            warnings.push(format!("IRR calculation warning: {failure}"));
            (None, None, None, Some(failure.to_string()))
        }
    };

    let analysis = analyze_irr(irr, input.hurdle_rate);

    let discount_rate = input.discount_rate.or(input.hurdle_rate);
    let reinvestment_rate = input.reinvestment_rate.or(discount_rate);

    let (npv_value, profitability_index, discounted_payback) = match discount_rate {
        Some(rate) => {
            let value = npv(rate, flows);
            if value.is_none() {
                warnings.push(format!("NPV is undefined at discount rate {rate}"));
            }
            (
                value,
                metrics::profitability_index(rate, flows),
                metrics::discounted_payback_period(rate, flows),
            )
        }
        None => (None, None, None),
    };

    let mirr = match (discount_rate, reinvestment_rate) {
        (Some(finance), Some(reinvest)) => metrics::mirr(flows, finance, reinvest),
        _ => None,
    };

    let output = IrrReport {
        irr,
        method,
        iterations,
        failure,
        analysis,
        npv: npv_value,
        profitability_index,
        mirr,
        payback_period: metrics::payback_period(flows),
        discounted_payback_period: discounted_payback,
        total_outflows: cash_flows.total_outflows(),
        total_inflows: cash_flows.total_inflows(),
        sign_changes,
        periods: cash_flows.len(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "IRR: hybrid Newton-Raphson with bisection fallback; NPV, MIRR, payback",
        &serde_json::json!({
            "initial_guess": input.solver.initial_guess.to_string(),
            "tolerance": input.solver.tolerance.to_string(),
            "max_iterations": input.solver.max_iterations,
            "bisection_bracket": [
                input.solver.bisection_low.to_string(),
                input.solver.bisection_high.to_string(),
            ],
            "hurdle_rate": input.hurdle_rate.map(|r| r.to_string()),
            "discount_rate": discount_rate.map(|r| r.to_string()),
            "reinvestment_rate": reinvestment_rate.map(|r| r.to_string()),
        }),
        warnings,
        elapsed,
        output,
    ))
}
