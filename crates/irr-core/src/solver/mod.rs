//! Hybrid IRR root finder.
//!
//! Newton-Raphson drives the search while the NPV derivative is well away
//! from zero. When it flattens out the controller hands over to bisection
//! on the fixed bracket from [`SolverConfig`], which either finds a
//! bracketed root or reports that none exists in the supported range.
//!
//! | Strategy | Chosen when | Behaviour |
//! |----------|-------------|-----------|
//! | Newton   | `|dNPV/dr| >= derivative_floor` | one step, clamped to `[rate_floor, rate_cap]` |
//! | Bisection | `|dNPV/dr| < derivative_floor` | terminal: returns a rate or `NoSignChange` |
//!
//! Every call owns its [`ConvergenceState`]; nothing is shared between
//! calls, so the solver can be used from any number of threads.

pub mod bisection;
pub mod newton;

use log::{debug, trace};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::cash_flows::CashFlowSequence;
use crate::config::SolverConfig;
use crate::error::IrrFailure;
use crate::npv::{npv, npv_and_derivative, npv_or_bound};
use crate::types::{Money, Rate};

use self::newton::NewtonStep;

/// Which strategy the controller applies at the current iterate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Newton,
    Bisection,
}

impl Strategy {
    /// Newton unless the derivative is too flat for a stable step.
    pub fn select(derivative: Decimal, config: &SolverConfig) -> Self {
        if derivative.abs() < config.derivative_floor {
            Strategy::Bisection
        } else {
            Strategy::Newton
        }
    }
}

/// How the returned rate was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveMethod {
    /// |NPV| or the Newton step fell below the tolerance.
    Newton,
    /// The bisection fallback produced the rate.
    Bisection,
    /// Accepted after the Newton budget ran out, under the relaxed tolerance.
    RelaxedTolerance,
}

/// A rate found by [`solve_irr`] plus how it was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrrSolution {
    pub rate: Rate,
    /// Newton iterations performed, plus bisection iterations if the fallback ran.
    pub iterations: u32,
    pub method: SolveMethod,
    /// NPV at `rate`, when it is representable.
    pub residual: Option<Money>,
    /// False only when bisection exhausted its budget without meeting the tolerance.
    pub converged: bool,
}

/// Per-call iteration state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvergenceState {
    pub rate: Rate,
    pub previous_rate: Option<Rate>,
    pub iteration: u32,
    pub last_npv: Option<Money>,
}

impl ConvergenceState {
    fn new(initial_guess: Rate) -> Self {
        Self {
            rate: initial_guess,
            previous_rate: None,
            iteration: 0,
            last_npv: None,
        }
    }

    fn advance(&mut self, rate: Rate) {
        self.previous_rate = Some(self.rate);
        self.rate = rate;
        self.iteration += 1;
    }
}

/// Internal Rate of Return, or `None` when no rate can be established.
///
/// This is the sentinel form of [`solve_irr`]: every [`IrrFailure`] maps to
/// `None`.
pub fn compute_irr(cash_flows: &CashFlowSequence, config: &SolverConfig) -> Option<Rate> {
    match solve_irr(cash_flows, config) {
        Ok(solution) => Some(solution.rate),
        Err(failure) => {
            debug!("IRR undefined: {failure}");
            None
        }
    }
}

/// Hybrid Newton-Raphson / bisection IRR search with diagnostics.
pub fn solve_irr(
    cash_flows: &CashFlowSequence,
    config: &SolverConfig,
) -> Result<IrrSolution, IrrFailure> {
    let flows = cash_flows.as_slice();
    if flows.len() < 2 {
        return Err(IrrFailure::InsufficientData { count: flows.len() });
    }

    let mut state = ConvergenceState::new(config.initial_guess);

    while state.iteration < config.max_iterations {
        let step = match npv_and_derivative(state.rate, flows) {
            Some(point) => {
                state.last_npv = Some(point.npv);
                trace!(
                    "IRR iteration {}: rate={} npv={} dnpv={}",
                    state.iteration,
                    state.rate,
                    point.npv,
                    point.derivative
                );

                if point.npv.abs() < config.tolerance {
                    return Ok(IrrSolution {
                        rate: state.rate,
                        iterations: state.iteration,
                        method: SolveMethod::Newton,
                        residual: Some(point.npv),
                        converged: true,
                    });
                }

                match Strategy::select(point.derivative, config) {
                    Strategy::Bisection => {
                        debug!(
                            "IRR derivative {} below floor at rate {}; switching to bisection on [{}, {}]",
                            point.derivative, state.rate, config.bisection_low, config.bisection_high
                        );
                        return fall_back_to_bisection(&state, flows, config);
                    }
                    Strategy::Newton => point
                        .npv
                        .checked_div(point.derivative)
                        .or_else(|| newton::scaled_step(state.rate, flows))
                        .ok_or(IrrFailure::Overflow { rate: state.rate })?,
                }
            }
            // NPV is beyond the decimal range here, so it is not within
            // tolerance; step on the carried-forward value instead
            None if state.rate > dec!(-1) => match newton::scaled_step(state.rate, flows) {
                Some(step) => {
                    trace!(
                        "IRR iteration {}: rate={} npv out of range, scaled step={}",
                        state.iteration,
                        state.rate,
                        step
                    );
                    step
                }
                None => {
                    debug!(
                        "IRR scaled step undefined at rate {}; switching to bisection",
                        state.rate
                    );
                    return fall_back_to_bisection(&state, flows, config);
                }
            },
            None => return Err(IrrFailure::DomainViolation { rate: state.rate }),
        };

        match newton::step_by(state.rate, step, config)
            .ok_or(IrrFailure::Overflow { rate: state.rate })?
        {
            NewtonStep::Converged(rate) => {
                return Ok(IrrSolution {
                    rate,
                    iterations: state.iteration + 1,
                    method: SolveMethod::Newton,
                    residual: npv(rate, flows),
                    converged: true,
                });
            }
            NewtonStep::Continue { rate, clamped } => {
                if clamped {
                    debug!("IRR Newton iterate clamped to {rate}");
                }
                state.advance(rate);
            }
        }
    }

    let final_npv = evaluate(state.rate, flows)?;
    if final_npv.abs() < config.relaxed_tolerance() {
        debug!(
            "IRR accepted under relaxed tolerance after {} iterations",
            state.iteration
        );
        return Ok(IrrSolution {
            rate: state.rate,
            iterations: state.iteration,
            method: SolveMethod::RelaxedTolerance,
            residual: Some(final_npv),
            converged: true,
        });
    }

    Err(IrrFailure::NonConvergence {
        iterations: state.iteration,
        last_npv: final_npv,
    })
}

fn fall_back_to_bisection(
    state: &ConvergenceState,
    flows: &[Money],
    config: &SolverConfig,
) -> Result<IrrSolution, IrrFailure> {
    let outcome = bisection::bisect(flows, config)?;
    Ok(IrrSolution {
        rate: outcome.rate,
        iterations: state.iteration + outcome.iterations,
        method: SolveMethod::Bisection,
        residual: npv(outcome.rate, flows),
        converged: outcome.converged,
    })
}

/// NPV at `rate`, saturated to the decimal bounds when out of range.
fn evaluate(rate: Rate, flows: &[Money]) -> Result<Money, IrrFailure> {
    npv_or_bound(rate, flows).ok_or(if rate <= dec!(-1) {
        IrrFailure::DomainViolation { rate }
    } else {
        IrrFailure::Overflow { rate }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(flows: &[Decimal]) -> CashFlowSequence {
        CashFlowSequence::new(flows.to_vec())
    }

    #[test]
    fn test_simple_one_period() {
        let solution = solve_irr(&seq(&[dec!(-100), dec!(110)]), &SolverConfig::default()).unwrap();
        assert!((solution.rate - dec!(0.10)).abs() < dec!(0.000001));
        assert_eq!(solution.method, SolveMethod::Newton);
        assert_eq!(solution.iterations, 0);
    }

    #[test]
    fn test_two_period() {
        let cfs = seq(&[dec!(-100), dec!(60), dec!(60)]);
        let rate = compute_irr(&cfs, &SolverConfig::default()).unwrap();
        assert!((rate - dec!(0.1306)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_insufficient_data() {
        let config = SolverConfig::default();
        assert_eq!(
            solve_irr(&seq(&[]), &config),
            Err(IrrFailure::InsufficientData { count: 0 })
        );
        assert_eq!(
            solve_irr(&seq(&[dec!(-100)]), &config),
            Err(IrrFailure::InsufficientData { count: 1 })
        );
    }

    #[test]
    fn test_flat_derivative_triggers_bisection() {
        // dNPV/dr vanishes at r = 0.10 for [c, 20, -11]
        let cfs = seq(&[dec!(1), dec!(20), dec!(-11)]);
        let solution = solve_irr(&cfs, &SolverConfig::default()).unwrap();
        assert_eq!(solution.method, SolveMethod::Bisection);
        assert!(solution.converged);
        assert!(solution.rate > dec!(-0.47) && solution.rate < dec!(-0.46));
        assert!(npv(solution.rate, cfs.as_slice()).unwrap().abs() < dec!(0.000001));
    }

    #[test]
    fn test_flat_derivative_without_sign_change() {
        // Same flat point, but NPV is negative at both ends of [-0.5, 10]
        let cfs = seq(&[dec!(-5), dec!(20), dec!(-11)]);
        let err = solve_irr(&cfs, &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, IrrFailure::NoSignChange { .. }));
    }

    #[test]
    fn test_all_positive_does_not_converge() {
        let cfs = seq(&[dec!(100), dec!(50), dec!(25)]);
        let err = solve_irr(&cfs, &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, IrrFailure::NonConvergence { iterations: 100, .. }));
    }

    #[test]
    fn test_domain_violation_from_initial_guess() {
        let cfs = seq(&[dec!(-100), dec!(110)]);
        let config = SolverConfig::default().with_initial_guess(dec!(-1.5));
        assert_eq!(
            solve_irr(&cfs, &config),
            Err(IrrFailure::DomainViolation { rate: dec!(-1.5) })
        );
    }

    #[test]
    fn test_relaxed_tolerance_acceptance() {
        // One iteration cannot converge tightly from 0.10, but with a very
        // loose tolerance the post-loop check accepts the iterate.
        let cfs = seq(&[dec!(-100), dec!(60), dec!(60)]);
        let config = SolverConfig::default()
            .with_max_iterations(1)
            .with_tolerance(dec!(0.02));
        let solution = solve_irr(&cfs, &config).unwrap();
        assert_eq!(solution.method, SolveMethod::RelaxedTolerance);
        assert_eq!(solution.iterations, 1);
    }

    #[test]
    fn test_recovers_from_rate_floor_on_long_series() {
        // The first Newton step overshoots to -0.99, where discounting 15
        // periods no longer fits in a decimal.
        let mut flows = vec![dec!(-1000)];
        flows.extend(std::iter::repeat(dec!(10)).take(15));
        let solution = solve_irr(&seq(&flows), &SolverConfig::default()).unwrap();
        assert!((solution.rate - dec!(-0.177507)).abs() < dec!(0.00001), "got {}", solution.rate);
        assert!(solution.iterations > 1);
        assert!(npv(solution.rate, &flows).unwrap().abs() < dec!(0.00001));
    }

    #[test]
    fn test_strategy_selection() {
        let config = SolverConfig::default();
        assert_eq!(Strategy::select(dec!(-5), &config), Strategy::Newton);
        assert_eq!(
            Strategy::select(dec!(0.00000000001), &config),
            Strategy::Bisection
        );
    }
}
