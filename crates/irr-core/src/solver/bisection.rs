//! Bisection fallback on the configured fixed bracket.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::SolverConfig;
use crate::error::IrrFailure;
use crate::npv::npv_or_bound;
use crate::types::{Money, Rate};

/// Result of a bisection run that found a bracketed sign change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BisectionOutcome {
    pub rate: Rate,
    pub npv: Money,
    pub iterations: u32,
    /// False when the iteration budget ran out before |NPV| < tolerance.
    pub converged: bool,
}

/// Bisect `[bisection_low, bisection_high]` for a root of NPV.
///
/// The bracket is never widened. Same-signed endpoints fail with
/// [`IrrFailure::NoSignChange`] even when one of them is inside the
/// tolerance; otherwise an endpoint inside the tolerance is returned
/// directly. When the budget is exhausted the last midpoint is returned
/// with `converged = false`.
pub fn bisect(cash_flows: &[Money], config: &SolverConfig) -> Result<BisectionOutcome, IrrFailure> {
    let mut low = config.bisection_low;
    let mut high = config.bisection_high;
    let mut npv_low = evaluate(low, cash_flows)?;
    let npv_high = evaluate(high, cash_flows)?;

    if same_sign(npv_low, npv_high) {
        return Err(IrrFailure::NoSignChange { npv_low, npv_high });
    }
    if npv_low.abs() < config.tolerance {
        return Ok(endpoint(low, npv_low));
    }
    if npv_high.abs() < config.tolerance {
        return Ok(endpoint(high, npv_high));
    }

    let max_iter = config.bisection_max_iterations.max(1);
    let mut mid = low;
    let mut npv_mid = npv_low;

    for iter in 1..=max_iter {
        mid = low / dec!(2) + high / dec!(2);
        npv_mid = evaluate(mid, cash_flows)?;

        if npv_mid.abs() < config.tolerance {
            return Ok(BisectionOutcome {
                rate: mid,
                npv: npv_mid,
                iterations: iter,
                converged: true,
            });
        }

        if same_sign(npv_low, npv_mid) {
            low = mid;
            npv_low = npv_mid;
        } else {
            high = mid;
        }
    }

    Ok(BisectionOutcome {
        rate: mid,
        npv: npv_mid,
        iterations: max_iter,
        converged: false,
    })
}

/// Out-of-range NPVs come back as signed bounds, which is all bisection needs.
fn evaluate(rate: Rate, cash_flows: &[Money]) -> Result<Money, IrrFailure> {
    npv_or_bound(rate, cash_flows).ok_or(if rate <= dec!(-1) {
        IrrFailure::DomainViolation { rate }
    } else {
        IrrFailure::Overflow { rate }
    })
}

fn endpoint(rate: Rate, npv: Money) -> BisectionOutcome {
    BisectionOutcome {
        rate,
        npv,
        iterations: 0,
        converged: true,
    }
}

fn same_sign(a: Decimal, b: Decimal) -> bool {
    (a > Decimal::ZERO && b > Decimal::ZERO) || (a < Decimal::ZERO && b < Decimal::ZERO)
}
