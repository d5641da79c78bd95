//! Single Newton-Raphson step for the IRR search.

use rust_decimal::Decimal;

use crate::config::SolverConfig;
use crate::npv::{future_value_and_derivative, NpvPoint};
use crate::types::{Money, Rate};

/// Outcome of one Newton step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewtonStep {
    /// The step was shorter than the tolerance; the unclamped new rate is the answer.
    Converged(Rate),
    /// Keep iterating from `rate`, which has already been clamped.
    Continue { rate: Rate, clamped: bool },
}

/// Take one Newton step from `rate` using the NPV and derivative evaluated there.
///
/// The caller guarantees the derivative is above the configured floor.
/// Returns `None` if the step overflows the decimal range.
pub fn newton_step(rate: Rate, point: &NpvPoint, config: &SolverConfig) -> Option<NewtonStep> {
    let step = point.npv.checked_div(point.derivative)?;
    step_by(rate, step, config)
}

/// NPV / NPV' at `rate` computed from the carried-forward value, for rates
/// where NPV itself is beyond the decimal range.
///
/// With x = 1 + r and FV(r) = NPV(r) * x^(n-1):
/// NPV / NPV' = FV * x / (FV' * x - (n-1) * FV).
/// Returns `None` when the denominator vanishes (a flat NPV) or on overflow.
pub fn scaled_step(rate: Rate, cash_flows: &[Money]) -> Option<Decimal> {
    let fv = future_value_and_derivative(rate, cash_flows)?;
    let growth = Decimal::ONE.checked_add(rate)?;
    let periods = Decimal::from(cash_flows.len().saturating_sub(1) as u64);

    let numerator = fv.value.checked_mul(growth)?;
    let denominator = fv
        .derivative
        .checked_mul(growth)?
        .checked_sub(periods.checked_mul(fv.value)?)?;
    if denominator.is_zero() {
        return None;
    }
    numerator.checked_div(denominator)
}

/// Move from `rate` by `-step`, testing convergence before clamping.
pub fn step_by(rate: Rate, step: Decimal, config: &SolverConfig) -> Option<NewtonStep> {
    let new_rate = rate.checked_sub(step)?;

    if new_rate.checked_sub(rate)?.abs() < config.tolerance {
        return Some(NewtonStep::Converged(new_rate));
    }

    let clamped_rate = config.clamp_rate(new_rate);
    Some(NewtonStep::Continue {
        rate: clamped_rate,
        clamped: clamped_rate != new_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::npv::npv_and_derivative;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_step_moves_toward_root() {
        let cfs = [dec!(-100), dec!(60), dec!(60)];
        let config = SolverConfig::default();
        let point = npv_and_derivative(dec!(0.10), &cfs).unwrap();
        match newton_step(dec!(0.10), &point, &config).unwrap() {
            NewtonStep::Continue { rate, clamped } => {
                assert!(!clamped);
                // root is ~0.1307; the first step lands within a few basis points
                assert!((rate - dec!(0.1307)).abs() < dec!(0.005), "got {rate}");
            }
            other => panic!("expected Continue, got {other:?}"),
        }
    }

    #[test]
    fn test_tiny_step_converges_unclamped() {
        let config = SolverConfig::default();
        let point = NpvPoint {
            npv: dec!(0.000001),
            derivative: dec!(-100),
        };
        assert_eq!(
            newton_step(dec!(0.05), &point, &config),
            Some(NewtonStep::Converged(dec!(0.05000001)))
        );
    }

    #[test]
    fn test_overshoot_is_clamped() {
        let config = SolverConfig::default();
        let point = NpvPoint {
            npv: dec!(500),
            derivative: dec!(-1),
        };
        assert_eq!(
            newton_step(dec!(0.10), &point, &config),
            Some(NewtonStep::Continue {
                rate: dec!(100),
                clamped: true
            })
        );

        let point = NpvPoint {
            npv: dec!(-500),
            derivative: dec!(-1),
        };
        assert_eq!(
            newton_step(dec!(0.10), &point, &config),
            Some(NewtonStep::Continue {
                rate: dec!(-0.99),
                clamped: true
            })
        );
    }

    #[test]
    fn test_scaled_step_matches_direct_ratio() {
        let cfs = [dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let point = npv_and_derivative(dec!(0.10), &cfs).unwrap();
        let direct = point.npv / point.derivative;
        let scaled = scaled_step(dec!(0.10), &cfs).unwrap();
        assert!((direct - scaled).abs() < dec!(0.0000001), "{direct} vs {scaled}");
    }

    #[test]
    fn test_scaled_step_at_rate_floor() {
        // NPV at -0.99 is about 10 * 100^20, far beyond the decimal range
        let mut cfs = vec![dec!(-1000)];
        cfs.extend(std::iter::repeat(dec!(10)).take(20));
        assert!(npv_and_derivative(dec!(-0.99), &cfs).is_none());

        let step = scaled_step(dec!(-0.99), &cfs).unwrap();
        // dominated by 10 / x^20, whose Newton ratio is -x / 20
        assert!((step - dec!(-0.0005)).abs() < dec!(0.00001), "got {step}");
        match step_by(dec!(-0.99), step, &SolverConfig::default()).unwrap() {
            NewtonStep::Continue { rate, clamped } => {
                assert!(!clamped);
                assert!(rate > dec!(-0.99));
            }
            other => panic!("expected Continue, got {other:?}"),
        }
    }

    #[test]
    fn test_scaled_step_flat_is_none() {
        // an all-zero series has no slope anywhere
        assert!(scaled_step(dec!(0.5), &[dec!(0), dec!(0)]).is_none());
    }

    #[test]
    fn test_overflowing_step_is_none() {
        let config = SolverConfig::default();
        let point = NpvPoint {
            npv: Decimal::MAX,
            derivative: dec!(0.001),
        };
        assert!(newton_step(dec!(0.10), &point, &config).is_none());
    }
}
