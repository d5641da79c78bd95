use rust_decimal::Decimal;

use crate::types::{Money, Rate};

/// NPV and its first derivative with respect to the rate, at one rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NpvPoint {
    pub npv: Money,
    pub derivative: Decimal,
}

/// NPV(r) = sum CF_t / (1+r)^t and d(NPV)/dr = sum -t * CF_t / (1+r)^(t+1).
///
/// Returns `None` when `1 + r <= 0` or when a discount factor overflows the
/// decimal range, never a silently wrong value.
pub fn npv_and_derivative(rate: Rate, cash_flows: &[Money]) -> Option<NpvPoint> {
    let one_plus_r = Decimal::ONE.checked_add(rate)?;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }

    let mut npv = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE; // (1+r)^-t

    for (t, cf) in cash_flows.iter().enumerate() {
        npv = npv.checked_add(cf.checked_mul(discount)?)?;
        if t > 0 {
            let term = Decimal::from(t as u64)
                .checked_mul(*cf)?
                .checked_mul(discount)?
                .checked_div(one_plus_r)?;
            dnpv = dnpv.checked_sub(term)?;
        }
        discount = discount.checked_div(one_plus_r)?;
    }

    Some(NpvPoint {
        npv,
        derivative: dnpv,
    })
}

/// Net Present Value of periodic cash flows, index 0 undiscounted.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> Option<Money> {
    npv_and_derivative(rate, cash_flows).map(|p| p.npv)
}

/// Value of the series carried forward to its last period,
/// FV(r) = sum CF_t * (1+r)^(n-1-t), and dFV/dr.
///
/// NPV(r) = FV(r) / (1+r)^(n-1), so FV has the sign and the roots of NPV
/// but stays small where `1 + r` is close to zero and discount factors
/// leave the decimal range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuturePoint {
    pub value: Money,
    pub derivative: Decimal,
}

/// Horner evaluation of FV and its derivative. `None` when `1 + r <= 0`
/// or on overflow.
pub fn future_value_and_derivative(rate: Rate, cash_flows: &[Money]) -> Option<FuturePoint> {
    let growth = Decimal::ONE.checked_add(rate)?;
    if growth <= Decimal::ZERO {
        return None;
    }

    let mut value = Decimal::ZERO;
    let mut derivative = Decimal::ZERO;
    for cf in cash_flows {
        derivative = derivative.checked_mul(growth)?.checked_add(value)?;
        value = value.checked_mul(growth)?.checked_add(*cf)?;
    }

    Some(FuturePoint { value, derivative })
}

/// NPV, or `Decimal::MAX` / `Decimal::MIN` with the right sign when NPV is
/// beyond the decimal range. Only sign and magnitude tests should consume
/// a bound.
pub fn npv_or_bound(rate: Rate, cash_flows: &[Money]) -> Option<Money> {
    if let Some(value) = npv(rate, cash_flows) {
        return Some(value);
    }
    let fv = future_value_and_derivative(rate, cash_flows)?.value;
    Some(if fv > Decimal::ZERO {
        Decimal::MAX
    } else if fv < Decimal::ZERO {
        Decimal::MIN
    } else {
        Decimal::ZERO
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(0.01));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        assert_eq!(npv(Decimal::ZERO, &cfs).unwrap(), dec!(50));
    }

    #[test]
    fn test_exact_single_period_root() {
        let point = npv_and_derivative(dec!(0.10), &[dec!(-100), dec!(110)]).unwrap();
        assert!(point.npv.abs() < dec!(0.00000000000000000001));
        // d/dr (110 / (1+r)) = -110 / 1.21
        assert!((point.derivative - dec!(-90.909090909)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let cfs = vec![dec!(-1000), dec!(200), dec!(-50), dec!(700), dec!(400)];
        let r = dec!(0.07);
        let h = dec!(0.000001);
        let analytic = npv_and_derivative(r, &cfs).unwrap().derivative;
        let numeric = (npv(r + h, &cfs).unwrap() - npv(r - h, &cfs).unwrap()) / (h + h);
        assert!((analytic - numeric).abs() < dec!(0.001));
    }

    #[test]
    fn test_domain_violation_returns_none() {
        let cfs = vec![dec!(-100), dec!(110)];
        assert!(npv_and_derivative(dec!(-1), &cfs).is_none());
        assert!(npv(dec!(-1.5), &cfs).is_none());
    }

    #[test]
    fn test_overflow_returns_none() {
        // (1 - 0.999)^-40 = 1e120 exceeds the decimal range
        let mut cfs = vec![dec!(-100)];
        cfs.extend(std::iter::repeat(dec!(10)).take(40));
        assert!(npv(dec!(-0.999), &cfs).is_none());
    }

    #[test]
    fn test_future_value_matches_npv() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let r = dec!(0.10);
        let fv = future_value_and_derivative(r, &cfs).unwrap();
        // -1000 * 1.331 + 300 * 1.21 + 400 * 1.1 + 500
        assert_eq!(fv.value, dec!(-28.000));
        let carried = npv(r, &cfs).unwrap() * dec!(1.331);
        assert!((fv.value - carried).abs() < dec!(0.000001));
        // dFV/dr = -3000 * 1.21 + 600 * 1.1 + 400
        assert_eq!(fv.derivative, dec!(-2570.00));
    }

    #[test]
    fn test_future_value_stays_finite_near_minus_one() {
        let mut cfs = vec![dec!(-1000)];
        cfs.extend(std::iter::repeat(dec!(10)).take(20));
        assert!(npv(dec!(-0.99), &cfs).is_none());
        let fv = future_value_and_derivative(dec!(-0.99), &cfs).unwrap();
        assert!(fv.value > dec!(10) && fv.value < dec!(10.2));
        assert!(future_value_and_derivative(dec!(-1), &cfs).is_none());
    }

    #[test]
    fn test_npv_or_bound_keeps_sign() {
        let mut cfs = vec![dec!(-1000)];
        cfs.extend(std::iter::repeat(dec!(10)).take(20));
        assert_eq!(npv_or_bound(dec!(-0.99), &cfs), Some(Decimal::MAX));

        let negated: Vec<Decimal> = cfs.iter().map(|cf| -*cf).collect();
        assert_eq!(npv_or_bound(dec!(-0.99), &negated), Some(Decimal::MIN));

        assert_eq!(npv_or_bound(dec!(0.10), &[dec!(-100), dec!(110)]), npv(dec!(0.10), &[dec!(-100), dec!(110)]));
        assert_eq!(npv_or_bound(dec!(-1), &cfs), None);
    }

    #[test]
    fn test_rate_at_decimal_max_is_none() {
        assert!(npv(Decimal::MAX, &[dec!(-100), dec!(110)]).is_none());
    }

    #[test]
    fn test_empty_series_is_zero() {
        let point = npv_and_derivative(dec!(0.05), &[]).unwrap();
        assert_eq!(point.npv, Decimal::ZERO);
        assert_eq!(point.derivative, Decimal::ZERO);
    }
}
