//! Companion capital-budgeting metrics reported alongside the IRR.
//!
//! All functions take periodic flows with index 0 as the initial period and
//! return `None` when the metric is not defined for the series or does not
//! fit in a decimal.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use crate::npv::npv;
use crate::types::{Money, Rate, Years};

/// Simple payback: periods until cumulative cash flow turns non-negative,
/// interpolated linearly inside the recovering period.
pub fn payback_period(cash_flows: &[Money]) -> Option<Years> {
    recovery_point(cash_flows)
}

/// Payback on cash flows discounted at `rate`.
pub fn discounted_payback_period(rate: Rate, cash_flows: &[Money]) -> Option<Years> {
    let one_plus_r = Decimal::ONE.checked_add(rate)?;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }
    let mut discount = Decimal::ONE;
    let mut discounted = Vec::with_capacity(cash_flows.len());
    for cf in cash_flows {
        discounted.push(cf.checked_mul(discount)?);
        discount = discount.checked_div(one_plus_r)?;
    }
    recovery_point(&discounted)
}

fn recovery_point(flows: &[Money]) -> Option<Years> {
    let (first, rest) = flows.split_first()?;
    if *first >= Decimal::ZERO {
        return None;
    }

    let mut cumulative = *first;
    for (i, cf) in rest.iter().enumerate() {
        let before = cumulative;
        cumulative = cumulative.checked_add(*cf)?;
        if cumulative >= Decimal::ZERO {
            // before < 0 and cumulative >= 0 imply cf > 0
            let fraction = (-before).checked_div(*cf)?;
            return Decimal::from(i as u64).checked_add(fraction);
        }
    }
    None
}

/// Profitability index: (NPV + I0) / I0 with I0 = -cf[0] > 0.
pub fn profitability_index(rate: Rate, cash_flows: &[Money]) -> Option<Decimal> {
    let initial = -*cash_flows.first()?;
    if initial <= Decimal::ZERO {
        return None;
    }
    let value = npv(rate, cash_flows)?;
    value.checked_add(initial)?.checked_div(initial)
}

/// Modified IRR: outflows discounted at `finance_rate`, inflows compounded
/// to the final period at `reinvestment_rate`.
pub fn mirr(cash_flows: &[Money], finance_rate: Rate, reinvestment_rate: Rate) -> Option<Rate> {
    let n = cash_flows.len();
    if n < 2 || finance_rate <= dec!(-1) || reinvestment_rate <= dec!(-1) {
        return None;
    }
    let last = (n - 1) as u64;

    let mut pv_outflows = Decimal::ZERO;
    let mut fv_inflows = Decimal::ZERO;
    for (t, cf) in cash_flows.iter().enumerate() {
        let t = t as u64;
        if *cf < Decimal::ZERO {
            let factor = Decimal::ONE.checked_add(finance_rate)?.checked_powu(t)?;
            pv_outflows = pv_outflows.checked_add(cf.checked_div(factor)?)?;
        } else if *cf > Decimal::ZERO {
            let factor = Decimal::ONE
                .checked_add(reinvestment_rate)?
                .checked_powu(last - t)?;
            fv_inflows = fv_inflows.checked_add(cf.checked_mul(factor)?)?;
        }
    }

    if pv_outflows.is_zero() || fv_inflows.is_zero() {
        return None;
    }

    let ratio = fv_inflows.checked_div(-pv_outflows)?;
    let exponent = Decimal::ONE / Decimal::from(last);
    ratio.checked_powd(exponent)?.checked_sub(Decimal::ONE)
}

/// Number of sign changes in the series, ignoring zeros. More than one
/// means the IRR may not be unique.
pub fn sign_changes(cash_flows: &[Money]) -> usize {
    let mut changes = 0;
    let mut previous_negative: Option<bool> = None;
    for cf in cash_flows.iter().filter(|cf| !cf.is_zero()) {
        let negative = *cf < Decimal::ZERO;
        if let Some(prev) = previous_negative {
            if prev != negative {
                changes += 1;
            }
        }
        previous_negative = Some(negative);
    }
    changes
}
