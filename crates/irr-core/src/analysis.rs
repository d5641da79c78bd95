//! Qualitative reading of an IRR.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::cash_flows::lenient_rate;
use crate::types::{format_pct, Rate};

/// Upper bound (inclusive) of the "low return" band.
const LOW_RETURN_CEILING: Rate = dec!(0.05);

/// Upper bound (inclusive) of the "moderate return" band.
const MODERATE_RETURN_CEILING: Rate = dec!(0.15);

/// Coarse risk classification of an investment's return profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        };
        f.write_str(label)
    }
}

/// Recommendation text and risk level for one IRR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub recommendation: String,
    pub risk_level: RiskLevel,
}

/// JSON-facing input for [`analyze_irr`]. Non-numeric values read as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisInput {
    #[serde(default, deserialize_with = "lenient_rate")]
    pub rate: Option<Rate>,
    #[serde(default, deserialize_with = "lenient_rate")]
    pub hurdle_rate: Option<Rate>,
}

/// Classify an IRR (or its absence) and phrase a recommendation.
///
/// | IRR | Risk | Reading |
/// |-----|------|---------|
/// | undefined | High | could not be computed |
/// | < 0 | High | loses value |
/// | 0 to 5% | Medium | low |
/// | 5% to 15% | Low | moderate |
/// | > 15% | Low | strong |
///
/// With a hurdle rate the recommendation states whether the IRR meets it.
pub fn analyze_irr(rate: Option<Rate>, hurdle_rate: Option<Rate>) -> AnalysisResult {
    let Some(rate) = rate else {
        return AnalysisResult {
            recommendation: "IRR could not be computed for this cash-flow series. \
                             Verify that it contains at least one outflow (negative amount) \
                             and at least one inflow (positive amount)."
                .to_string(),
            risk_level: RiskLevel::High,
        };
    };

    let pct = format_pct(rate);
    let (risk_level, reading) = if rate < Decimal::ZERO {
        (
            RiskLevel::High,
            format!("An IRR of {pct} means the investment loses value over time."),
        )
    } else if rate <= LOW_RETURN_CEILING {
        (
            RiskLevel::Medium,
            format!("An IRR of {pct} is a low return."),
        )
    } else if rate <= MODERATE_RETURN_CEILING {
        (
            RiskLevel::Low,
            format!("An IRR of {pct} is a moderate return."),
        )
    } else {
        (
            RiskLevel::Low,
            format!("An IRR of {pct} is a strong return."),
        )
    };

    let guidance = match hurdle_rate {
        Some(hurdle) if rate >= hurdle => format!(
            "It meets your required rate of return of {}.",
            format_pct(hurdle)
        ),
        Some(hurdle) => match shortfall_points(hurdle, rate) {
            Some(points) => format!(
                "It falls short of your required rate of return of {} by {:.2} percentage points.",
                format_pct(hurdle),
                points
            ),
            None => format!(
                "It falls short of your required rate of return of {}.",
                format_pct(hurdle)
            ),
        },
        None => "Compare it against your required rate of return (hurdle rate) \
                 before committing capital."
            .to_string(),
    };

    AnalysisResult {
        recommendation: format!("{reading} {guidance}"),
        risk_level,
    }
}

/// Gap between hurdle and rate in percentage points to two decimals, or
/// `None` when it rounds to zero or does not fit in a decimal.
fn shortfall_points(hurdle: Rate, rate: Rate) -> Option<Decimal> {
    let points = hurdle
        .checked_sub(rate)?
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    (points > Decimal::ZERO).then_some(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_undefined_rate_is_high_risk() {
        let result = analyze_irr(None, Some(dec!(0.08)));
        assert_eq!(result.risk_level, RiskLevel::High);
        assert!(result.recommendation.contains("could not be computed"));
        assert!(result.recommendation.contains("outflow"));
        assert!(result.recommendation.contains("inflow"));
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(analyze_irr(Some(dec!(-0.01)), None).risk_level, RiskLevel::High);
        assert_eq!(analyze_irr(Some(Decimal::ZERO), None).risk_level, RiskLevel::Medium);
        assert_eq!(analyze_irr(Some(dec!(0.05)), None).risk_level, RiskLevel::Medium);
        assert_eq!(analyze_irr(Some(dec!(0.0501)), None).risk_level, RiskLevel::Low);
        assert_eq!(analyze_irr(Some(dec!(0.15)), None).risk_level, RiskLevel::Low);
        assert_eq!(analyze_irr(Some(dec!(0.30)), None).risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_band_wording() {
        assert!(analyze_irr(Some(dec!(-0.2)), None)
            .recommendation
            .contains("loses value over time"));
        assert!(analyze_irr(Some(dec!(0.03)), None)
            .recommendation
            .contains("low return"));
        assert!(analyze_irr(Some(dec!(0.10)), None)
            .recommendation
            .contains("moderate return"));
        assert!(analyze_irr(Some(dec!(0.25)), None)
            .recommendation
            .contains("strong return"));
    }

    #[test]
    fn test_hurdle_shortfall() {
        let result = analyze_irr(Some(dec!(0.0547)), Some(dec!(0.08)));
        assert_eq!(
            result.recommendation,
            "An IRR of 5.47% is a moderate return. It falls short of your required \
             rate of return of 8.00% by 2.53 percentage points."
        );
    }

    #[test]
    fn test_hurdle_met() {
        let result = analyze_irr(Some(dec!(0.12)), Some(dec!(0.12)));
        assert!(result.recommendation.contains("meets your required rate of return of 12.00%"));
    }

    #[test]
    fn test_negligible_shortfall_omits_amount() {
        let result = analyze_irr(Some(dec!(0.07999999)), Some(dec!(0.08)));
        assert_eq!(
            result.recommendation,
            "An IRR of 8.00% is a moderate return. It falls short of your \
             required rate of return of 8.00%."
        );
        assert!(!result.recommendation.contains("percentage points"));
    }

    #[test]
    fn test_extreme_rates_do_not_panic() {
        let huge = analyze_irr(Some(dec!(1000000000000000000000000000)), None);
        assert_eq!(huge.risk_level, RiskLevel::Low);
        assert!(huge.recommendation.contains("strong return"));

        let gap = analyze_irr(Some(dec!(-70000000000000000000000000000)), Some(dec!(50000000000000000000000000000)));
        assert_eq!(gap.risk_level, RiskLevel::High);
        assert!(gap.recommendation.contains("falls short"));
    }

    #[test]
    fn test_no_hurdle_gives_generic_guidance() {
        let result = analyze_irr(Some(dec!(0.12)), None);
        assert!(result.recommendation.contains("hurdle rate"));
    }

    #[test]
    fn test_input_ignores_non_numeric_hurdle() {
        let input: AnalysisInput =
            serde_json::from_str(r#"{"rate": 0.1, "hurdle_rate": "n/a"}"#).unwrap();
        assert_eq!(input.rate, Some(dec!(0.1)));
        assert_eq!(input.hurdle_rate, None);
    }

    #[test]
    fn test_risk_level_serializes_as_label() {
        assert_eq!(serde_json::to_string(&RiskLevel::Medium).unwrap(), "\"Medium\"");
        assert_eq!(RiskLevel::High.to_string(), "High");
    }
}
