//! Validated cash-flow sequences.
//!
//! A [`CashFlowSequence`] is built once at the boundary. Entries that are
//! not finite numbers are dropped there (and counted), so nothing
//! downstream re-checks element types.

use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Money;

/// Ordered periodic cash flows, index 0 being the initial period.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CashFlowSequence {
    flows: Vec<Money>,
    dropped: usize,
}

impl CashFlowSequence {
    /// Wrap already-typed decimal flows. Nothing is dropped.
    pub fn new(flows: Vec<Money>) -> Self {
        Self { flows, dropped: 0 }
    }

    /// Build from floats, dropping NaN, infinities and values outside the
    /// decimal range.
    pub fn from_f64(values: &[f64]) -> Self {
        let flows: Vec<Money> = values.iter().filter_map(|v| Decimal::from_f64(*v)).collect();
        let dropped = values.len() - flows.len();
        Self { flows, dropped }
    }

    /// Build from loosely typed JSON values, keeping only JSON numbers.
    pub fn from_json_values(values: &[Value]) -> Self {
        let flows: Vec<Money> = values.iter().filter_map(json_number).collect();
        let dropped = values.len() - flows.len();
        Self { flows, dropped }
    }

    pub fn as_slice(&self) -> &[Money] {
        &self.flows
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Number of entries rejected while building the sequence.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn has_outflow(&self) -> bool {
        self.flows.iter().any(|cf| *cf < Decimal::ZERO)
    }

    pub fn has_inflow(&self) -> bool {
        self.flows.iter().any(|cf| *cf > Decimal::ZERO)
    }

    /// Sum of the absolute values of negative flows, `None` on overflow.
    pub fn total_outflows(&self) -> Option<Money> {
        self.flows
            .iter()
            .filter(|cf| **cf < Decimal::ZERO)
            .try_fold(Decimal::ZERO, |acc, cf| acc.checked_add(cf.abs()))
    }

    /// Sum of positive flows, `None` on overflow.
    pub fn total_inflows(&self) -> Option<Money> {
        self.flows
            .iter()
            .filter(|cf| **cf > Decimal::ZERO)
            .try_fold(Decimal::ZERO, |acc, cf| acc.checked_add(*cf))
    }

    /// Copy with every positive flow multiplied by `factor`, saturating at
    /// the decimal bounds.
    pub fn scale_inflows(&self, factor: Decimal) -> Self {
        let flows = self
            .flows
            .iter()
            .map(|cf| if *cf > Decimal::ZERO { cf.saturating_mul(factor) } else { *cf })
            .collect();
        Self {
            flows,
            dropped: self.dropped,
        }
    }
}

impl From<Vec<Money>> for CashFlowSequence {
    fn from(flows: Vec<Money>) -> Self {
        Self::new(flows)
    }
}

impl AsRef<[Money]> for CashFlowSequence {
    fn as_ref(&self) -> &[Money] {
        &self.flows
    }
}

/// Convert a JSON number to a decimal. Strings, booleans, nulls, arrays
/// and objects are not numeric.
fn json_number(value: &Value) -> Option<Money> {
    let Value::Number(n) = value else {
        return None;
    };
    Decimal::from_str(&n.to_string())
        .or_else(|_| Decimal::from_scientific(&n.to_string()))
        .ok()
        .or_else(|| n.as_f64().and_then(Decimal::from_f64))
}

/// Lenient optional rate: any non-numeric JSON value reads as absent.
pub fn lenient_rate<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(json_number))
}

impl Serialize for CashFlowSequence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.flows.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CashFlowSequence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = Vec::<Value>::deserialize(deserializer)?;
        Ok(Self::from_json_values(&values))
    }
}
