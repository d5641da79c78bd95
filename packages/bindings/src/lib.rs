use napi::Result as NapiResult;
use napi_derive::napi;

use irr_core::analysis::AnalysisInput;
use irr_core::report::{self, IrrInput, IrrReportInput, NpvInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// `{"cash_flows": [...], "solver": {...}}` -> IRR envelope. An undefined
/// IRR is `"irr": null`, not an error.
#[napi]
pub fn compute_irr(input_json: String) -> NapiResult<String> {
    let input: IrrInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = report::calculate_irr(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// `{"rate": 0.12 | null, "hurdle_rate": 0.08}` -> recommendation and risk level.
#[napi]
pub fn analyze_irr(input_json: String) -> NapiResult<String> {
    let input: AnalysisInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = irr_core::analyze_irr(input.rate, input.hurdle_rate);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn npv(input_json: String) -> NapiResult<String> {
    let input: NpvInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = report::calculate_npv(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn irr_report(input_json: String) -> NapiResult<String> {
    let input: IrrReportInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = report::build_irr_report(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
