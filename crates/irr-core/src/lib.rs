pub mod analysis;
pub mod cash_flows;
pub mod config;
pub mod error;
pub mod metrics;
pub mod npv;
pub mod report;
pub mod solver;
pub mod types;

pub use analysis::{analyze_irr, AnalysisResult, RiskLevel};
pub use cash_flows::CashFlowSequence;
pub use config::SolverConfig;
pub use error::{IrrError, IrrFailure};
pub use solver::{compute_irr, solve_irr, IrrSolution, SolveMethod};
pub use types::*;

/// Standard result type for boundary operations
pub type IrrResult<T> = Result<T, IrrError>;
