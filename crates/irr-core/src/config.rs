//! Solver configuration.
//!
//! Every tunable of the hybrid IRR solver lives here with its default so
//! callers (and tests) can tighten or loosen the search without touching
//! solver internals.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::IrrError;
use crate::types::Rate;
use crate::IrrResult;

/// Starting rate for the Newton iteration (10%).
pub const DEFAULT_INITIAL_GUESS: Rate = dec!(0.10);

/// Absolute NPV tolerance, also used as the step-size tolerance.
pub const DEFAULT_TOLERANCE: Decimal = dec!(0.0000001);

/// Maximum Newton iterations.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// Below this absolute derivative a Newton step is considered unstable
/// and the solver switches to bisection.
pub const DERIVATIVE_FLOOR: Decimal = dec!(0.0000000001);

/// Lower clamp for Newton iterates.
pub const RATE_FLOOR: Rate = dec!(-0.99);

/// Upper clamp for Newton iterates.
pub const RATE_CAP: Rate = dec!(100);

/// Lower end of the fixed bisection bracket.
pub const BISECTION_LOW: Rate = dec!(-0.5);

/// Upper end of the fixed bisection bracket.
pub const BISECTION_HIGH: Rate = dec!(10);

/// Maximum bisection iterations once the fallback is triggered.
pub const BISECTION_MAX_ITERATIONS: u32 = 50;

/// Multiplier applied to the tolerance for the post-loop acceptance check.
pub const RELAXED_TOLERANCE_FACTOR: Decimal = dec!(10);

/// Configuration for the hybrid Newton-Raphson / bisection IRR solver.
///
/// Deserializes with every field optional, so a JSON payload such as
/// `{"tolerance": "0.000001"}` keeps the remaining defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Starting rate for Newton-Raphson.
    pub initial_guess: Rate,
    /// Convergence tolerance on |NPV| and on the Newton step size.
    pub tolerance: Decimal,
    /// Maximum Newton iterations.
    pub max_iterations: u32,
    /// Derivative magnitude below which bisection takes over.
    pub derivative_floor: Decimal,
    /// Newton iterates are clamped into `[rate_floor, rate_cap]`.
    pub rate_floor: Rate,
    pub rate_cap: Rate,
    /// Fixed bisection bracket. Never widened automatically.
    pub bisection_low: Rate,
    pub bisection_high: Rate,
    pub bisection_max_iterations: u32,
    /// Post-loop acceptance uses `tolerance * relaxed_tolerance_factor`.
    pub relaxed_tolerance_factor: Decimal,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            initial_guess: DEFAULT_INITIAL_GUESS,
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            derivative_floor: DERIVATIVE_FLOOR,
            rate_floor: RATE_FLOOR,
            rate_cap: RATE_CAP,
            bisection_low: BISECTION_LOW,
            bisection_high: BISECTION_HIGH,
            bisection_max_iterations: BISECTION_MAX_ITERATIONS,
            relaxed_tolerance_factor: RELAXED_TOLERANCE_FACTOR,
        }
    }
}

impl SolverConfig {
    /// Sets the starting rate.
    #[must_use]
    pub fn with_initial_guess(mut self, initial_guess: Rate) -> Self {
        self.initial_guess = initial_guess;
        self
    }

    /// Sets the tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the maximum Newton iterations.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Tolerance used by the final acceptance check after the Newton loop.
    pub fn relaxed_tolerance(&self) -> Decimal {
        self.tolerance.saturating_mul(self.relaxed_tolerance_factor)
    }

    /// Clamp a Newton iterate into the configured band.
    pub fn clamp_rate(&self, rate: Rate) -> Rate {
        rate.max(self.rate_floor).min(self.rate_cap)
    }

    /// Reject configurations the solver cannot run meaningfully.
    pub fn validate(&self) -> IrrResult<()> {
        if self.tolerance <= Decimal::ZERO {
            return Err(invalid("tolerance", "Tolerance must be positive"));
        }
        if self.max_iterations == 0 {
            return Err(invalid("max_iterations", "At least one iteration is required"));
        }
        if self.initial_guess <= dec!(-1) {
            return Err(invalid(
                "initial_guess",
                "Initial guess must be greater than -100%",
            ));
        }
        if self.derivative_floor < Decimal::ZERO {
            return Err(invalid("derivative_floor", "Derivative floor cannot be negative"));
        }
        if self.rate_floor <= dec!(-1) {
            return Err(invalid("rate_floor", "Rate floor must be greater than -100%"));
        }
        if self.rate_floor >= self.rate_cap {
            return Err(invalid("rate_cap", "Rate cap must exceed rate floor"));
        }
        if self.bisection_low <= dec!(-1) {
            return Err(invalid(
                "bisection_low",
                "Bisection bracket must start above -100%",
            ));
        }
        if self.bisection_low >= self.bisection_high {
            return Err(invalid(
                "bisection_high",
                "Bisection upper bound must exceed lower bound",
            ));
        }
        if self.relaxed_tolerance_factor < Decimal::ONE {
            return Err(invalid(
                "relaxed_tolerance_factor",
                "Relaxed tolerance factor must be at least 1",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> IrrError {
    IrrError::InvalidInput {
        field: field.into(),
        reason: reason.into(),
    }
}
