#![forbid(unsafe_code)]

//! Error norm and step-size control.

use crate::tableau::ButcherTableau;
use crate::validation::ToleranceValue;

// Step-size control constants.
pub const SAFETY: f64 = 0.9;
pub const MIN_FACTOR: f64 = 0.2;
pub const MAX_FACTOR: f64 = 10.0;

/// RMS norm: ||x|| / sqrt(n).
pub fn rms_norm(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = x.iter().map(|v| v * v).sum();
    sum_sq.sqrt() / (x.len() as f64).sqrt()
}

/// Per-component error scale: `atol_i + rtol * max(|y_i|, |y_new_i|)`.
pub fn error_scale(y: &[f64], y_new: &[f64], rtol: f64, atol: &ToleranceValue) -> Vec<f64> {
    y.iter()
        .zip(y_new)
        .enumerate()
        .map(|(i, (yi, yni))| atol.component(i) + yi.abs().max(yni.abs()) * rtol)
        .collect()
}

/// Compute the RMS error norm: ||error / scale|| / sqrt(n).
pub fn error_norm(error: &[f64], scale: &[f64]) -> f64 {
    rms_norm(
        &error
            .iter()
            .zip(scale)
            .map(|(e, s)| if *e == 0.0 { 0.0 } else { e / s })
            .collect::<Vec<_>>(),
    )
}

/// What to do with an evaluated step attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepDecision {
    /// Commit the attempt; try `next_h_abs` for the following step.
    Accept { next_h_abs: f64 },
    /// Commit the attempt although `error_norm > 1`: the step size is
    /// already at the floor and cannot shrink further.
    AcceptAtFloor { next_h_abs: f64 },
    /// Discard the attempt and retry from the same point with `next_h_abs`.
    Reject { next_h_abs: f64 },
}

/// Accept/reject policy with bounded growth and shrinkage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepController {
    pub safety: f64,
    pub min_factor: f64,
    pub max_factor: f64,
    pub error_exponent: f64,
}

impl StepController {
    #[must_use]
    pub fn for_tableau(tableau: &ButcherTableau) -> Self {
        Self {
            safety: SAFETY,
            min_factor: MIN_FACTOR,
            max_factor: MAX_FACTOR,
            error_exponent: tableau.error_exponent(),
        }
    }

    /// Resize factor `min(max_factor, max(min_factor, safety * norm^exponent))`.
    #[must_use]
    pub fn factor(&self, error_norm: f64) -> f64 {
        if error_norm == 0.0 {
            return self.max_factor;
        }
        self.max_factor
            .min(self.min_factor.max(self.safety * error_norm.powf(self.error_exponent)))
    }

    /// Decide on an attempt of magnitude `h_abs`.
    ///
    /// `at_floor` marks an attempt whose trial magnitude was already the
    /// minimum step, before any stretch onto `t_bound`; such an attempt is
    /// never rejected. `previously_rejected` caps growth at 1 after a
    /// rejection within the same advance.
    #[must_use]
    pub fn decide(
        &self,
        error_norm: f64,
        h_abs: f64,
        at_floor: bool,
        previously_rejected: bool,
    ) -> StepDecision {
        if error_norm <= 1.0 {
            let factor = self.factor(error_norm);
            let factor = if previously_rejected {
                factor.min(1.0)
            } else {
                factor
            };
            return StepDecision::Accept {
                next_h_abs: h_abs * factor,
            };
        }
        if at_floor {
            return StepDecision::AcceptAtFloor { next_h_abs: h_abs };
        }
        StepDecision::Reject {
            next_h_abs: h_abs * self.factor(error_norm),
        }
    }
}

/// `next_after` equivalent: the next representable f64 toward `toward`.
pub(crate) fn next_after(from: f64, toward: f64) -> f64 {
    if from == toward {
        return from;
    }
    if from.is_nan() || toward.is_nan() {
        return f64::NAN;
    }
    if from == 0.0 {
        if toward > 0.0 {
            return f64::from_bits(1);
        }
        return -f64::from_bits(1);
    }
    let bits = from.to_bits();
    let next_bits = if (toward > from) == (from > 0.0) {
        bits + 1
    } else {
        bits - 1
    };
    f64::from_bits(next_bits)
}

/// Smallest admissible step magnitude at `t`: ten ulps in the direction of travel.
pub fn min_step_at(t: f64, direction: f64) -> f64 {
    10.0 * (next_after(t, direction * f64::INFINITY) - t).abs()
}
