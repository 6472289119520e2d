#![forbid(unsafe_code)]

use rkpair_runtime::RuntimeMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dense::DenseOutputError;
use crate::validation::IntegrateValidationError;

/// Lifecycle of a solver instance.
///
/// `Finished` and `Failed` are terminal: stepping a finished solver is a
/// no-op, stepping a failed one reports [`StepFailure::SolverFailed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OdeSolverState {
    Running,
    Finished,
    Failed,
}

impl OdeSolverState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Whether a committed point met the requested tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAccuracy {
    WithinTolerance,
    /// The step size was pinned at the minimum floor and the error norm
    /// still exceeded 1; the step was committed to guarantee progress.
    ViolatedAtMinStep,
}

/// Metadata of one accepted step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub t_old: f64,
    pub t: f64,
    /// Signed step actually taken (`t - t_old`).
    pub h: f64,
    pub error_norm: f64,
    /// Attempts discarded before this one was accepted.
    pub rejected_attempts: usize,
    pub accuracy: StepAccuracy,
}

impl StepRecord {
    #[must_use]
    pub fn is_accuracy_warning(&self) -> bool {
        self.accuracy == StepAccuracy::ViolatedAtMinStep
    }

    /// Serialize to JSON line for structured logging.
    #[must_use]
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub message: Option<String>,
    pub state: OdeSolverState,
    /// The committed step, `None` when the call was a no-op on a finished solver.
    pub record: Option<StepRecord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverStats {
    pub nfev: usize,
    pub n_accepted: usize,
    pub n_rejected: usize,
    pub n_accuracy_warnings: usize,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepFailure {
    #[error("right-hand side returned a non-finite value at t = {t}")]
    NonFiniteDerivative { t: f64 },
    #[error("right-hand side returned {actual} components at t = {t}, expected {expected}")]
    DimensionMismatch {
        t: f64,
        expected: usize,
        actual: usize,
    },
    #[error("step rejected {rejections} consecutive times at t = {t}")]
    TooManyRejections { t: f64, rejections: usize },
    #[error("attempt to step on a failed solver")]
    SolverFailed,
}

/// Errors surfaced while constructing or driving a solver.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntegrateError {
    #[error(transparent)]
    Validation(#[from] IntegrateValidationError),
    #[error(transparent)]
    Step(#[from] StepFailure),
    #[error(transparent)]
    DenseOutput(#[from] DenseOutputError),
}

pub trait OdeSolver {
    fn mode(&self) -> RuntimeMode;

    fn state(&self) -> OdeSolverState;

    fn t(&self) -> f64;

    fn y(&self) -> &[f64];

    fn step(&mut self) -> Result<StepOutcome, StepFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!OdeSolverState::Running.is_terminal());
        assert!(OdeSolverState::Finished.is_terminal());
        assert!(OdeSolverState::Failed.is_terminal());
    }

    #[test]
    fn step_record_json_line() {
        let record = StepRecord {
            t_old: 0.0,
            t: 0.5,
            h: 0.5,
            error_norm: 0.25,
            rejected_attempts: 1,
            accuracy: StepAccuracy::ViolatedAtMinStep,
        };
        assert!(record.is_accuracy_warning());
        let parsed: serde_json::Value =
            serde_json::from_str(&record.to_json_line()).expect("valid JSON");
        assert_eq!(parsed["accuracy"], "violated_at_min_step");
        assert_eq!(parsed["rejected_attempts"], 1);
        assert_eq!(parsed["t"], 0.5);
    }

    #[test]
    fn integrate_error_wraps_both_sources() {
        let err: IntegrateError = IntegrateValidationError::EmptySpan.into();
        assert_eq!(err.to_string(), "`t0` and `t_bound` must differ.");
        let err: IntegrateError = StepFailure::NonFiniteDerivative { t: 1.5 }.into();
        assert_eq!(
            err.to_string(),
            "right-hand side returned a non-finite value at t = 1.5"
        );
    }
}
