#![forbid(unsafe_code)]

//! Explicit Runge-Kutta ODE solvers (RK23 and RK45).
//!
//! [`RkSolver`] owns the right-hand side and advances one accepted point
//! per [`RkSolver::step`] call, retrying rejected attempts internally.
//! Step-size control follows the classic embedded-pair scheme: the error
//! estimate of the lower-order member drives a bounded resize of the next
//! trial step.

use rkpair_runtime::{EvidenceLedger, RuntimeMode};
use serde::{Deserialize, Serialize};

use crate::control::{StepController, StepDecision, error_norm, error_scale, min_step_at};
use crate::dense::{DenseOutputError, RkDenseOutput};
use crate::engine::{eval_rhs, rk_step};
use crate::solver::{
    IntegrateError, OdeSolver, OdeSolverState, SolverStats, StepAccuracy, StepFailure,
    StepOutcome, StepRecord,
};
use crate::step_size::{InitialStepRequest, select_initial_step};
use crate::tableau::{ButcherTableau, RK45_TABLEAU, SolverKind};
use crate::validation::{
    IntegrateValidationError, ToleranceValue, ToleranceWarning, validate_first_step,
    validate_initial_state, validate_max_step, validate_span, validate_tol,
};

/// Right-hand side produced by [`IntegrationProblem::scalar`].
pub type BoxedRhs<'a> = Box<dyn FnMut(f64, &[f64]) -> Vec<f64> + 'a>;

/// An initial value problem `y' = fun(t, y)`, `y(t0) = y0`, solved up to `t_bound`.
pub struct IntegrationProblem<F> {
    pub fun: F,
    pub t0: f64,
    pub y0: Vec<f64>,
    pub t_bound: f64,
}

impl<F> IntegrationProblem<F>
where
    F: FnMut(f64, &[f64]) -> Vec<f64>,
{
    pub fn new(fun: F, t0: f64, y0: Vec<f64>, t_bound: f64) -> Self {
        Self {
            fun,
            t0,
            y0,
            t_bound,
        }
    }
}

impl<'a> IntegrationProblem<BoxedRhs<'a>> {
    /// One-dimensional problem with a scalar right-hand side.
    pub fn scalar<G>(mut fun: G, t0: f64, y0: f64, t_bound: f64) -> Self
    where
        G: FnMut(f64, f64) -> f64 + 'a,
    {
        Self {
            fun: Box::new(move |t, y: &[f64]| vec![fun(t, y[0])]),
            t0,
            y0: vec![y0],
            t_bound,
        }
    }
}

/// Tolerances and step bounds. Serializable so it can be read from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToleranceConfig {
    pub rtol: f64,
    pub atol: ToleranceValue,
    /// `None` allows steps as long as the whole span. A bound below the
    /// minimum step at the current time (ten ulps of `t`) is raised to it.
    pub max_step: Option<f64>,
    /// `None` estimates the first step from the problem.
    pub first_step: Option<f64>,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            rtol: 1e-3,
            atol: ToleranceValue::Scalar(1e-6),
            max_step: None,
            first_step: None,
        }
    }
}

/// Configuration for constructing an RK solver.
#[derive(Debug, Clone)]
pub struct RkSolverConfig {
    pub tolerance: ToleranceConfig,
    pub tableau: &'static ButcherTableau,
    pub mode: RuntimeMode,
    /// Consecutive rejections within one `step()` that fail it. Must be positive.
    pub max_rejections: usize,
    /// Number of recent [`StepRecord`]s kept in the solver's ledger.
    pub ledger_capacity: usize,
}

impl Default for RkSolverConfig {
    fn default() -> Self {
        Self {
            tolerance: ToleranceConfig::default(),
            tableau: &RK45_TABLEAU,
            mode: RuntimeMode::Strict,
            max_rejections: 500,
            ledger_capacity: 64,
        }
    }
}

impl RkSolverConfig {
    #[must_use]
    pub fn for_kind(kind: SolverKind) -> Self {
        Self {
            tableau: kind.tableau(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: ToleranceConfig) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: RuntimeMode) -> Self {
        self.mode = mode;
        self
    }
}

/// An explicit Runge-Kutta ODE solver with adaptive step-size control.
///
/// Supports RK45 (Dormand-Prince) and RK23 (Bogacki-Shampine) via
/// interchangeable Butcher tableaux.
pub struct RkSolver<F> {
    fun: F,
    mode: RuntimeMode,
    state: OdeSolverState,
    tableau: &'static ButcherTableau,
    controller: StepController,
    // Problem definition
    n: usize,
    t: f64,
    y: Vec<f64>,
    t_old: Option<f64>,
    y_old: Vec<f64>,
    t_bound: f64,
    direction: f64,
    /// Distance to `t_bound` below which a step lands exactly on it.
    snap: f64,
    // Tolerances
    rtol: f64,
    atol: ToleranceValue,
    max_step: f64,
    warnings: Vec<ToleranceWarning>,
    // Solver state
    f: Vec<f64>,
    h_abs: f64,
    /// Stage derivatives of the last accepted step.
    k: Vec<Vec<f64>>,
    /// Scratch stages for the attempt in flight.
    k_trial: Vec<Vec<f64>>,
    max_rejections: usize,
    stats: SolverStats,
    ledger: EvidenceLedger<StepRecord>,
}

impl<F> RkSolver<F>
where
    F: FnMut(f64, &[f64]) -> Vec<f64>,
{
    /// Validate the problem and configuration, evaluate `f(t0, y0)` and
    /// pick the first trial step.
    pub fn new(
        problem: IntegrationProblem<F>,
        config: RkSolverConfig,
    ) -> Result<Self, IntegrateError> {
        let IntegrationProblem {
            mut fun,
            t0,
            y0,
            t_bound,
        } = problem;
        let tolerance = config.tolerance;

        let direction = validate_span(t0, t_bound)?;
        let n = validate_initial_state(&y0, config.mode)?;
        let validated = validate_tol(tolerance.rtol, tolerance.atol, n, config.mode)?;
        if config.max_rejections == 0 {
            return Err(IntegrateValidationError::MaxRejectionsMustBePositive.into());
        }

        let horizon = (t_bound - t0).abs();
        let max_step = match tolerance.max_step {
            Some(max_step) => validate_max_step(max_step)?,
            None => horizon,
        };

        let f0 = eval_rhs(&mut fun, t0, &y0, n).map_err(|failure| match failure {
            StepFailure::DimensionMismatch {
                expected, actual, ..
            } => IntegrateError::from(IntegrateValidationError::RhsDimensionMismatch {
                expected,
                actual,
            }),
            other => IntegrateError::from(other),
        })?;
        let mut nfev = 1;

        let h_abs = match tolerance.first_step {
            Some(first_step) => validate_first_step(first_step, t0, t_bound)?,
            None => {
                let request = InitialStepRequest {
                    t0,
                    y0: &y0,
                    t_bound,
                    max_step,
                    f0: &f0,
                    direction,
                    order: config.tableau.error_estimator_order as f64,
                    rtol: validated.rtol,
                    atol: &validated.atol,
                };
                nfev += 1;
                select_initial_step(&mut fun, &request)?
            }
        };

        let k = vec![vec![0.0; n]; config.tableau.n_stages + 1];

        Ok(Self {
            fun,
            mode: config.mode,
            state: OdeSolverState::Running,
            tableau: config.tableau,
            controller: StepController::for_tableau(config.tableau),
            n,
            t: t0,
            y: y0,
            t_old: None,
            y_old: Vec::new(),
            t_bound,
            direction,
            snap: min_step_at(t_bound, direction),
            rtol: validated.rtol,
            atol: validated.atol,
            max_step,
            warnings: validated.warnings,
            f: f0,
            h_abs,
            k_trial: k.clone(),
            k,
            max_rejections: config.max_rejections,
            stats: SolverStats {
                nfev,
                ..SolverStats::default()
            },
            ledger: EvidenceLedger::new(config.ledger_capacity),
        })
    }

    /// Current time.
    pub fn t(&self) -> f64 {
        self.t
    }

    /// Current state vector.
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn state(&self) -> OdeSolverState {
        self.state
    }

    /// Previous time (after at least one successful step).
    pub fn t_old(&self) -> Option<f64> {
        self.t_old
    }

    pub fn t_bound(&self) -> f64 {
        self.t_bound
    }

    /// `1.0` when integrating forward, `-1.0` backward.
    pub fn direction(&self) -> f64 {
        self.direction
    }

    /// Magnitude of the last accepted step.
    pub fn step_size(&self) -> Option<f64> {
        self.t_old.map(|t_old| (self.t - t_old).abs())
    }

    /// Magnitude the next step will try first.
    pub fn next_step_size(&self) -> f64 {
        self.h_abs
    }

    pub fn tableau(&self) -> &'static ButcherTableau {
        self.tableau
    }

    /// Number of function evaluations.
    pub fn nfev(&self) -> usize {
        self.stats.nfev
    }

    pub fn stats(&self) -> SolverStats {
        self.stats
    }

    /// Adjustments made to the tolerances at construction.
    pub fn warnings(&self) -> &[ToleranceWarning] {
        &self.warnings
    }

    /// Most recent accepted steps, oldest first.
    pub fn ledger(&self) -> &EvidenceLedger<StepRecord> {
        &self.ledger
    }

    /// Interpolant over the last accepted step.
    pub fn dense_output(&self) -> Result<RkDenseOutput, DenseOutputError> {
        let t_old = self.t_old.ok_or(DenseOutputError::NoAcceptedStep)?;
        Ok(RkDenseOutput::new(
            t_old,
            self.t,
            self.y_old.clone(),
            self.y.clone(),
            &self.k,
            self.tableau.p,
        ))
    }

    /// Advance by one accepted step.
    ///
    /// A finished solver returns its state without a new record; a failed
    /// solver reports [`StepFailure::SolverFailed`]. Any failure while
    /// stepping moves the solver to [`OdeSolverState::Failed`].
    pub fn step(&mut self) -> Result<StepOutcome, StepFailure> {
        match self.state {
            OdeSolverState::Finished => {
                return Ok(StepOutcome {
                    message: None,
                    state: OdeSolverState::Finished,
                    record: None,
                });
            }
            OdeSolverState::Failed => return Err(StepFailure::SolverFailed),
            OdeSolverState::Running => {}
        }

        match self.advance() {
            Ok(record) => {
                if self.direction * (self.t - self.t_bound) >= 0.0 {
                    self.state = OdeSolverState::Finished;
                }
                let message = record
                    .is_accuracy_warning()
                    .then(|| String::from("tolerance not met at the minimum step size"));
                Ok(StepOutcome {
                    message,
                    state: self.state,
                    record: Some(record),
                })
            }
            Err(failure) => {
                self.state = OdeSolverState::Failed;
                Err(failure)
            }
        }
    }

    fn advance(&mut self) -> Result<StepRecord, StepFailure> {
        let t = self.t;
        let min_step = min_step_at(t, self.direction);
        let mut trial_h_abs = self.h_abs.min(self.max_step).max(min_step);
        let mut rejected = 0usize;

        loop {
            let at_floor = trial_h_abs <= min_step;
            let mut t_new = t + trial_h_abs * self.direction;
            if self.direction * (self.t_bound - t_new) <= self.snap {
                t_new = self.t_bound;
            }
            let h = t_new - t;
            let h_abs = h.abs();

            self.stats.nfev += self.tableau.n_stages;
            let attempt = rk_step(
                &mut self.fun,
                t,
                &self.y,
                &self.f,
                h,
                self.tableau,
                &mut self.k_trial,
            )?;

            let scale = error_scale(&self.y, &attempt.y_new, self.rtol, &self.atol);
            let norm = error_norm(&attempt.error, &scale);

            let (next_h_abs, accuracy) =
                match self.controller.decide(norm, h_abs, at_floor, rejected > 0) {
                    StepDecision::Accept { next_h_abs } => {
                        (next_h_abs, StepAccuracy::WithinTolerance)
                    }
                    StepDecision::AcceptAtFloor { next_h_abs } => {
                        (next_h_abs, StepAccuracy::ViolatedAtMinStep)
                    }
                    StepDecision::Reject { next_h_abs } => {
                        rejected += 1;
                        self.stats.n_rejected += 1;
                        if rejected >= self.max_rejections {
                            return Err(StepFailure::TooManyRejections {
                                t,
                                rejections: rejected,
                            });
                        }
                        trial_h_abs = next_h_abs.max(min_step);
                        continue;
                    }
                };

            self.t_old = Some(t);
            self.y_old = std::mem::replace(&mut self.y, attempt.y_new);
            self.t = t_new;
            self.f = attempt.f_new;
            self.h_abs = next_h_abs;
            std::mem::swap(&mut self.k, &mut self.k_trial);

            self.stats.n_accepted += 1;
            if accuracy == StepAccuracy::ViolatedAtMinStep {
                self.stats.n_accuracy_warnings += 1;
            }

            let record = StepRecord {
                t_old: t,
                t: t_new,
                h,
                error_norm: norm,
                rejected_attempts: rejected,
                accuracy,
            };
            self.ledger.record(record.clone());
            return Ok(record);
        }
    }
}

impl<F> OdeSolver for RkSolver<F>
where
    F: FnMut(f64, &[f64]) -> Vec<f64>,
{
    fn mode(&self) -> RuntimeMode {
        self.mode
    }

    fn state(&self) -> OdeSolverState {
        self.state
    }

    fn t(&self) -> f64 {
        self.t
    }

    fn y(&self) -> &[f64] {
        &self.y
    }

    fn step(&mut self) -> Result<StepOutcome, StepFailure> {
        RkSolver::step(self)
    }
}

impl<F> std::fmt::Debug for RkSolver<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RkSolver")
            .field("method", &self.tableau.name)
            .field("state", &self.state)
            .field("n", &self.n)
            .field("t", &self.t)
            .field("t_bound", &self.t_bound)
            .field("h_abs", &self.h_abs)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
