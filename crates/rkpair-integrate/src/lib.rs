#![forbid(unsafe_code)]

//! Adaptive embedded Runge-Kutta integrators for initial value problems.
//!
//! ## Module layout
//!
//! | Module       | Contents                                                |
//! |--------------|---------------------------------------------------------|
//! | `tableau`    | RK23 / RK45 Butcher tableaux, [`SolverKind`]            |
//! | `engine`     | single step attempt shared by every tableau             |
//! | `control`    | error norm, accept/reject policy, minimum step          |
//! | `step_size`  | first-step heuristic                                    |
//! | `rk`         | [`RkSolver`] state machine and its configuration        |
//! | `dense`      | [`RkDenseOutput`] interpolant, [`OdeSolution`]          |
//! | `api`        | [`solve_ivp`] driver                                    |
//! | `solver`     | lifecycle, step records, error types                    |
//! | `validation` | tolerance and input checks                              |

pub mod api;
pub mod control;
pub mod dense;
pub mod engine;
pub mod rk;
pub mod solver;
pub mod step_size;
pub mod tableau;
pub mod validation;

// ── Re-exports: preserve the flat public API ────────────────────────
pub use api::{SolveIvpOptions, SolveIvpResult, solve_ivp};
pub use control::{StepController, StepDecision, min_step_at};
pub use dense::{DenseOutputError, OdeSolution, RkDenseOutput};
pub use engine::{StepAttempt, rk_step};
pub use rk::{BoxedRhs, IntegrationProblem, RkSolver, RkSolverConfig, ToleranceConfig};
pub use solver::{
    IntegrateError, OdeSolver, OdeSolverState, SolverStats, StepAccuracy, StepFailure,
    StepOutcome, StepRecord,
};
pub use step_size::{InitialStepRequest, select_initial_step};
pub use tableau::{ButcherTableau, RK23_TABLEAU, RK45_TABLEAU, SolverKind};
pub use validation::{
    EPS, IntegrateValidationError, MIN_RTOL, ToleranceValue, ToleranceWarning, ValidatedTolerance,
    validate_first_step, validate_initial_state, validate_max_step, validate_span, validate_tol,
};
