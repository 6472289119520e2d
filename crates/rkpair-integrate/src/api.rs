#![forbid(unsafe_code)]

use rkpair_runtime::RuntimeMode;

use crate::dense::OdeSolution;
use crate::rk::{IntegrationProblem, RkSolver, RkSolverConfig, ToleranceConfig};
use crate::solver::{IntegrateError, OdeSolverState};
use crate::tableau::SolverKind;
use crate::validation::{IntegrateValidationError, ToleranceValue};

#[derive(Debug, Clone, PartialEq)]
pub struct SolveIvpOptions<'a> {
    pub t_span: (f64, f64),
    pub y0: &'a [f64],
    pub method: SolverKind,
    /// Times at which to report the solution, sorted in the direction of
    /// integration. `None` reports every accepted step.
    pub t_eval: Option<&'a [f64]>,
    pub dense_output: bool,
    pub rtol: f64,
    pub atol: ToleranceValue,
    pub first_step: Option<f64>,
    /// `None` allows steps as long as the whole span.
    pub max_step: Option<f64>,
    pub max_rejections: usize,
    pub mode: RuntimeMode,
}

impl Default for SolveIvpOptions<'_> {
    fn default() -> Self {
        Self {
            t_span: (0.0, 0.0),
            y0: &[],
            method: SolverKind::Rk45,
            t_eval: None,
            dense_output: false,
            rtol: 1e-3,
            atol: ToleranceValue::Scalar(1e-6),
            first_step: None,
            max_step: None,
            max_rejections: 500,
            mode: RuntimeMode::Strict,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolveIvpResult {
    pub t: Vec<f64>,
    pub y: Vec<Vec<f64>>,
    pub sol: Option<OdeSolution>,
    pub nfev: usize,
    pub n_accepted: usize,
    pub n_rejected: usize,
    pub n_accuracy_warnings: usize,
    /// `0` when the end of the span was reached, `-1` when a step failed.
    pub status: i32,
    pub message: String,
    pub success: bool,
}

const MSG_SUCCESS: &str = "The solver successfully reached the end of the integration interval.";

fn validate_t_eval(t_eval: &[f64], t0: f64, tf: f64) -> Result<(), IntegrateValidationError> {
    let (t_min, t_max) = (t0.min(tf), t0.max(tf));
    if t_eval.iter().any(|&te| !(te >= t_min && te <= t_max)) {
        return Err(IntegrateValidationError::TEvalOutOfSpan);
    }
    let direction = (tf - t0).signum();
    if t_eval
        .windows(2)
        .any(|w| !(direction * (w[1] - w[0]) > 0.0))
    {
        return Err(IntegrateValidationError::TEvalNotSorted);
    }
    Ok(())
}

/// Solve an initial value problem for a system of ODEs.
///
/// Configuration errors are returned as `Err`. A failure while stepping
/// ends the integration early with `status = -1` and keeps the points
/// computed so far.
pub fn solve_ivp<F>(
    fun: &mut F,
    options: &SolveIvpOptions<'_>,
) -> Result<SolveIvpResult, IntegrateError>
where
    F: FnMut(f64, &[f64]) -> Vec<f64>,
{
    let (t0, tf) = options.t_span;
    if let Some(t_eval) = options.t_eval {
        validate_t_eval(t_eval, t0, tf)?;
    }

    let config = RkSolverConfig {
        tolerance: ToleranceConfig {
            rtol: options.rtol,
            atol: options.atol.clone(),
            max_step: options.max_step,
            first_step: options.first_step,
        },
        tableau: options.method.tableau(),
        mode: options.mode,
        max_rejections: options.max_rejections,
        ..RkSolverConfig::default()
    };
    let problem = IntegrationProblem::new(fun, t0, options.y0.to_vec(), tf);
    let mut solver = RkSolver::new(problem, config)?;
    let direction = solver.direction();

    let (mut ts, mut ys) = match options.t_eval {
        Some(t_eval) => (
            Vec::with_capacity(t_eval.len()),
            Vec::with_capacity(t_eval.len()),
        ),
        None => (vec![t0], vec![options.y0.to_vec()]),
    };
    let mut cursor = 0;
    let mut segments = Vec::new();
    let mut failure = None;

    while solver.state() == OdeSolverState::Running {
        if let Err(err) = solver.step() {
            failure = Some(err);
            break;
        }

        if let Some(t_eval) = options.t_eval {
            let dense = solver.dense_output()?;
            while let Some(&te) = t_eval.get(cursor)
                && direction * (te - solver.t()) <= 0.0
            {
                ys.push(dense.call(te)?);
                ts.push(te);
                cursor += 1;
            }
            if options.dense_output {
                segments.push(dense);
            }
        } else {
            ts.push(solver.t());
            ys.push(solver.y().to_vec());
            if options.dense_output {
                segments.push(solver.dense_output()?);
            }
        }
    }

    let sol = if options.dense_output && !segments.is_empty() {
        Some(OdeSolution::new(segments)?)
    } else {
        None
    };

    let (status, message, success) = match failure {
        None => (0, MSG_SUCCESS.to_owned(), true),
        Some(err) => (-1, err.to_string(), false),
    };
    let stats = solver.stats();

    Ok(SolveIvpResult {
        t: ts,
        y: ys,
        sol,
        nfev: stats.nfev,
        n_accepted: stats.n_accepted,
        n_rejected: stats.n_rejected,
        n_accuracy_warnings: stats.n_accuracy_warnings,
        status,
        message,
        success,
    })
}
