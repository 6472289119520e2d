#![forbid(unsafe_code)]

//! Single-attempt step engine shared by every tableau.

use crate::solver::StepFailure;
use crate::tableau::ButcherTableau;

/// Candidate produced by one step attempt. Discarded on rejection.
#[derive(Debug, Clone, PartialEq)]
pub struct StepAttempt {
    /// High-order solution at `t + h`.
    pub y_new: Vec<f64>,
    /// `f(t + h, y_new)`, the FSAL slope.
    pub f_new: Vec<f64>,
    /// Local error estimate `y_high - y_low`.
    pub error: Vec<f64>,
}

/// Evaluate the right-hand side and check its shape and finiteness.
pub(crate) fn eval_rhs<F>(fun: &mut F, t: f64, y: &[f64], n: usize) -> Result<Vec<f64>, StepFailure>
where
    F: FnMut(f64, &[f64]) -> Vec<f64>,
{
    let f = fun(t, y);
    if f.len() != n {
        return Err(StepFailure::DimensionMismatch {
            t,
            expected: n,
            actual: f.len(),
        });
    }
    if f.iter().any(|v| !v.is_finite()) {
        return Err(StepFailure::NonFiniteDerivative { t });
    }
    Ok(f)
}

/// Perform a single explicit Runge-Kutta step attempt.
///
/// `f` must equal `fun(t, y)`. `k` is filled with the stage derivatives
/// (`k[0] = f`, `k[n_stages] = f_new`) and must hold `n_stages + 1` vectors.
/// The right-hand side is evaluated exactly `n_stages` times.
pub fn rk_step<F>(
    fun: &mut F,
    t: f64,
    y: &[f64],
    f: &[f64],
    h: f64,
    tableau: &ButcherTableau,
    k: &mut [Vec<f64>],
) -> Result<StepAttempt, StepFailure>
where
    F: FnMut(f64, &[f64]) -> Vec<f64>,
{
    let n = y.len();
    k[0].clear();
    k[0].extend_from_slice(f);

    for s in 1..tableau.n_stages {
        let y_stage = combine(y, h, tableau.a[s], k);
        k[s] = eval_rhs(fun, t + tableau.c[s] * h, &y_stage, n)?;
    }

    let y_new = combine(y, h, tableau.b, k);
    let f_new = eval_rhs(fun, t + h, &y_new, n)?;
    k[tableau.n_stages].clone_from(&f_new);

    let error = estimate_error(k, tableau.e, h, n);

    Ok(StepAttempt {
        y_new,
        f_new,
        error,
    })
}

/// `y + h * Σ_j weights[j] * k[j]`.
fn combine(y: &[f64], h: f64, weights: &[f64], k: &[Vec<f64>]) -> Vec<f64> {
    let mut dy = vec![0.0; y.len()];
    for (j, &w) in weights.iter().enumerate() {
        if w != 0.0 {
            for (d, kj) in dy.iter_mut().zip(&k[j]) {
                *d += w * kj;
            }
        }
    }
    y.iter().zip(&dy).map(|(yi, di)| yi + h * di).collect()
}

/// Estimate local error using the E coefficients: `h * Σ_s e_s * k_s`.
pub(crate) fn estimate_error(k: &[Vec<f64>], e: &[f64], h: f64, n: usize) -> Vec<f64> {
    let mut err = vec![0.0; n];
    for (s, &e_s) in e.iter().enumerate() {
        if e_s != 0.0 {
            for (acc, ks) in err.iter_mut().zip(&k[s]) {
                *acc += e_s * ks;
            }
        }
    }
    for v in &mut err {
        *v *= h;
    }
    err
}
