#![forbid(unsafe_code)]

use crate::control::rms_norm;
use crate::engine::eval_rhs;
use crate::solver::StepFailure;
use crate::validation::ToleranceValue;

#[derive(Debug, Clone, PartialEq)]
pub struct InitialStepRequest<'a> {
    pub t0: f64,
    pub y0: &'a [f64],
    pub t_bound: f64,
    pub max_step: f64,
    pub f0: &'a [f64],
    pub direction: f64,
    /// Order of the error estimator of the method that will take the step.
    pub order: f64,
    pub rtol: f64,
    pub atol: &'a ToleranceValue,
}

/// Estimate a first step magnitude from the scale of `y0`, `f0` and the tolerances.
///
/// Takes one explicit Euler step of size `h0` to estimate the second
/// derivative, then picks the step whose projected local error is about
/// tolerance-sized. The result is bounded by `100 * h0`, the horizon and
/// `max_step`. Evaluates `fun` exactly once.
pub fn select_initial_step<F>(
    fun: &mut F,
    request: &InitialStepRequest<'_>,
) -> Result<f64, StepFailure>
where
    F: FnMut(f64, &[f64]) -> Vec<f64>,
{
    let n = request.y0.len();
    if n == 0 {
        return Ok(f64::INFINITY);
    }
    let interval_length = (request.t_bound - request.t0).abs();
    if interval_length == 0.0 {
        return Ok(0.0);
    }

    let scale: Vec<f64> = request
        .y0
        .iter()
        .enumerate()
        .map(|(i, y)| request.atol.component(i) + y.abs() * request.rtol)
        .collect();
    let scaled = |v: &[f64]| -> Vec<f64> {
        v.iter()
            .zip(&scale)
            .map(|(vi, si)| if *vi == 0.0 { 0.0 } else { vi / si })
            .collect()
    };

    let d0 = rms_norm(&scaled(request.y0));
    let d1 = rms_norm(&scaled(request.f0));

    let h0 = if !(d0 >= 1e-5) || !(d1 >= 1e-5) {
        1e-6
    } else {
        0.01 * d0 / d1
    };
    let h0 = h0.min(interval_length);

    let y1: Vec<f64> = request
        .y0
        .iter()
        .zip(request.f0)
        .map(|(y, f)| y + h0 * request.direction * f)
        .collect();
    let f1 = eval_rhs(fun, request.t0 + h0 * request.direction, &y1, n)?;

    let df: Vec<f64> = f1.iter().zip(request.f0).map(|(a, b)| a - b).collect();
    let d2 = rms_norm(&scaled(&df)) / h0;

    let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
        1e-6_f64.max(h0 * 1e-3)
    } else {
        (0.01 / d1.max(d2)).powf(1.0 / (request.order + 1.0))
    };

    Ok((100.0 * h0)
        .min(h1)
        .min(interval_length)
        .min(request.max_step))
}
