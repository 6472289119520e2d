#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rkpair_integrate::{SolveIvpOptions, SolverKind, ToleranceValue, solve_ivp};

#[derive(Debug, Arbitrary)]
struct IntegrationInput {
    rk23: bool,
    t_end: f64,
    y0: Vec<f64>,
    coefficients: Vec<f64>,
    rtol: f64,
    atol: f64,
}

fuzz_target!(|input: IntegrationInput| {
    let y0 = input.y0.iter().copied().take(4).collect::<Vec<_>>();
    let n = y0.len();
    let coefficients = input
        .coefficients
        .iter()
        .copied()
        .take(n * n)
        .collect::<Vec<_>>();
    if coefficients.len() < n * n || !input.t_end.is_finite() || input.t_end.abs() > 10.0 {
        return;
    }
    // Linear system y' = A y, bounded so the fuzzer cannot force blow-up work.
    if coefficients.iter().any(|a| !(a.abs() <= 10.0)) {
        return;
    }
    let mut rhs = |_t: f64, y: &[f64]| {
        (0..n)
            .map(|i| (0..n).map(|j| coefficients[i * n + j] * y[j]).sum())
            .collect::<Vec<f64>>()
    };
    let options = SolveIvpOptions {
        t_span: (0.0, input.t_end),
        y0: &y0,
        method: if input.rk23 {
            SolverKind::Rk23
        } else {
            SolverKind::Rk45
        },
        rtol: input.rtol,
        atol: ToleranceValue::Scalar(input.atol),
        max_rejections: 50,
        ..SolveIvpOptions::default()
    };
    if let Ok(result) = solve_ivp(&mut rhs, &options) {
        let direction = input.t_end.signum();
        assert!(result.t.windows(2).all(|w| direction * (w[1] - w[0]) > 0.0));
        if result.success {
            assert_eq!(result.t.last().copied(), Some(input.t_end));
        }
    }
});
