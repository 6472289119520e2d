#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rkpair_integrate::{
    SolverKind, StepController, StepDecision, min_step_at, validate_first_step, validate_max_step,
};

#[derive(Debug, Arbitrary)]
struct StepBoundsInput {
    first_step: f64,
    t0: f64,
    t_bound: f64,
    max_step: f64,
    error_norm: f64,
    h_abs: f64,
    rk23: bool,
    after_rejection: bool,
}

fuzz_target!(|input: StepBoundsInput| {
    let _ = validate_first_step(input.first_step, input.t0, input.t_bound);
    let _ = validate_max_step(input.max_step);

    if !input.t0.is_finite() || !input.h_abs.is_finite() || input.h_abs <= 0.0 {
        return;
    }
    let direction = if input.t_bound >= input.t0 { 1.0 } else { -1.0 };
    let min_step = min_step_at(input.t0, direction);
    assert!(min_step > 0.0);

    let kind = if input.rk23 {
        SolverKind::Rk23
    } else {
        SolverKind::Rk45
    };
    let controller = StepController::for_tableau(kind.tableau());
    let norm = input.error_norm.abs();
    let at_floor = input.h_abs <= min_step;
    match controller.decide(norm, input.h_abs, at_floor, input.after_rejection) {
        StepDecision::Accept { next_h_abs } | StepDecision::AcceptAtFloor { next_h_abs } => {
            assert!(!(next_h_abs < 0.0));
        }
        StepDecision::Reject { next_h_abs } => assert!(!(next_h_abs > input.h_abs)),
    }
});
