#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rkpair_integrate::{MIN_RTOL, ToleranceValue, validate_tol};
use rkpair_runtime::RuntimeMode;

#[derive(Debug, Arbitrary)]
struct ValidateTolInput {
    n: u8,
    hardened: bool,
    atol_vector: bool,
    rtol: f64,
    atol_values: Vec<f64>,
}

fuzz_target!(|input: ValidateTolInput| {
    let mode = if input.hardened {
        RuntimeMode::Hardened
    } else {
        RuntimeMode::Strict
    };
    let clipped = input.atol_values.iter().copied().take(8).collect::<Vec<_>>();
    let atol = if input.atol_vector {
        ToleranceValue::Vector(clipped)
    } else {
        ToleranceValue::Scalar(clipped.first().copied().unwrap_or(0.0))
    };
    if let Ok(validated) = validate_tol(input.rtol, atol, usize::from(input.n), mode) {
        assert!(validated.rtol >= MIN_RTOL);
    }
});
