#![forbid(unsafe_code)]

use rkpair_runtime::RuntimeMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const EPS: f64 = f64::EPSILON;
pub const MIN_RTOL: f64 = 100.0 * EPS;

/// Absolute tolerance, either shared by every component or given per component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToleranceValue {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl ToleranceValue {
    fn any(&self, mut predicate: impl FnMut(f64) -> bool) -> bool {
        match self {
            Self::Scalar(value) => predicate(*value),
            Self::Vector(values) => values.iter().copied().any(predicate),
        }
    }

    fn len_if_vector(&self) -> Option<usize> {
        match self {
            Self::Scalar(_) => None,
            Self::Vector(values) => Some(values.len()),
        }
    }

    /// Tolerance that applies to component `index`.
    ///
    /// Vector tolerances are validated against the system dimension before
    /// use, so indexing stays in bounds for validated values.
    #[must_use]
    pub fn component(&self, index: usize) -> f64 {
        match self {
            Self::Scalar(value) => *value,
            Self::Vector(values) => values[index],
        }
    }
}

impl Default for ToleranceValue {
    fn default() -> Self {
        Self::Scalar(1e-6)
    }
}

impl From<f64> for ToleranceValue {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<f64>> for ToleranceValue {
    fn from(values: Vec<f64>) -> Self {
        Self::Vector(values)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ToleranceWarning {
    RtolClamped { minimum: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTolerance {
    pub rtol: f64,
    pub atol: ToleranceValue,
    pub mode: RuntimeMode,
    pub warnings: Vec<ToleranceWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrateValidationError {
    #[error("`first_step` must be positive.")]
    FirstStepMustBePositive,
    #[error("`first_step` exceeds bounds.")]
    FirstStepExceedsBounds,
    #[error("`max_step` must be positive.")]
    MaxStepMustBePositive,
    #[error("`max_rejections` must be positive.")]
    MaxRejectionsMustBePositive,
    #[error("`rtol` must be positive.")]
    RtolMustBePositive,
    #[error("`atol` has wrong shape.")]
    AtolWrongShape { expected: usize, actual: usize },
    #[error("`atol` must be positive.")]
    AtolMustBePositive,
    #[error("`t0` and `t_bound` must differ.")]
    EmptySpan,
    #[error("`y0` must have at least one component.")]
    EmptyState,
    #[error("right-hand side returned {actual} components, expected {expected}.")]
    RhsDimensionMismatch { expected: usize, actual: usize },
    #[error("`{name}` must be finite.")]
    NonFiniteInput { name: &'static str },
    #[error("`t_eval` must lie within `t_span`.")]
    TEvalOutOfSpan,
    #[error("`t_eval` must be sorted in the direction of integration.")]
    TEvalNotSorted,
}

pub fn validate_first_step(
    first_step: f64,
    t0: f64,
    t_bound: f64,
) -> Result<f64, IntegrateValidationError> {
    if !(first_step > 0.0) {
        return Err(IntegrateValidationError::FirstStepMustBePositive);
    }
    if first_step > (t_bound - t0).abs() {
        return Err(IntegrateValidationError::FirstStepExceedsBounds);
    }
    Ok(first_step)
}

pub fn validate_max_step(max_step: f64) -> Result<f64, IntegrateValidationError> {
    if !(max_step > 0.0) {
        return Err(IntegrateValidationError::MaxStepMustBePositive);
    }
    Ok(max_step)
}

/// Check that the integration span is finite and non-degenerate.
///
/// Returns the integration direction (`1.0` forward, `-1.0` backward).
pub fn validate_span(t0: f64, t_bound: f64) -> Result<f64, IntegrateValidationError> {
    if !t0.is_finite() || !t_bound.is_finite() {
        return Err(IntegrateValidationError::NonFiniteInput { name: "t_span" });
    }
    if t0 == t_bound {
        return Err(IntegrateValidationError::EmptySpan);
    }
    Ok((t_bound - t0).signum())
}

pub fn validate_initial_state(
    y0: &[f64],
    mode: RuntimeMode,
) -> Result<usize, IntegrateValidationError> {
    if y0.is_empty() {
        return Err(IntegrateValidationError::EmptyState);
    }
    if mode.rejects_non_finite() && y0.iter().any(|v| !v.is_finite()) {
        return Err(IntegrateValidationError::NonFiniteInput { name: "y0" });
    }
    Ok(y0.len())
}

pub fn validate_tol(
    rtol: f64,
    atol: ToleranceValue,
    n: usize,
    mode: RuntimeMode,
) -> Result<ValidatedTolerance, IntegrateValidationError> {
    if mode.rejects_non_finite() {
        if !rtol.is_finite() {
            return Err(IntegrateValidationError::NonFiniteInput { name: "rtol" });
        }
        if atol.any(|x| !x.is_finite()) {
            return Err(IntegrateValidationError::NonFiniteInput { name: "atol" });
        }
    }

    if !(rtol > 0.0) {
        return Err(IntegrateValidationError::RtolMustBePositive);
    }

    let mut warnings = Vec::new();
    let rtol = if rtol < MIN_RTOL {
        warnings.push(ToleranceWarning::RtolClamped { minimum: MIN_RTOL });
        MIN_RTOL
    } else {
        rtol
    };

    if let Some(len) = atol.len_if_vector()
        && len != n
    {
        return Err(IntegrateValidationError::AtolWrongShape {
            expected: n,
            actual: len,
        });
    }

    if atol.any(|x| x < 0.0) {
        return Err(IntegrateValidationError::AtolMustBePositive);
    }

    Ok(ValidatedTolerance {
        rtol,
        atol,
        mode,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── validate_tol scalar tests ────────────────────────────────

    #[test]
    fn test_validation_tol_scalar_rtol_within_range_strict() {
        let report = validate_tol(1e-3, ToleranceValue::Scalar(1e-6), 3, RuntimeMode::Strict)
            .expect("valid tolerances");
        assert!(report.warnings.is_empty());
        assert_eq!(report.rtol, 1e-3);
    }

    #[test]
    fn test_validation_tol_scalar_rtol_within_range_hardened() {
        let report = validate_tol(1e-3, ToleranceValue::Scalar(1e-6), 3, RuntimeMode::Hardened)
            .expect("valid tolerances");
        assert!(report.warnings.is_empty());
        assert_eq!(report.mode, RuntimeMode::Hardened);
    }

    #[test]
    fn test_validation_tol_scalar_rtol_below_min_clamped() {
        let report = validate_tol(1e-30, ToleranceValue::Scalar(1e-8), 3, RuntimeMode::Strict)
            .expect("tolerance should validate");
        assert_eq!(
            report,
            ValidatedTolerance {
                rtol: MIN_RTOL,
                atol: ToleranceValue::Scalar(1e-8),
                mode: RuntimeMode::Strict,
                warnings: vec![ToleranceWarning::RtolClamped { minimum: MIN_RTOL }],
            }
        );
    }

    #[test]
    fn test_validation_tol_scalar_rtol_zero_rejected() {
        let err = validate_tol(0.0, ToleranceValue::Scalar(1e-6), 1, RuntimeMode::Strict)
            .expect_err("zero rtol is not a usable tolerance");
        assert_eq!(err, IntegrateValidationError::RtolMustBePositive);
    }

    #[test]
    fn test_validation_tol_scalar_negative_rtol_rejected() {
        let err = validate_tol(-1.0, ToleranceValue::Scalar(1e-6), 1, RuntimeMode::Strict)
            .expect_err("negative rtol must fail");
        assert_eq!(err, IntegrateValidationError::RtolMustBePositive);
    }

    #[test]
    fn test_validation_tol_nan_rtol_rejected_in_both_modes() {
        for mode in [RuntimeMode::Strict, RuntimeMode::Hardened] {
            assert!(validate_tol(f64::NAN, ToleranceValue::Scalar(1e-6), 1, mode).is_err());
        }
    }

    // ── validate_tol vector tests ────────────────────────────────

    #[test]
    fn test_validation_tol_vector_matching_dim() {
        let report = validate_tol(
            1e-3,
            ToleranceValue::Vector(vec![1e-6, 1e-7, 1e-8]),
            3,
            RuntimeMode::Strict,
        )
        .expect("matching vector atol should succeed");
        assert!(report.warnings.is_empty());
        assert_eq!(report.atol.component(2), 1e-8);
    }

    #[test]
    fn test_validation_tol_vector_wrong_dim() {
        let err = validate_tol(
            1e-6,
            ToleranceValue::Vector(vec![1e-9, 1e-9]),
            3,
            RuntimeMode::Strict,
        )
        .expect_err("wrong atol shape must fail");
        assert_eq!(
            err,
            IntegrateValidationError::AtolWrongShape {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_validation_tol_vector_negative_element() {
        let err = validate_tol(
            1e-6,
            ToleranceValue::Vector(vec![1e-9, -1e-9, 1e-9]),
            3,
            RuntimeMode::Hardened,
        )
        .expect_err("negative atol must fail");
        assert_eq!(err, IntegrateValidationError::AtolMustBePositive);
    }

    #[test]
    fn test_validation_tol_nan_atol_strict_passes() {
        // NaN is not < 0 so Strict lets it through.
        let report = validate_tol(1e-3, ToleranceValue::Scalar(f64::NAN), 1, RuntimeMode::Strict);
        assert!(report.is_ok());
    }

    #[test]
    fn test_validation_tol_nan_atol_hardened_rejected() {
        let err = validate_tol(
            1e-3,
            ToleranceValue::Scalar(f64::NAN),
            1,
            RuntimeMode::Hardened,
        )
        .expect_err("hardened mode rejects non-finite atol");
        assert_eq!(err, IntegrateValidationError::NonFiniteInput { name: "atol" });
    }

    #[test]
    fn test_validation_tol_inf_atol_strict() {
        let report = validate_tol(
            1e-3,
            ToleranceValue::Scalar(f64::INFINITY),
            1,
            RuntimeMode::Strict,
        );
        assert!(report.is_ok());
    }

    #[test]
    fn test_validation_tol_vector_zero_element() {
        let report = validate_tol(
            1e-3,
            ToleranceValue::Vector(vec![0.0, 1e-6]),
            2,
            RuntimeMode::Strict,
        )
        .expect("zero atol element should be valid");
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_validation_tol_extreme_large() {
        let report = validate_tol(1e300, ToleranceValue::Scalar(1e300), 1, RuntimeMode::Strict)
            .expect("extreme large should be valid");
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_validation_tol_deserializes_scalar_and_vector() {
        let scalar: ToleranceValue = serde_json::from_str("1e-6").expect("scalar atol");
        assert_eq!(scalar, ToleranceValue::Scalar(1e-6));
        let vector: ToleranceValue = serde_json::from_str("[1e-6, 1e-8]").expect("vector atol");
        assert_eq!(vector, ToleranceValue::Vector(vec![1e-6, 1e-8]));
    }

    // ── validate_first_step tests ────────────────────────────────

    #[test]
    fn test_validation_first_step_positive_within_bounds() {
        assert_eq!(validate_first_step(0.5, 0.0, 1.0).unwrap(), 0.5);
    }

    #[test]
    fn test_validation_first_step_zero() {
        let err = validate_first_step(0.0, 0.0, 1.0).expect_err("must reject zero");
        assert_eq!(err, IntegrateValidationError::FirstStepMustBePositive);
    }

    #[test]
    fn test_validation_first_step_nan() {
        let err = validate_first_step(f64::NAN, 0.0, 1.0).expect_err("must reject NaN");
        assert_eq!(err, IntegrateValidationError::FirstStepMustBePositive);
    }

    #[test]
    fn test_validation_first_step_exceeds_bounds() {
        let err = validate_first_step(2.0, 0.0, 1.0).expect_err("must reject out-of-bounds step");
        assert_eq!(err, IntegrateValidationError::FirstStepExceedsBounds);
    }

    #[test]
    fn test_validation_first_step_exact_boundary() {
        assert_eq!(validate_first_step(1.0, 0.0, 1.0).unwrap(), 1.0);
    }

    #[test]
    fn test_validation_first_step_backward() {
        assert_eq!(validate_first_step(0.5, 1.0, 0.0).unwrap(), 0.5);
    }

    // ── validate_max_step tests ──────────────────────────────────

    #[test]
    fn test_validation_max_step_positive() {
        assert_eq!(validate_max_step(1.0).unwrap(), 1.0);
    }

    #[test]
    fn test_validation_max_step_zero() {
        let err = validate_max_step(0.0).expect_err("must reject zero");
        assert_eq!(err, IntegrateValidationError::MaxStepMustBePositive);
    }

    #[test]
    fn test_validation_max_step_negative() {
        let err = validate_max_step(-1.0).expect_err("must reject negative max step");
        assert_eq!(err, IntegrateValidationError::MaxStepMustBePositive);
    }

    #[test]
    fn test_validation_max_step_infinity() {
        assert_eq!(validate_max_step(f64::INFINITY).unwrap(), f64::INFINITY);
    }

    // ── span and state ───────────────────────────────────────────

    #[test]
    fn test_validation_span_direction() {
        assert_eq!(validate_span(0.0, 10.0).unwrap(), 1.0);
        assert_eq!(validate_span(10.0, -1.0).unwrap(), -1.0);
    }

    #[test]
    fn test_validation_span_empty() {
        assert_eq!(
            validate_span(2.0, 2.0).expect_err("t0 == t_bound"),
            IntegrateValidationError::EmptySpan
        );
    }

    #[test]
    fn test_validation_span_non_finite() {
        let err = validate_span(0.0, f64::INFINITY).expect_err("unreachable bound");
        assert_eq!(err, IntegrateValidationError::NonFiniteInput { name: "t_span" });
        assert!(validate_span(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_validation_initial_state_empty() {
        let err = validate_initial_state(&[], RuntimeMode::Strict).expect_err("n >= 1");
        assert_eq!(err, IntegrateValidationError::EmptyState);
    }

    #[test]
    fn test_validation_initial_state_non_finite_by_mode() {
        assert_eq!(
            validate_initial_state(&[1.0, f64::NAN], RuntimeMode::Strict).unwrap(),
            2
        );
        let err = validate_initial_state(&[1.0, f64::NAN], RuntimeMode::Hardened)
            .expect_err("hardened rejects NaN state");
        assert_eq!(err, IntegrateValidationError::NonFiniteInput { name: "y0" });
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(
            IntegrateValidationError::AtolWrongShape {
                expected: 3,
                actual: 2
            }
            .to_string(),
            "`atol` has wrong shape."
        );
        assert_eq!(
            IntegrateValidationError::RhsDimensionMismatch {
                expected: 2,
                actual: 1
            }
            .to_string(),
            "right-hand side returned 1 components, expected 2."
        );
    }
}
