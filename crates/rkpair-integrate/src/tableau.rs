#![forbid(unsafe_code)]

//! Butcher tableaux for the embedded explicit Runge-Kutta pairs.
//!
//! Each tableau is an immutable `'static` record shared by every solver
//! instance. The error weights `e` and the dense-output matrix `p` have one
//! more row than there are stages: the extra row weights the slope at the
//! end of the step, `f(t + h, y_new)`, which both pairs reuse as the first
//! stage of the next step (FSAL).

use serde::{Deserialize, Serialize};

/// Butcher tableau for an explicit embedded Runge-Kutta pair.
#[derive(Debug)]
pub struct ButcherTableau {
    /// Short method name used in logs.
    pub name: &'static str,
    /// A coefficients (lower-triangular, row `s` holds `a[s][0..s]`).
    pub a: &'static [&'static [f64]],
    /// B coefficients (weights of the propagated solution, length n_stages).
    pub b: &'static [f64],
    /// C coefficients (time increments, length n_stages).
    pub c: &'static [f64],
    /// E coefficients (error estimation, length n_stages + 1).
    pub e: &'static [f64],
    /// Dense-output coefficients, (n_stages + 1) rows × `interpolant_order` columns.
    pub p: &'static [&'static [f64]],
    /// Number of stages.
    pub n_stages: usize,
    /// Order of the main method.
    pub order: usize,
    /// Order of the error estimator.
    pub error_estimator_order: usize,
}

impl ButcherTableau {
    /// Degree of the dense-output polynomial.
    #[must_use]
    pub fn interpolant_order(&self) -> usize {
        self.p.first().map_or(0, |row| row.len())
    }

    /// Exponent applied to the error norm by the step-size controller.
    #[must_use]
    pub fn error_exponent(&self) -> f64 {
        -1.0 / (self.error_estimator_order as f64 + 1.0)
    }
}

// ═══════════════════════════════════════════════════════════════
// RK45: Dormand-Prince 5(4) Butcher tableau
// ═══════════════════════════════════════════════════════════════

static RK45_C: &[f64] = &[0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0];

static RK45_A0: &[f64] = &[];
static RK45_A1: &[f64] = &[1.0 / 5.0];
static RK45_A2: &[f64] = &[3.0 / 40.0, 9.0 / 40.0];
static RK45_A3: &[f64] = &[44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0];
static RK45_A4: &[f64] = &[
    19372.0 / 6561.0,
    -25360.0 / 2187.0,
    64448.0 / 6561.0,
    -212.0 / 729.0,
];
static RK45_A5: &[f64] = &[
    9017.0 / 3168.0,
    -355.0 / 33.0,
    46732.0 / 5247.0,
    49.0 / 176.0,
    -5103.0 / 18656.0,
];

static RK45_A: &[&[f64]] = &[RK45_A0, RK45_A1, RK45_A2, RK45_A3, RK45_A4, RK45_A5];

static RK45_B: &[f64] = &[
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
];

static RK45_E: &[f64] = &[
    -71.0 / 57600.0,
    0.0,
    71.0 / 16695.0,
    -71.0 / 1920.0,
    17253.0 / 339200.0,
    -22.0 / 525.0,
    1.0 / 40.0,
];

static RK45_P0: &[f64] = &[
    1.0,
    -8048581381.0 / 2820520608.0,
    8663915743.0 / 2820520608.0,
    -12715105075.0 / 11282082432.0,
];
static RK45_P1: &[f64] = &[0.0, 0.0, 0.0, 0.0];
static RK45_P2: &[f64] = &[
    0.0,
    131558114200.0 / 32700410799.0,
    -68118460800.0 / 10900136933.0,
    87487479700.0 / 32700410799.0,
];
static RK45_P3: &[f64] = &[
    0.0,
    -1754552775.0 / 470086768.0,
    14199869525.0 / 1410260304.0,
    -10690763975.0 / 1880347072.0,
];
static RK45_P4: &[f64] = &[
    0.0,
    127303824393.0 / 49829197408.0,
    -318862633887.0 / 49829197408.0,
    701980252875.0 / 199316789632.0,
];
static RK45_P5: &[f64] = &[
    0.0,
    -282668133.0 / 205662961.0,
    2019193451.0 / 616988883.0,
    -1453857185.0 / 822651844.0,
];
static RK45_P6: &[f64] = &[
    0.0,
    40617522.0 / 29380423.0,
    -110615467.0 / 29380423.0,
    69997945.0 / 29380423.0,
];

static RK45_P: &[&[f64]] = &[
    RK45_P0, RK45_P1, RK45_P2, RK45_P3, RK45_P4, RK45_P5, RK45_P6,
];

pub static RK45_TABLEAU: ButcherTableau = ButcherTableau {
    name: "RK45",
    a: RK45_A,
    b: RK45_B,
    c: RK45_C,
    e: RK45_E,
    p: RK45_P,
    n_stages: 6,
    order: 5,
    error_estimator_order: 4,
};

// ═══════════════════════════════════════════════════════════════
// RK23: Bogacki-Shampine 3(2) Butcher tableau
// ═══════════════════════════════════════════════════════════════

static RK23_C: &[f64] = &[0.0, 1.0 / 2.0, 3.0 / 4.0];

static RK23_A0: &[f64] = &[];
static RK23_A1: &[f64] = &[1.0 / 2.0];
static RK23_A2: &[f64] = &[0.0, 3.0 / 4.0];

static RK23_A: &[&[f64]] = &[RK23_A0, RK23_A1, RK23_A2];

static RK23_B: &[f64] = &[2.0 / 9.0, 1.0 / 3.0, 4.0 / 9.0];

static RK23_E: &[f64] = &[5.0 / 72.0, -1.0 / 12.0, -1.0 / 9.0, 1.0 / 8.0];

static RK23_P0: &[f64] = &[1.0, -4.0 / 3.0, 5.0 / 9.0];
static RK23_P1: &[f64] = &[0.0, 1.0, -2.0 / 3.0];
static RK23_P2: &[f64] = &[0.0, 4.0 / 3.0, -8.0 / 9.0];
static RK23_P3: &[f64] = &[0.0, -1.0, 1.0];

static RK23_P: &[&[f64]] = &[RK23_P0, RK23_P1, RK23_P2, RK23_P3];

pub static RK23_TABLEAU: ButcherTableau = ButcherTableau {
    name: "RK23",
    a: RK23_A,
    b: RK23_B,
    c: RK23_C,
    e: RK23_E,
    p: RK23_P,
    n_stages: 3,
    order: 3,
    error_estimator_order: 2,
};

/// Method selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverKind {
    /// Bogacki-Shampine 3(2).
    Rk23,
    /// Dormand-Prince 5(4).
    #[default]
    Rk45,
}

impl SolverKind {
    #[must_use]
    pub fn tableau(self) -> &'static ButcherTableau {
        match self {
            Self::Rk23 => &RK23_TABLEAU,
            Self::Rk45 => &RK45_TABLEAU,
        }
    }
}
