#![forbid(unsafe_code)]

//! Continuous extension of accepted Runge-Kutta steps.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DenseOutputError {
    #[error("t = {t} lies outside the interpolation range [{t_min}, {t_max}]")]
    OutOfRange { t: f64, t_min: f64, t_max: f64 },
    #[error("no step has been accepted yet")]
    NoAcceptedStep,
    #[error("an ODE solution needs at least one interpolant")]
    EmptySolution,
}

/// Polynomial interpolant over one accepted step `[t_old, t]`.
///
/// `y(τ) = y_old + h * Q * [x, x^2, ..., x^m]` with `x = (τ - t_old) / h`
/// and `Q = Kᵀ P`, where `K` holds the stage derivatives of the step and
/// `P` is the tableau's dense-output matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct RkDenseOutput {
    t_old: f64,
    t: f64,
    h: f64,
    y_old: Vec<f64>,
    y: Vec<f64>,
    /// Row `i` holds the polynomial coefficients of component `i`.
    q: Vec<Vec<f64>>,
}

impl RkDenseOutput {
    /// Build the interpolant from the stage derivatives `k` (`n_stages + 1`
    /// rows) and the dense-output matrix `p` (same number of rows).
    #[must_use]
    pub fn new(
        t_old: f64,
        t: f64,
        y_old: Vec<f64>,
        y: Vec<f64>,
        k: &[Vec<f64>],
        p: &[&[f64]],
    ) -> Self {
        let n = y_old.len();
        let order = p.first().map_or(0, |row| row.len());
        let mut q = vec![vec![0.0; order]; n];
        for (ks, ps) in k.iter().zip(p) {
            for (qi, &kis) in q.iter_mut().zip(ks) {
                if kis == 0.0 {
                    continue;
                }
                for (qij, &psj) in qi.iter_mut().zip(ps.iter()) {
                    *qij += kis * psj;
                }
            }
        }
        Self {
            t_old,
            t,
            h: t - t_old,
            y_old,
            y,
            q,
        }
    }

    #[must_use]
    pub fn t_old(&self) -> f64 {
        self.t_old
    }

    #[must_use]
    pub fn t(&self) -> f64 {
        self.t
    }

    #[must_use]
    pub fn t_min(&self) -> f64 {
        self.t_old.min(self.t)
    }

    #[must_use]
    pub fn t_max(&self) -> f64 {
        self.t_old.max(self.t)
    }

    #[must_use]
    pub fn contains(&self, t: f64) -> bool {
        t >= self.t_min() && t <= self.t_max()
    }

    fn check(&self, t: f64) -> Result<f64, DenseOutputError> {
        if !self.contains(t) {
            return Err(DenseOutputError::OutOfRange {
                t,
                t_min: self.t_min(),
                t_max: self.t_max(),
            });
        }
        Ok((t - self.t_old) / self.h)
    }

    /// Evaluate the interpolant. The interval endpoints return the stored
    /// grid values exactly.
    pub fn call(&self, t: f64) -> Result<Vec<f64>, DenseOutputError> {
        let x = self.check(t)?;
        if t == self.t_old {
            return Ok(self.y_old.clone());
        }
        if t == self.t {
            return Ok(self.y.clone());
        }
        Ok(self
            .y_old
            .iter()
            .zip(&self.q)
            .map(|(y0, qi)| {
                let mut power = 1.0;
                let mut acc = 0.0;
                for &coeff in qi {
                    power *= x;
                    acc += coeff * power;
                }
                y0 + self.h * acc
            })
            .collect())
    }

    /// Time derivative of the interpolant.
    pub fn derivative(&self, t: f64) -> Result<Vec<f64>, DenseOutputError> {
        let x = self.check(t)?;
        Ok(self
            .q
            .iter()
            .map(|qi| {
                let mut power = 1.0;
                let mut acc = 0.0;
                for (j, &coeff) in qi.iter().enumerate() {
                    acc += coeff * (j as f64 + 1.0) * power;
                    power *= x;
                }
                acc
            })
            .collect())
    }
}

/// Piecewise interpolant assembled from consecutive accepted steps.
#[derive(Debug, Clone, PartialEq)]
pub struct OdeSolution {
    segments: Vec<RkDenseOutput>,
    ascending: bool,
}

impl OdeSolution {
    /// Segments must be given in integration order.
    pub fn new(segments: Vec<RkDenseOutput>) -> Result<Self, DenseOutputError> {
        let first = segments.first().ok_or(DenseOutputError::EmptySolution)?;
        let ascending = first.t() >= first.t_old();
        Ok(Self {
            segments,
            ascending,
        })
    }

    #[must_use]
    pub fn t_min(&self) -> f64 {
        self.segments
            .iter()
            .map(RkDenseOutput::t_min)
            .fold(f64::INFINITY, f64::min)
    }

    #[must_use]
    pub fn t_max(&self) -> f64 {
        self.segments
            .iter()
            .map(RkDenseOutput::t_max)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    #[must_use]
    pub fn n_segments(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn segments(&self) -> &[RkDenseOutput] {
        &self.segments
    }

    fn segment_for(&self, t: f64) -> Result<&RkDenseOutput, DenseOutputError> {
        let index = if self.ascending {
            self.segments.partition_point(|s| s.t_max() < t)
        } else {
            self.segments.partition_point(|s| s.t_min() > t)
        };
        self.segments
            .get(index)
            .filter(|s| s.contains(t))
            .ok_or(DenseOutputError::OutOfRange {
                t,
                t_min: self.t_min(),
                t_max: self.t_max(),
            })
    }

    pub fn call(&self, t: f64) -> Result<Vec<f64>, DenseOutputError> {
        self.segment_for(t)?.call(t)
    }

    pub fn derivative(&self, t: f64) -> Result<Vec<f64>, DenseOutputError> {
        self.segment_for(t)?.derivative(t)
    }
}
