#![forbid(unsafe_code)]

//! Runtime mode definitions for Strict and Hardened operation.

use serde::{Deserialize, Serialize};

/// Operational mode governing how much input checking the integrators do.
///
/// - **Strict**: validate exactly the documented configuration contract
///   (tolerance signs, step bounds, span, dimensions) and nothing more.
/// - **Hardened**: additionally reject non-finite times, initial states and
///   tolerances before any right-hand-side evaluation happens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuntimeMode {
    #[default]
    Strict,
    Hardened,
}

impl RuntimeMode {
    /// Whether non-finite configuration values must be rejected up front.
    #[must_use]
    pub const fn rejects_non_finite(self) -> bool {
        matches!(self, Self::Hardened)
    }
}
