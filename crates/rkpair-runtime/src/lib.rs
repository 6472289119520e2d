#![forbid(unsafe_code)]

//! rkpair runtime: operating mode, structured logging, and bounded
//! audit ledgers shared by the integrator crates.
//!
//! ## Module layout
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | `mode`      | [`RuntimeMode`] enum (Strict / Hardened)                  |
//! | `evidence`  | [`EvidenceLedger`], bounded FIFO of serializable records  |
//! | `log`       | [`TestLogEntry`] JSON lines and assertion helpers         |

pub mod evidence;
pub mod log;
pub mod mode;

// ── Re-exports: preserve the flat public API ────────────────────────
pub use evidence::EvidenceLedger;
pub use log::{
    TestLogEntry, TestLogLevel, TestResult, assert_close, assert_close_slice, now_unix_ms,
    within_tolerance,
};
pub use mode::RuntimeMode;
