//! # lut-tests
//!
//! Integration tests, fixtures and benches for oxlut.
//!
//! - `fixtures`: synthetic ICC profiles written to bytes or temp files
//! - `reference`: lcms2 and moxcms float transforms for parity checks
//! - `accuracy`: CIEDE2000 statistics and LUT code-value comparisons

use std::sync::Once;

pub mod accuracy;
pub mod fixtures;
pub mod reference;

pub use accuracy::{DeltaEStats, compare_xyz, delta_e_2000, max_code_diff};
pub use fixtures::ProfileBuilder;

/// Install a `tracing` subscriber filtered by `RUST_LOG`, once per process
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
