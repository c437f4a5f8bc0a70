//! Test utilities for NDF development.
//!
//! - [`FaultyStore`] wraps any [`ArrayStore`](ndf_core::ArrayStore) and
//!   makes a chosen operation fail after a number of successful calls.
//! - [`fixtures`] builds the buffers the scenario tests keep needing.
//! - [`init_tracing`] installs a log subscriber for test output.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod faulty;
pub mod fixtures;

pub use faulty::{FaultyStore, StoreOp};

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `warn`).
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
