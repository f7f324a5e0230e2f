// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Shared test utilities.

use std::sync::Once;

pub mod builders;
pub mod mocks;

static TRACING: Once = Once::new();

/// Initializes tracing output for a test, once per process.
///
/// Honors `RUST_LOG`; defaults to warnings so duplicate-reference and
/// skipped-edge diagnostics show up under `--nocapture`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
