// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # uacrawl Integration Tests
//!
//! Shared test utilities and integration suites for the address-space
//! crawler.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `mocks`: In-memory mock session with interaction recording
//!   - `builders`: Fluent address-space fixture construction
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all integration tests
//! cargo test -p uacrawl-tests
//!
//! # Run a specific suite
//! cargo test -p uacrawl-tests --test integration_crawl
//! cargo test -p uacrawl-tests --test integration_batching
//! cargo test -p uacrawl-tests --test integration_finalize
//! ```
//!
//! ## Writing New Tests
//!
//! ```rust,ignore
//! use uacrawl_tests::prelude::*;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let session = AddressSpaceBuilder::new()
//!         .object("i=85", "Objects")
//!         .variable("ns=2;i=1", "Temperature", Variant::Double(21.5))
//!         .organizes("i=85", "ns=2;i=1")
//!         .build();
//!     // ... drive a NodeCrawler against `session`
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod common;

/// Re-export commonly used items for convenience.
pub mod prelude {
    pub use crate::common::builders::*;
    pub use crate::common::init_tracing;
    pub use crate::common::mocks::*;
}
