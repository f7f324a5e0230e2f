// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session abstraction consumed by the crawler.
//!
//! The crawler never talks to a server directly; it issues batched browse
//! and read requests through this trait. Implementations wrap an
//! authenticated OPC UA client session; tests use an in-memory mock.

use async_trait::async_trait;

use crate::error::CrawlResult;
use crate::types::{
    BrowseDescription, BrowseResponse, DataValue, OperationalLimits, ReadValueId,
};

// =============================================================================
// CrawlSession
// =============================================================================

/// Batched browse/read operations of an authenticated session.
///
/// # Contract
///
/// - `browse` and `read` return exactly one result per request item, in
///   request order. The crawler treats a count mismatch as a protocol
///   error.
/// - Batch sizes respect the server's operational limits; the crawler
///   never passes more items than [`operational_limits`] advertised (after
///   the 500-item fallback for unadvertised limits).
/// - Errors returned here abort the crawl; per-item failures belong in the
///   per-item status codes instead.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync`; the crawler itself drives all
/// calls from a single consumer, one transaction at a time.
///
/// [`operational_limits`]: CrawlSession::operational_limits
#[async_trait]
pub trait CrawlSession: Send + Sync {
    /// Browses a batch of nodes in a single transaction.
    async fn browse(&self, nodes: &[BrowseDescription]) -> CrawlResult<Vec<BrowseResponse>>;

    /// Reads a batch of (node, attribute) pairs in a single transaction.
    async fn read(&self, nodes: &[ReadValueId]) -> CrawlResult<Vec<DataValue>>;

    /// Returns the server-advertised operational limits.
    ///
    /// Real sessions read the server-capability nodes
    /// [`ids::MAX_NODES_PER_READ`](crate::ids::MAX_NODES_PER_READ) and
    /// [`ids::MAX_NODES_PER_BROWSE`](crate::ids::MAX_NODES_PER_BROWSE).
    /// Called once per crawler before the first transaction. A limit of 0
    /// (or an error from this call) makes the crawler fall back to
    /// [`DEFAULT_OPERATION_LIMIT`](crate::types::DEFAULT_OPERATION_LIMIT)
    /// for that operation.
    async fn operational_limits(&self) -> CrawlResult<OperationalLimits>;
}
