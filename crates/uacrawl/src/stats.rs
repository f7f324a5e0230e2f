// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Crawl counters.

use std::time::{Duration, Instant};

// =============================================================================
// CrawlStatistics
// =============================================================================

/// Counters for one crawler instance.
///
/// `read_count` and `browse_count` count individual request items;
/// `transaction_count` counts server round-trips. The operational-limit
/// handshake is not included in either.
#[derive(Debug, Clone, Default)]
pub struct CrawlStatistics {
    /// Attribute read requests issued.
    pub read_count: u64,

    /// Browse requests issued.
    pub browse_count: u64,

    /// Server round-trips performed.
    pub transaction_count: u64,

    /// When the most recent crawl started.
    pub start_time: Option<Instant>,
}

impl CrawlStatistics {
    /// Creates zeroed statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the start of a crawl.
    pub(crate) fn mark_started(&mut self) {
        if self.start_time.is_none() {
            self.start_time = Some(Instant::now());
        }
    }

    /// Records one read round-trip of `items` requests.
    pub(crate) fn record_read_batch(&mut self, items: usize) {
        self.read_count += items as u64;
        self.transaction_count += 1;
    }

    /// Records one browse round-trip of `items` descriptions.
    pub(crate) fn record_browse_batch(&mut self, items: usize) {
        self.browse_count += items as u64;
        self.transaction_count += 1;
    }

    /// Time elapsed since the crawl started.
    pub fn elapsed(&self) -> Option<Duration> {
        self.start_time.map(|t| t.elapsed())
    }
}

// =============================================================================
// Tests
// =============================================================================
