// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Crawl progress events.
//!
//! A broadcast hub fanning out [`CrawlEvent`]s to any number of
//! subscribers. Emission never blocks: events published with no receiver
//! are dropped, and slow receivers observe a lag instead of stalling the
//! crawl.

use tokio::sync::broadcast;

use crate::cache::CacheNode;
use crate::stats::CrawlStatistics;

/// Default capacity of the event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

// =============================================================================
// CrawlEvent
// =============================================================================

/// Events published while a crawl runs.
#[derive(Debug, Clone)]
pub enum CrawlEvent {
    /// A node's browse completed and its attributes are resolved.
    Browsed {
        /// Snapshot of the cache node at completion time.
        node: Box<CacheNode>,
    },

    /// The work queue drained; the crawl is complete.
    End {
        /// Final counters of the crawl.
        statistics: CrawlStatistics,
    },
}

// =============================================================================
// EventHub
// =============================================================================

/// Broadcast fan-out for crawl events.
#[derive(Debug)]
pub(crate) struct EventHub {
    sender: broadcast::Sender<CrawlEvent>,
}

impl EventHub {
    /// Creates a hub with the given channel capacity.
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to subsequent events.
    pub(crate) fn subscribe(&self) -> broadcast::Receiver<CrawlEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event; a missing receiver is not an error.
    pub(crate) fn emit(&self, event: CrawlEvent) {
        let _ = self.sender.send(event);
    }
}

// =============================================================================
// Tests
// =============================================================================
