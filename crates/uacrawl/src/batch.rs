// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Deferred-operation batchers.
//!
//! Browse and read requests are not sent when they are made. They land in
//! one of two append-only buffers which the scheduler drains after every
//! task, so work deferred while a server response is being processed joins
//! the next batch instead of forcing its own round-trip.
//!
//! The read batcher additionally memoizes results by `(node, attribute)`:
//! for any pair, at most one read is ever issued. Requesters arriving while
//! the read is in flight join its waiter list; requesters arriving after
//! resolution are answered from the cache immediately.

use std::collections::{HashMap, VecDeque};

use crate::cache::AttributeValue;
use crate::types::{AttributeId, NodeId};

/// Interning key of a cache node (canonical node-id string).
pub(crate) type NodeKey = String;

/// Memoization key of one attribute read.
pub(crate) type ReadKey = (NodeKey, AttributeId);

// =============================================================================
// ReadBatcher
// =============================================================================

/// Outcome of deferring a read.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Deferred {
    /// The attribute already resolved; apply the value now.
    Resolved(AttributeValue),

    /// A new read was queued for the next batch.
    Queued,

    /// Joined a read already in flight.
    Joined,
}

enum MemoEntry {
    /// Read issued (or queued); groups waiting on completion.
    InFlight(Vec<NodeKey>),

    /// Result available.
    Resolved(AttributeValue),
}

/// Accumulates and memoizes attribute reads.
#[derive(Default)]
pub(crate) struct ReadBatcher {
    memo: HashMap<ReadKey, MemoEntry>,
    pending: VecDeque<ReadKey>,
}

impl ReadBatcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Defers a read of `(node, attribute)` on behalf of `group`.
    ///
    /// `group` is the completion group (the node whose browse continuation
    /// is waiting); it is recorded as a waiter unless the value is already
    /// available.
    pub(crate) fn defer(
        &mut self,
        node: &NodeKey,
        attribute: AttributeId,
        group: &NodeKey,
    ) -> Deferred {
        let key = (node.clone(), attribute);
        match self.memo.get_mut(&key) {
            Some(MemoEntry::Resolved(value)) => Deferred::Resolved(value.clone()),
            Some(MemoEntry::InFlight(waiters)) => {
                waiters.push(group.clone());
                Deferred::Joined
            }
            None => {
                self.memo
                    .insert(key.clone(), MemoEntry::InFlight(vec![group.clone()]));
                self.pending.push_back(key);
                Deferred::Queued
            }
        }
    }

    /// Seeds a resolved entry without issuing a read.
    ///
    /// Used for the per-reference hints a browse response delivers for
    /// free. Existing entries are kept.
    pub(crate) fn prefill(&mut self, node: &NodeKey, attribute: AttributeId, value: AttributeValue) {
        self.memo
            .entry((node.clone(), attribute))
            .or_insert(MemoEntry::Resolved(value));
    }

    /// Returns `true` if reads are waiting for a flush.
    pub(crate) fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Takes up to `max` pending reads, oldest first.
    pub(crate) fn take_batch(&mut self, max: usize) -> Vec<ReadKey> {
        let count = self.pending.len().min(max);
        self.pending.drain(..count).collect()
    }

    /// Discards queued reads and in-flight waiters, keeping resolved
    /// results. Used when a crawl aborts mid-batch.
    pub(crate) fn clear_in_flight(&mut self) {
        self.pending.clear();
        self.memo
            .retain(|_, entry| matches!(entry, MemoEntry::Resolved(_)));
    }

    /// Stores the result for a key and drains its waiter groups.
    pub(crate) fn resolve(
        &mut self,
        node: &NodeKey,
        attribute: AttributeId,
        value: AttributeValue,
    ) -> Vec<NodeKey> {
        let key = (node.clone(), attribute);
        match self.memo.insert(key, MemoEntry::Resolved(value)) {
            Some(MemoEntry::InFlight(waiters)) => waiters,
            _ => Vec::new(),
        }
    }
}

// =============================================================================
// BrowseBatcher
// =============================================================================

/// Accumulates deferred forward browses.
///
/// Each entry carries the reference type to follow (the traversal driver
/// supplies the root `References` type). Dedup is the driver's job (the
/// visited set guarantees one browse per node); this buffer only coalesces
/// and bounds the batches.
#[derive(Default)]
pub(crate) struct BrowseBatcher {
    pending: VecDeque<(NodeKey, NodeId)>,
}

impl BrowseBatcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Defers a browse of `node` following `reference_type_id`.
    pub(crate) fn defer(&mut self, node: NodeKey, reference_type_id: NodeId) {
        self.pending.push_back((node, reference_type_id));
    }

    /// Returns `true` if browses are waiting for a flush.
    pub(crate) fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Takes up to `max` pending browses, oldest first.
    pub(crate) fn take_batch(&mut self, max: usize) -> Vec<(NodeKey, NodeId)> {
        let count = self.pending.len().min(max);
        self.pending.drain(..count).collect()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Variant;

    fn key(n: u32) -> NodeKey {
        format!("i={}", n)
    }

    #[test]
    fn defer_queues_once_and_joins_after() {
        let mut batcher = ReadBatcher::new();

        let first = batcher.defer(&key(1), AttributeId::BrowseName, &key(1));
        assert_eq!(first, Deferred::Queued);

        let second = batcher.defer(&key(1), AttributeId::BrowseName, &key(9));
        assert_eq!(second, Deferred::Joined);

        // Only one read was queued for the pair.
        assert_eq!(batcher.take_batch(10).len(), 1);

        // Both groups are notified on resolution.
        let waiters = batcher.resolve(
            &key(1),
            AttributeId::BrowseName,
            AttributeValue::Value(Variant::String("X".into())),
        );
        assert_eq!(waiters, vec![key(1), key(9)]);
    }

    #[test]
    fn defer_after_resolution_answers_from_cache() {
        let mut batcher = ReadBatcher::new();
        batcher.defer(&key(1), AttributeId::Value, &key(1));
        batcher.take_batch(10);
        batcher.resolve(
            &key(1),
            AttributeId::Value,
            AttributeValue::Value(Variant::Int32(5)),
        );

        match batcher.defer(&key(1), AttributeId::Value, &key(2)) {
            Deferred::Resolved(AttributeValue::Value(Variant::Int32(5))) => {}
            other => panic!("expected resolved value, got {:?}", other),
        }
        assert!(!batcher.has_pending());
    }

    #[test]
    fn prefill_short_circuits_the_read() {
        let mut batcher = ReadBatcher::new();
        batcher.prefill(
            &key(3),
            AttributeId::DisplayName,
            AttributeValue::Value(Variant::LocalizedText("Motor".into())),
        );

        let outcome = batcher.defer(&key(3), AttributeId::DisplayName, &key(3));
        assert!(matches!(outcome, Deferred::Resolved(_)));
        assert!(!batcher.has_pending());
    }

    #[test]
    fn prefill_keeps_existing_entries() {
        let mut batcher = ReadBatcher::new();
        batcher.prefill(
            &key(3),
            AttributeId::DisplayName,
            AttributeValue::Value(Variant::LocalizedText("First".into())),
        );
        batcher.prefill(
            &key(3),
            AttributeId::DisplayName,
            AttributeValue::Value(Variant::LocalizedText("Second".into())),
        );

        match batcher.defer(&key(3), AttributeId::DisplayName, &key(3)) {
            Deferred::Resolved(AttributeValue::Value(Variant::LocalizedText(text))) => {
                assert_eq!(text, "First");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn take_batch_is_bounded_and_fifo() {
        let mut batcher = ReadBatcher::new();
        for i in 0..5 {
            batcher.defer(&key(i), AttributeId::Value, &key(i));
        }

        let batch = batcher.take_batch(3);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0].0, key(0));
        assert_eq!(batch[2].0, key(2));

        let rest = batcher.take_batch(3);
        assert_eq!(rest.len(), 2);
        assert!(!batcher.has_pending());
    }

    #[test]
    fn browse_batcher_bounds_batches() {
        let references = NodeId::numeric(0, 31);
        let mut batcher = BrowseBatcher::new();
        for i in 0..4 {
            batcher.defer(key(i), references.clone());
        }
        assert_eq!(batcher.take_batch(2).len(), 2);

        let rest = batcher.take_batch(10);
        assert_eq!(rest[0].0, key(2));
        assert_eq!(rest[1].0, key(3));
        assert!(!batcher.has_pending());
    }
}
