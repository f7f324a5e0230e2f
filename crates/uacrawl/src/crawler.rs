// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The crawl pipeline.
//!
//! [`NodeCrawler`] walks the transitive closure of references reachable
//! from a starting node, collecting attributes into a [`NodeCache`]. It
//! sits between a pure graph traversal and a latency-bound server:
//! instead of issuing one request per node, every browse and read is
//! deferred into a batcher, and a single-consumer task queue alternates
//! between browsing new nodes, processing responses and flushing the
//! accumulated batches until the pipeline drains.
//!
//! # Pipeline
//!
//! ```text
//! crawl(root) ─► [Crawl n] ... ─► FlushBrowse ─► session.browse(batch)
//!                   ▲                                    │
//!                   │ push (new targets)                 ▼ unshift
//!             [Complete n] ◄─ FlushReads ◄─ [ProcessBrowse responses]
//! ```
//!
//! Browse flushes are queued at the tail so sibling crawl tasks coalesce
//! into one batch; read flushes and response processing are queued at the
//! head so a response is fully absorbed (and its attribute reads issued)
//! before the next wave of browsing starts.

use std::collections::{HashMap, HashSet};

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::batch::{BrowseBatcher, Deferred, NodeKey, ReadBatcher};
use crate::cache::{AttributeValue, CacheNode, NodeCache, VariableSlot};
use crate::config::CrawlerConfig;
use crate::error::{CrawlResult, ProtocolError, StateError};
use crate::events::{CrawlEvent, EventHub};
use crate::ids;
use crate::scheduler::TaskQueue;
use crate::session::CrawlSession;
use crate::stats::CrawlStatistics;
use crate::types::{
    AttributeId, BrowseDescription, BrowseResponse, NodeClass, NodeId, OperationalLimits,
    QualifiedName, ReadValueId, ReferenceDescription, Variant,
};

// =============================================================================
// CrawlVisitor
// =============================================================================

/// User hooks invoked while the crawl runs.
///
/// The default implementations reproduce the stock traversal: follow every
/// reference of every browsed node. Implementations can prune the walk via
/// [`follow_reference`](CrawlVisitor::follow_reference) or observe edges
/// into already-known nodes via
/// [`on_extra_reference`](CrawlVisitor::on_extra_reference).
pub trait CrawlVisitor: Send {
    /// Called once per node after its references and attributes are known.
    fn on_browsed(&mut self, node: &CacheNode) {
        let _ = node;
    }

    /// Decides whether a reference of a browsed node is followed.
    fn follow_reference(&mut self, node: &CacheNode, reference: &ReferenceDescription) -> bool {
        let _ = (node, reference);
        true
    }

    /// Called when a followed reference points at a node that is already
    /// in the cache; the edge is recorded without re-crawling the target.
    fn on_extra_reference(
        &mut self,
        parent: &CacheNode,
        reference: &ReferenceDescription,
        target: &CacheNode,
    ) {
        let _ = (parent, reference, target);
    }
}

/// Stock traversal: follow everything, observe nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultVisitor;

impl CrawlVisitor for DefaultVisitor {}

// =============================================================================
// Task
// =============================================================================

/// Work items of the single-consumer queue.
#[derive(Debug)]
enum Task {
    /// Visit a node: mark it visited and defer its browse.
    Crawl(NodeKey),

    /// Splice up to the browse bound and perform one browse round-trip.
    FlushBrowse,

    /// Splice up to the read bound and perform one read round-trip.
    FlushReads,

    /// Absorb a batch of browse responses.
    ProcessBrowse(Vec<(NodeKey, BrowseResponse)>),

    /// All attribute reads for a node finished; emit and recurse.
    Complete(NodeKey),

    /// A followed reference hit an already-known target.
    ExtraReference {
        parent: NodeKey,
        reference: ReferenceDescription,
    },
}

// =============================================================================
// NodeCrawler
// =============================================================================

/// Address-space crawler over a [`CrawlSession`].
///
/// # Examples
///
/// ```rust,ignore
/// use uacrawl::{NodeCrawler, types::NodeId};
///
/// let mut crawler = NodeCrawler::new(session);
/// let tree = crawler.read_tree(&NodeId::numeric(0, 85)).await?;
/// println!("{}", serde_json::to_string_pretty(&tree)?);
/// ```
pub struct NodeCrawler<S: CrawlSession> {
    session: S,
    config: CrawlerConfig,
    cache: NodeCache,
    read_batcher: ReadBatcher,
    browse_batcher: BrowseBatcher,
    queue: TaskQueue<Task>,

    /// Nodes whose browse request has been issued.
    visited: HashSet<NodeKey>,

    /// Nodes for which a crawl task has been scheduled.
    crawled: HashSet<NodeKey>,

    /// Per-node count of attribute reads still in flight.
    outstanding_reads: HashMap<NodeKey, usize>,

    /// Keys of the seeded standard reference types.
    prepopulated: HashSet<NodeKey>,

    limits: Option<OperationalLimits>,
    stats: CrawlStatistics,
    events: EventHub,
}

impl<S: CrawlSession> NodeCrawler<S> {
    /// Creates a crawler with default configuration.
    pub fn new(session: S) -> Self {
        Self::with_config(session, CrawlerConfig::default())
    }

    /// Creates a crawler with the given configuration.
    pub fn with_config(session: S, config: CrawlerConfig) -> Self {
        let mut cache = NodeCache::new();
        let mut prepopulated = HashSet::new();

        // Seed the standard reference types so common edges never cost a
        // browse or a read.
        for (node_id, browse_name) in ids::PREPOPULATED_REFERENCE_TYPES {
            cache.create_prepopulated(&node_id, browse_name);
            prepopulated.insert(node_id.to_canonical_string());
        }

        let events = EventHub::new(config.event_capacity);

        Self {
            session,
            config,
            cache,
            read_batcher: ReadBatcher::new(),
            browse_batcher: BrowseBatcher::new(),
            queue: TaskQueue::new(),
            visited: HashSet::new(),
            crawled: HashSet::new(),
            outstanding_reads: HashMap::new(),
            prepopulated,
            limits: None,
            stats: CrawlStatistics::new(),
            events,
        }
    }

    /// The node cache collected so far.
    pub fn cache(&self) -> &NodeCache {
        &self.cache
    }

    /// The crawl counters.
    pub fn statistics(&self) -> &CrawlStatistics {
        &self.stats
    }

    /// Subscribes to [`CrawlEvent`]s.
    pub fn subscribe(&self) -> broadcast::Receiver<CrawlEvent> {
        self.events.subscribe()
    }

    /// The effective batch bounds, once negotiated.
    pub fn operational_limits(&self) -> Option<OperationalLimits> {
        self.limits
    }

    // =========================================================================
    // Public operations
    // =========================================================================

    /// Crawls the address space reachable from `start`.
    ///
    /// Drives the pipeline to quiescence, invoking the visitor once per
    /// browsed node. On a transport error the crawl stops; everything
    /// already collected stays in the cache.
    pub async fn crawl<V: CrawlVisitor>(
        &mut self,
        start: &NodeId,
        visitor: &mut V,
    ) -> CrawlResult<()> {
        self.ensure_limits().await;
        self.stats.mark_started();

        // The visited/crawled sets live for one crawl; the seeded
        // reference types count as both so they are never rebrowsed.
        self.visited = self.prepopulated.clone();
        self.crawled = self.prepopulated.clone();

        let root_key = start.to_canonical_string();
        self.cache.get_or_create(start);
        self.schedule_crawl(root_key);

        let outcome = self.drain(visitor).await;

        self.visited.clear();
        self.crawled.clear();

        match outcome {
            Ok(()) => {
                self.events.emit(CrawlEvent::End {
                    statistics: self.stats.clone(),
                });
                Ok(())
            }
            Err(err) => {
                err.log("crawl aborted");
                self.abandon_in_flight();
                Err(err)
            }
        }
    }

    /// Crawls from `start` and returns the denormalized object tree.
    pub async fn read_tree(&mut self, start: &NodeId) -> CrawlResult<serde_json::Value> {
        let mut visitor = DefaultVisitor;
        self.crawl(start, &mut visitor).await?;
        self.finalize(start)
    }

    /// Builds the denormalized tree for an already-crawled node.
    pub fn finalize(&self, start: &NodeId) -> CrawlResult<serde_json::Value> {
        crate::finalize::build_tree(&self.cache, start)
    }

    // =========================================================================
    // Scheduling
    // =========================================================================

    /// Resolves the effective batch bounds once per crawler.
    async fn ensure_limits(&mut self) {
        if self.limits.is_some() {
            return;
        }
        let advertised = match self.session.operational_limits().await {
            Ok(limits) => limits,
            Err(err) => {
                warn!(error = %err, "operational limits unavailable, using defaults");
                OperationalLimits::default()
            }
        };
        let effective = self.config.effective_limits(advertised);
        debug!(
            max_nodes_per_read = effective.max_nodes_per_read,
            max_nodes_per_browse = effective.max_nodes_per_browse,
            "operational limits resolved"
        );
        self.limits = Some(effective);
    }

    fn effective_limits(&self) -> OperationalLimits {
        // ensure_limits runs before the first task.
        self.limits.unwrap_or_default().sanitized()
    }

    /// Schedules a crawl task for a node, once.
    fn schedule_crawl(&mut self, key: NodeKey) {
        if self.crawled.insert(key.clone()) {
            self.queue.push(Task::Crawl(key));
        }
    }

    /// Runs tasks until the queue and both batchers are empty.
    async fn drain(&mut self, visitor: &mut dyn CrawlVisitor) -> CrawlResult<()> {
        while let Some(task) = self.queue.pop() {
            self.run_task(task, visitor).await?;

            // Post-task flushes turn individually deferred operations into
            // batched round-trips. Browse flushes go to the tail so queued
            // sibling crawls join the batch; read flushes go to the head so
            // attribute reads land before the next crawl task.
            if self.browse_batcher.has_pending() && self.queue.try_mark_browse_flush() {
                self.queue.push(Task::FlushBrowse);
            }
            if self.read_batcher.has_pending() && self.queue.try_mark_read_flush() {
                self.queue.unshift(Task::FlushReads);
            }
        }
        Ok(())
    }

    async fn run_task(&mut self, task: Task, visitor: &mut dyn CrawlVisitor) -> CrawlResult<()> {
        match task {
            Task::Crawl(key) => self.task_crawl(key),
            Task::FlushBrowse => self.task_flush_browse().await,
            Task::FlushReads => self.task_flush_reads().await,
            Task::ProcessBrowse(work) => {
                for (key, response) in work {
                    self.process_browse_response(key, response)?;
                }
                Ok(())
            }
            Task::Complete(key) => self.task_complete(key, visitor),
            Task::ExtraReference { parent, reference } => {
                self.task_extra_reference(parent, reference, visitor)
            }
        }
    }

    // =========================================================================
    // Task bodies
    // =========================================================================

    /// Visits a node: marks it visited and defers its browse.
    fn task_crawl(&mut self, key: NodeKey) -> CrawlResult<()> {
        if !self.visited.insert(key.clone()) {
            return Ok(());
        }

        let node = self
            .cache
            .get_by_key(&key)
            .ok_or_else(|| StateError::node_missing(&key))?;

        if node.is_browsed() {
            // Browsed by an earlier crawl; re-enter the completion path
            // from cache without touching the server.
            self.queue.unshift(Task::Complete(key));
            return Ok(());
        }

        self.browse_batcher.defer(key, ids::REFERENCES);
        Ok(())
    }

    /// Performs one bounded browse round-trip.
    async fn task_flush_browse(&mut self) -> CrawlResult<()> {
        self.queue.clear_browse_flush();

        let limit = self.effective_limits().max_nodes_per_browse as usize;
        let batch = self.browse_batcher.take_batch(limit);
        if batch.is_empty() {
            return Ok(());
        }

        let mut descriptions = Vec::with_capacity(batch.len());
        for (key, reference_type_id) in &batch {
            let node = self
                .cache
                .get_by_key(key)
                .ok_or_else(|| StateError::node_missing(key))?;
            descriptions.push(BrowseDescription::forward(
                node.node_id().clone(),
                reference_type_id.clone(),
            ));
        }

        debug!(count = descriptions.len(), "browse batch");
        let results = self.session.browse(&descriptions).await?;
        self.stats.record_browse_batch(descriptions.len());

        if results.len() != descriptions.len() {
            return Err(
                ProtocolError::count_mismatch("browse", descriptions.len(), results.len()).into(),
            );
        }

        let work: Vec<(NodeKey, BrowseResponse)> = batch
            .into_iter()
            .map(|(key, _)| key)
            .zip(results)
            .collect();
        self.queue.unshift(Task::ProcessBrowse(work));
        Ok(())
    }

    /// Performs one bounded read round-trip and distributes the results.
    async fn task_flush_reads(&mut self) -> CrawlResult<()> {
        self.queue.clear_read_flush();

        let limit = self.effective_limits().max_nodes_per_read as usize;
        let batch = self.read_batcher.take_batch(limit);
        if batch.is_empty() {
            return Ok(());
        }

        let mut requests = Vec::with_capacity(batch.len());
        for (key, attribute) in &batch {
            let node = self
                .cache
                .get_by_key(key)
                .ok_or_else(|| StateError::node_missing(key))?;
            requests.push(ReadValueId {
                node_id: node.node_id().clone(),
                attribute_id: *attribute,
            });
        }

        debug!(count = requests.len(), "read batch");
        let results = self.session.read(&requests).await?;
        self.stats.record_read_batch(requests.len());

        if results.len() != requests.len() {
            return Err(
                ProtocolError::count_mismatch("read", requests.len(), results.len()).into(),
            );
        }

        for ((key, attribute), data_value) in batch.into_iter().zip(results) {
            let value = AttributeValue::from_data_value(&data_value);
            let waiters = self.read_batcher.resolve(&key, attribute, value.clone());

            // Applying NodeClass may reveal a Variable and queue its five
            // attribute reads into the same completion group.
            let mut expansion = 0;
            self.apply_attribute(&key, attribute, &value, &mut expansion);
            if expansion > 0 {
                *self.outstanding_reads.entry(key.clone()).or_insert(0) += expansion;
            }

            for group in waiters {
                self.complete_one_read(&group);
            }
        }
        Ok(())
    }

    /// Emits the `browsed` event for a finished node and follows its
    /// references.
    fn task_complete(&mut self, key: NodeKey, visitor: &mut dyn CrawlVisitor) -> CrawlResult<()> {
        let node = self
            .cache
            .get_by_key(&key)
            .ok_or_else(|| StateError::node_missing(&key))?
            .clone();

        self.events.emit(CrawlEvent::Browsed {
            node: Box::new(node.clone()),
        });
        visitor.on_browsed(&node);

        let references: Vec<ReferenceDescription> =
            node.references().unwrap_or_default().to_vec();
        for reference in references {
            if !reference.is_forward {
                continue;
            }
            if !visitor.follow_reference(&node, &reference) {
                continue;
            }
            self.follow_reference(&key, reference);
        }
        Ok(())
    }

    /// Notifies the visitor about an edge into an already-known node.
    fn task_extra_reference(
        &mut self,
        parent: NodeKey,
        reference: ReferenceDescription,
        visitor: &mut dyn CrawlVisitor,
    ) -> CrawlResult<()> {
        let parent_node = self
            .cache
            .get_by_key(&parent)
            .ok_or_else(|| StateError::node_missing(&parent))?;
        let target_key = reference.node_id.to_canonical_string();
        let target_node = self
            .cache
            .get_by_key(&target_key)
            .ok_or_else(|| StateError::node_missing(&target_key))?;

        visitor.on_extra_reference(parent_node, &reference, target_node);
        Ok(())
    }

    // =========================================================================
    // Browse-response processing
    // =========================================================================

    fn process_browse_response(
        &mut self,
        key: NodeKey,
        response: BrowseResponse,
    ) -> CrawlResult<()> {
        if response.continuation_point.is_some() {
            return Err(ProtocolError::continuation_point(&key).into());
        }
        if !response.status_code.is_good() {
            warn!(node = %key, status = %response.status_code, "browse returned non-good status");
        }

        // Collapse duplicate (referenceType, target) pairs; first wins.
        let mut seen: HashSet<(NodeKey, NodeKey)> = HashSet::new();
        let mut references = Vec::with_capacity(response.references.len());
        for reference in response.references {
            let edge = (
                reference.reference_type_id.to_canonical_string(),
                reference.node_id.to_canonical_string(),
            );
            if !seen.insert(edge) {
                warn!(
                    node = %key,
                    reference_type = %reference.reference_type_id,
                    target = %reference.node_id,
                    "duplicate reference dropped"
                );
                continue;
            }
            references.push(reference);
        }

        // The browse reply carries each target's browse name, display name
        // and node class for free; seed the read cache so they are never
        // fetched again.
        for reference in &references {
            let target = reference.node_id.to_canonical_string();
            self.read_batcher.prefill(
                &target,
                AttributeId::BrowseName,
                AttributeValue::Value(Variant::QualifiedName(reference.browse_name.clone())),
            );
            self.read_batcher.prefill(
                &target,
                AttributeId::DisplayName,
                AttributeValue::Value(Variant::LocalizedText(reference.display_name.clone())),
            );
            if let Some(class) = reference.node_class {
                self.read_batcher.prefill(
                    &target,
                    AttributeId::NodeClass,
                    AttributeValue::Value(Variant::Int32(class.value() as i32)),
                );
            }
        }

        let type_definition = references
            .iter()
            .find(|r| r.is_forward && r.reference_type_id == ids::HAS_TYPE_DEFINITION)
            .map(|r| r.node_id.clone());

        {
            let node = self
                .cache
                .get_mut(&key)
                .ok_or_else(|| StateError::node_missing(&key))?;
            if let Some(target) = type_definition {
                node.set_type_definition(target);
            }
            node.set_references(references)?;
        }

        // Resolve whatever attributes the node still misses; the node
        // completes when the last of them lands.
        let mut outstanding = 0;
        self.defer_node_attributes(&key, &mut outstanding);
        if outstanding == 0 {
            self.queue.unshift(Task::Complete(key));
        } else {
            self.outstanding_reads.insert(key, outstanding);
        }
        Ok(())
    }

    // =========================================================================
    // Attribute resolution
    // =========================================================================

    /// Defers the reads a node still needs into its completion group.
    fn defer_node_attributes(&mut self, key: &NodeKey, outstanding: &mut usize) {
        let (browse_name_pending, display_name_missing, node_class) = match self
            .cache
            .get_by_key(key)
        {
            Some(node) => (
                node.is_browse_name_pending(),
                node.display_name().is_none(),
                node.node_class(),
            ),
            None => return,
        };

        if browse_name_pending {
            self.defer_attribute(key, AttributeId::BrowseName, outstanding);
        }
        if display_name_missing {
            self.defer_attribute(key, AttributeId::DisplayName, outstanding);
        }
        match node_class {
            None => self.defer_attribute(key, AttributeId::NodeClass, outstanding),
            Some(NodeClass::Variable) => self.defer_variable_attributes(key, outstanding),
            Some(_) => {}
        }
    }

    /// Defers the five Variable-only attribute reads.
    fn defer_variable_attributes(&mut self, key: &NodeKey, outstanding: &mut usize) {
        for attribute in AttributeId::VARIABLE_ATTRIBUTES {
            self.defer_attribute(key, attribute, outstanding);
        }
    }

    fn defer_attribute(&mut self, key: &NodeKey, attribute: AttributeId, outstanding: &mut usize) {
        match self.read_batcher.defer(key, attribute, key) {
            Deferred::Resolved(value) => {
                self.apply_attribute(key, attribute, &value, outstanding);
            }
            Deferred::Queued | Deferred::Joined => *outstanding += 1,
        }
    }

    /// Stores a resolved attribute on its cache node.
    ///
    /// Hints prefilled from a reference record win over later direct
    /// reads; every path below keeps the first value.
    fn apply_attribute(
        &mut self,
        key: &NodeKey,
        attribute: AttributeId,
        value: &AttributeValue,
        outstanding: &mut usize,
    ) {
        let Some(node) = self.cache.get_mut(key) else {
            return;
        };

        match attribute {
            AttributeId::BrowseName => match value.as_variant() {
                Some(Variant::QualifiedName(name)) => node.set_browse_name(name.clone()),
                Some(Variant::String(name)) => {
                    node.set_browse_name(QualifiedName::from(name.as_str()))
                }
                _ => warn!(node = %key, "browse name did not resolve"),
            },
            AttributeId::DisplayName => match value.as_variant().and_then(Variant::as_text) {
                Some(text) => node.set_display_name(text.to_string()),
                None => warn!(node = %key, "display name did not resolve"),
            },
            AttributeId::NodeClass => {
                let class = value
                    .as_variant()
                    .and_then(Variant::as_i64)
                    .and_then(|v| u32::try_from(v).ok())
                    .and_then(NodeClass::from_value);
                match class {
                    Some(class) => node.set_node_class(class),
                    None => warn!(node = %key, "node class did not resolve"),
                }
                // Variables carry five more attributes; queue them into
                // the same completion group.
                if self.cache.get_by_key(key).and_then(CacheNode::node_class)
                    == Some(NodeClass::Variable)
                {
                    self.defer_variable_attributes(key, outstanding);
                }
            }
            AttributeId::DataType => node.set_attribute(VariableSlot::DataType, value.clone()),
            AttributeId::Value => node.set_attribute(VariableSlot::DataValue, value.clone()),
            AttributeId::MinimumSamplingInterval => {
                node.set_attribute(VariableSlot::MinimumSamplingInterval, value.clone())
            }
            AttributeId::AccessLevel => {
                node.set_attribute(VariableSlot::AccessLevel, value.clone())
            }
            AttributeId::UserAccessLevel => {
                node.set_attribute(VariableSlot::UserAccessLevel, value.clone())
            }
        }
    }

    /// Retires one outstanding read of a completion group.
    fn complete_one_read(&mut self, group: &NodeKey) {
        let Some(count) = self.outstanding_reads.get_mut(group) else {
            warn!(node = %group, "read completed for unknown group");
            return;
        };
        *count -= 1;
        if *count == 0 {
            self.outstanding_reads.remove(group);
            self.queue.unshift(Task::Complete(group.clone()));
        }
    }

    // =========================================================================
    // Reference following
    // =========================================================================

    /// Recurses into one reference of a just-completed node.
    fn follow_reference(&mut self, parent: &NodeKey, reference: ReferenceDescription) {
        // The reference's type node must end up cached and crawled so the
        // finalizer can name the edge.
        let type_key = reference.reference_type_id.to_canonical_string();
        if !self.cache.contains_key(&type_key) {
            self.cache.get_or_create(&reference.reference_type_id);
        }
        self.schedule_crawl(type_key);

        let target_key = reference.node_id.to_canonical_string();
        if self.cache.contains_key(&target_key) {
            // Known target: record the extra edge without re-crawling.
            self.queue.push(Task::ExtraReference {
                parent: parent.clone(),
                reference,
            });
            return;
        }

        let target = self.cache.get_or_create(&reference.node_id);
        target.set_browse_name(reference.browse_name.clone());
        target.set_display_name(reference.display_name.clone());
        if let Some(class) = reference.node_class {
            target.set_node_class(class);
        }
        if let Some(type_definition) = reference.type_definition.clone() {
            target.set_type_definition(type_definition);
        }
        self.schedule_crawl(target_key);
    }

    // =========================================================================
    // Error recovery
    // =========================================================================

    /// Drops in-flight bookkeeping after a failed crawl.
    ///
    /// Resolved attribute memoization and the cache itself survive; only
    /// pending batches, queued tasks and completion groups are discarded
    /// so a later crawl starts from a consistent idle state.
    fn abandon_in_flight(&mut self) {
        self.queue = TaskQueue::new();
        self.browse_batcher = BrowseBatcher::new();
        self.read_batcher.clear_in_flight();
        self.outstanding_reads.clear();
    }
}
