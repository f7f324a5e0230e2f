// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Session
//!
//! An in-memory [`CrawlSession`] backed by a prebuilt address space.
//!
//! ## Design Principles
//!
//! - Recording of every batch for verification (request contents and sizes)
//! - Error injection for transport-failure scenarios
//! - Protocol-violation injection (continuation points, short responses)
//! - Cheap cloning: handles share one inner state, so tests keep a clone
//!   for assertions after the crawler takes ownership

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use uacrawl::error::{CrawlResult, TransportError};
use uacrawl::types::{
    AttributeId, BrowseDescription, BrowseResponse, DataValue, NodeClass, NodeId,
    OperationalLimits, QualifiedName, ReadValueId, ReferenceDescription, StatusCode, Variant,
};
use uacrawl::CrawlSession;

// =============================================================================
// MockNode
// =============================================================================

/// One node of the mock address space.
#[derive(Debug, Clone)]
pub struct MockNode {
    /// The node id.
    pub node_id: NodeId,

    /// Browse name.
    pub browse_name: QualifiedName,

    /// Display name.
    pub display_name: String,

    /// Node class.
    pub node_class: NodeClass,

    /// Current value (Variable nodes).
    pub value: Option<Variant>,

    /// Data type (Variable nodes).
    pub data_type: Option<NodeId>,

    /// Outgoing references, in server order. Duplicates are returned as-is.
    pub references: Vec<ReferenceDescription>,

    /// Per-attribute response overrides, e.g. to inject a bad status.
    pub read_overrides: HashMap<AttributeId, DataValue>,
}

impl MockNode {
    /// Answers one attribute read the way a server would.
    fn read_attribute(&self, attribute: AttributeId) -> DataValue {
        if let Some(overridden) = self.read_overrides.get(&attribute) {
            return overridden.clone();
        }

        match attribute {
            AttributeId::NodeClass => {
                DataValue::good(Variant::Int32(self.node_class.value() as i32))
            }
            AttributeId::BrowseName => {
                DataValue::good(Variant::QualifiedName(self.browse_name.clone()))
            }
            AttributeId::DisplayName => {
                DataValue::good(Variant::LocalizedText(self.display_name.clone()))
            }
            AttributeId::Value => {
                if self.node_class != NodeClass::Variable {
                    return DataValue::bad(StatusCode::BAD_ATTRIBUTE_ID_INVALID);
                }
                match &self.value {
                    Some(value) => DataValue::good(value.clone()),
                    None => DataValue::empty(),
                }
            }
            AttributeId::DataType => {
                if self.node_class != NodeClass::Variable {
                    return DataValue::bad(StatusCode::BAD_ATTRIBUTE_ID_INVALID);
                }
                match &self.data_type {
                    Some(id) => DataValue::good(Variant::NodeId(id.clone())),
                    None => DataValue::bad(StatusCode::BAD_ATTRIBUTE_ID_INVALID),
                }
            }
            AttributeId::AccessLevel | AttributeId::UserAccessLevel => {
                if self.node_class != NodeClass::Variable {
                    return DataValue::bad(StatusCode::BAD_ATTRIBUTE_ID_INVALID);
                }
                DataValue::good(Variant::Int32(3))
            }
            AttributeId::MinimumSamplingInterval => {
                if self.node_class != NodeClass::Variable {
                    return DataValue::bad(StatusCode::BAD_ATTRIBUTE_ID_INVALID);
                }
                DataValue::good(Variant::Double(0.0))
            }
        }
    }
}

// =============================================================================
// MockSession
// =============================================================================

struct MockSessionInner {
    nodes: HashMap<String, MockNode>,
    limits: OperationalLimits,
    limits_unavailable: bool,

    /// Node key that answers its browse with a continuation point.
    continuation_point_on: Option<String>,

    fail_next_browse: AtomicBool,
    fail_next_read: AtomicBool,

    browse_log: Mutex<Vec<Vec<String>>>,
    read_log: Mutex<Vec<Vec<(String, AttributeId)>>>,
}

/// In-memory session over a prebuilt address space.
///
/// Cloning yields another handle to the same state, so a test can keep one
/// for assertions after handing the other to a crawler.
#[derive(Clone)]
pub struct MockSession {
    inner: Arc<MockSessionInner>,
}

impl MockSession {
    pub(crate) fn new(
        nodes: HashMap<String, MockNode>,
        limits: OperationalLimits,
        limits_unavailable: bool,
        continuation_point_on: Option<String>,
    ) -> Self {
        Self {
            inner: Arc::new(MockSessionInner {
                nodes,
                limits,
                limits_unavailable,
                continuation_point_on,
                fail_next_browse: AtomicBool::new(false),
                fail_next_read: AtomicBool::new(false),
                browse_log: Mutex::new(Vec::new()),
                read_log: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Makes the next browse call fail at the transport level.
    pub fn fail_next_browse(&self) {
        self.inner.fail_next_browse.store(true, Ordering::SeqCst);
    }

    /// Makes the next read call fail at the transport level.
    pub fn fail_next_read(&self) {
        self.inner.fail_next_read.store(true, Ordering::SeqCst);
    }

    /// Every browse batch, as lists of browsed node keys.
    pub fn browse_batches(&self) -> Vec<Vec<String>> {
        self.inner.browse_log.lock().clone()
    }

    /// Every read batch, as lists of (node key, attribute) pairs.
    pub fn read_batches(&self) -> Vec<Vec<(String, AttributeId)>> {
        self.inner.read_log.lock().clone()
    }

    /// All read requests across all batches, in issue order.
    pub fn all_read_requests(&self) -> Vec<(String, AttributeId)> {
        self.read_batches().into_iter().flatten().collect()
    }

    /// All browsed node keys across all batches, in issue order.
    pub fn all_browsed_nodes(&self) -> Vec<String> {
        self.browse_batches().into_iter().flatten().collect()
    }

    /// Number of round-trips performed (browse + read).
    pub fn transaction_count(&self) -> usize {
        self.inner.browse_log.lock().len() + self.inner.read_log.lock().len()
    }
}

#[async_trait]
impl CrawlSession for MockSession {
    async fn browse(&self, nodes: &[BrowseDescription]) -> CrawlResult<Vec<BrowseResponse>> {
        if self.inner.fail_next_browse.swap(false, Ordering::SeqCst) {
            return Err(TransportError::failed("injected browse failure").into());
        }

        let keys: Vec<String> = nodes
            .iter()
            .map(|d| d.node_id.to_canonical_string())
            .collect();
        self.inner.browse_log.lock().push(keys.clone());

        let responses = keys
            .iter()
            .map(|key| {
                let Some(node) = self.inner.nodes.get(key) else {
                    return BrowseResponse {
                        status_code: StatusCode::BAD_NODE_ID_UNKNOWN,
                        continuation_point: None,
                        references: Vec::new(),
                    };
                };
                let mut response = BrowseResponse::good(node.references.clone());
                if self.inner.continuation_point_on.as_deref() == Some(key.as_str()) {
                    response.continuation_point = Some(vec![0x01]);
                }
                response
            })
            .collect();
        Ok(responses)
    }

    async fn read(&self, nodes: &[ReadValueId]) -> CrawlResult<Vec<DataValue>> {
        if self.inner.fail_next_read.swap(false, Ordering::SeqCst) {
            return Err(TransportError::failed("injected read failure").into());
        }

        let requests: Vec<(String, AttributeId)> = nodes
            .iter()
            .map(|r| (r.node_id.to_canonical_string(), r.attribute_id))
            .collect();
        self.inner.read_log.lock().push(requests.clone());

        let results = requests
            .iter()
            .map(|(key, attribute)| match self.inner.nodes.get(key) {
                Some(node) => node.read_attribute(*attribute),
                None => DataValue::bad(StatusCode::BAD_NODE_ID_UNKNOWN),
            })
            .collect();
        Ok(results)
    }

    async fn operational_limits(&self) -> CrawlResult<OperationalLimits> {
        if self.inner.limits_unavailable {
            return Err(TransportError::failed("operation limits not readable").into());
        }
        Ok(self.inner.limits)
    }
}
