// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Cache of discovered nodes.
//!
//! [`NodeCache`] owns every node the crawler has seen and is the single
//! source of truth for node state. Nodes are interned by the canonical
//! string form of their id: for any node identifier there is at most one
//! [`CacheNode`] instance.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{CrawlResult, StateError};
use crate::types::{
    DataValue, NodeClass, NodeId, QualifiedName, ReferenceDescription, Variant,
};

// =============================================================================
// AttributeValue
// =============================================================================

/// Outcome of one attribute read, as stored on a cache node.
///
/// A non-Good read status is data, not an error: it is kept as a
/// `{name: <symbolic status>}` descriptor so consumers can see why the
/// attribute is unavailable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// The attribute resolved to a value.
    Value(Variant),

    /// The server returned Good with no payload.
    Null,

    /// The server returned a non-Good status.
    Status {
        /// Symbolic status code name, e.g. `BadAttributeIdInvalid`.
        name: String,
    },
}

impl AttributeValue {
    /// Maps a read result into an attribute value.
    pub fn from_data_value(value: &DataValue) -> Self {
        if value.status_code.is_good() {
            match &value.value {
                Some(v) if !v.is_null() => Self::Value(v.clone()),
                _ => Self::Null,
            }
        } else {
            Self::Status {
                name: value.status_code.symbolic_name(),
            }
        }
    }

    /// Returns the inner variant, if the attribute resolved to a value.
    pub fn as_variant(&self) -> Option<&Variant> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Converts to a JSON value for the denormalized tree.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Value(v) => v.to_json(),
            Self::Null => serde_json::Value::Null,
            Self::Status { name } => serde_json::json!({ "name": name }),
        }
    }
}

// =============================================================================
// CacheNode
// =============================================================================

/// The canonical record for one discovered node.
///
/// Created on first mention (as the crawl root or as the target of a
/// discovered reference) and alive for the lifetime of the crawler.
/// `browse_name` starts pending and transitions exactly once; `references`
/// is assigned exactly once after the node's browse completes.
#[derive(Debug, Clone, Serialize)]
pub struct CacheNode {
    node_id: NodeId,
    browse_name: Option<QualifiedName>,
    display_name: Option<String>,
    node_class: Option<NodeClass>,
    type_definition: Option<NodeId>,
    references: Option<Vec<ReferenceDescription>>,
    data_type: Option<AttributeValue>,
    data_value: Option<AttributeValue>,
    minimum_sampling_interval: Option<AttributeValue>,
    access_level: Option<AttributeValue>,
    user_access_level: Option<AttributeValue>,
}

impl CacheNode {
    fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            browse_name: None,
            display_name: None,
            node_class: None,
            type_definition: None,
            references: None,
            data_type: None,
            data_value: None,
            minimum_sampling_interval: None,
            access_level: None,
            user_access_level: None,
        }
    }

    /// The node id.
    #[inline]
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// The interning key of this node.
    pub fn key(&self) -> String {
        self.node_id.to_canonical_string()
    }

    /// The resolved browse name, or `None` while still pending.
    #[inline]
    pub fn browse_name(&self) -> Option<&QualifiedName> {
        self.browse_name.as_ref()
    }

    /// Returns `true` while the browse name has not been resolved.
    #[inline]
    pub fn is_browse_name_pending(&self) -> bool {
        self.browse_name.is_none()
    }

    /// The display name, when resolved.
    #[inline]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// The node class, when known.
    #[inline]
    pub fn node_class(&self) -> Option<NodeClass> {
        self.node_class
    }

    /// The type definition target, when the node has a HasTypeDefinition
    /// reference.
    #[inline]
    pub fn type_definition(&self) -> Option<&NodeId> {
        self.type_definition.as_ref()
    }

    /// The node's references, populated once after browsing.
    #[inline]
    pub fn references(&self) -> Option<&[ReferenceDescription]> {
        self.references.as_deref()
    }

    /// Returns `true` once the node's browse has completed.
    #[inline]
    pub fn is_browsed(&self) -> bool {
        self.references.is_some()
    }

    /// The data type attribute (Variable nodes).
    #[inline]
    pub fn data_type(&self) -> Option<&AttributeValue> {
        self.data_type.as_ref()
    }

    /// The value attribute (Variable nodes).
    #[inline]
    pub fn data_value(&self) -> Option<&AttributeValue> {
        self.data_value.as_ref()
    }

    /// The minimum sampling interval attribute (Variable nodes).
    #[inline]
    pub fn minimum_sampling_interval(&self) -> Option<&AttributeValue> {
        self.minimum_sampling_interval.as_ref()
    }

    /// The access level attribute (Variable nodes).
    #[inline]
    pub fn access_level(&self) -> Option<&AttributeValue> {
        self.access_level.as_ref()
    }

    /// The user access level attribute (Variable nodes).
    #[inline]
    pub fn user_access_level(&self) -> Option<&AttributeValue> {
        self.user_access_level.as_ref()
    }

    // =========================================================================
    // Mutators (first write wins)
    // =========================================================================

    // Hints prefilled from a ReferenceDescription are never overwritten by
    // a later direct read, so every setter keeps the first value.

    pub(crate) fn set_browse_name(&mut self, name: QualifiedName) {
        if self.browse_name.is_none() {
            self.browse_name = Some(name);
        }
    }

    pub(crate) fn set_display_name(&mut self, name: String) {
        if self.display_name.is_none() {
            self.display_name = Some(name);
        }
    }

    pub(crate) fn set_node_class(&mut self, class: NodeClass) {
        if self.node_class.is_none() {
            self.node_class = Some(class);
        }
    }

    pub(crate) fn set_type_definition(&mut self, target: NodeId) {
        if self.type_definition.is_none() {
            self.type_definition = Some(target);
        }
    }

    pub(crate) fn set_attribute(&mut self, slot: VariableSlot, value: AttributeValue) {
        let field = match slot {
            VariableSlot::DataType => &mut self.data_type,
            VariableSlot::DataValue => &mut self.data_value,
            VariableSlot::MinimumSamplingInterval => &mut self.minimum_sampling_interval,
            VariableSlot::AccessLevel => &mut self.access_level,
            VariableSlot::UserAccessLevel => &mut self.user_access_level,
        };
        if field.is_none() {
            *field = Some(value);
        }
    }

    /// Assigns the reference list. May happen at most once per node.
    pub(crate) fn set_references(
        &mut self,
        references: Vec<ReferenceDescription>,
    ) -> CrawlResult<()> {
        if self.references.is_some() {
            return Err(StateError::references_reassigned(self.key()).into());
        }
        self.references = Some(references);
        Ok(())
    }
}

/// Variable-only attribute slots on a cache node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VariableSlot {
    DataType,
    DataValue,
    MinimumSamplingInterval,
    AccessLevel,
    UserAccessLevel,
}

// =============================================================================
// NodeCache
// =============================================================================

/// Arena of all discovered nodes, keyed by canonical node-id string.
#[derive(Debug, Default)]
pub struct NodeCache {
    nodes: HashMap<String, CacheNode>,
}

impl NodeCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a node.
    pub fn get(&self, node_id: &NodeId) -> Option<&CacheNode> {
        self.nodes.get(&node_id.to_canonical_string())
    }

    /// Looks up a node by interning key.
    pub fn get_by_key(&self, key: &str) -> Option<&CacheNode> {
        self.nodes.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut CacheNode> {
        self.nodes.get_mut(key)
    }

    /// Returns the node for `node_id`, creating it if absent.
    pub(crate) fn get_or_create(&mut self, node_id: &NodeId) -> &mut CacheNode {
        self.nodes
            .entry(node_id.to_canonical_string())
            .or_insert_with(|| CacheNode::new(node_id.clone()))
    }

    /// Creates a node that must not already exist.
    pub(crate) fn create(&mut self, node_id: &NodeId) -> CrawlResult<&mut CacheNode> {
        let key = node_id.to_canonical_string();
        if self.nodes.contains_key(&key) {
            return Err(StateError::node_already_exists(key).into());
        }
        Ok(self
            .nodes
            .entry(key)
            .or_insert_with(|| CacheNode::new(node_id.clone())))
    }

    /// Creates a synthetic, pre-resolved node.
    ///
    /// Used to seed the standard reference types: the node carries its
    /// constant browse name and an empty reference list so it never incurs
    /// a read or a browse. Idempotent.
    pub(crate) fn create_prepopulated(&mut self, node_id: &NodeId, browse_name: &str) {
        let node = self.get_or_create(node_id);
        node.set_browse_name(QualifiedName::standard(browse_name));
        node.set_display_name(browse_name.to_string());
        node.set_node_class(NodeClass::ReferenceType);
        if node.references.is_none() {
            node.references = Some(Vec::new());
        }
    }

    /// Number of nodes in the cache.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the cache holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over all nodes.
    pub fn iter(&self) -> impl Iterator<Item = &CacheNode> {
        self.nodes.values()
    }

    /// Returns `true` if the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StatusCode;

    fn nid(i: u32) -> NodeId {
        NodeId::numeric(0, i)
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let mut cache = NodeCache::new();
        cache.get_or_create(&nid(85));
        cache.get_or_create(&nid(85));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn create_rejects_existing_key() {
        let mut cache = NodeCache::new();
        cache.create(&nid(85)).unwrap();
        assert!(cache.create(&nid(85)).is_err());
    }

    #[test]
    fn prepopulated_node_is_fully_resolved() {
        let mut cache = NodeCache::new();
        cache.create_prepopulated(&nid(35), "Organizes");
        cache.create_prepopulated(&nid(35), "Organizes");
        assert_eq!(cache.len(), 1);

        let node = cache.get(&nid(35)).unwrap();
        assert!(!node.is_browse_name_pending());
        assert_eq!(node.browse_name().unwrap().name, "Organizes");
        assert_eq!(node.node_class(), Some(NodeClass::ReferenceType));
        assert!(node.is_browsed());
    }

    #[test]
    fn references_assigned_exactly_once() {
        let mut cache = NodeCache::new();
        let node = cache.get_or_create(&nid(85));
        node.set_references(Vec::new()).unwrap();
        assert!(node.set_references(Vec::new()).is_err());
    }

    #[test]
    fn first_write_wins_on_hints() {
        let mut cache = NodeCache::new();
        let node = cache.get_or_create(&nid(7));

        node.set_node_class(NodeClass::Variable);
        node.set_node_class(NodeClass::Object);
        assert_eq!(node.node_class(), Some(NodeClass::Variable));

        node.set_browse_name(QualifiedName::new(2, "First"));
        node.set_browse_name(QualifiedName::new(2, "Second"));
        assert_eq!(node.browse_name().unwrap().name, "First");
    }

    #[test]
    fn attribute_value_mapping() {
        let good = DataValue::good(Variant::Double(1.0));
        assert_eq!(
            AttributeValue::from_data_value(&good),
            AttributeValue::Value(Variant::Double(1.0))
        );

        let empty = DataValue::empty();
        assert_eq!(AttributeValue::from_data_value(&empty), AttributeValue::Null);

        let bad = DataValue::bad(StatusCode::BAD_ATTRIBUTE_ID_INVALID);
        assert_eq!(
            AttributeValue::from_data_value(&bad),
            AttributeValue::Status {
                name: "BadAttributeIdInvalid".to_string()
            }
        );
    }

    #[test]
    fn attribute_value_json() {
        let status = AttributeValue::Status {
            name: "BadNotReadable".to_string(),
        };
        assert_eq!(
            status.to_json(),
            serde_json::json!({ "name": "BadNotReadable" })
        );
        assert_eq!(AttributeValue::Null.to_json(), serde_json::Value::Null);
    }
}
