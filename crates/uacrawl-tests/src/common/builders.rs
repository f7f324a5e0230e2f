// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Address-Space Builder
//!
//! Fluent construction of mock address spaces with sensible defaults.
//!
//! ## Design Principles
//!
//! - Node ids are given as canonical strings (`"ns=2;i=7"`)
//! - References are declared as links; the per-reference hints a real
//!   server would deliver (browse name, display name, node class, type
//!   definition) are synthesized from the target node at build time, so
//!   declaration order does not matter
//! - Declaring the same link twice produces a duplicate reference in the
//!   server response, for dedup scenarios

use std::collections::HashMap;

use uacrawl::ids;
use uacrawl::types::{
    AttributeId, DataValue, NodeClass, NodeId, OperationalLimits, QualifiedName,
    ReferenceDescription, Variant,
};

use super::mocks::{MockNode, MockSession};

// =============================================================================
// AddressSpaceBuilder
// =============================================================================

/// Builder for [`MockSession`] address spaces.
#[derive(Default)]
pub struct AddressSpaceBuilder {
    nodes: Vec<MockNode>,
    links: Vec<(String, NodeId, String)>,
    limits: OperationalLimits,
    limits_unavailable: bool,
    continuation_point_on: Option<String>,
}

impl AddressSpaceBuilder {
    /// Creates an empty address space. The advertised limits default to 0
    /// (unadvertised), which the crawler replaces with its 500 fallback.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    /// Adds a node of an explicit class.
    pub fn node(mut self, id: &str, name: &str, node_class: NodeClass) -> Self {
        let node_id = parse_id(id);
        let namespace = node_id.namespace_index;
        self.nodes.push(MockNode {
            node_id,
            browse_name: QualifiedName::new(namespace, name),
            display_name: name.to_string(),
            node_class,
            value: None,
            data_type: None,
            references: Vec::new(),
            read_overrides: HashMap::new(),
        });
        self
    }

    /// Adds an Object node.
    pub fn object(self, id: &str, name: &str) -> Self {
        self.node(id, name, NodeClass::Object)
    }

    /// Adds a Variable node holding `value`.
    pub fn variable(mut self, id: &str, name: &str, value: Variant) -> Self {
        let data_type = data_type_of(&value);
        self = self.node(id, name, NodeClass::Variable);
        if let Some(node) = self.nodes.last_mut() {
            node.value = Some(value);
            node.data_type = Some(data_type);
        }
        self
    }

    /// Adds an ObjectType node.
    pub fn object_type(self, id: &str, name: &str) -> Self {
        self.node(id, name, NodeClass::ObjectType)
    }

    /// Adds a VariableType node.
    pub fn variable_type(self, id: &str, name: &str) -> Self {
        self.node(id, name, NodeClass::VariableType)
    }

    /// Adds a custom ReferenceType node.
    pub fn reference_type(self, id: &str, name: &str) -> Self {
        self.node(id, name, NodeClass::ReferenceType)
    }

    /// Overrides the response for one attribute of one node.
    pub fn read_override(mut self, id: &str, attribute: AttributeId, value: DataValue) -> Self {
        let key = parse_id(id).to_canonical_string();
        if let Some(node) = self
            .nodes
            .iter_mut()
            .find(|n| n.node_id.to_canonical_string() == key)
        {
            node.read_overrides.insert(attribute, value);
        }
        self
    }

    // =========================================================================
    // References
    // =========================================================================

    /// Links `source` to `target` with an arbitrary reference type.
    pub fn link(mut self, source: &str, reference_type: NodeId, target: &str) -> Self {
        self.links.push((
            parse_id(source).to_canonical_string(),
            reference_type,
            parse_id(target).to_canonical_string(),
        ));
        self
    }

    /// Adds an Organizes reference.
    pub fn organizes(self, source: &str, target: &str) -> Self {
        self.link(source, ids::ORGANIZES, target)
    }

    /// Adds a HasComponent reference.
    pub fn has_component(self, source: &str, target: &str) -> Self {
        self.link(source, ids::HAS_COMPONENT, target)
    }

    /// Adds a HasProperty reference.
    pub fn has_property(self, source: &str, target: &str) -> Self {
        self.link(source, ids::HAS_PROPERTY, target)
    }

    /// Adds a HasTypeDefinition reference.
    pub fn has_type_definition(self, source: &str, target: &str) -> Self {
        self.link(source, ids::HAS_TYPE_DEFINITION, target)
    }

    // =========================================================================
    // Server behavior
    // =========================================================================

    /// Sets the advertised operational limits.
    pub fn limits(mut self, max_nodes_per_read: u32, max_nodes_per_browse: u32) -> Self {
        self.limits = OperationalLimits {
            max_nodes_per_read,
            max_nodes_per_browse,
        };
        self
    }

    /// Makes the operational-limit handshake fail.
    pub fn limits_unavailable(mut self) -> Self {
        self.limits_unavailable = true;
        self
    }

    /// Makes the given node's browse answer with a continuation point.
    pub fn continuation_point_on(mut self, id: &str) -> Self {
        self.continuation_point_on = Some(parse_id(id).to_canonical_string());
        self
    }

    // =========================================================================
    // Build
    // =========================================================================

    /// Materializes the session, synthesizing reference hints from the
    /// target nodes.
    pub fn build(self) -> MockSession {
        let mut nodes: HashMap<String, MockNode> = self
            .nodes
            .into_iter()
            .map(|node| (node.node_id.to_canonical_string(), node))
            .collect();

        // Type definitions are themselves links; resolve them first so
        // reference hints can carry them.
        let mut type_definitions: HashMap<String, NodeId> = HashMap::new();
        for (source, reference_type, target) in &self.links {
            if *reference_type == ids::HAS_TYPE_DEFINITION {
                if let Some(target_node) = nodes.get(target) {
                    type_definitions
                        .entry(source.clone())
                        .or_insert_with(|| target_node.node_id.clone());
                }
            }
        }

        let mut references: HashMap<String, Vec<ReferenceDescription>> = HashMap::new();
        for (source, reference_type, target) in &self.links {
            let Some(target_node) = nodes.get(target) else {
                continue;
            };
            references
                .entry(source.clone())
                .or_default()
                .push(ReferenceDescription {
                    reference_type_id: reference_type.clone(),
                    is_forward: true,
                    node_id: target_node.node_id.clone(),
                    browse_name: target_node.browse_name.clone(),
                    display_name: target_node.display_name.clone(),
                    node_class: Some(target_node.node_class),
                    type_definition: type_definitions.get(target).cloned(),
                });
        }

        for (key, refs) in references {
            if let Some(node) = nodes.get_mut(&key) {
                node.references = refs;
            }
        }

        MockSession::new(
            nodes,
            self.limits,
            self.limits_unavailable,
            self.continuation_point_on,
        )
    }
}

/// Parses a canonical node-id string; panics on malformed test fixtures.
fn parse_id(id: &str) -> NodeId {
    id.parse()
        .unwrap_or_else(|_| panic!("malformed fixture node id: {}", id))
}

/// Maps a value to the standard data-type node a server would report.
fn data_type_of(value: &Variant) -> NodeId {
    let type_id = match value {
        Variant::Boolean(_) => 1,
        Variant::Int32(_) => 6,
        Variant::UInt32(_) => 7,
        Variant::Int64(_) => 8,
        Variant::Float(_) => 10,
        Variant::Double(_) => 11,
        Variant::String(_) => 12,
        Variant::DateTime(_) => 13,
        Variant::Guid(_) => 14,
        Variant::ByteString(_) => 15,
        _ => 24,
    };
    NodeId::numeric(0, type_id)
}
