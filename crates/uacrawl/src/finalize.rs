// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Denormalized-tree construction.
//!
//! Converts the raw cached graph into a JSON object tree that downstream
//! code can consume without further round-trips. Edges are named after the
//! browse name of their reference type (`Organizes` → `organizes`);
//! `HasTypeDefinition` collapses into a scalar `typeDefinition` field.
//!
//! The cache is naturally cyclic, so construction walks the graph
//! breadth-first with a global visited set: the first encounter of a node
//! expands it in place, any later encounter receives a scalar copy without
//! edge arrays. The result is a finite tree in which every node id occurs
//! at most once along any root-to-leaf path.

use std::collections::{HashMap, HashSet, VecDeque};

use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::cache::{CacheNode, NodeCache};
use crate::error::{CrawlResult, StateError};
use crate::ids;
use crate::types::NodeId;

/// Lowercases the first letter of a reference-type name.
///
/// `HasComponent` → `hasComponent`, `Organizes` → `organizes`.
fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

// =============================================================================
// Reconstruction plan
// =============================================================================

/// A child slot of one edge array.
enum Child {
    /// First encounter: the full subtree goes here.
    Expand(String),

    /// Re-encounter: a scalar copy without edge arrays goes here.
    Stub(String),
}

/// Per-node reconstruction work computed during the walk.
#[derive(Default)]
struct NodePlan {
    type_definition: Option<String>,
    edges: Vec<(String, Vec<Child>)>,
}

impl NodePlan {
    fn edge_slot(&mut self, name: &str) -> &mut Vec<Child> {
        let index = match self.edges.iter().position(|(n, _)| n == name) {
            Some(index) => index,
            None => {
                self.edges.push((name.to_string(), Vec::new()));
                self.edges.len() - 1
            }
        };
        &mut self.edges[index].1
    }
}

// =============================================================================
// build_tree
// =============================================================================

/// Builds the denormalized object tree rooted at `start`.
pub(crate) fn build_tree(cache: &NodeCache, start: &NodeId) -> CrawlResult<Value> {
    let root_key = start.to_canonical_string();
    if !cache.contains_key(&root_key) {
        return Err(StateError::node_missing(&root_key).into());
    }

    // Phase 1: walk the graph, planning each node's edges. Nodes enter
    // `order` exactly once, parents before the children they expand.
    let mut visited: HashSet<String> = HashSet::new();
    let mut order: Vec<String> = Vec::new();
    let mut plans: HashMap<String, NodePlan> = HashMap::new();
    let mut work: VecDeque<String> = VecDeque::new();

    visited.insert(root_key.clone());
    order.push(root_key.clone());
    work.push_back(root_key.clone());

    while let Some(key) = work.pop_front() {
        let Some(node) = cache.get_by_key(&key) else {
            continue;
        };
        let mut plan = NodePlan::default();

        for reference in node.references().unwrap_or_default() {
            if !reference.is_forward {
                continue;
            }
            let target_key = reference.node_id.to_canonical_string();

            if reference.reference_type_id == ids::HAS_TYPE_DEFINITION {
                let label = cache
                    .get_by_key(&target_key)
                    .and_then(CacheNode::browse_name)
                    .map(|name| name.name.clone())
                    .unwrap_or_else(|| target_key.clone());
                plan.type_definition.get_or_insert(label);
                continue;
            }

            let edge_name = match cache
                .get(&reference.reference_type_id)
                .and_then(CacheNode::browse_name)
            {
                Some(name) => lower_first(&name.name),
                None => {
                    warn!(
                        node = %key,
                        reference_type = %reference.reference_type_id,
                        "unknown reference type, edge skipped"
                    );
                    continue;
                }
            };

            if !cache.contains_key(&target_key) {
                debug!(node = %key, target = %target_key, "target not crawled, edge skipped");
                continue;
            }

            let child = if visited.insert(target_key.clone()) {
                order.push(target_key.clone());
                work.push_back(target_key.clone());
                Child::Expand(target_key)
            } else {
                Child::Stub(target_key)
            };
            plan.edge_slot(&edge_name).push(child);
        }

        // A type-definition hint can be present even when the edge itself
        // was pruned from the walk.
        if plan.type_definition.is_none() {
            if let Some(target) = node.type_definition() {
                let target_key = target.to_canonical_string();
                plan.type_definition = cache
                    .get_by_key(&target_key)
                    .and_then(CacheNode::browse_name)
                    .map(|name| name.name.clone());
            }
        }

        plans.insert(key, plan);
    }

    // Phase 2: assemble children before parents by processing the
    // discovery order in reverse. Each expanded subtree is consumed by
    // exactly one parent slot.
    let mut built: HashMap<String, Value> = HashMap::new();
    for key in order.iter().rev() {
        let Some(node) = cache.get_by_key(key) else {
            continue;
        };
        let mut object = scalar_object(node);

        if let Some(plan) = plans.remove(key) {
            if let Some(type_definition) = plan.type_definition {
                object.insert("typeDefinition".to_string(), json!(type_definition));
            }
            for (edge_name, children) in plan.edges {
                let mut array = Vec::with_capacity(children.len());
                for child in children {
                    match child {
                        Child::Expand(child_key) => {
                            if let Some(value) = built.remove(&child_key) {
                                array.push(value);
                            }
                        }
                        Child::Stub(child_key) => {
                            if let Some(stub) = cache.get_by_key(&child_key) {
                                array.push(Value::Object(scalar_object(stub)));
                            }
                        }
                    }
                }
                if !array.is_empty() {
                    object.insert(edge_name, Value::Array(array));
                }
            }
        }

        built.insert(key.clone(), Value::Object(object));
    }

    built
        .remove(&root_key)
        .ok_or_else(|| StateError::node_missing(&root_key).into())
}

/// The scalar fields of one denormalized node.
fn scalar_object(node: &CacheNode) -> Map<String, Value> {
    let mut object = Map::new();
    object.insert(
        "browseName".to_string(),
        json!(node
            .browse_name()
            .map(ToString::to_string)
            .unwrap_or_else(|| node.key())),
    );
    object.insert("nodeId".to_string(), json!(node.key()));
    if let Some(class) = node.node_class() {
        object.insert("nodeClass".to_string(), json!(class.name()));
    }
    if let Some(data_type) = node.data_type() {
        object.insert("dataType".to_string(), data_type.to_json());
    }
    if let Some(data_value) = node.data_value() {
        object.insert("dataValue".to_string(), data_value.to_json());
    }
    object
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NodeClass, QualifiedName, ReferenceDescription};

    fn nid(i: u32) -> NodeId {
        NodeId::numeric(2, i)
    }

    fn reference(reference_type: &NodeId, target: &NodeId, name: &str) -> ReferenceDescription {
        ReferenceDescription {
            reference_type_id: reference_type.clone(),
            is_forward: true,
            node_id: target.clone(),
            browse_name: QualifiedName::new(2, name),
            display_name: name.to_string(),
            node_class: Some(NodeClass::Object),
            type_definition: None,
        }
    }

    /// Builds a cache node with resolved names and the given references.
    fn seed(cache: &mut NodeCache, id: &NodeId, name: &str, refs: Vec<ReferenceDescription>) {
        let node = cache.get_or_create(id);
        node.set_browse_name(QualifiedName::new(2, name));
        node.set_display_name(name.to_string());
        node.set_node_class(NodeClass::Object);
        node.set_references(refs).unwrap();
    }

    fn seeded_cache() -> NodeCache {
        let mut cache = NodeCache::new();
        for (node_id, browse_name) in ids::PREPOPULATED_REFERENCE_TYPES {
            cache.create_prepopulated(&node_id, browse_name);
        }
        cache
    }

    #[test]
    fn lower_first_matches_edge_naming() {
        assert_eq!(lower_first("Organizes"), "organizes");
        assert_eq!(lower_first("HasComponent"), "hasComponent");
        assert_eq!(lower_first(""), "");
    }

    #[test]
    fn builds_parent_child_edges() {
        let mut cache = seeded_cache();
        let (a, b) = (nid(1), nid(2));
        seed(
            &mut cache,
            &a,
            "A",
            vec![reference(&ids::ORGANIZES, &b, "B")],
        );
        seed(&mut cache, &b, "B", Vec::new());

        let tree = build_tree(&cache, &a).unwrap();
        assert_eq!(tree["browseName"], "2:A");
        assert_eq!(tree["organizes"][0]["browseName"], "2:B");
    }

    #[test]
    fn cycle_is_broken_at_revisit() {
        let mut cache = seeded_cache();
        let (a, b) = (nid(1), nid(2));
        seed(
            &mut cache,
            &a,
            "A",
            vec![reference(&ids::ORGANIZES, &b, "B")],
        );
        seed(
            &mut cache,
            &b,
            "B",
            vec![reference(&ids::ORGANIZES, &a, "A")],
        );

        let tree = build_tree(&cache, &a).unwrap();
        let b_entry = &tree["organizes"][0];
        assert_eq!(b_entry["browseName"], "2:B");

        // B still references A, but the revisited A is not re-expanded.
        let a_stub = &b_entry["organizes"][0];
        assert_eq!(a_stub["nodeId"], "ns=2;i=1");
        assert!(a_stub.get("organizes").is_none());
    }

    #[test]
    fn unknown_reference_type_skips_edge() {
        let mut cache = seeded_cache();
        let (a, b) = (nid(1), nid(2));
        let exotic = NodeId::numeric(2, 999);
        seed(&mut cache, &a, "A", vec![reference(&exotic, &b, "B")]);
        seed(&mut cache, &b, "B", Vec::new());

        let tree = build_tree(&cache, &a).unwrap();
        assert_eq!(tree["browseName"], "2:A");
        assert!(tree.as_object().unwrap().keys().all(|k| k != "b"));
    }

    #[test]
    fn type_definition_collapses_to_scalar() {
        let mut cache = seeded_cache();
        let (a, t) = (nid(1), nid(50));
        seed(
            &mut cache,
            &a,
            "A",
            vec![reference(&ids::HAS_TYPE_DEFINITION, &t, "SomeType")],
        );
        seed(&mut cache, &t, "SomeType", Vec::new());

        let tree = build_tree(&cache, &a).unwrap();
        assert_eq!(tree["typeDefinition"], "SomeType");
        assert!(tree.get("hasTypeDefinition").is_none());
    }

    #[test]
    fn missing_root_is_an_error() {
        let cache = seeded_cache();
        assert!(build_tree(&cache, &nid(1)).is_err());
    }
}
