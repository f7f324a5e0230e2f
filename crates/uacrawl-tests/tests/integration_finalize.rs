// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Finalization Integration Tests
//!
//! Shape of the denormalized tree produced by a full crawl:
//!
//! - Edge arrays named after lowercased reference-type browse names
//! - Diamonds: the second descent into a shared node is not re-expanded
//! - Cycles terminate and are broken at the revisit
//! - Any node id occurs at most once along any root-to-leaf path

use std::collections::HashSet;

use serde_json::Value;

use uacrawl::types::{NodeId, Variant};
use uacrawl::NodeCrawler;

use uacrawl_tests::prelude::*;

fn nid(s: &str) -> NodeId {
    s.parse().unwrap()
}

/// Asserts no node id repeats along any root-to-leaf path.
fn assert_acyclic_paths(value: &Value, path: &mut Vec<String>) {
    let Some(object) = value.as_object() else {
        return;
    };
    let node_id = object
        .get("nodeId")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    assert!(
        !path.contains(&node_id),
        "node {} repeats along path {:?}",
        node_id,
        path
    );

    path.push(node_id);
    for child_value in object.values() {
        if let Value::Array(children) = child_value {
            for child in children {
                assert_acyclic_paths(child, path);
            }
        }
    }
    path.pop();
}

#[tokio::test]
async fn test_edges_are_named_after_reference_types() {
    let session = AddressSpaceBuilder::new()
        .object("ns=2;i=1", "Plant")
        .object("ns=2;i=2", "Line")
        .variable("ns=2;i=3", "Speed", Variant::Double(9.0))
        .variable("ns=2;i=4", "Serial", Variant::String("A-17".into()))
        .organizes("ns=2;i=1", "ns=2;i=2")
        .has_component("ns=2;i=2", "ns=2;i=3")
        .has_property("ns=2;i=2", "ns=2;i=4")
        .build();

    let mut crawler = NodeCrawler::new(session);
    let tree = crawler.read_tree(&nid("ns=2;i=1")).await.unwrap();

    let line = &tree["organizes"][0];
    assert_eq!(line["browseName"], "2:Line");
    assert_eq!(line["hasComponent"][0]["browseName"], "2:Speed");
    assert_eq!(line["hasComponent"][0]["dataValue"], 9.0);
    assert_eq!(line["hasProperty"][0]["browseName"], "2:Serial");
    assert_eq!(line["hasProperty"][0]["dataValue"], "A-17");
}

#[tokio::test]
async fn test_diamond_second_descent_is_not_expanded() {
    let session = AddressSpaceBuilder::new()
        .object("ns=2;i=1", "A")
        .object("ns=2;i=2", "B")
        .object("ns=2;i=3", "C")
        .object("ns=2;i=4", "D")
        .variable("ns=2;i=5", "P", Variant::Int32(5))
        .organizes("ns=2;i=1", "ns=2;i=2")
        .organizes("ns=2;i=1", "ns=2;i=3")
        .has_component("ns=2;i=2", "ns=2;i=4")
        .has_component("ns=2;i=3", "ns=2;i=4")
        .has_property("ns=2;i=4", "ns=2;i=5")
        .build();

    let mut crawler = NodeCrawler::new(session);
    let tree = crawler.read_tree(&nid("ns=2;i=1")).await.unwrap();

    let b = &tree["organizes"][0];
    let c = &tree["organizes"][1];
    assert_eq!(b["browseName"], "2:B");
    assert_eq!(c["browseName"], "2:C");

    // Both B and C reference D, but only the first descent expands it.
    let d_full = &b["hasComponent"][0];
    let d_stub = &c["hasComponent"][0];
    assert_eq!(d_full["nodeId"], "ns=2;i=4");
    assert_eq!(d_stub["nodeId"], "ns=2;i=4");
    assert_eq!(d_full["hasProperty"][0]["browseName"], "2:P");
    assert!(d_stub.get("hasProperty").is_none());

    assert_acyclic_paths(&tree, &mut Vec::new());
}

#[tokio::test]
async fn test_cycle_terminates_and_is_broken() {
    let session = AddressSpaceBuilder::new()
        .object("ns=2;i=1", "A")
        .object("ns=2;i=2", "B")
        .organizes("ns=2;i=1", "ns=2;i=2")
        .organizes("ns=2;i=2", "ns=2;i=1")
        .build();

    let mut crawler = NodeCrawler::new(session);
    let tree = crawler.read_tree(&nid("ns=2;i=1")).await.unwrap();

    let b = &tree["organizes"][0];
    assert_eq!(b["browseName"], "2:B");

    // B's organizes contains A's entry, but recursion into A stopped.
    let a_stub = &b["organizes"][0];
    assert_eq!(a_stub["nodeId"], "ns=2;i=1");
    assert!(a_stub.get("organizes").is_none());

    assert_acyclic_paths(&tree, &mut Vec::new());
}

#[tokio::test]
async fn test_custom_reference_type_names_the_edge() {
    init_tracing();
    let session = AddressSpaceBuilder::new()
        .object("ns=2;i=1", "Boiler")
        .object("ns=2;i=2", "Sensor")
        .reference_type("ns=2;i=900", "HasSensor")
        .link("ns=2;i=1", nid("ns=2;i=900"), "ns=2;i=2")
        .build();

    let mut crawler = NodeCrawler::new(session);
    let tree = crawler.read_tree(&nid("ns=2;i=1")).await.unwrap();

    assert_eq!(tree["hasSensor"][0]["browseName"], "2:Sensor");
}

#[tokio::test]
async fn test_finalize_without_recrawl() {
    let session = AddressSpaceBuilder::new()
        .object("ns=2;i=1", "Root")
        .variable("ns=2;i=2", "V", Variant::Boolean(true))
        .has_component("ns=2;i=1", "ns=2;i=2")
        .build();

    let mut crawler = NodeCrawler::new(session.clone());
    let mut visitor = uacrawl::DefaultVisitor;
    crawler.crawl(&nid("ns=2;i=1"), &mut visitor).await.unwrap();
    let transactions = session.transaction_count();

    // Finalization is pure cache work.
    let tree = crawler.finalize(&nid("ns=2;i=1")).unwrap();
    assert_eq!(tree["hasComponent"][0]["dataValue"], true);
    assert_eq!(session.transaction_count(), transactions);
}
