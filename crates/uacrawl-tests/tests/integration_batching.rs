// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Batching Integration Tests
//!
//! Batch-bound and coalescing behavior:
//!
//! - Unadvertised limits fall back to 500 and are never exceeded
//! - Sibling crawl tasks coalesce into one browse batch
//! - Attribute reads across one browse response coalesce into one batch
//! - Client-side overrides lower the effective bounds

use uacrawl::types::{NodeId, Variant, DEFAULT_OPERATION_LIMIT};
use uacrawl::{CrawlerConfig, DefaultVisitor, NodeCrawler};

use uacrawl_tests::prelude::*;

fn nid(s: &str) -> NodeId {
    s.parse().unwrap()
}

/// Root object organizing `count` variable children in namespace 2.
fn wide_space(count: u32) -> AddressSpaceBuilder {
    let mut builder = AddressSpaceBuilder::new().object("ns=2;i=1", "Root");
    for i in 0..count {
        let id = format!("ns=2;i={}", 100 + i);
        builder = builder
            .variable(&id, &format!("Var{}", i), Variant::Double(f64::from(i)))
            .organizes("ns=2;i=1", &id);
    }
    builder
}

#[tokio::test]
async fn test_zero_limits_fall_back_to_500_and_hold() {
    // 101 variable children produce 505 attribute reads plus 3 for the
    // root seed, forcing the 500 bound to split the read work.
    let session = wide_space(101).limits(0, 0).build();

    let mut crawler = NodeCrawler::new(session.clone());
    let mut visitor = DefaultVisitor;
    crawler.crawl(&nid("ns=2;i=1"), &mut visitor).await.unwrap();

    let limits = crawler.operational_limits().unwrap();
    assert_eq!(limits.max_nodes_per_read, DEFAULT_OPERATION_LIMIT);
    assert_eq!(limits.max_nodes_per_browse, DEFAULT_OPERATION_LIMIT);

    let read_batches = session.read_batches();
    assert!(read_batches.iter().all(|b| b.len() <= 500));
    assert!(read_batches.iter().any(|b| b.len() == 500));
    let total: usize = read_batches.iter().map(Vec::len).sum();
    assert_eq!(total, 508);

    assert!(session.browse_batches().iter().all(|b| b.len() <= 500));
}

#[tokio::test]
async fn test_sibling_crawls_coalesce_into_one_browse_batch() {
    let session = wide_space(40).build();

    let mut crawler = NodeCrawler::new(session.clone());
    let mut visitor = DefaultVisitor;
    crawler.crawl(&nid("ns=2;i=1"), &mut visitor).await.unwrap();

    let batches = session.browse_batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0], vec!["ns=2;i=1"]);
    assert_eq!(batches[1].len(), 40);
}

#[tokio::test]
async fn test_reads_of_one_response_coalesce() {
    let session = wide_space(12).build();

    let mut crawler = NodeCrawler::new(session.clone());
    let mut visitor = DefaultVisitor;
    crawler.crawl(&nid("ns=2;i=1"), &mut visitor).await.unwrap();

    // The 12 children are hinted by the browse, leaving 5 variable
    // attributes each; all 60 land in a single read transaction.
    let read_batches = session.read_batches();
    assert!(read_batches.iter().any(|b| b.len() == 60));
}

#[tokio::test]
async fn test_server_advertised_limits_bound_batches() {
    let session = wide_space(30).limits(25, 8).build();

    let mut crawler = NodeCrawler::new(session.clone());
    let mut visitor = DefaultVisitor;
    crawler.crawl(&nid("ns=2;i=1"), &mut visitor).await.unwrap();

    assert!(session.read_batches().iter().all(|b| b.len() <= 25));
    assert!(session.browse_batches().iter().all(|b| b.len() <= 8));
}

#[tokio::test]
async fn test_client_override_lowers_the_bound() {
    let session = wide_space(10).limits(500, 500).build();
    let config = CrawlerConfig::builder()
        .max_nodes_per_read(10)
        .max_nodes_per_browse(4)
        .build();

    let mut crawler = NodeCrawler::with_config(session.clone(), config);
    let mut visitor = DefaultVisitor;
    crawler.crawl(&nid("ns=2;i=1"), &mut visitor).await.unwrap();

    assert!(session.read_batches().iter().all(|b| b.len() <= 10));
    assert!(session.browse_batches().iter().all(|b| b.len() <= 4));
}

#[tokio::test]
async fn test_unavailable_limits_use_defaults() {
    let session = wide_space(3).limits_unavailable().build();

    let mut crawler = NodeCrawler::new(session);
    let mut visitor = DefaultVisitor;
    crawler.crawl(&nid("ns=2;i=1"), &mut visitor).await.unwrap();

    let limits = crawler.operational_limits().unwrap();
    assert_eq!(limits.max_nodes_per_read, DEFAULT_OPERATION_LIMIT);
    assert_eq!(limits.max_nodes_per_browse, DEFAULT_OPERATION_LIMIT);
}
