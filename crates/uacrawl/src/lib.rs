// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Batched address-space crawler for OPC UA client sessions.
//!
//! Given a starting node and an authenticated session exposing two batched
//! primitives — browse a list of nodes, read a list of (node, attribute)
//! pairs — the crawler discovers the transitive closure of reachable
//! nodes, collects their attributes, and materializes a cycle-free
//! denormalized object tree.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                         NodeCrawler                           │
//! │  ┌──────────┐  ┌───────────────┐  ┌────────────────────────┐  │
//! │  │ TaskQueue│─►│ browse/read   │─►│ CrawlSession (batched) │  │
//! │  │ (conc 1) │  │ batchers      │  │  browse() / read()     │  │
//! │  └──────────┘  └───────────────┘  └────────────────────────┘  │
//! │        │                                                      │
//! │        ▼                                                      │
//! │  ┌──────────┐        ┌───────────────────────────┐            │
//! │  │ NodeCache│───────►│ finalizer (JSON tree)     │            │
//! │  └──────────┘        └───────────────────────────┘            │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Requests are never sent when they are made: they accumulate in two
//! batchers which a single-consumer task queue drains after every task,
//! bounded by the server's advertised operational limits. Attribute reads
//! are memoized per (node, attribute) and prefilled from the hints a
//! browse response carries, so across a whole crawl each node is browsed
//! at most once and each attribute is read at most once.
//!
//! # Example
//!
//! ```rust,ignore
//! use uacrawl::{NodeCrawler, types::NodeId};
//!
//! let mut crawler = NodeCrawler::new(session);
//! let objects = NodeId::numeric(0, 85);
//! let tree = crawler.read_tree(&objects).await?;
//! println!("{}", serde_json::to_string_pretty(&tree)?);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod session;
pub mod stats;
pub mod types;

mod batch;
mod crawler;
mod finalize;
mod scheduler;

// Re-export the crawler surface
pub use crawler::{CrawlVisitor, DefaultVisitor, NodeCrawler};

// Re-export commonly used types
pub use cache::{AttributeValue, CacheNode, NodeCache};
pub use config::{CrawlerConfig, CrawlerConfigBuilder};
pub use error::{
    ConfigurationError, CrawlError, CrawlResult, ErrorSeverity, ProtocolError, StateError,
    TransportError,
};
pub use events::CrawlEvent;
pub use session::CrawlSession;
pub use stats::CrawlStatistics;
pub use types::{
    AttributeId, BrowseDescription, BrowseDirection, BrowseResponse, DataValue, NodeClass, NodeId,
    NodeIdentifier, OperationalLimits, QualifiedName, ReadValueId, ReferenceDescription,
    StatusCode, Variant, DEFAULT_OPERATION_LIMIT,
};
