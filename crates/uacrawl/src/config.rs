// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Crawler configuration.
//!
//! All settings are optional; the defaults defer to the server's
//! advertised operational limits with the standard 500-item fallback.
//!
//! # Examples
//!
//! ```
//! use uacrawl::config::CrawlerConfig;
//!
//! let config = CrawlerConfig::builder()
//!     .max_nodes_per_read(100)
//!     .build();
//! assert_eq!(config.max_nodes_per_read, Some(100));
//! ```

use serde::{Deserialize, Serialize};

use crate::events::DEFAULT_EVENT_CAPACITY;
use crate::types::OperationalLimits;

// =============================================================================
// CrawlerConfig
// =============================================================================

/// Client-side crawler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Client-side cap on read batch size. The effective bound is the
    /// smaller of this and the server limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_nodes_per_read: Option<u32>,

    /// Client-side cap on browse batch size. The effective bound is the
    /// smaller of this and the server limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_nodes_per_browse: Option<u32>,

    /// Capacity of the event broadcast channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_nodes_per_read: None,
            max_nodes_per_browse: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl CrawlerConfig {
    /// Creates a builder.
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::default()
    }

    /// Combines server limits with the client-side overrides.
    ///
    /// Server limits are sanitized first (0 becomes the 500 fallback);
    /// overrides can only lower the result.
    pub fn effective_limits(&self, advertised: OperationalLimits) -> OperationalLimits {
        let sanitized = advertised.sanitized();
        OperationalLimits {
            max_nodes_per_read: clamp_limit(sanitized.max_nodes_per_read, self.max_nodes_per_read),
            max_nodes_per_browse: clamp_limit(
                sanitized.max_nodes_per_browse,
                self.max_nodes_per_browse,
            ),
        }
    }
}

fn clamp_limit(server: u32, client: Option<u32>) -> u32 {
    match client {
        Some(limit) if limit > 0 => server.min(limit),
        _ => server,
    }
}

// =============================================================================
// CrawlerConfigBuilder
// =============================================================================

/// Builder for [`CrawlerConfig`].
#[derive(Debug, Clone, Default)]
pub struct CrawlerConfigBuilder {
    config: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    /// Caps read batches on the client side.
    pub fn max_nodes_per_read(mut self, limit: u32) -> Self {
        self.config.max_nodes_per_read = Some(limit);
        self
    }

    /// Caps browse batches on the client side.
    pub fn max_nodes_per_browse(mut self, limit: u32) -> Self {
        self.config.max_nodes_per_browse = Some(limit);
        self
    }

    /// Sets the event channel capacity.
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    /// Finishes the builder.
    pub fn build(self) -> CrawlerConfig {
        self.config
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_OPERATION_LIMIT;

    #[test]
    fn effective_limits_default_to_server() {
        let config = CrawlerConfig::default();
        let limits = config.effective_limits(OperationalLimits {
            max_nodes_per_read: 200,
            max_nodes_per_browse: 0,
        });
        assert_eq!(limits.max_nodes_per_read, 200);
        assert_eq!(limits.max_nodes_per_browse, DEFAULT_OPERATION_LIMIT);
    }

    #[test]
    fn client_override_only_lowers() {
        let config = CrawlerConfig::builder()
            .max_nodes_per_read(50)
            .max_nodes_per_browse(9999)
            .build();
        let limits = config.effective_limits(OperationalLimits {
            max_nodes_per_read: 200,
            max_nodes_per_browse: 100,
        });
        assert_eq!(limits.max_nodes_per_read, 50);
        assert_eq!(limits.max_nodes_per_browse, 100);
    }

    #[test]
    fn zero_override_is_ignored() {
        let config = CrawlerConfig::builder().max_nodes_per_read(0).build();
        let limits = config.effective_limits(OperationalLimits::default());
        assert_eq!(limits.max_nodes_per_read, DEFAULT_OPERATION_LIMIT);
    }
}
