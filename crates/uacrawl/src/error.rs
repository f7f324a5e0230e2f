// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Crawler error types.
//!
//! A categorized error hierarchy in four domains:
//!
//! ```text
//! CrawlError
//! ├── Transport     - Session-level browse/read failures
//! ├── Protocol      - Server responses violating crawler assumptions
//! ├── State         - Crawler-internal invariant violations
//! └── Configuration - Invalid identifiers and settings
//! ```
//!
//! Every error carries a [`category`](CrawlError::category) for metrics and
//! a [`severity`](CrawlError::severity) that maps onto a tracing level via
//! [`log`](CrawlError::log).
//!
//! Per-attribute status failures are **not** errors: a non-Good read status
//! becomes an [`AttributeValue::Status`](crate::cache::AttributeValue)
//! descriptor on the cache node and the crawl continues.

use std::io;

use thiserror::Error;
use tracing::Level;

/// Result alias used throughout the crate.
pub type CrawlResult<T> = Result<T, CrawlError>;

// =============================================================================
// ErrorSeverity
// =============================================================================

/// Severity classification of a crawl error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    /// Informational - no action required.
    Info,
    /// Warning - action may be required.
    Warning,
    /// Error - action required, but recoverable.
    Error,
    /// Critical - immediate action required.
    Critical,
}

impl ErrorSeverity {
    /// Maps the severity to a tracing level.
    pub fn to_tracing_level(self) -> Level {
        match self {
            Self::Info => Level::DEBUG,
            Self::Warning => Level::WARN,
            Self::Error | Self::Critical => Level::ERROR,
        }
    }
}

// =============================================================================
// CrawlError
// =============================================================================

/// The main error type for crawler operations.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The session failed to execute a batched operation.
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// The server response violated a crawler assumption.
    #[error("{0}")]
    Protocol(#[from] ProtocolError),

    /// A crawler-internal invariant was violated.
    #[error("{0}")]
    State(#[from] StateError),

    /// Invalid identifier or configuration value.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),
}

impl CrawlError {
    /// Creates a transport error.
    #[inline]
    pub fn transport(error: TransportError) -> Self {
        Self::Transport(error)
    }

    /// Creates a transport failure from a message.
    pub fn transport_failed(message: impl Into<String>) -> Self {
        Self::Transport(TransportError::Failed {
            message: message.into(),
        })
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(error: ProtocolError) -> Self {
        Self::Protocol(error)
    }

    /// Creates a state error.
    #[inline]
    pub fn state(error: StateError) -> Self {
        Self::State(error)
    }

    /// Creates a configuration error.
    #[inline]
    pub fn configuration(error: ConfigurationError) -> Self {
        Self::Configuration(error)
    }

    /// Returns the error category for logging and metrics.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Protocol(_) => "protocol",
            Self::State(_) => "state",
            Self::Configuration(_) => "configuration",
        }
    }

    /// Returns `true` if retrying the whole crawl could succeed.
    ///
    /// Protocol, state and configuration errors are deterministic; only
    /// transport failures are worth a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns the severity of this error.
    ///
    /// Transport failures are transient server/network trouble; protocol
    /// violations mean the server breaks a crawler assumption; state and
    /// configuration errors point at the calling code.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Transport(e) => e.severity(),
            Self::Protocol(_) => ErrorSeverity::Error,
            Self::State(_) => ErrorSeverity::Critical,
            Self::Configuration(_) => ErrorSeverity::Critical,
        }
    }

    /// Returns the tracing level for this error.
    pub fn tracing_level(&self) -> Level {
        self.severity().to_tracing_level()
    }

    /// Logs this error with the appropriate level and context.
    pub fn log(&self, context: &str) {
        match self.tracing_level() {
            Level::ERROR => tracing::error!(
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
            Level::WARN => tracing::warn!(
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
            _ => tracing::debug!(
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
        }
    }
}

// =============================================================================
// TransportError
// =============================================================================

/// Session-level failures.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Underlying I/O failure.
    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),

    /// The session is not connected.
    #[error("session is not connected")]
    NotConnected,

    /// The session reported a failure.
    #[error("transport failure: {message}")]
    Failed {
        /// Failure description from the session.
        message: String,
    },
}

impl TransportError {
    /// Creates a failure from a message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Returns the severity of this transport failure.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotConnected => ErrorSeverity::Warning,
            Self::Io(_) | Self::Failed { .. } => ErrorSeverity::Error,
        }
    }
}

// =============================================================================
// ProtocolError
// =============================================================================

/// Server responses the crawler refuses to process.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The server returned a continuation point; large browses are assumed
    /// to fit in one response.
    #[error("server returned a continuation point for node {node_id}; continuation is not supported")]
    ContinuationPoint {
        /// The node whose browse did not complete.
        node_id: String,
    },

    /// The number of results does not match the number of requests.
    #[error("response count mismatch for {operation}: sent {requested}, received {received}")]
    ResponseCountMismatch {
        /// The batched operation ("browse" or "read").
        operation: &'static str,
        /// Items in the request.
        requested: usize,
        /// Items in the response.
        received: usize,
    },
}

impl ProtocolError {
    /// Creates a continuation-point error.
    pub fn continuation_point(node_id: impl Into<String>) -> Self {
        Self::ContinuationPoint {
            node_id: node_id.into(),
        }
    }

    /// Creates a response-count mismatch error.
    pub fn count_mismatch(operation: &'static str, requested: usize, received: usize) -> Self {
        Self::ResponseCountMismatch {
            operation,
            requested,
            received,
        }
    }
}

// =============================================================================
// StateError
// =============================================================================

/// Crawler-internal invariant violations. These indicate a programming
/// error, not a server problem.
#[derive(Debug, Error)]
pub enum StateError {
    /// `create` was called for a node already in the cache.
    #[error("cache node {node_id} already exists")]
    NodeAlreadyExists {
        /// The duplicated key.
        node_id: String,
    },

    /// A node's reference list was assigned twice.
    #[error("references of {node_id} are already assigned")]
    ReferencesReassigned {
        /// The offending node.
        node_id: String,
    },

    /// A task referred to a node missing from the cache.
    #[error("node {node_id} is not in the cache")]
    NodeMissing {
        /// The missing key.
        node_id: String,
    },
}

impl StateError {
    /// Creates a node-already-exists error.
    pub fn node_already_exists(node_id: impl Into<String>) -> Self {
        Self::NodeAlreadyExists {
            node_id: node_id.into(),
        }
    }

    /// Creates a references-reassigned error.
    pub fn references_reassigned(node_id: impl Into<String>) -> Self {
        Self::ReferencesReassigned {
            node_id: node_id.into(),
        }
    }

    /// Creates a node-missing error.
    pub fn node_missing(node_id: impl Into<String>) -> Self {
        Self::NodeMissing {
            node_id: node_id.into(),
        }
    }
}

// =============================================================================
// ConfigurationError
// =============================================================================

/// Invalid identifiers and settings.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A node id string could not be parsed.
    #[error("invalid node id '{input}': {reason}")]
    InvalidNodeId {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl ConfigurationError {
    /// Creates an invalid-node-id error.
    pub fn invalid_node_id(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidNodeId {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
