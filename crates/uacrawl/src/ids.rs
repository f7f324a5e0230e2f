// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Well-known node ids of the standard namespace (OPC UA Part 5).

use crate::types::NodeId;

// =============================================================================
// Reference types
// =============================================================================

/// References (abstract base of all reference types) - i=31.
pub const REFERENCES: NodeId = NodeId::numeric(0, 31);

/// HasChild (abstract) - i=34.
pub const HAS_CHILD: NodeId = NodeId::numeric(0, 34);

/// Organizes - i=35.
pub const ORGANIZES: NodeId = NodeId::numeric(0, 35);

/// HasEventSource - i=36.
pub const HAS_EVENT_SOURCE: NodeId = NodeId::numeric(0, 36);

/// HasTypeDefinition - i=40.
pub const HAS_TYPE_DEFINITION: NodeId = NodeId::numeric(0, 40);

/// HasSubtype - i=45.
pub const HAS_SUBTYPE: NodeId = NodeId::numeric(0, 45);

/// HasProperty - i=46.
pub const HAS_PROPERTY: NodeId = NodeId::numeric(0, 46);

/// HasComponent - i=47.
pub const HAS_COMPONENT: NodeId = NodeId::numeric(0, 47);

/// HasNotifier - i=48.
pub const HAS_NOTIFIER: NodeId = NodeId::numeric(0, 48);

/// HasHistoricalConfiguration - i=56.
pub const HAS_HISTORICAL_CONFIGURATION: NodeId = NodeId::numeric(0, 56);

// =============================================================================
// Server capability nodes
// =============================================================================

/// Server_ServerCapabilities_OperationLimits_MaxNodesPerRead - i=11705.
pub const MAX_NODES_PER_READ: NodeId = NodeId::numeric(0, 11705);

/// Server_ServerCapabilities_OperationLimits_MaxNodesPerBrowse - i=11710.
pub const MAX_NODES_PER_BROWSE: NodeId = NodeId::numeric(0, 11710);

// =============================================================================
// Prepopulated reference types
// =============================================================================

/// Reference-type nodes seeded into the cache before any crawl.
///
/// The finalizer names edges after the browse name of the edge's reference
/// type; seeding these nodes keeps the common edge kinds from ever costing
/// a browse or a read.
pub const PREPOPULATED_REFERENCE_TYPES: [(NodeId, &str); 8] = [
    (HAS_TYPE_DEFINITION, "HasTypeDefinition"),
    (HAS_CHILD, "HasChild"),
    (HAS_PROPERTY, "HasProperty"),
    (HAS_COMPONENT, "HasComponent"),
    (HAS_HISTORICAL_CONFIGURATION, "HasHistoricalConfiguration"),
    (HAS_SUBTYPE, "HasSubtype"),
    (ORGANIZES, "Organizes"),
    (HAS_EVENT_SOURCE, "HasEventSource"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepopulated_set_is_distinct() {
        let mut keys: Vec<String> = PREPOPULATED_REFERENCE_TYPES
            .iter()
            .map(|(id, _)| id.to_canonical_string())
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), PREPOPULATED_REFERENCE_TYPES.len());
    }

    #[test]
    fn reference_type_ids_are_standard() {
        for (id, _) in PREPOPULATED_REFERENCE_TYPES {
            assert!(id.is_standard());
        }
        assert_eq!(REFERENCES.to_canonical_string(), "i=31");
        assert_eq!(HAS_COMPONENT.to_canonical_string(), "i=47");
    }
}
