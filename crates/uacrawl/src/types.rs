// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Protocol-level types shared by the session interface and the crawler.
//!
//! This module provides the small slice of the OPC UA information model the
//! crawler operates on:
//!
//! - **NodeId**: all four node identifier kinds with parsing and the
//!   canonical string form used as the cache interning key
//! - **QualifiedName / NodeClass / AttributeId**: node metadata
//! - **Variant / DataValue / StatusCode**: read results
//! - **BrowseDescription / BrowseResponse / ReferenceDescription**: browse
//!   requests and results
//! - **OperationalLimits**: server-advertised batch bounds
//!
//! # Examples
//!
//! ```
//! use uacrawl::types::NodeId;
//!
//! let node: NodeId = "ns=2;s=Machine.Temperature".parse().unwrap();
//! assert_eq!(node.to_canonical_string(), "ns=2;s=Machine.Temperature");
//! ```

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ConfigurationError, CrawlError};

// =============================================================================
// NodeId
// =============================================================================

/// OPC UA node identifier.
///
/// Uniquely identifies a node within a server's address space. The canonical
/// string form (`ns=<namespace>;{i|s|g|b}=<identifier>`) doubles as the
/// interning key of the crawler's node cache.
///
/// # Examples
///
/// ```
/// use uacrawl::types::NodeId;
///
/// let numeric = NodeId::numeric(0, 85);
/// assert_eq!(numeric.to_canonical_string(), "i=85");
///
/// let string = NodeId::string(2, "Line1.Motor");
/// assert_eq!(string.to_canonical_string(), "ns=2;s=Line1.Motor");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    /// Namespace index (0 = OPC UA standard namespace).
    pub namespace_index: u16,

    /// The node identifier.
    pub identifier: NodeIdentifier,
}

impl NodeId {
    /// Creates a numeric node ID.
    #[inline]
    pub const fn numeric(namespace_index: u16, value: u32) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Numeric(value),
        }
    }

    /// Creates a string node ID.
    #[inline]
    pub fn string(namespace_index: u16, value: impl Into<String>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::String(value.into()),
        }
    }

    /// Creates a GUID node ID.
    #[inline]
    pub const fn guid(namespace_index: u16, value: Uuid) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Guid(value),
        }
    }

    /// Creates an opaque (byte string) node ID.
    #[inline]
    pub fn opaque(namespace_index: u16, value: Vec<u8>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Opaque(value),
        }
    }

    /// The null node ID (ns=0, i=0).
    #[inline]
    pub const fn null() -> Self {
        Self::numeric(0, 0)
    }

    /// Returns `true` if this is the null node ID.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.namespace_index == 0 && matches!(self.identifier, NodeIdentifier::Numeric(0))
    }

    /// Returns `true` if this is in the standard namespace (ns=0).
    #[inline]
    pub const fn is_standard(&self) -> bool {
        self.namespace_index == 0
    }

    /// Returns the numeric value if this is a numeric identifier.
    #[inline]
    pub fn as_numeric(&self) -> Option<u32> {
        match &self.identifier {
            NodeIdentifier::Numeric(v) => Some(*v),
            _ => None,
        }
    }

    /// Converts to the canonical OPC UA string form.
    ///
    /// Format: `ns=<namespace>;{i|s|g|b}=<identifier>`; the `ns=` prefix is
    /// omitted for the standard namespace.
    pub fn to_canonical_string(&self) -> String {
        if self.namespace_index == 0 {
            self.identifier.to_string()
        } else {
            format!("ns={};{}", self.namespace_index, self.identifier)
        }
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for NodeId {
    type Err = CrawlError;

    /// Parses a node ID from the canonical string form.
    ///
    /// Supported identifier kinds: `i=` (numeric), `s=` (string), `g=`
    /// (GUID), `b=` (opaque, base64).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();

        // An `ns=<index>;` prefix scopes the identifier; everything else
        // lives in the standard namespace. A `;` inside a string
        // identifier without such a prefix stays part of the identifier.
        let (namespace_index, body) = match input.split_once(';') {
            Some((head, tail)) => match head.strip_prefix("ns=") {
                Some(digits) => {
                    let index = digits
                        .parse::<u16>()
                        .map_err(|_| node_id_error(input, "namespace index is not a u16"))?;
                    (index, tail)
                }
                None => (0, input),
            },
            None => (0, input),
        };

        let (kind, payload) = body
            .split_once('=')
            .ok_or_else(|| node_id_error(input, "identifier must be of the form <kind>=<value>"))?;

        Ok(Self {
            namespace_index,
            identifier: parse_identifier(kind, payload, input)?,
        })
    }
}

/// Builds a [`NodeIdentifier`] from its kind tag and payload.
fn parse_identifier(kind: &str, payload: &str, input: &str) -> Result<NodeIdentifier, CrawlError> {
    match kind {
        "i" => payload
            .parse::<u32>()
            .map(NodeIdentifier::Numeric)
            .map_err(|_| node_id_error(input, "numeric identifier is not a u32")),
        "s" => Ok(NodeIdentifier::String(payload.to_string())),
        "g" => Uuid::parse_str(payload)
            .map(NodeIdentifier::Guid)
            .map_err(|e| node_id_error(input, format!("GUID identifier: {}", e))),
        "b" => BASE64
            .decode(payload)
            .map(NodeIdentifier::Opaque)
            .map_err(|e| node_id_error(input, format!("opaque identifier: {}", e))),
        other => Err(node_id_error(
            input,
            format!("identifier kind '{}' is not one of i, s, g, b", other),
        )),
    }
}

fn node_id_error(input: &str, reason: impl Into<String>) -> CrawlError {
    CrawlError::configuration(ConfigurationError::invalid_node_id(input, reason))
}

// =============================================================================
// NodeIdentifier
// =============================================================================

/// The four identifier kinds defined by the OPC UA specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum NodeIdentifier {
    /// Numeric identifier (standard nodes, most compact).
    Numeric(u32),

    /// String identifier (human-readable custom nodes).
    String(String),

    /// Globally unique identifier.
    Guid(Uuid),

    /// Application-specific byte array.
    Opaque(Vec<u8>),
}

impl fmt::Display for NodeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(v) => write!(f, "i={}", v),
            Self::String(v) => write!(f, "s={}", v),
            Self::Guid(v) => write!(f, "g={}", v),
            Self::Opaque(v) => write!(f, "b={}", BASE64.encode(v)),
        }
    }
}

// =============================================================================
// QualifiedName
// =============================================================================

/// OPC UA qualified name (namespace index + name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedName {
    /// Namespace index.
    pub namespace_index: u16,

    /// The name string.
    pub name: String,
}

impl QualifiedName {
    /// Creates a new qualified name.
    pub fn new(namespace_index: u16, name: impl Into<String>) -> Self {
        Self {
            namespace_index,
            name: name.into(),
        }
    }

    /// Creates a qualified name in the standard namespace.
    pub fn standard(name: impl Into<String>) -> Self {
        Self::new(0, name)
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace_index == 0 {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}:{}", self.namespace_index, self.name)
        }
    }
}

impl From<&str> for QualifiedName {
    fn from(s: &str) -> Self {
        if let Some((ns, name)) = s.split_once(':') {
            if let Ok(ns_idx) = ns.parse::<u16>() {
                return Self::new(ns_idx, name);
            }
        }
        Self::standard(s)
    }
}

// =============================================================================
// NodeClass
// =============================================================================

/// OPC UA node class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeClass {
    /// Object node.
    Object,
    /// Variable node.
    Variable,
    /// Method node.
    Method,
    /// Object type node.
    ObjectType,
    /// Variable type node.
    VariableType,
    /// Reference type node.
    ReferenceType,
    /// Data type node.
    DataType,
    /// View node.
    View,
}

impl NodeClass {
    /// Returns the OPC UA bit value.
    pub const fn value(&self) -> u32 {
        match self {
            Self::Object => 1,
            Self::Variable => 2,
            Self::Method => 4,
            Self::ObjectType => 8,
            Self::VariableType => 16,
            Self::ReferenceType => 32,
            Self::DataType => 64,
            Self::View => 128,
        }
    }

    /// Creates from the OPC UA bit value.
    pub fn from_value(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Object),
            2 => Some(Self::Variable),
            4 => Some(Self::Method),
            8 => Some(Self::ObjectType),
            16 => Some(Self::VariableType),
            32 => Some(Self::ReferenceType),
            64 => Some(Self::DataType),
            128 => Some(Self::View),
            _ => None,
        }
    }

    /// Returns the class name as used in denormalized output.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Object => "Object",
            Self::Variable => "Variable",
            Self::Method => "Method",
            Self::ObjectType => "ObjectType",
            Self::VariableType => "VariableType",
            Self::ReferenceType => "ReferenceType",
            Self::DataType => "DataType",
            Self::View => "View",
        }
    }

    /// Returns `true` if this node class carries a value attribute.
    #[inline]
    pub const fn has_value(&self) -> bool {
        matches!(self, Self::Variable)
    }
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// AttributeId
// =============================================================================

/// OPC UA attribute identifiers the crawler reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeId {
    /// Node class attribute.
    NodeClass,
    /// Browse name attribute.
    BrowseName,
    /// Display name attribute.
    DisplayName,
    /// Value attribute.
    Value,
    /// Data type attribute.
    DataType,
    /// Access level attribute.
    AccessLevel,
    /// User access level attribute.
    UserAccessLevel,
    /// Minimum sampling interval attribute.
    MinimumSamplingInterval,
}

impl AttributeId {
    /// Returns the OPC UA numeric attribute id.
    pub const fn value(&self) -> u32 {
        match self {
            Self::NodeClass => 2,
            Self::BrowseName => 3,
            Self::DisplayName => 4,
            Self::Value => 13,
            Self::DataType => 14,
            Self::AccessLevel => 17,
            Self::UserAccessLevel => 18,
            Self::MinimumSamplingInterval => 19,
        }
    }

    /// The attributes resolved for every Variable node.
    pub const VARIABLE_ATTRIBUTES: [AttributeId; 5] = [
        AttributeId::DataType,
        AttributeId::Value,
        AttributeId::MinimumSamplingInterval,
        AttributeId::AccessLevel,
        AttributeId::UserAccessLevel,
    ];
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// =============================================================================
// BrowseDirection
// =============================================================================

/// Direction of a browse operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BrowseDirection {
    /// Browse forward references.
    #[default]
    Forward,

    /// Browse inverse references.
    Inverse,

    /// Browse both directions.
    Both,
}

impl BrowseDirection {
    /// Returns the OPC UA wire value.
    pub const fn value(&self) -> u32 {
        match self {
            Self::Forward => 0,
            Self::Inverse => 1,
            Self::Both => 2,
        }
    }
}

// =============================================================================
// StatusCode
// =============================================================================

/// OPC UA status code.
///
/// A thin wrapper over the 32-bit wire value with the symbolic names the
/// crawler can observe. Unknown codes render as hexadecimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct StatusCode(pub u32);

impl StatusCode {
    /// Operation succeeded.
    pub const GOOD: StatusCode = StatusCode(0x0000_0000);
    /// The attribute is not supported for the specified node.
    pub const BAD_ATTRIBUTE_ID_INVALID: StatusCode = StatusCode(0x8035_0000);
    /// The node id refers to a node that does not exist.
    pub const BAD_NODE_ID_UNKNOWN: StatusCode = StatusCode(0x8034_0000);
    /// The syntax of the node id is not valid.
    pub const BAD_NODE_ID_INVALID: StatusCode = StatusCode(0x8033_0000);
    /// The access level does not allow reading the node.
    pub const BAD_NOT_READABLE: StatusCode = StatusCode(0x803A_0000);
    /// An unexpected error occurred.
    pub const BAD_UNEXPECTED_ERROR: StatusCode = StatusCode(0x8001_0000);
    /// An internal error occurred.
    pub const BAD_INTERNAL_ERROR: StatusCode = StatusCode(0x8002_0000);
    /// There are too many operations in the request.
    pub const BAD_TOO_MANY_OPERATIONS: StatusCode = StatusCode(0x8010_0000);

    /// Returns `true` if the severity is Good.
    #[inline]
    pub const fn is_good(&self) -> bool {
        self.0 & 0xC000_0000 == 0
    }

    /// Returns `true` if the severity is Bad.
    #[inline]
    pub const fn is_bad(&self) -> bool {
        self.0 & 0x8000_0000 != 0
    }

    /// Returns `true` if the severity is Uncertain.
    #[inline]
    pub const fn is_uncertain(&self) -> bool {
        self.0 & 0xC000_0000 == 0x4000_0000
    }

    /// Returns the symbolic name of this status code.
    ///
    /// Codes outside the table render as `Bad_0x<code>`.
    pub fn symbolic_name(&self) -> String {
        match *self {
            Self::GOOD => "Good".to_string(),
            Self::BAD_ATTRIBUTE_ID_INVALID => "BadAttributeIdInvalid".to_string(),
            Self::BAD_NODE_ID_UNKNOWN => "BadNodeIdUnknown".to_string(),
            Self::BAD_NODE_ID_INVALID => "BadNodeIdInvalid".to_string(),
            Self::BAD_NOT_READABLE => "BadNotReadable".to_string(),
            Self::BAD_UNEXPECTED_ERROR => "BadUnexpectedError".to_string(),
            Self::BAD_INTERNAL_ERROR => "BadInternalError".to_string(),
            Self::BAD_TOO_MANY_OPERATIONS => "BadTooManyOperations".to_string(),
            StatusCode(code) => format!("Bad_0x{:08X}", code),
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbolic_name())
    }
}

// =============================================================================
// Variant
// =============================================================================

/// Value carried by a read result.
///
/// A reduced OPC UA variant covering the types the crawler stores and
/// denormalizes. Arrays nest; `Null` models an absent value with a Good
/// status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Boolean value.
    Boolean(bool),
    /// 32-bit signed integer (also carries enumerations such as NodeClass).
    Int32(i32),
    /// 32-bit unsigned integer.
    UInt32(u32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit double.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// Date/time value.
    DateTime(chrono::DateTime<chrono::Utc>),
    /// GUID value.
    Guid(Uuid),
    /// Raw byte string.
    ByteString(Vec<u8>),
    /// Node id value (DataType and TypeDefinition attributes).
    NodeId(NodeId),
    /// Qualified name value (BrowseName attribute).
    QualifiedName(QualifiedName),
    /// Localized text value (DisplayName attribute).
    LocalizedText(String),
    /// Array of values.
    Array(Vec<Variant>),
    /// Null value.
    Null,
}

impl Variant {
    /// Returns `true` if this is the null variant.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Attempts to interpret the value as an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Boolean(v) => Some(i64::from(*v)),
            Self::Int32(v) => Some(i64::from(*v)),
            Self::UInt32(v) => Some(i64::from(*v)),
            Self::Int64(v) => Some(*v),
            Self::Float(v) => Some(*v as i64),
            Self::Double(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Attempts to interpret the value as an f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int32(v) => Some(f64::from(*v)),
            Self::UInt32(v) => Some(f64::from(*v)),
            Self::Int64(v) => Some(*v as f64),
            Self::Float(v) => Some(f64::from(*v)),
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Attempts to interpret the value as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::String(v) | Self::LocalizedText(v) => Some(v),
            _ => None,
        }
    }

    /// Converts the variant into a JSON value for the denormalized tree.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::{json, Value};
        match self {
            Self::Boolean(v) => json!(v),
            Self::Int32(v) => json!(v),
            Self::UInt32(v) => json!(v),
            Self::Int64(v) => json!(v),
            Self::Float(v) => json!(v),
            Self::Double(v) => json!(v),
            Self::String(v) | Self::LocalizedText(v) => json!(v),
            Self::DateTime(v) => json!(v.to_rfc3339()),
            Self::Guid(v) => json!(v.to_string()),
            Self::ByteString(v) => json!(BASE64.encode(v)),
            Self::NodeId(v) => json!(v.to_canonical_string()),
            Self::QualifiedName(v) => json!(v.to_string()),
            Self::Array(items) => Value::Array(items.iter().map(Variant::to_json).collect()),
            Self::Null => Value::Null,
        }
    }
}

impl Default for Variant {
    fn default() -> Self {
        Self::Null
    }
}

// =============================================================================
// DataValue
// =============================================================================

/// Result of one item of a batched read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValue {
    /// Status code of the read.
    pub status_code: StatusCode,

    /// The value, when the server returned one.
    pub value: Option<Variant>,
}

impl DataValue {
    /// Creates a Good data value.
    pub fn good(value: Variant) -> Self {
        Self {
            status_code: StatusCode::GOOD,
            value: Some(value),
        }
    }

    /// Creates a Good data value with no payload.
    pub fn empty() -> Self {
        Self {
            status_code: StatusCode::GOOD,
            value: None,
        }
    }

    /// Creates a failed data value.
    pub fn bad(status_code: StatusCode) -> Self {
        Self {
            status_code,
            value: None,
        }
    }
}

// =============================================================================
// ReferenceDescription
// =============================================================================

/// One reference returned by a browse.
///
/// Carries the per-target hints (browse name, display name, node class,
/// type definition) the server delivers alongside the edge itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDescription {
    /// The reference type of this edge.
    pub reference_type_id: NodeId,

    /// `true` for a forward reference.
    pub is_forward: bool,

    /// The target node.
    pub node_id: NodeId,

    /// Browse name of the target.
    pub browse_name: QualifiedName,

    /// Display name of the target.
    pub display_name: String,

    /// Node class of the target, when the server supplied it.
    pub node_class: Option<NodeClass>,

    /// Type definition of the target, when the server supplied it.
    pub type_definition: Option<NodeId>,
}

// =============================================================================
// Browse / read request records
// =============================================================================

/// Result-mask bits requested with every browse.
pub mod result_mask {
    /// Include the reference type id.
    pub const REFERENCE_TYPE: u32 = 0x01;
    /// Include the forward flag.
    pub const IS_FORWARD: u32 = 0x02;
    /// Include the target node class.
    pub const NODE_CLASS: u32 = 0x04;
    /// Include the target browse name.
    pub const BROWSE_NAME: u32 = 0x08;
    /// Include the target display name.
    pub const DISPLAY_NAME: u32 = 0x10;
    /// Include the target type definition.
    pub const TYPE_DEFINITION: u32 = 0x20;

    /// Everything the crawler needs.
    pub const ALL: u32 = REFERENCE_TYPE
        | IS_FORWARD
        | NODE_CLASS
        | BROWSE_NAME
        | DISPLAY_NAME
        | TYPE_DEFINITION;
}

/// One item of a batched browse request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowseDescription {
    /// The node to browse from.
    pub node_id: NodeId,

    /// Browse direction.
    pub browse_direction: BrowseDirection,

    /// Reference type to follow.
    pub reference_type_id: NodeId,

    /// Whether to include subtypes of the reference type.
    pub include_subtypes: bool,

    /// Node class filter (0 = all classes).
    pub node_class_mask: u32,

    /// Result fields to include.
    pub result_mask: u32,
}

impl BrowseDescription {
    /// Creates the forward browse description the crawler issues for a node.
    pub fn forward(node_id: NodeId, reference_type_id: NodeId) -> Self {
        Self {
            node_id,
            browse_direction: BrowseDirection::Forward,
            reference_type_id,
            include_subtypes: true,
            node_class_mask: 0,
            result_mask: result_mask::ALL,
        }
    }
}

/// One item of a batched browse response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowseResponse {
    /// Status of this browse item.
    pub status_code: StatusCode,

    /// Server continuation point. Must be absent; the crawler does not
    /// support continuation.
    pub continuation_point: Option<Vec<u8>>,

    /// The references of the browsed node.
    pub references: Vec<ReferenceDescription>,
}

impl BrowseResponse {
    /// Creates a Good response carrying the given references.
    pub fn good(references: Vec<ReferenceDescription>) -> Self {
        Self {
            status_code: StatusCode::GOOD,
            continuation_point: None,
            references,
        }
    }
}

/// One item of a batched read request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReadValueId {
    /// The node to read.
    pub node_id: NodeId,

    /// The attribute to read.
    pub attribute_id: AttributeId,
}

// =============================================================================
// OperationalLimits
// =============================================================================

/// Fallback batch bound applied when the server advertises no limit.
pub const DEFAULT_OPERATION_LIMIT: u32 = 500;

/// Server-advertised caps on batched operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OperationalLimits {
    /// Maximum items per read request (0 = not advertised).
    pub max_nodes_per_read: u32,

    /// Maximum items per browse request (0 = not advertised).
    pub max_nodes_per_browse: u32,
}

impl OperationalLimits {
    /// Replaces unadvertised limits with [`DEFAULT_OPERATION_LIMIT`].
    pub fn sanitized(self) -> Self {
        Self {
            max_nodes_per_read: sanitize_limit(self.max_nodes_per_read),
            max_nodes_per_browse: sanitize_limit(self.max_nodes_per_browse),
        }
    }
}

fn sanitize_limit(limit: u32) -> u32 {
    if limit == 0 {
        DEFAULT_OPERATION_LIMIT
    } else {
        limit
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_canonical_roundtrip() {
        let cases = [
            "i=85",
            "ns=2;i=1001",
            "ns=2;s=Line1.Motor",
            "ns=4;b=SGVsbG8=",
        ];
        for case in cases {
            let parsed: NodeId = case.parse().unwrap();
            assert_eq!(parsed.to_canonical_string(), case);
        }
    }

    #[test]
    fn node_id_parse_rejects_garbage() {
        assert!("ns=2".parse::<NodeId>().is_err());
        assert!("ns=xyz;i=1".parse::<NodeId>().is_err());
        assert!("x=12".parse::<NodeId>().is_err());
        assert!("ns=2;i=notanumber".parse::<NodeId>().is_err());
    }

    #[test]
    fn node_id_standard_namespace_omits_prefix() {
        assert_eq!(NodeId::numeric(0, 85).to_canonical_string(), "i=85");
        assert!(NodeId::numeric(0, 85).is_standard());
        assert!(NodeId::null().is_null());
    }

    #[test]
    fn qualified_name_display() {
        assert_eq!(QualifiedName::standard("Objects").to_string(), "Objects");
        assert_eq!(QualifiedName::new(2, "Motor").to_string(), "2:Motor");
        let parsed = QualifiedName::from("3:Pump");
        assert_eq!(parsed.namespace_index, 3);
        assert_eq!(parsed.name, "Pump");
    }

    #[test]
    fn node_class_roundtrip() {
        for class in [
            NodeClass::Object,
            NodeClass::Variable,
            NodeClass::Method,
            NodeClass::ObjectType,
            NodeClass::VariableType,
            NodeClass::ReferenceType,
            NodeClass::DataType,
            NodeClass::View,
        ] {
            assert_eq!(NodeClass::from_value(class.value()), Some(class));
        }
        assert_eq!(NodeClass::from_value(3), None);
    }

    #[test]
    fn status_code_severity() {
        assert!(StatusCode::GOOD.is_good());
        assert!(StatusCode::BAD_ATTRIBUTE_ID_INVALID.is_bad());
        assert!(!StatusCode::BAD_ATTRIBUTE_ID_INVALID.is_good());
        assert!(StatusCode(0x4000_0000).is_uncertain());
    }

    #[test]
    fn status_code_symbolic_names() {
        assert_eq!(StatusCode::GOOD.symbolic_name(), "Good");
        assert_eq!(
            StatusCode::BAD_ATTRIBUTE_ID_INVALID.symbolic_name(),
            "BadAttributeIdInvalid"
        );
        assert_eq!(StatusCode(0x8FFF_0000).symbolic_name(), "Bad_0x8FFF0000");
    }

    #[test]
    fn variant_accessors() {
        assert_eq!(Variant::Int32(42).as_i64(), Some(42));
        assert_eq!(Variant::Double(2.5).as_f64(), Some(2.5));
        assert_eq!(Variant::LocalizedText("abc".into()).as_text(), Some("abc"));
        assert!(Variant::Null.is_null());
    }

    #[test]
    fn variant_json_conversion() {
        assert_eq!(Variant::Double(1.5).to_json(), serde_json::json!(1.5));
        assert_eq!(
            Variant::NodeId(NodeId::numeric(0, 2253)).to_json(),
            serde_json::json!("i=2253")
        );
        assert_eq!(Variant::Null.to_json(), serde_json::Value::Null);
        assert_eq!(
            Variant::Array(vec![Variant::Int32(1), Variant::Int32(2)]).to_json(),
            serde_json::json!([1, 2])
        );
    }

    #[test]
    fn browse_description_defaults() {
        let desc = BrowseDescription::forward(NodeId::numeric(0, 85), NodeId::numeric(0, 31));
        assert_eq!(desc.browse_direction, BrowseDirection::Forward);
        assert!(desc.include_subtypes);
        assert_eq!(desc.result_mask, result_mask::ALL);
        assert_eq!(desc.node_class_mask, 0);
    }

    #[test]
    fn operational_limits_sanitize() {
        let limits = OperationalLimits {
            max_nodes_per_read: 0,
            max_nodes_per_browse: 100,
        }
        .sanitized();
        assert_eq!(limits.max_nodes_per_read, DEFAULT_OPERATION_LIMIT);
        assert_eq!(limits.max_nodes_per_browse, 100);
    }
}
