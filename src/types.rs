//! Core types shared by the registry, builder and resolver.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Content type marker reserved for the generic entry representation.
pub const BASE_ENTRY_MARKER: &str = "Entry";

/// `items_mapped` bucket for assets.
pub const ASSET_BUCKET: &str = "Asset";

/// `items_mapped` bucket for entries.
pub const ENTRY_BUCKET: &str = "Entry";

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Resource type tag carried in `sys.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Array,
    Asset,
    ContentType,
    Entry,
    Space,
    Link,
}

impl ResourceKind {
    /// Parse a `sys.type` value.
    ///
    /// Returns `None` for unknown tags (caller should error).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Array" => Some(ResourceKind::Array),
            "Asset" => Some(ResourceKind::Asset),
            "ContentType" => Some(ResourceKind::ContentType),
            "Entry" => Some(ResourceKind::Entry),
            "Space" => Some(ResourceKind::Space),
            "Link" => Some(ResourceKind::Link),
            _ => None,
        }
    }

    /// Returns the wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Array => "Array",
            ResourceKind::Asset => "Asset",
            ResourceKind::ContentType => "ContentType",
            ResourceKind::Entry => "Entry",
            ResourceKind::Space => "Space",
            ResourceKind::Link => "Link",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared type of an entry field.
///
/// Serialized with the remote API's names (`"Boolean"`, `"MultipleEntries"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Boolean,
    Date,
    Link,
    Location,
    Number,
    Object,
    Symbol,
    Text,
    List,
    MultipleAssets,
    MultipleEntries,
}

impl FieldType {
    /// True for the sequence-valued types.
    pub fn is_sequence(&self) -> bool {
        matches!(
            self,
            FieldType::List | FieldType::MultipleAssets | FieldType::MultipleEntries
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Boolean => "Boolean",
            FieldType::Date => "Date",
            FieldType::Link => "Link",
            FieldType::Location => "Location",
            FieldType::Number => "Number",
            FieldType::Object => "Object",
            FieldType::Symbol => "Symbol",
            FieldType::Text => "Text",
            FieldType::List => "List",
            FieldType::MultipleAssets => "MultipleAssets",
            FieldType::MultipleEntries => "MultipleEntries",
        };
        f.write_str(name)
    }
}

/// Options for decoding a whole document.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Run the link resolver on array responses after decoding.
    pub resolve_links: bool,
}

impl DecodeOptions {
    /// Create options with link resolution enabled (default).
    pub fn new() -> Self {
        Self {
            resolve_links: true,
        }
    }

    /// Enable or disable local link resolution.
    pub fn resolve_links(mut self, resolve_links: bool) -> Self {
        self.resolve_links = resolve_links;
        self
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::new()
    }
}
