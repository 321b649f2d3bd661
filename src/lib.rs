//! CDA Graph
//!
//! Typed decoding and local link resolution for Content Delivery API
//! responses.
//!
//! A response is a JSON tree tagged by `sys.type`. This library turns it
//! into typed resources ([`Array`], [`Asset`], [`ContentType`], [`Entry`],
//! [`Space`]), coerces entry fields through registered schemas, and
//! rewrites link placeholders into references to resources of the same
//! array, cycles included.
//!
//! # Example
//!
//! ```
//! use cda_graph::{decode_document, DecodeOptions, FieldType, SchemaDescriptor, SchemaRegistry};
//! use serde_json::json;
//!
//! let mut registry = SchemaRegistry::new();
//! registry
//!     .register(
//!         SchemaDescriptor::builder("cat")
//!             .field("lives", FieldType::Number)
//!             .field_with_id("best_friend", FieldType::Link, "bestFriend")
//!             .build()
//!             .unwrap(),
//!     )
//!     .unwrap();
//!
//! let page = json!({
//!     "sys": { "type": "Array" },
//!     "total": 1, "skip": 0, "limit": 100,
//!     "items": [{
//!         "sys": { "type": "Entry", "id": "happycat", "contentType": { "sys": { "id": "cat" } } },
//!         "fields": {
//!             "lives": "9",
//!             "bestFriend": { "sys": { "type": "Link", "linkType": "Entry", "id": "nyancat" } }
//!         }
//!     }],
//!     "includes": { "Entry": [{
//!         "sys": { "type": "Entry", "id": "nyancat", "contentType": { "sys": { "id": "cat" } } },
//!         "fields": { "bestFriend": { "sys": { "type": "Link", "linkType": "Entry", "id": "happycat" } } }
//!     }] }
//! });
//!
//! let resource = decode_document(&registry, &page, &DecodeOptions::new()).unwrap();
//! let array = resource.as_array().unwrap();
//!
//! let happy = array.entry("happycat").unwrap();
//! assert_eq!(happy.get("lives").and_then(|v| v.as_i64()), Some(9));
//!
//! // The friend is the included entry itself, not a copy
//! let friend = happy.get("best_friend").and_then(|v| v.as_resolved()).unwrap();
//! assert_eq!(array.get(friend).id(), Some("nyancat"));
//! ```
//!
//! # Coercion
//!
//! | Declared type | Accepts | Produces |
//! |---------------|---------|----------|
//! | `Boolean` | anything | truthiness |
//! | `Date` | date strings | date-time (UTC when no offset) |
//! | `Number` | integers, integer strings, floats | integer |
//! | `Object` | objects, mapping literals | object |
//! | `Text` / `Symbol` | anything | string |
//! | `List`, `MultipleAssets`, `MultipleEntries` | anything | list (scalars wrapped) |
//! | `Link`, `Location` | anything | unchanged |
//!
//! Link placeholders pass through every declared type untouched.

pub mod builder;
pub mod coerce;
mod error;
pub mod literal;
pub mod loader;
pub mod render;
pub mod resolver;
pub mod resource;
pub mod schema;
mod types;

pub use builder::{decode_document, GraphBuilder};
pub use coerce::{coerce, convert, parse_date};
pub use error::{DecodeError, FormatError, LoadError, SchemaError};
pub use literal::parse_map_literal;
#[cfg(feature = "remote")]
pub use loader::load_document_url;
pub use loader::{
    is_url, load_document, load_document_auto, load_document_str, load_schemas,
    load_schemas_into,
};
pub use render::{render, summary};
pub use resolver::{resolve_links, unresolved_links, UnresolvedLink};
pub use resource::{
    Array, Asset, ContentType, Entry, FieldMap, FieldValue, Handle, ItemsMapped, Resource,
    ResourceLink, Space, TypedFields,
};
pub use schema::{FieldDescriptor, SchemaBuilder, SchemaDescriptor, SchemaRegistry};
pub use types::{
    json_type_name, DecodeOptions, FieldType, ResourceKind, ASSET_BUCKET, BASE_ENTRY_MARKER,
    ENTRY_BUCKET,
};
