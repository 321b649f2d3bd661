//! Schema descriptors and the registry mapping content types to them.
//!
//! A descriptor binds a content type identifier to an ordered list of typed
//! attributes. Entries of a registered content type get a typed field view
//! next to their raw fields:
//!
//! ```
//! use cda_graph::{FieldType, SchemaDescriptor, SchemaRegistry};
//!
//! let cat = SchemaDescriptor::builder("cat")
//!     .field("name", FieldType::Text)
//!     .field("lives", FieldType::Number)
//!     .field_with_id("best_friend", FieldType::Link, "bestFriend")
//!     .build()
//!     .unwrap();
//!
//! let mut registry = SchemaRegistry::new();
//! registry.register(cat).unwrap();
//! assert!(registry.lookup("cat").is_some());
//! assert!(registry.lookup("dog").is_none());
//! ```
//!
//! Descriptors can also be read from JSON config files:
//!
//! ```json
//! [{ "content_type": "cat",
//!    "fields": [{ "name": "best_friend", "type": "Link", "id": "bestFriend" }] }]
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;
use crate::types::{FieldType, BASE_ENTRY_MARKER};

/// One typed attribute of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    /// Attribute name used for typed access.
    pub name: String,
    /// Declared type driving coercion.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Remote field id in the entry's `fields` object.
    #[serde(rename = "id")]
    pub field_id: String,
}

/// A validated content type schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaDescriptor {
    content_type: String,
    fields: Vec<FieldDescriptor>,
}

impl SchemaDescriptor {
    /// Start building a descriptor for `content_type`.
    pub fn builder(content_type: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            content_type: Some(content_type.into()),
            fields: Vec::new(),
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Declared fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Find a declared field by attribute name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Builder validating a descriptor when `build` is called.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    content_type: Option<String>,
    fields: Vec<FieldDescriptor>,
}

impl SchemaBuilder {
    /// Declare an attribute whose remote id equals its name.
    pub fn field(self, name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        let field_id = name.clone();
        self.field_with_id(name, field_type, field_id)
    }

    /// Declare an attribute read from a differently named remote field.
    pub fn field_with_id(
        mut self,
        name: impl Into<String>,
        field_type: FieldType,
        field_id: impl Into<String>,
    ) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.into(),
            field_type,
            field_id: field_id.into(),
        });
        self
    }

    /// Validate and produce the descriptor.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if the content type is missing, empty or the
    /// reserved base marker, or if an attribute name is empty or repeated.
    pub fn build(self) -> Result<SchemaDescriptor, SchemaError> {
        let content_type = self.content_type.unwrap_or_default();
        validate_content_type(&content_type)?;

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(SchemaError::EmptyFieldName { content_type });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    content_type: content_type.clone(),
                    name: field.name.clone(),
                });
            }
        }

        Ok(SchemaDescriptor {
            content_type,
            fields: self.fields,
        })
    }
}

fn validate_content_type(content_type: &str) -> Result<(), SchemaError> {
    if content_type.trim().is_empty() {
        return Err(SchemaError::MissingContentType);
    }
    if content_type == BASE_ENTRY_MARKER {
        return Err(SchemaError::ReservedContentType {
            marker: BASE_ENTRY_MARKER.to_string(),
        });
    }
    Ok(())
}

// --- JSON config form ---

#[derive(Deserialize)]
struct RawDescriptor {
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    fields: Vec<RawField>,
}

#[derive(Deserialize)]
struct RawField {
    name: String,
    #[serde(rename = "type")]
    field_type: FieldType,
    #[serde(default)]
    id: Option<String>,
}

impl RawDescriptor {
    fn into_descriptor(self) -> Result<SchemaDescriptor, SchemaError> {
        let mut builder = SchemaBuilder {
            content_type: self.content_type,
            fields: Vec::new(),
        };
        for field in self.fields {
            builder = match field.id {
                Some(id) => builder.field_with_id(field.name, field.field_type, id),
                None => builder.field(field.name, field.field_type),
            };
        }
        builder.build()
    }
}

/// Parse descriptors from JSON: a single descriptor object or an array of them.
///
/// # Errors
///
/// Returns `SchemaError::InvalidDescriptor` for JSON that doesn't have the
/// descriptor shape, or any validation error from the builder.
pub fn descriptors_from_json(value: &Value) -> Result<Vec<SchemaDescriptor>, SchemaError> {
    let raw: Vec<RawDescriptor> = match value {
        Value::Array(_) => serde_json::from_value(value.clone()),
        _ => serde_json::from_value(value.clone()).map(|d| vec![d]),
    }
    .map_err(|source| SchemaError::InvalidDescriptor { source })?;

    raw.into_iter().map(RawDescriptor::into_descriptor).collect()
}

/// Maps content type identifiers to schema descriptors.
///
/// Registration happens during setup; decoding only reads, so a finished
/// registry can be shared across threads behind a plain reference.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<SchemaDescriptor>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a JSON descriptor document.
    ///
    /// # Errors
    ///
    /// Returns the first `SchemaError` met while parsing or registering.
    pub fn from_json(value: &Value) -> Result<Self, SchemaError> {
        let mut registry = Self::new();
        for descriptor in descriptors_from_json(value)? {
            registry.register(descriptor)?;
        }
        Ok(registry)
    }

    /// Register a descriptor, replacing any previous one for its content type.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if the content type is empty or reserved.
    pub fn register(&mut self, descriptor: SchemaDescriptor) -> Result<(), SchemaError> {
        validate_content_type(&descriptor.content_type)?;

        let content_type = descriptor.content_type.clone();
        if self
            .schemas
            .insert(content_type.clone(), Arc::new(descriptor))
            .is_some()
        {
            tracing::warn!(
                content_type = %content_type,
                "schema registered twice, keeping the latest"
            );
        }
        Ok(())
    }

    /// Find the descriptor for a content type.
    pub fn lookup(&self, content_type: &str) -> Option<Arc<SchemaDescriptor>> {
        self.schemas.get(content_type).cloned()
    }

    /// Registered content types, sorted.
    pub fn content_types(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cat() -> SchemaDescriptor {
        SchemaDescriptor::builder("cat")
            .field("name", FieldType::Text)
            .field_with_id("best_friend", FieldType::Link, "bestFriend")
            .build()
            .unwrap()
    }

    #[test]
    fn builder_defaults_field_id_to_name() {
        let schema = cat();
        assert_eq!(schema.field("name").unwrap().field_id, "name");
        assert_eq!(schema.field("best_friend").unwrap().field_id, "bestFriend");
        assert_eq!(schema.fields().len(), 2);
    }

    #[test]
    fn builder_rejects_empty_content_type() {
        let result = SchemaDescriptor::builder("").build();
        assert!(matches!(result, Err(SchemaError::MissingContentType)));

        let result = SchemaDescriptor::builder("   ").build();
        assert!(matches!(result, Err(SchemaError::MissingContentType)));
    }

    #[test]
    fn builder_rejects_base_marker() {
        let result = SchemaDescriptor::builder("Entry").build();
        assert!(matches!(
            result,
            Err(SchemaError::ReservedContentType { marker }) if marker == "Entry"
        ));
    }

    #[test]
    fn builder_rejects_duplicate_attribute() {
        let result = SchemaDescriptor::builder("cat")
            .field("name", FieldType::Text)
            .field_with_id("name", FieldType::Symbol, "title")
            .build();
        assert!(matches!(
            result,
            Err(SchemaError::DuplicateField { name, .. }) if name == "name"
        ));
    }

    #[test]
    fn builder_rejects_empty_attribute() {
        let result = SchemaDescriptor::builder("cat")
            .field("", FieldType::Text)
            .build();
        assert!(matches!(result, Err(SchemaError::EmptyFieldName { .. })));
    }

    #[test]
    fn register_last_wins() {
        let mut registry = SchemaRegistry::new();
        registry.register(cat()).unwrap();
        let replacement = SchemaDescriptor::builder("cat")
            .field("color", FieldType::Symbol)
            .build()
            .unwrap();
        registry.register(replacement).unwrap();

        assert_eq!(registry.len(), 1);
        let found = registry.lookup("cat").unwrap();
        assert!(found.field("color").is_some());
        assert!(found.field("name").is_none());
    }

    #[test]
    fn lookup_missing_is_none() {
        let registry = SchemaRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.lookup("cat").is_none());
    }

    #[test]
    fn from_json_single_and_list() {
        let single = json!({
            "content_type": "cat",
            "fields": [{ "name": "best_friend", "type": "Link", "id": "bestFriend" }]
        });
        let registry = SchemaRegistry::from_json(&single).unwrap();
        assert_eq!(registry.content_types(), vec!["cat"]);

        let list = json!([
            { "content_type": "dog", "fields": [] },
            { "content_type": "cat", "fields": [{ "name": "lives", "type": "Number" }] }
        ]);
        let registry = SchemaRegistry::from_json(&list).unwrap();
        assert_eq!(registry.content_types(), vec!["cat", "dog"]);
        let lives = registry.lookup("cat").unwrap().field("lives").cloned().unwrap();
        assert_eq!(lives.field_id, "lives");
        assert_eq!(lives.field_type, FieldType::Number);
    }

    #[test]
    fn from_json_missing_content_type() {
        let result = SchemaRegistry::from_json(&json!({ "fields": [] }));
        assert!(matches!(result, Err(SchemaError::MissingContentType)));
    }

    #[test]
    fn from_json_unknown_field_type() {
        let value = json!({
            "content_type": "cat",
            "fields": [{ "name": "lives", "type": "Integer" }]
        });
        let result = SchemaRegistry::from_json(&value);
        assert!(matches!(result, Err(SchemaError::InvalidDescriptor { .. })));
    }
}
