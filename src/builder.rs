//! Resource graph building - decodes JSON documents into typed resources.
//!
//! Dispatches on `sys.type`. Arrays decode their `items` and `includes`
//! into one arena and index assets and entries by id; entries get link
//! placeholders and, when a schema is registered, a coerced typed view.
//! Links are never resolved here.

use serde_json::{Map, Value};

use crate::coerce::coerce;
use crate::error::DecodeError;
use crate::resource::{
    Array, Asset, ContentType, Entry, FieldMap, FieldValue, Handle, Resource, ResourceLink, Space,
    TypedFields,
};
use crate::resolver::resolve_links;
use crate::schema::SchemaRegistry;
use crate::types::{json_type_name, DecodeOptions, ResourceKind, ASSET_BUCKET, ENTRY_BUCKET};

/// Decodes JSON nodes using the schemas of one registry.
#[derive(Debug, Clone, Copy)]
pub struct GraphBuilder<'r> {
    registry: &'r SchemaRegistry,
}

impl<'r> GraphBuilder<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Decode a JSON node into a resource.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::UnsupportedResource` for tags other than Array,
    /// Asset, ContentType, Entry and Space, `MissingField`/`InvalidFieldType`
    /// for malformed nodes, and `Format` when a typed field fails coercion.
    pub fn decode(&self, node: &Value) -> Result<Resource, DecodeError> {
        self.decode_at(node, "")
    }

    fn decode_at(&self, node: &Value, path: &str) -> Result<Resource, DecodeError> {
        let sys = object_at(node, "sys", path)?;
        let sys_path = format!("{}/sys", path);
        let tag = str_at(sys, "type", &sys_path)?;

        match ResourceKind::parse(tag) {
            Some(ResourceKind::Array) => self.decode_array(node, sys, path).map(Resource::Array),
            Some(ResourceKind::Entry) => self.decode_entry(node, sys, path).map(Resource::Entry),
            Some(ResourceKind::Asset) => decode_asset(node, sys, path).map(Resource::Asset),
            Some(ResourceKind::ContentType) => {
                decode_content_type(node, sys, path).map(Resource::ContentType)
            }
            Some(ResourceKind::Space) => decode_space(node, sys, path).map(Resource::Space),
            Some(ResourceKind::Link) | None => Err(DecodeError::UnsupportedResource {
                tag: tag.to_string(),
            }),
        }
    }

    fn decode_array(
        &self,
        node: &Value,
        sys: &Map<String, Value>,
        path: &str,
    ) -> Result<Array, DecodeError> {
        let mut array = Array::new(
            sys.clone(),
            u64_at(node, "skip", path)?,
            u64_at(node, "limit", path)?,
            u64_at(node, "total", path)?,
        );

        let items_path = format!("{}/items", path);
        let items = node
            .get("items")
            .ok_or_else(|| DecodeError::missing(items_path.clone()))?;
        let items = expect_array(items, &items_path)?;

        for (i, item) in items.iter().enumerate() {
            let item_path = format!("{}/{}", items_path, i);
            let resource = self.decode_at(item, &item_path)?;
            let bucket = bucket_for(resource.kind());
            let handle = array.adopt(resource);
            if let Some(bucket) = bucket {
                index(&mut array, bucket, handle, &item_path)?;
            }
            array.items.push(handle);
        }

        // Includes overwrite same-id items in the index, never in `items`
        if let Some(includes) = node.get("includes").filter(|v| !v.is_null()) {
            let includes_path = format!("{}/includes", path);
            let includes = includes
                .as_object()
                .ok_or_else(|| invalid_type(&includes_path, "object", includes))?;

            for bucket in [ASSET_BUCKET, ENTRY_BUCKET] {
                let Some(list) = includes.get(bucket) else {
                    continue;
                };
                let list_path = format!("{}/{}", includes_path, bucket);
                for (i, item) in expect_array(list, &list_path)?.iter().enumerate() {
                    let item_path = format!("{}/{}", list_path, i);
                    let resource = self.decode_at(item, &item_path)?;
                    let kind = resource.kind();
                    let handle = array.adopt(resource);
                    match bucket_for(kind) {
                        Some(actual) => {
                            if actual != bucket {
                                tracing::warn!(
                                    path = %item_path,
                                    kind = %kind,
                                    "included resource listed under the wrong type"
                                );
                            }
                            index(&mut array, actual, handle, &item_path)?;
                        }
                        None => {
                            tracing::warn!(
                                path = %item_path,
                                kind = %kind,
                                "included resource cannot be linked, skipping index"
                            );
                        }
                    }
                }
            }
        }

        tracing::debug!(
            items = array.items.len(),
            assets = array.items_mapped.assets.len(),
            entries = array.items_mapped.entries.len(),
            "decoded array"
        );

        Ok(array)
    }

    fn decode_entry(
        &self,
        node: &Value,
        sys: &Map<String, Value>,
        path: &str,
    ) -> Result<Entry, DecodeError> {
        let content_type = sys
            .get("contentType")
            .and_then(|ct| ct.get("sys"))
            .and_then(|ct| ct.get("id"))
            .and_then(Value::as_str)
            .ok_or_else(|| DecodeError::missing(format!("{}/sys/contentType/sys/id", path)))?
            .to_string();

        // Entries whose fields are all empty arrive without a `fields` key
        let source_fields = match node.get("fields") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                return Err(invalid_type(&format!("{}/fields", path), "object", other));
            }
        };

        let fields: FieldMap = source_fields
            .iter()
            .map(|(id, value)| (id.clone(), extract_links(value)))
            .collect();

        let typed = match self.registry.lookup(&content_type) {
            Some(schema) => {
                let mut values = FieldMap::new();
                for descriptor in schema.fields() {
                    let Some(value) = fields.get(&descriptor.field_id) else {
                        continue;
                    };
                    if matches!(value, FieldValue::Json(Value::Null)) {
                        continue;
                    }
                    let coerced = coerce(value.clone(), descriptor.field_type).map_err(|source| {
                        DecodeError::Format {
                            content_type: content_type.clone(),
                            field: descriptor.field_id.clone(),
                            source,
                        }
                    })?;
                    values.insert(descriptor.name.clone(), coerced);
                }
                Some(TypedFields { schema, values })
            }
            None => None,
        };

        Ok(Entry {
            sys: sys.clone(),
            content_type,
            fields,
            typed,
            source_fields,
        })
    }
}

/// Decode a document and, for arrays, resolve links when `options` ask for it.
///
/// # Errors
///
/// Returns any `DecodeError` from [`GraphBuilder::decode`].
pub fn decode_document(
    registry: &SchemaRegistry,
    node: &Value,
    options: &DecodeOptions,
) -> Result<Resource, DecodeError> {
    let mut resource = GraphBuilder::new(registry).decode(node)?;

    if options.resolve_links {
        if let Resource::Array(array) = &mut resource {
            resolve_links(array);
        }
    }

    Ok(resource)
}

/// Replace link shapes by placeholders, directly or inside a sequence.
fn extract_links(value: &Value) -> FieldValue {
    if let Some(link) = ResourceLink::from_node(value) {
        return FieldValue::Link(link);
    }

    match value {
        Value::Array(elements) if elements.iter().any(|e| ResourceLink::from_node(e).is_some()) => {
            FieldValue::Sequence(
                elements
                    .iter()
                    .map(|e| match ResourceLink::from_node(e) {
                        Some(link) => FieldValue::Link(link),
                        None => FieldValue::Json(e.clone()),
                    })
                    .collect(),
            )
        }
        other => FieldValue::Json(other.clone()),
    }
}

fn decode_asset(node: &Value, sys: &Map<String, Value>, path: &str) -> Result<Asset, DecodeError> {
    let fields = object_at(node, "fields", path)?;
    let fields_path = format!("{}/fields", path);
    let file = fields
        .get("file")
        .ok_or_else(|| DecodeError::missing(format!("{}/file", fields_path)))?;
    let file_path = format!("{}/file", fields_path);
    let file = file
        .as_object()
        .ok_or_else(|| invalid_type(&file_path, "object", file))?;

    Ok(Asset {
        sys: sys.clone(),
        url: str_at(file, "url", &file_path)?.to_string(),
        mime_type: str_at(file, "contentType", &file_path)?.to_string(),
        fields: fields.clone(),
    })
}

fn decode_content_type(
    node: &Value,
    sys: &Map<String, Value>,
    path: &str,
) -> Result<ContentType, DecodeError> {
    let fields_path = format!("{}/fields", path);
    let list = node
        .get("fields")
        .ok_or_else(|| DecodeError::missing(fields_path.clone()))?;

    let mut fields = Map::new();
    for (i, field) in expect_array(list, &fields_path)?.iter().enumerate() {
        let field_path = format!("{}/{}", fields_path, i);
        let mut meta = field
            .as_object()
            .ok_or_else(|| invalid_type(&field_path, "object", field))?
            .clone();
        let id = match meta.remove("id") {
            Some(Value::String(id)) => id,
            Some(other) => return Err(invalid_type(&format!("{}/id", field_path), "string", &other)),
            None => return Err(DecodeError::missing(format!("{}/id", field_path))),
        };
        fields.insert(id, Value::Object(meta));
    }

    let root = node
        .as_object()
        .ok_or_else(|| invalid_type(path, "object", node))?;

    Ok(ContentType {
        sys: sys.clone(),
        name: str_at(root, "name", path)?.to_string(),
        display_field: optional_str(root, "displayField", path)?,
        description: optional_str(root, "description", path)?,
        fields,
    })
}

fn decode_space(node: &Value, sys: &Map<String, Value>, path: &str) -> Result<Space, DecodeError> {
    let root = node
        .as_object()
        .ok_or_else(|| invalid_type(path, "object", node))?;
    Ok(Space {
        sys: sys.clone(),
        name: str_at(root, "name", path)?.to_string(),
    })
}

// --- Internal helpers ---

fn bucket_for(kind: ResourceKind) -> Option<&'static str> {
    match kind {
        ResourceKind::Asset => Some(ASSET_BUCKET),
        ResourceKind::Entry => Some(ENTRY_BUCKET),
        _ => None,
    }
}

fn index(array: &mut Array, bucket: &str, handle: Handle, path: &str) -> Result<(), DecodeError> {
    let id = array
        .get(handle)
        .id()
        .ok_or_else(|| DecodeError::missing(format!("{}/sys/id", path)))?
        .to_string();
    if let Some(map) = array.items_mapped.bucket_mut(bucket) {
        map.insert(id, handle);
    }
    Ok(())
}

fn object_at<'a>(
    node: &'a Value,
    key: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, DecodeError> {
    let child_path = format!("{}/{}", path, key);
    let value = node
        .get(key)
        .ok_or_else(|| DecodeError::missing(child_path.clone()))?;
    value
        .as_object()
        .ok_or_else(|| invalid_type(&child_path, "object", value))
}

fn str_at<'a>(map: &'a Map<String, Value>, key: &str, path: &str) -> Result<&'a str, DecodeError> {
    let child_path = format!("{}/{}", path, key);
    let value = map
        .get(key)
        .ok_or_else(|| DecodeError::missing(child_path.clone()))?;
    value
        .as_str()
        .ok_or_else(|| invalid_type(&child_path, "string", value))
}

fn optional_str(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<Option<String>, DecodeError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(invalid_type(&format!("{}/{}", path, key), "string", other)),
    }
}

fn u64_at(node: &Value, key: &str, path: &str) -> Result<u64, DecodeError> {
    let child_path = format!("{}/{}", path, key);
    let value = node
        .get(key)
        .ok_or_else(|| DecodeError::missing(child_path.clone()))?;
    value
        .as_u64()
        .ok_or_else(|| invalid_type(&child_path, "unsigned integer", value))
}

fn expect_array<'a>(value: &'a Value, path: &str) -> Result<&'a Vec<Value>, DecodeError> {
    value
        .as_array()
        .ok_or_else(|| invalid_type(path, "array", value))
}

fn invalid_type(path: &str, expected: &'static str, actual: &Value) -> DecodeError {
    DecodeError::InvalidFieldType {
        path: path.to_string(),
        expected,
        actual: json_type_name(actual),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaDescriptor;
    use crate::types::FieldType;
    use serde_json::json;

    fn link(kind: &str, id: &str) -> Value {
        json!({ "sys": { "type": "Link", "linkType": kind, "id": id } })
    }

    fn cat_registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry
            .register(
                SchemaDescriptor::builder("cat")
                    .field("name", FieldType::Text)
                    .field("lives", FieldType::Number)
                    .field("likes", FieldType::List)
                    .field("birthday", FieldType::Date)
                    .field_with_id("best_friend", FieldType::Link, "bestFriend")
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
    }

    fn cat_node() -> Value {
        json!({
            "sys": {
                "type": "Entry",
                "id": "happycat",
                "contentType": { "sys": { "type": "Link", "linkType": "ContentType", "id": "cat" } }
            },
            "fields": {
                "name": "Happy Cat",
                "lives": "1",
                "likes": "cheezburger",
                "birthday": "2003-10-28T23:00:00+00:00",
                "bestFriend": link("Entry", "nyancat"),
                "image": link("Asset", "happycat")
            }
        })
    }

    #[test]
    fn entry_typed_view() {
        let registry = cat_registry();
        let resource = GraphBuilder::new(&registry).decode(&cat_node()).unwrap();
        let entry = resource.as_entry().unwrap();

        assert_eq!(entry.content_type(), "cat");
        assert_eq!(entry.get("name").and_then(FieldValue::as_str), Some("Happy Cat"));
        assert_eq!(entry.get("lives").and_then(FieldValue::as_i64), Some(1));
        assert_eq!(
            entry.get("likes").and_then(FieldValue::as_json),
            Some(&json!(["cheezburger"]))
        );
        assert!(entry.get("birthday").and_then(FieldValue::as_date).is_some());
        assert_eq!(
            entry.get("best_friend").and_then(FieldValue::as_link),
            Some(&ResourceLink::new("Entry", "nyancat"))
        );
        // Undeclared fields stay raw-only
        assert!(entry.get("image").is_none());
        assert!(entry.field("image").unwrap().is_placeholder());
    }

    #[test]
    fn entry_raw_fields_keep_placeholders() {
        let registry = cat_registry();
        let resource = GraphBuilder::new(&registry).decode(&cat_node()).unwrap();
        let entry = resource.as_entry().unwrap();

        assert_eq!(
            entry.field("bestFriend").and_then(FieldValue::as_link),
            Some(&ResourceLink::new("Entry", "nyancat"))
        );
        // Raw storage is not coerced
        assert_eq!(entry.field("lives").and_then(FieldValue::as_str), Some("1"));
        assert_eq!(entry.source_fields()["bestFriend"], link("Entry", "nyancat"));
    }

    #[test]
    fn entry_without_schema_is_generic() {
        let registry = SchemaRegistry::new();
        let resource = GraphBuilder::new(&registry).decode(&cat_node()).unwrap();
        let entry = resource.as_entry().unwrap();

        assert!(entry.typed().is_none());
        assert!(entry.get("name").is_none());
        assert!(entry.field("bestFriend").unwrap().is_placeholder());
        assert_eq!(entry.fields().len(), 6);
    }

    #[test]
    fn entry_sequence_links() {
        let node = json!({
            "sys": { "type": "Entry", "id": "e", "contentType": { "sys": { "id": "list" } } },
            "fields": {
                "entries": [link("Entry", "a"), "plain", link("Entry", "b")],
                "tags": ["x", "y"]
            }
        });
        let registry = SchemaRegistry::new();
        let resource = GraphBuilder::new(&registry).decode(&node).unwrap();
        let entry = resource.as_entry().unwrap();

        let seq = entry.field("entries").and_then(FieldValue::as_sequence).unwrap();
        assert!(seq[0].is_placeholder());
        assert_eq!(seq[1], FieldValue::Json(json!("plain")));
        assert!(seq[2].is_placeholder());
        assert_eq!(
            entry.field("tags"),
            Some(&FieldValue::Json(json!(["x", "y"])))
        );
    }

    #[test]
    fn symbol_field_holding_links_becomes_text() {
        let mut registry = SchemaRegistry::new();
        registry
            .register(
                SchemaDescriptor::builder("cat")
                    .field("friends", FieldType::Symbol)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let node = json!({
            "sys": { "type": "Entry", "id": "happycat", "contentType": { "sys": { "id": "cat" } } },
            "fields": { "friends": [link("Entry", "a")] }
        });

        let resource = GraphBuilder::new(&registry).decode(&node).unwrap();
        let entry = resource.as_entry().unwrap();

        let text = entry.get("friends").and_then(FieldValue::as_str).unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(text).unwrap(),
            json!([link("Entry", "a")])
        );
        // The raw view keeps the placeholder for resolution
        let raw = entry.field("friends").and_then(FieldValue::as_sequence).unwrap();
        assert!(raw[0].is_placeholder());
    }

    #[test]
    fn entry_format_error_names_field() {
        let mut node = cat_node();
        node["fields"]["lives"] = json!("nine");
        let registry = cat_registry();
        let result = GraphBuilder::new(&registry).decode(&node);
        assert!(matches!(
            result,
            Err(DecodeError::Format { ref field, ref content_type, .. })
                if field == "lives" && content_type == "cat"
        ));
    }

    #[test]
    fn entry_null_field_skipped_in_typed_view() {
        let mut node = cat_node();
        node["fields"]["lives"] = Value::Null;
        let registry = cat_registry();
        let resource = GraphBuilder::new(&registry).decode(&node).unwrap();
        let entry = resource.as_entry().unwrap();
        assert!(entry.get("lives").is_none());
        assert_eq!(entry.field("lives"), Some(&FieldValue::Json(Value::Null)));
    }

    #[test]
    fn entry_missing_content_type() {
        let node = json!({ "sys": { "type": "Entry", "id": "e" }, "fields": {} });
        let result = GraphBuilder::new(&SchemaRegistry::new()).decode(&node);
        assert!(matches!(
            result,
            Err(DecodeError::MissingField { path }) if path == "/sys/contentType/sys/id"
        ));
    }

    #[test]
    fn asset_file_descriptor() {
        let node = json!({
            "sys": { "type": "Asset", "id": "nyancat" },
            "fields": {
                "title": "Nyan Cat",
                "file": { "url": "//images.example.net/nyan.png", "contentType": "image/png" }
            }
        });
        let resource = GraphBuilder::new(&SchemaRegistry::new()).decode(&node).unwrap();
        let asset = resource.as_asset().unwrap();
        assert_eq!(asset.url, "//images.example.net/nyan.png");
        assert_eq!(asset.mime_type, "image/png");
        assert_eq!(asset.title(), Some("Nyan Cat"));
    }

    #[test]
    fn asset_missing_file() {
        let node = json!({ "sys": { "type": "Asset", "id": "a" }, "fields": {} });
        let result = GraphBuilder::new(&SchemaRegistry::new()).decode(&node);
        assert!(matches!(
            result,
            Err(DecodeError::MissingField { path }) if path == "/fields/file"
        ));
    }

    #[test]
    fn content_type_fields_by_id() {
        let node = json!({
            "sys": { "type": "ContentType", "id": "cat" },
            "name": "Cat",
            "displayField": "name",
            "fields": [
                { "id": "name", "name": "Name", "type": "Text" },
                { "id": "lives", "name": "Lives", "type": "Integer" }
            ]
        });
        let resource = GraphBuilder::new(&SchemaRegistry::new()).decode(&node).unwrap();
        let ct = resource.as_content_type().unwrap();
        assert_eq!(ct.name, "Cat");
        assert_eq!(ct.display_field.as_deref(), Some("name"));
        assert!(ct.description.is_none());
        assert_eq!(ct.fields["lives"], json!({ "name": "Lives", "type": "Integer" }));
        assert!(ct.fields["name"].get("id").is_none());
    }

    #[test]
    fn space_name() {
        let node = json!({ "sys": { "type": "Space", "id": "cfexampleapi" }, "name": "Example" });
        let resource = GraphBuilder::new(&SchemaRegistry::new()).decode(&node).unwrap();
        assert_eq!(resource.as_space().unwrap().name, "Example");
        assert_eq!(resource.to_string(), "<Space(sys.id=cfexampleapi)>");
    }

    #[test]
    fn unsupported_tags() {
        let builder_registry = SchemaRegistry::new();
        let builder = GraphBuilder::new(&builder_registry);
        for tag in ["Link", "Locale", "DeletedEntry"] {
            let node = json!({ "sys": { "type": tag, "id": "x" } });
            assert!(matches!(
                builder.decode(&node),
                Err(DecodeError::UnsupportedResource { tag: t }) if t == tag
            ));
        }
    }

    #[test]
    fn missing_sys() {
        let result = GraphBuilder::new(&SchemaRegistry::new()).decode(&json!({ "name": "x" }));
        assert!(matches!(result, Err(DecodeError::MissingField { path }) if path == "/sys"));
    }

    #[test]
    fn array_paging_must_be_numbers() {
        let node = json!({
            "sys": { "type": "Array" },
            "skip": "0", "limit": 100, "total": 0, "items": []
        });
        let result = GraphBuilder::new(&SchemaRegistry::new()).decode(&node);
        assert!(matches!(
            result,
            Err(DecodeError::InvalidFieldType { path, .. }) if path == "/skip"
        ));
    }

    #[test]
    fn nested_item_errors_carry_path() {
        let node = json!({
            "sys": { "type": "Array" },
            "skip": 0, "limit": 100, "total": 1,
            "items": [{ "sys": { "type": "Space", "id": "s" } }]
        });
        let result = GraphBuilder::new(&SchemaRegistry::new()).decode(&node);
        assert!(matches!(
            result,
            Err(DecodeError::MissingField { path }) if path == "/items/0/name"
        ));
    }
}
