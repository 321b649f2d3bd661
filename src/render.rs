//! JSON rendering of decoded resources.
//!
//! The decoded graph may contain cycles, so a resolved reference is never
//! expanded: it renders as the link stub of its target plus
//! `"resolved": true`. Dates render as RFC 3339 strings.

use std::collections::HashSet;

use serde_json::{json, Map, Value};

use crate::resource::{
    Array, Asset, ContentType, Entry, FieldMap, FieldValue, Handle, Resource, Space,
};

/// Render any resource to JSON.
pub fn render(resource: &Resource) -> Value {
    render_in(resource, None)
}

/// Short description of a decoded document: item counts, bucket sizes and
/// the links left unresolved.
pub fn summary(resource: &Resource) -> Value {
    let Resource::Array(array) = resource else {
        return json!({
            "type": resource.kind().as_str(),
            "id": resource.id(),
        });
    };

    let unresolved: Vec<Value> = array
        .unresolved_links()
        .into_iter()
        .map(|u| {
            json!({
                "entry": u.entry_id,
                "field": u.field,
                "link": format!("{}:{}", u.link.link_type, u.link.id),
            })
        })
        .collect();

    json!({
        "type": "Array",
        "total": array.total,
        "skip": array.skip,
        "limit": array.limit,
        "items": array.len(),
        "assets": array.items_mapped().assets().len(),
        "entries": array.items_mapped().entries().len(),
        "unresolved": unresolved,
    })
}

fn render_in(resource: &Resource, owner: Option<&Array>) -> Value {
    match resource {
        Resource::Array(array) => render_array(array),
        Resource::Asset(asset) => render_asset(asset),
        Resource::ContentType(content_type) => render_content_type(content_type),
        Resource::Entry(entry) => render_entry(entry, owner),
        Resource::Space(space) => render_space(space),
    }
}

fn render_array(array: &Array) -> Value {
    let items: Vec<Value> = array
        .items()
        .map(|item| render_in(item, Some(array)))
        .collect();

    // Includes are the mapped resources that are not listed items
    let listed: HashSet<Handle> = array.item_handles().iter().copied().collect();
    let mut includes = Map::new();
    for (bucket, mapped) in [
        ("Asset", array.items_mapped().assets()),
        ("Entry", array.items_mapped().entries()),
    ] {
        let extra: Vec<Value> = mapped
            .values()
            .filter(|h| !listed.contains(*h))
            .map(|h| render_in(array.get(*h), Some(array)))
            .collect();
        if !extra.is_empty() {
            includes.insert(bucket.to_string(), Value::Array(extra));
        }
    }

    let mut out = Map::new();
    out.insert("sys".into(), Value::Object(array.sys.clone()));
    out.insert("skip".into(), array.skip.into());
    out.insert("limit".into(), array.limit.into());
    out.insert("total".into(), array.total.into());
    out.insert("items".into(), Value::Array(items));
    if !includes.is_empty() {
        out.insert("includes".into(), Value::Object(includes));
    }
    Value::Object(out)
}

fn render_entry(entry: &Entry, owner: Option<&Array>) -> Value {
    let mut out = Map::new();
    out.insert("sys".into(), Value::Object(entry.sys.clone()));
    out.insert("fields".into(), render_fields(entry.fields(), owner));
    if let Some(typed) = entry.typed() {
        out.insert("typed".into(), render_fields(typed.values(), owner));
    }
    Value::Object(out)
}

fn render_fields(fields: &FieldMap, owner: Option<&Array>) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(key, value)| (key.clone(), render_value(value, owner)))
            .collect(),
    )
}

/// Render one field value. Resolved references need their owning array to
/// name the target.
pub fn render_value(value: &FieldValue, owner: Option<&Array>) -> Value {
    match value {
        FieldValue::Json(v) => v.clone(),
        FieldValue::Date(date) => Value::String(date.to_rfc3339()),
        FieldValue::Link(link) => link.to_json(),
        FieldValue::Resolved(handle) => {
            let stub = owner.map(|array| {
                let target = array.get(*handle);
                json!({
                    "type": "Link",
                    "linkType": target.kind().as_str(),
                    "id": target.id(),
                })
            });
            json!({
                "sys": stub.unwrap_or_else(|| json!({ "type": "Link" })),
                "resolved": true,
            })
        }
        FieldValue::Sequence(items) => Value::Array(
            items
                .iter()
                .map(|item| render_value(item, owner))
                .collect(),
        ),
    }
}

fn render_asset(asset: &Asset) -> Value {
    json!({
        "sys": asset.sys,
        "fields": asset.fields,
    })
}

fn render_content_type(content_type: &ContentType) -> Value {
    let fields: Vec<Value> = content_type
        .fields
        .iter()
        .map(|(id, meta)| {
            let mut field = Map::new();
            field.insert("id".into(), Value::String(id.clone()));
            if let Value::Object(meta) = meta {
                field.extend(meta.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Value::Object(field)
        })
        .collect();

    json!({
        "sys": content_type.sys,
        "name": content_type.name,
        "displayField": content_type.display_field,
        "description": content_type.description,
        "fields": fields,
    })
}

fn render_space(space: &Space) -> Value {
    json!({
        "sys": space.sys,
        "name": space.name,
    })
}
