//! Decoded resources and the field values they carry.
//!
//! An [`Array`] owns every resource decoded from one response in an arena.
//! `items` and the `items_mapped` buckets refer into that arena by
//! [`Handle`], and a resolved link is stored as the handle of its target, so
//! two entries linking to each other share the same objects without copies.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};

use crate::schema::SchemaDescriptor;
use crate::types::{ResourceKind, ASSET_BUCKET, ENTRY_BUCKET};

/// Index of a resource inside the arena of one [`Array`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(pub(crate) usize);

impl Handle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Unresolved reference to another resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceLink {
    /// Target kind from `sys.linkType` (`"Entry"`, `"Asset"`, ...).
    pub link_type: String,
    /// Remote id of the target.
    pub id: String,
}

impl ResourceLink {
    pub fn new(link_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            link_type: link_type.into(),
            id: id.into(),
        }
    }

    /// Recognize a link shape: `{"sys": {"type": "Link", "linkType": .., "id": ..}}`.
    ///
    /// Returns `None` for anything else, including link-typed nodes that lack
    /// a string `linkType` or `id`.
    pub fn from_node(node: &Value) -> Option<Self> {
        let sys = node.get("sys")?.as_object()?;
        if sys.get("type").and_then(Value::as_str) != Some(ResourceKind::Link.as_str()) {
            return None;
        }
        let link_type = sys.get("linkType")?.as_str()?;
        let id = sys.get("id")?.as_str()?;
        Some(Self::new(link_type, id))
    }

    /// Wire form of this link.
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "sys": { "type": "Link", "linkType": self.link_type, "id": self.id }
        })
    }
}

impl fmt::Display for ResourceLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Link({}:{})>", self.link_type, self.id)
    }
}

/// Value of an entry field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Raw or coerced JSON value.
    Json(Value),
    /// Coerced date-time; inputs without an offset are read as UTC.
    Date(DateTime<FixedOffset>),
    /// Link placeholder awaiting resolution.
    Link(ResourceLink),
    /// Live reference to a resource in the owning array.
    Resolved(Handle),
    /// Sequence holding at least one link or resolved element.
    Sequence(Vec<FieldValue>),
}

impl FieldValue {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            FieldValue::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_json().and_then(Value::as_str)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_json().and_then(Value::as_i64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_json().and_then(Value::as_bool)
    }

    pub fn as_date(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            FieldValue::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_link(&self) -> Option<&ResourceLink> {
        match self {
            FieldValue::Link(link) => Some(link),
            _ => None,
        }
    }

    pub fn as_resolved(&self) -> Option<Handle> {
        match self {
            FieldValue::Resolved(h) => Some(*h),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// True for an unresolved link.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, FieldValue::Link(_))
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Json(value)
    }
}

/// Field storage keyed by remote field id or attribute name.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// A content entry.
#[derive(Debug, Clone)]
pub struct Entry {
    pub sys: Map<String, Value>,
    pub(crate) content_type: String,
    pub(crate) fields: FieldMap,
    pub(crate) typed: Option<TypedFields>,
    pub(crate) source_fields: Map<String, Value>,
}

/// Typed view of an entry bound to a registered schema.
#[derive(Debug, Clone)]
pub struct TypedFields {
    pub(crate) schema: Arc<SchemaDescriptor>,
    pub(crate) values: FieldMap,
}

impl TypedFields {
    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    /// Values keyed by attribute name.
    pub fn values(&self) -> &FieldMap {
        &self.values
    }
}

impl Entry {
    pub fn id(&self) -> Option<&str> {
        sys_id(&self.sys)
    }

    /// Content type id from `sys.contentType.sys.id`.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Raw fields keyed by remote id, links replaced by placeholders.
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn field(&self, field_id: &str) -> Option<&FieldValue> {
        self.fields.get(field_id)
    }

    /// Typed view, present when a schema matched the content type.
    pub fn typed(&self) -> Option<&TypedFields> {
        self.typed.as_ref()
    }

    /// Typed attribute by name. `None` for untyped entries.
    pub fn get(&self, attribute: &str) -> Option<&FieldValue> {
        self.typed.as_ref()?.values.get(attribute)
    }

    /// The entry's `fields` object exactly as received.
    pub fn source_fields(&self) -> &Map<String, Value> {
        &self.source_fields
    }
}

/// A media asset.
#[derive(Debug, Clone)]
pub struct Asset {
    pub sys: Map<String, Value>,
    pub url: String,
    pub mime_type: String,
    pub fields: Map<String, Value>,
}

impl Asset {
    pub fn id(&self) -> Option<&str> {
        sys_id(&self.sys)
    }

    pub fn title(&self) -> Option<&str> {
        self.fields.get("title").and_then(Value::as_str)
    }
}

/// A content type definition.
#[derive(Debug, Clone)]
pub struct ContentType {
    pub sys: Map<String, Value>,
    pub name: String,
    pub display_field: Option<String>,
    pub description: Option<String>,
    /// Field metadata keyed by field id (the `id` key itself removed).
    pub fields: Map<String, Value>,
}

/// A space.
#[derive(Debug, Clone)]
pub struct Space {
    pub sys: Map<String, Value>,
    pub name: String,
}

/// Assets and entries of one array, keyed by remote id.
#[derive(Debug, Clone, Default)]
pub struct ItemsMapped {
    pub(crate) assets: BTreeMap<String, Handle>,
    pub(crate) entries: BTreeMap<String, Handle>,
}

impl ItemsMapped {
    /// Bucket for `"Asset"` or `"Entry"`; `None` for other kinds.
    pub fn bucket(&self, kind: &str) -> Option<&BTreeMap<String, Handle>> {
        match kind {
            ASSET_BUCKET => Some(&self.assets),
            ENTRY_BUCKET => Some(&self.entries),
            _ => None,
        }
    }

    pub(crate) fn bucket_mut(&mut self, kind: &str) -> Option<&mut BTreeMap<String, Handle>> {
        match kind {
            ASSET_BUCKET => Some(&mut self.assets),
            ENTRY_BUCKET => Some(&mut self.entries),
            _ => None,
        }
    }

    pub fn assets(&self) -> &BTreeMap<String, Handle> {
        &self.assets
    }

    pub fn entries(&self) -> &BTreeMap<String, Handle> {
        &self.entries
    }

    pub fn get(&self, kind: &str, id: &str) -> Option<Handle> {
        self.bucket(kind)?.get(id).copied()
    }
}

/// A page of resources plus everything it includes.
#[derive(Debug, Clone)]
pub struct Array {
    pub sys: Map<String, Value>,
    pub skip: u64,
    pub limit: u64,
    pub total: u64,
    pub(crate) items: Vec<Handle>,
    pub(crate) items_mapped: ItemsMapped,
    pub(crate) arena: Vec<Resource>,
}

impl Array {
    pub(crate) fn new(sys: Map<String, Value>, skip: u64, limit: u64, total: u64) -> Self {
        Self {
            sys,
            skip,
            limit,
            total,
            items: Vec::new(),
            items_mapped: ItemsMapped::default(),
            arena: Vec::new(),
        }
    }

    /// Move a decoded resource into the arena.
    pub(crate) fn adopt(&mut self, resource: Resource) -> Handle {
        self.arena.push(resource);
        Handle(self.arena.len() - 1)
    }

    /// Number of listed items (includes excluded).
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Listed items in response order.
    pub fn items(&self) -> impl Iterator<Item = &Resource> + '_ {
        self.items.iter().map(move |h| &self.arena[h.0])
    }

    /// Handles of the listed items in response order.
    pub fn item_handles(&self) -> &[Handle] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&Resource> {
        self.items.get(index).map(|h| &self.arena[h.0])
    }

    /// First listed item, if the response reported any.
    pub fn first(&self) -> Option<&Resource> {
        if self.total > 0 {
            self.item(0)
        } else {
            None
        }
    }

    pub fn items_mapped(&self) -> &ItemsMapped {
        &self.items_mapped
    }

    /// Resource behind a handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle came from a different array.
    pub fn get(&self, handle: Handle) -> &Resource {
        &self.arena[handle.0]
    }

    pub fn entry(&self, id: &str) -> Option<&Entry> {
        let handle = self.items_mapped.get(ENTRY_BUCKET, id)?;
        self.get(handle).as_entry()
    }

    pub fn asset(&self, id: &str) -> Option<&Asset> {
        let handle = self.items_mapped.get(ASSET_BUCKET, id)?;
        self.get(handle).as_asset()
    }

    /// Find a link target among items and includes. No network access.
    pub fn lookup(&self, link: &ResourceLink) -> Option<Handle> {
        self.items_mapped.get(&link.link_type, &link.id)
    }

    /// Like [`Array::lookup`] for a raw link object.
    pub fn lookup_dict_link(&self, node: &Value) -> Option<Handle> {
        self.lookup(&ResourceLink::from_node(node)?)
    }
}

impl Index<usize> for Array {
    type Output = Resource;

    fn index(&self, index: usize) -> &Resource {
        &self.arena[self.items[index].0]
    }
}

/// Any decoded resource.
#[derive(Debug, Clone)]
pub enum Resource {
    Array(Array),
    Asset(Asset),
    ContentType(ContentType),
    Entry(Entry),
    Space(Space),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Array(_) => ResourceKind::Array,
            Resource::Asset(_) => ResourceKind::Asset,
            Resource::ContentType(_) => ResourceKind::ContentType,
            Resource::Entry(_) => ResourceKind::Entry,
            Resource::Space(_) => ResourceKind::Space,
        }
    }

    pub fn sys(&self) -> &Map<String, Value> {
        match self {
            Resource::Array(r) => &r.sys,
            Resource::Asset(r) => &r.sys,
            Resource::ContentType(r) => &r.sys,
            Resource::Entry(r) => &r.sys,
            Resource::Space(r) => &r.sys,
        }
    }

    pub fn id(&self) -> Option<&str> {
        sys_id(self.sys())
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Resource::Array(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_asset(&self) -> Option<&Asset> {
        match self {
            Resource::Asset(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_content_type(&self) -> Option<&ContentType> {
        match self {
            Resource::ContentType(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_entry(&self) -> Option<&Entry> {
        match self {
            Resource::Entry(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_space(&self) -> Option<&Space> {
        match self {
            Resource::Space(r) => Some(r),
            _ => None,
        }
    }

    pub fn into_array(self) -> Option<Array> {
        match self {
            Resource::Array(r) => Some(r),
            _ => None,
        }
    }
}

/// Renders as `<Entry(sys.id=nyancat)>`, or `<Entry>` without an id.
impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id() {
            Some(id) => write!(f, "<{}(sys.id={})>", self.kind(), id),
            None => write!(f, "<{}>", self.kind()),
        }
    }
}

fn sys_id(sys: &Map<String, Value>) -> Option<&str> {
    sys.get("id").and_then(Value::as_str)
}
