//! Link resolution - rewrites placeholders into references to resources of
//! the same array.
//!
//! A single pass over the entries of `items_mapped`. Every target already
//! lives in the array's arena before the pass starts, so a placeholder only
//! has to be swapped for the target's handle. Nothing is followed
//! recursively, which makes cycles (two entries linking to each other)
//! resolve like any other link.

use crate::resource::{Array, FieldMap, FieldValue, ItemsMapped, Resource, ResourceLink};

/// Link still unresolved after a resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedLink {
    /// Id of the entry holding the link.
    pub entry_id: String,
    /// Remote field id holding the link.
    pub field: String,
    pub link: ResourceLink,
}

/// Resolve links of every mapped entry against the array's own resources.
///
/// Placeholders whose target is in `items_mapped` become
/// [`FieldValue::Resolved`]; the others stay as they are. A sequence is only
/// resolved when its first element is a placeholder. Both the typed view and
/// the raw fields are rewritten.
pub fn resolve_links(array: &mut Array) {
    let Array {
        arena,
        items_mapped,
        ..
    } = array;
    let index: &ItemsMapped = items_mapped;

    let mut tally = Tally::default();
    for handle in index.entries.values() {
        let Resource::Entry(entry) = &mut arena[handle.0] else {
            continue;
        };
        if let Some(typed) = entry.typed.as_mut() {
            resolve_fields(&mut typed.values, index, &mut tally);
        }
        resolve_fields(&mut entry.fields, index, &mut tally);
    }

    tracing::debug!(
        resolved = tally.resolved,
        unresolved = tally.unresolved,
        "resolved array links"
    );
}

/// Placeholders left in the raw fields of mapped entries.
///
/// Callers use this to decide which links need a remote lookup.
pub fn unresolved_links(array: &Array) -> Vec<UnresolvedLink> {
    let mut found = Vec::new();
    for (entry_id, handle) in &array.items_mapped.entries {
        let Some(entry) = array.get(*handle).as_entry() else {
            continue;
        };
        for (field, value) in &entry.fields {
            let mut push = |link: &ResourceLink| {
                found.push(UnresolvedLink {
                    entry_id: entry_id.clone(),
                    field: field.clone(),
                    link: link.clone(),
                })
            };
            match value {
                FieldValue::Link(link) => push(link),
                FieldValue::Sequence(items) => items
                    .iter()
                    .filter_map(FieldValue::as_link)
                    .for_each(&mut push),
                _ => {}
            }
        }
    }
    found
}

impl Array {
    /// See [`resolve_links`].
    pub fn resolve_links(&mut self) {
        resolve_links(self);
    }

    /// See [`unresolved_links`].
    pub fn unresolved_links(&self) -> Vec<UnresolvedLink> {
        unresolved_links(self)
    }
}

#[derive(Default)]
struct Tally {
    resolved: usize,
    unresolved: usize,
}

fn resolve_fields(fields: &mut FieldMap, index: &ItemsMapped, tally: &mut Tally) {
    for value in fields.values_mut() {
        match value {
            FieldValue::Link(_) => resolve_slot(value, index, tally),
            // Only the leading element decides whether a sequence holds links
            FieldValue::Sequence(items) if items.first().is_some_and(FieldValue::is_placeholder) => {
                for item in items.iter_mut() {
                    resolve_slot(item, index, tally);
                }
            }
            _ => {}
        }
    }
}

fn resolve_slot(slot: &mut FieldValue, index: &ItemsMapped, tally: &mut Tally) {
    let FieldValue::Link(link) = slot else {
        return;
    };
    match index.get(&link.link_type, &link.id) {
        Some(handle) => {
            *slot = FieldValue::Resolved(handle);
            tally.resolved += 1;
        }
        None => tally.unresolved += 1,
    }
}
