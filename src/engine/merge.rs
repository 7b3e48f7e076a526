//! merge-one and merge-many.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::Context;
use crate::action::{Id, Page};
use crate::schema::{ResourceId, ResourceNode};
use crate::state::shape::generate_default_state_one;
use crate::state::{Collection, ComputedField, Entity, Fields, ResourceState};

/// What merge-one lays over an entity: incoming fields, and replacement
/// subresource slots when re-merging after a descent.
#[derive(Debug, Default)]
pub(super) struct Overlay {
    pub fields: Fields,
    pub slots: BTreeMap<String, Arc<ResourceState>>,
}

impl Overlay {
    pub fn fields(fields: Fields) -> Self {
        Self {
            fields,
            slots: BTreeMap::new(),
        }
    }
}

/// Target of a collection merge: the last integer id, else the resource's
/// own primary key.
pub(super) fn target_id(ids: &[Id], fields: &Fields, primary_key: &str) -> Option<Id> {
    ids.iter()
        .rev()
        .find(|id| id.is_numeric())
        .cloned()
        .or_else(|| fields.get(primary_key).and_then(Id::from_value))
}

pub(super) fn merge_one(
    ctx: &Context<'_>,
    node_id: ResourceId,
    state: &Arc<ResourceState>,
    ids: &[Id],
    overlay: Overlay,
) -> Arc<ResourceState> {
    let node = ctx.schema.node(node_id);
    match state.as_ref() {
        ResourceState::Singleton(singleton) => {
            let mut next = singleton.clone();
            let mut fields = overlay.fields;
            if !fields.is_empty() {
                next.invalid = false;
            }
            strip_masked(node, &mut fields);
            next.fields.extend(fields);
            Arc::new(ResourceState::Singleton(next))
        }
        ResourceState::Collection(collection) => {
            let Some(target) = target_id(ids, &overlay.fields, node.primary_key()) else {
                tracing::debug!(
                    path = %node.path(),
                    "ONE without a usable id or primary key; ignoring"
                );
                return Arc::clone(state);
            };
            let mut next = collection.clone();
            merge_into(ctx, node_id, &mut next, target, overlay);
            sort_ids(node, &mut next.ids);
            Arc::new(ResourceState::Collection(next))
        }
    }
}

/// Re-merge an entity keyed directly by `target`. Used after descending,
/// where the parent id may be a non-numeric key.
pub(super) fn merge_keyed(
    ctx: &Context<'_>,
    node_id: ResourceId,
    collection: &Collection,
    target: Id,
    overlay: Overlay,
) -> Arc<ResourceState> {
    let mut next = collection.clone();
    merge_into(ctx, node_id, &mut next, target, overlay);
    sort_ids(ctx.schema.node(node_id), &mut next.ids);
    Arc::new(ResourceState::Collection(next))
}

pub(super) fn merge_many(
    ctx: &Context<'_>,
    node_id: ResourceId,
    state: &Arc<ResourceState>,
    page: &Page,
) -> Arc<ResourceState> {
    let node = ctx.schema.node(node_id);
    let ResourceState::Collection(collection) = state.as_ref() else {
        tracing::debug!(path = %node.path(), "MANY on a singleton resource; ignoring");
        return Arc::clone(state);
    };

    let mut next = collection.clone();
    for item in &page.items {
        // Same path as a ONE carrying `ids: [item[primaryKey]]`.
        let ids: Vec<Id> = item
            .get(node.primary_key())
            .and_then(Id::from_value)
            .into_iter()
            .collect();
        match target_id(&ids, item, node.primary_key()) {
            Some(target) => merge_into(ctx, node_id, &mut next, target, Overlay::fields(item.clone())),
            None => tracing::debug!(
                path = %node.path(),
                primary_key = node.primary_key(),
                "Page item without a primary key; skipping"
            ),
        }
    }

    recompute_ids(&mut next);
    sort_ids(node, &mut next.ids);
    next.total_pages = page.pages;
    next.total_results = page.results;
    next.invalid = false;
    next.updated_at = Some(ctx.now);
    Arc::new(ResourceState::Collection(next))
}

fn merge_into(
    ctx: &Context<'_>,
    node_id: ResourceId,
    collection: &mut Collection,
    target: Id,
    overlay: Overlay,
) {
    let node = ctx.schema.node(node_id);
    let Overlay { mut fields, slots } = overlay;

    let existing = collection.entities.get(&target);
    let is_new = existing.is_none();
    let mut entity: Entity = match existing {
        Some(entity) => entity.as_ref().clone(),
        None => generate_default_state_one(ctx.schema, node_id, Fields::new()),
    };

    if !fields.is_empty() {
        entity.invalid = false;
    }
    entity.updated_at = Some(ctx.now);

    if let Some(dispatcher) = ctx.dispatch {
        for (name, accessor) in node.properties() {
            if fields.contains_key(name) {
                entity.computed.insert(
                    name.clone(),
                    ComputedField::new(Arc::clone(accessor), fields.clone(), dispatcher.clone()),
                );
            }
        }
    }

    strip_masked(node, &mut fields);
    entity.fields.extend(fields);
    entity.subresources.extend(slots);

    collection.entities.insert(target.clone(), Arc::new(entity));
    if is_new {
        collection.ids.push(target);
    }
}

fn strip_masked(node: &ResourceNode, fields: &mut Fields) {
    for key in node.property_masks() {
        fields.remove(key);
    }
}

/// Rebuild `ids` from the entity map, keeping the existing order and
/// appending anything missing.
pub(super) fn recompute_ids(collection: &mut Collection) {
    let entities = &collection.entities;
    collection.ids.retain(|id| entities.contains_key(id));
    let mut seen: BTreeSet<Id> = collection.ids.iter().cloned().collect();
    for id in entities.keys() {
        if seen.insert(id.clone()) {
            collection.ids.push(id.clone());
        }
    }
}

fn sort_ids(node: &ResourceNode, ids: &mut [Id]) {
    if let Some(sort) = node.sort() {
        ids.sort_by(|a, b| sort(a, b));
    }
}
