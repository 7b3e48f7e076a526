//! delete and invalidate.

use std::sync::Arc;

use super::Context;
use crate::action::Id;
use crate::schema::ResourceId;
use crate::state::shape::generate_default_state_full;
use crate::state::{ResourceState, Singleton};

/// Remove the entity keyed by the last id.
pub(super) fn delete(
    ctx: &Context<'_>,
    node_id: ResourceId,
    state: &Arc<ResourceState>,
    ids: &[Id],
) -> Arc<ResourceState> {
    let node = ctx.schema.node(node_id);
    let ResourceState::Collection(collection) = state.as_ref() else {
        tracing::debug!(path = %node.path(), "DELETE on a singleton resource; ignoring");
        return Arc::clone(state);
    };
    let Some(target) = ids.last() else {
        tracing::debug!(path = %node.path(), "DELETE without ids; ignoring");
        return Arc::clone(state);
    };
    if !collection.entities.contains_key(target) {
        return Arc::clone(state);
    }

    let mut next = collection.clone();
    next.entities.remove(target);
    // retain keeps the existing order.
    next.ids.retain(|id| id != target);
    Arc::new(ResourceState::Collection(next))
}

/// Mark stale or purge, depending on `partial` and whether an id is given.
/// Only the first id is honored.
pub(super) fn invalidate(
    ctx: &Context<'_>,
    node_id: ResourceId,
    state: &Arc<ResourceState>,
    ids: &[Id],
    partial: bool,
) -> Arc<ResourceState> {
    let node = ctx.schema.node(node_id);
    let next = match state.as_ref() {
        ResourceState::Singleton(singleton) => {
            let mut next = if partial {
                Singleton {
                    invalid: true,
                    ..singleton.clone()
                }
            } else {
                Singleton::default()
            };
            next.updated_at = Some(ctx.now);
            ResourceState::Singleton(next)
        }
        ResourceState::Collection(collection) => {
            let mut next = match (partial, ids.first()) {
                (true, Some(id)) => {
                    let mut next = collection.clone();
                    match next.entities.get(id).cloned() {
                        Some(entity) => {
                            let mut entity = entity.as_ref().clone();
                            entity.invalid = true;
                            next.entities.insert(id.clone(), Arc::new(entity));
                        }
                        None => tracing::debug!(
                            path = %node.path(),
                            %id,
                            "Partial invalidation of an unknown entity"
                        ),
                    }
                    next
                }
                (true, None) => {
                    let mut next = collection.clone();
                    next.invalid = true;
                    next
                }
                (false, Some(id)) => {
                    let mut next = collection.clone();
                    next.entities.remove(id);
                    next.ids.retain(|existing| existing != id);
                    next
                }
                (false, None) => match generate_default_state_full(node) {
                    ResourceState::Collection(fresh) => fresh,
                    ResourceState::Singleton(_) => collection.clone(),
                },
            };
            next.updated_at = Some(ctx.now);
            ResourceState::Collection(next)
        }
    };
    Arc::new(next)
}
