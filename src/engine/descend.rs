//! Descent into a parent entity's subresource slot.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::merge::{merge_keyed, Overlay};
use super::{route, Context, ReduceError};
use crate::action::{Action, Id};
use crate::schema::ResourceId;
use crate::state::shape::generate_default_state_full;
use crate::state::{Fields, ResourceState};

/// Route `action` into the slot of `entities[ids[0]]` that belongs to the
/// child named by the next path segment, then re-merge the parent.
pub(super) fn descend(
    ctx: &Context<'_>,
    node_id: ResourceId,
    state: &Arc<ResourceState>,
    action: &Action,
    ids: &[Id],
) -> Result<Arc<ResourceState>, ReduceError> {
    let node = ctx.schema.node(node_id);
    let Some(segment) = node.path().next_segment(&action.path) else {
        return Ok(Arc::clone(state));
    };
    let Some(child_id) = ctx.schema.child(node_id, segment) else {
        tracing::debug!(
            path = %node.path(),
            subresource = segment,
            "No such subresource; ignoring"
        );
        return Ok(Arc::clone(state));
    };
    let ResourceState::Collection(collection) = state.as_ref() else {
        tracing::debug!(path = %node.path(), "Cannot descend below a singleton; ignoring");
        return Ok(Arc::clone(state));
    };
    let Some((parent_id, rest)) = ids.split_first() else {
        tracing::debug!(path = %node.path(), "Subresource action without a parent id; ignoring");
        return Ok(Arc::clone(state));
    };

    let parent = collection
        .entities
        .get(parent_id)
        .ok_or_else(|| ReduceError::MissingEntity {
            path: node.path().clone(),
            id: parent_id.clone(),
        })?;

    let child = ctx.schema.node(child_id);
    let slot = parent
        .slot(child.key())
        .cloned()
        .unwrap_or_else(|| Arc::new(generate_default_state_full(child)));

    let next_slot = route(ctx, child_id, &slot, action, rest)?;
    if Arc::ptr_eq(&next_slot, &slot) {
        return Ok(Arc::clone(state));
    }

    let mut slots = BTreeMap::new();
    slots.insert(child.key().to_string(), next_slot);
    let overlay = Overlay {
        fields: Fields::new(),
        slots,
    };
    Ok(merge_keyed(ctx, node_id, collection, parent_id.clone(), overlay))
}
