//! Reducer engine for compiled resource schemas.
//!
//! Routing is structural: for a node at path `P` and an action at path `A`
//!
//! | Match                      | Handler     |
//! |----------------------------|-------------|
//! | `A == P`, ONE              | merge-one   |
//! | `A == P`, MANY             | merge-many  |
//! | `A == P`, DELETE           | delete      |
//! | `A == P`, INVALIDATE       | invalidate  |
//! | `P` strict prefix of `A`   | descend     |
//! | anything else              | unchanged   |
//!
//! Handlers never mutate their input. Unchanged state is returned as the
//! same `Arc`, and only the path from the root to the touched node is
//! rebuilt.

mod descend;
mod merge;
mod remove;

use std::sync::Arc;
use std::time::SystemTime;

use thiserror::Error;

use crate::action::{Action, Id, Operation};
use crate::schema::{ResourceId, ResourcePath, Schema};
use crate::state::shape::generate_default_state_full;
use crate::state::{ResourceState, StateTree};
use crate::store::{Dispatcher, Reducer};

/// Errors that escape the reducer.
///
/// Everything else (unknown paths, unknown subresources, unusable ids)
/// degrades to a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReduceError {
    /// A subresource action referenced a parent entity that was never
    /// fetched.
    #[error("No '{path}' entity with id '{id}' to descend into")]
    MissingEntity { path: ResourcePath, id: Id },
}

/// Per-dispatch inputs shared by all handlers.
pub(crate) struct Context<'a> {
    pub schema: &'a Schema,
    pub now: SystemTime,
    pub dispatch: Option<&'a Dispatcher>,
}

pub(crate) fn route(
    ctx: &Context<'_>,
    node_id: ResourceId,
    state: &Arc<ResourceState>,
    action: &Action,
    ids: &[Id],
) -> Result<Arc<ResourceState>, ReduceError> {
    let node = ctx.schema.node(node_id);
    if node.path() == &action.path {
        let next = match &action.op {
            Operation::One { resource } => {
                merge::merge_one(ctx, node_id, state, ids, merge::Overlay::fields(resource.clone()))
            }
            Operation::Many { page } => merge::merge_many(ctx, node_id, state, page),
            Operation::Delete => remove::delete(ctx, node_id, state, ids),
            Operation::Invalidate { partial } => {
                remove::invalidate(ctx, node_id, state, ids, *partial)
            }
        };
        return Ok(next);
    }
    if node.path().is_ancestor_of(&action.path) {
        return descend::descend(ctx, node_id, state, action, ids);
    }
    Ok(Arc::clone(state))
}

/// Reducer over a whole [`StateTree`] for one compiled schema.
#[derive(Clone)]
pub struct ResourceReducer {
    schema: Arc<Schema>,
    clock: fn() -> SystemTime,
}

impl ResourceReducer {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            clock: SystemTime::now,
        }
    }

    /// Replace the timestamp source used for `__updatedAt`.
    pub fn with_clock(mut self, clock: fn() -> SystemTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Reduce a single resource branch rooted at `node`.
    pub fn reduce_node(
        &self,
        node: ResourceId,
        state: &Arc<ResourceState>,
        action: &Action,
        now: SystemTime,
    ) -> Result<Arc<ResourceState>, ReduceError> {
        let ctx = Context {
            schema: &self.schema,
            now,
            dispatch: action.dispatch.as_ref(),
        };
        route(&ctx, node, state, action, &action.ids)
    }

    /// Reduce the whole tree with an explicit timestamp.
    pub fn reduce_at(
        &self,
        state: &StateTree,
        action: &Action,
        now: SystemTime,
    ) -> Result<StateTree, ReduceError> {
        let Some(root_name) = action.path.first() else {
            return Ok(state.clone());
        };
        let Some(root) = self.schema.root(root_name) else {
            tracing::debug!(action = %action.action_type(), "No resource for action; ignoring");
            return Ok(state.clone());
        };

        let branch = match state.branch(root_name) {
            Some(branch) => Arc::clone(branch),
            None => Arc::new(generate_default_state_full(self.schema.node(root))),
        };
        let next = self.reduce_node(root, &branch, action, now)?;
        if Arc::ptr_eq(&next, &branch) && state.branch(root_name).is_some() {
            return Ok(state.clone());
        }
        Ok(state.with_branch(root_name, next))
    }
}

impl Reducer for ResourceReducer {
    type State = StateTree;
    type Action = Action;
    type Error = ReduceError;

    fn reduce(&self, state: &StateTree, action: &Action) -> Result<StateTree, ReduceError> {
        self.reduce_at(state, action, (self.clock)())
    }
}
