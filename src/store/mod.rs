//! In-process host store.
//!
//! Holds the current [`StateTree`], runs thunks, and applies actions through
//! a [`ResourceReducer`] in dispatch order.
//!
//! # Architecture
//!
//! ```text
//! dispatch ──→ queue ──→ Thunk(dispatcher) ──→ queue ...
//!                 └────→ Action ──→ Reducer ──→ new StateTree
//! ```
//!
//! - `dispatch.rs` - `Dispatcher` handle, `Dispatchable`, thunks
//! - `reducer.rs` - `Reducer` trait (pure, no side effects)

mod dispatch;
mod reducer;

use std::sync::Arc;

use thiserror::Error;

use crate::action::Id;
use crate::engine::{ReduceError, ResourceReducer};
use crate::schema::{ResourcePath, Schema};
use crate::state::{Entity, ResourceState, StateTree};

pub use dispatch::{Dispatchable, Dispatcher, Thunk};
pub use reducer::Reducer;

/// Errors surfaced by the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error(transparent)]
    Reduce(#[from] ReduceError),

    #[error("Unknown resource path '{0}'")]
    UnknownPath(ResourcePath),

    #[error("Expected {expected} ids for '{path}', got {actual}")]
    IdCount {
        path: ResourcePath,
        expected: usize,
        actual: usize,
    },

    #[error("No '{path}' entity with id '{id}'")]
    MissingEntity { path: ResourcePath, id: Id },

    #[error("'{path}' entity has no pending computed field '{name}'")]
    UnknownField { path: ResourcePath, name: String },
}

pub struct Store {
    reducer: ResourceReducer,
    state: Arc<StateTree>,
    dispatcher: Dispatcher,
}

impl Store {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self::with_reducer(ResourceReducer::new(schema))
    }

    pub fn with_reducer(reducer: ResourceReducer) -> Self {
        let state = Arc::new(StateTree::initial(reducer.schema()));
        Self {
            reducer,
            state,
            dispatcher: Dispatcher::new(),
        }
    }

    pub fn state(&self) -> Arc<StateTree> {
        Arc::clone(&self.state)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        self.reducer.schema()
    }

    /// Handle feeding this store's queue.
    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    /// Enqueue `item` and process the queue until it is empty.
    pub fn dispatch(&mut self, item: impl Into<Dispatchable>) -> Result<(), StoreError> {
        self.dispatcher.dispatch(item);
        self.drain().map(|_| ())
    }

    /// Process queued dispatches in dispatch order. A thunk's own
    /// dispatches run before anything queued behind it. Returns how many
    /// were processed.
    ///
    /// On a reducer error the state stays at the last good tree and the
    /// rest of the queue is discarded.
    pub fn drain(&mut self) -> Result<usize, StoreError> {
        let mut processed = 0;
        while let Some(next) = self.dispatcher.pop() {
            processed += 1;
            match next {
                Dispatchable::Thunk(thunk) => self.dispatcher.run_thunk(thunk),
                Dispatchable::Action(action) => {
                    tracing::trace!(action = %action.action_type(), ids = ?action.ids, "Reducing");
                    match self.reducer.reduce(&self.state, &action) {
                        Ok(next) => self.state = Arc::new(next),
                        Err(err) => {
                            let dropped = self.dispatcher.clear();
                            tracing::warn!(
                                action = %action.action_type(),
                                error = %err,
                                dropped,
                                "Reducer rejected action"
                            );
                            return Err(err.into());
                        }
                    }
                }
            }
        }
        Ok(processed)
    }

    /// Look up the entity at `path`, one id per path segment.
    pub fn entity(&self, path: &ResourcePath, ids: &[Id]) -> Result<Arc<Entity>, StoreError> {
        let schema = self.reducer.schema();
        if ids.len() != path.len() {
            return Err(StoreError::IdCount {
                path: path.clone(),
                expected: path.len(),
                actual: ids.len(),
            });
        }

        let mut segments = path.segments().iter();
        let root_name = segments
            .next()
            .ok_or_else(|| StoreError::UnknownPath(path.clone()))?;
        let mut node = schema
            .root(root_name)
            .ok_or_else(|| StoreError::UnknownPath(path.clone()))?;
        let mut slot = self
            .state
            .branch(root_name)
            .cloned()
            .ok_or_else(|| StoreError::UnknownPath(path.clone()))?;

        let mut ids = ids.iter();
        loop {
            let id = ids.next().ok_or_else(|| StoreError::UnknownPath(path.clone()))?;
            let missing = || StoreError::MissingEntity {
                path: schema.node(node).path().clone(),
                id: id.clone(),
            };
            let entity = match slot.as_ref() {
                ResourceState::Collection(c) => c.entities.get(id).cloned().ok_or_else(missing)?,
                ResourceState::Singleton(_) => return Err(missing()),
            };

            let Some(segment) = segments.next() else {
                return Ok(entity);
            };
            node = schema
                .child(node, segment)
                .ok_or_else(|| StoreError::UnknownPath(path.clone()))?;
            slot = entity
                .slot(schema.node(node).key())
                .cloned()
                .ok_or_else(|| StoreError::UnknownPath(path.clone()))?;
        }
    }

    /// Resolve a computed field on the entity at `path` and process what
    /// it dispatched. Returns `false` if the field was already resolved.
    pub fn resolve_computed(
        &mut self,
        path: &ResourcePath,
        ids: &[Id],
        name: &str,
    ) -> Result<bool, StoreError> {
        let entity = self.entity(path, ids)?;
        let field = entity
            .computed(name)
            .ok_or_else(|| StoreError::UnknownField {
                path: path.clone(),
                name: name.to_string(),
            })?;
        let dispatched = field.resolve();
        if dispatched {
            self.drain()?;
        }
        Ok(dispatched)
    }
}
