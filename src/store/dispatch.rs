//! Dispatch handles, thunks and the pending-dispatch queue.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::action::Action;

/// A function of the dispatcher, run by the store when dequeued.
pub type Thunk = Box<dyn FnOnce(&Dispatcher) + Send>;

/// Anything the store accepts: a plain action or a thunk.
pub enum Dispatchable {
    Action(Action),
    Thunk(Thunk),
}

impl Dispatchable {
    pub fn thunk<F>(f: F) -> Self
    where
        F: FnOnce(&Dispatcher) + Send + 'static,
    {
        Self::Thunk(Box::new(f))
    }

    /// Wrap `action` in a thunk that attaches the live dispatcher before
    /// dispatching it. ONE and MANY are produced this way.
    pub fn deferred(action: Action) -> Self {
        Self::thunk(move |dispatcher| {
            dispatcher.dispatch(action.with_dispatcher(dispatcher.clone()));
        })
    }

    pub fn is_thunk(&self) -> bool {
        matches!(self, Self::Thunk(_))
    }

    /// The plain action, or `None` for a thunk.
    pub fn into_action(self) -> Option<Action> {
        match self {
            Self::Action(action) => Some(action),
            Self::Thunk(_) => None,
        }
    }
}

impl From<Action> for Dispatchable {
    fn from(action: Action) -> Self {
        Self::Action(action)
    }
}

impl fmt::Debug for Dispatchable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action(action) => f
                .debug_tuple("Action")
                .field(&action.action_type().to_string())
                .finish(),
            Self::Thunk(_) => f.write_str("Thunk"),
        }
    }
}

/// Cloneable handle that enqueues dispatches for the owning store.
///
/// Thunks and computed fields hold one of these instead of a borrow of the
/// store. What a thunk dispatches while it runs is processed before
/// anything that was already queued, in the order it was dispatched.
#[derive(Clone, Default)]
pub struct Dispatcher {
    queue: Arc<Mutex<VecDeque<Dispatchable>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&self, item: impl Into<Dispatchable>) {
        self.queue.lock().push_back(item.into());
    }

    /// Number of queued, not yet processed dispatches.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Take the next queued dispatch.
    pub fn pop(&self) -> Option<Dispatchable> {
        self.queue.lock().pop_front()
    }

    /// Run `thunk` so that its dispatches land ahead of the entries that
    /// were already pending.
    pub fn run_thunk(&self, thunk: Thunk) {
        let pending = std::mem::take(&mut *self.queue.lock());
        thunk(self);
        self.queue.lock().extend(pending);
    }

    /// Drop everything queued. Returns how many entries were discarded.
    pub fn clear(&self) -> usize {
        let mut queue = self.queue.lock();
        let dropped = queue.len();
        queue.clear();
        dropped
    }

    /// True if both handles feed the same queue.
    pub fn same_queue(&self, other: &Dispatcher) -> bool {
        Arc::ptr_eq(&self.queue, &other.queue)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("pending", &self.pending())
            .finish()
    }
}
