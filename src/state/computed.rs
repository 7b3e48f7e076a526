//! Computed fields: deferred, dispatch-backed values on an entity.
//!
//! A computed field is installed when an entity is merged from a thunk
//! dispatch and the incoming resource carries a declared property. Reading
//! the entity never triggers anything; the access layer has to call
//! [`ComputedField::resolve`] (usually via `Store::resolve_computed`).

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::schema::Accessor;
use crate::state::Fields;
use crate::store::Dispatcher;

#[derive(Clone)]
pub struct ComputedField {
    accessor: Accessor,
    partial: Fields,
    dispatcher: Dispatcher,
    /// Shared by every clone of the owning entity.
    resolved: Arc<AtomicBool>,
}

impl ComputedField {
    pub fn new(accessor: Accessor, partial: Fields, dispatcher: Dispatcher) -> Self {
        Self {
            accessor,
            partial,
            dispatcher,
            resolved: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The resource as it arrived, before masking.
    pub fn partial(&self) -> &Fields {
        &self.partial
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.load(Ordering::SeqCst)
    }

    /// Dispatch `accessor(partial)` on the first call only.
    ///
    /// Returns `true` if this call dispatched. The dispatch is queued; the
    /// store processes it on its next drain.
    pub fn resolve(&self) -> bool {
        if self.resolved.swap(true, Ordering::SeqCst) {
            return false;
        }
        let next = (self.accessor)(&self.partial);
        tracing::trace!(pending = ?next, "Resolving computed field");
        self.dispatcher.dispatch(next);
        true
    }
}

impl PartialEq for ComputedField {
    fn eq(&self, other: &Self) -> bool {
        self.partial == other.partial && self.is_resolved() == other.is_resolved()
    }
}

impl fmt::Debug for ComputedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedField")
            .field("partial", &self.partial)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, Id, Operation};
    use crate::schema::ResourcePath;
    use serde_json::json;

    #[test]
    fn resolves_once() {
        let dispatcher = Dispatcher::new();
        let accessor: Accessor = Arc::new(|partial: &Fields| {
            let id = partial.get("id").and_then(Id::from_value).unwrap_or(Id::Num(0));
            Action::new(
                ResourcePath::parse("linodes.disks"),
                Operation::Invalidate { partial: false },
                vec![id],
            )
            .into()
        });
        let mut partial = Fields::new();
        partial.insert("id".to_string(), json!(7));
        let field = ComputedField::new(accessor, partial, dispatcher.clone());

        let clone = field.clone();
        assert!(field.resolve());
        assert!(!field.resolve());
        assert!(clone.is_resolved());
        assert_eq!(dispatcher.pending(), 1);
    }
}
