//! Action creators generated from a compiled schema.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Index;

use thiserror::Error;

use super::id::{coerce, Id};
use super::types::{Action, ActionType, Operation, Page};
use crate::schema::{OpKind, ResourceId, ResourcePath, Schema};
use crate::state::Fields;
use crate::store::Dispatchable;

/// Errors from building actions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("'{path}' does not support {op}")]
    Unsupported { path: ResourcePath, op: OpKind },

    #[error("Unknown resource '{0}'")]
    UnknownResource(String),
}

/// Action creators for one resource, with nested bundles for its
/// subresources keyed by subresource name.
///
/// ONE and MANY produce thunks so the merged entity can reach the
/// dispatcher for computed fields; DELETE and INVALIDATE are plain actions.
#[derive(Debug, Clone)]
pub struct ActionBundle {
    type_name: String,
    path: ResourcePath,
    supports: BTreeSet<OpKind>,
    children: BTreeMap<String, ActionBundle>,
}

/// Build the bundle for `node` and, recursively, its subresources.
pub fn gen_actions(schema: &Schema, node: ResourceId) -> ActionBundle {
    let resource = schema.node(node);
    let supports = OpKind::all()
        .iter()
        .copied()
        .filter(|op| resource.supports(*op))
        .collect();
    let children = resource
        .children()
        .map(|(_, child)| {
            let name = schema.node(child).name().to_string();
            (name, gen_actions(schema, child))
        })
        .collect();

    ActionBundle {
        type_name: resource.name().to_string(),
        path: schema.fully_qualified(node),
        supports,
        children,
    }
}

impl ActionBundle {
    /// Bundle for the root resource called `name`.
    pub fn for_root(schema: &Schema, name: &str) -> Result<Self, ActionError> {
        let root = schema
            .root(name)
            .ok_or_else(|| ActionError::UnknownResource(name.to_string()))?;
        Ok(gen_actions(schema, root))
    }

    /// The resource's own name. Display only; never dispatched.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    pub fn supports(&self, op: OpKind) -> bool {
        self.supports.contains(&op)
    }

    /// Nested bundle by subresource name.
    pub fn child(&self, name: &str) -> Option<&ActionBundle> {
        self.children.get(name)
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &ActionBundle)> + '_ {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn action_type(&self, op: OpKind) -> ActionType {
        ActionType {
            path: self.path.clone(),
            op,
        }
    }

    fn require(&self, op: OpKind) -> Result<(), ActionError> {
        if self.supports(op) {
            Ok(())
        } else {
            Err(ActionError::Unsupported {
                path: self.path.clone(),
                op,
            })
        }
    }

    /// Thunk dispatching `GEN@<path>/ONE`.
    pub fn one<I, T>(&self, resource: Fields, ids: I) -> Result<Dispatchable, ActionError>
    where
        I: IntoIterator<Item = T>,
        T: Into<Id>,
    {
        self.require(OpKind::One)?;
        let action = Action::new(self.path.clone(), Operation::One { resource }, coerce(ids));
        Ok(Dispatchable::deferred(action))
    }

    /// Thunk dispatching `GEN@<path>/MANY`.
    pub fn many<I, T>(&self, page: Page, ids: I) -> Result<Dispatchable, ActionError>
    where
        I: IntoIterator<Item = T>,
        T: Into<Id>,
    {
        self.require(OpKind::Many)?;
        let action = Action::new(self.path.clone(), Operation::Many { page }, coerce(ids));
        Ok(Dispatchable::deferred(action))
    }

    /// Plain `GEN@<path>/DELETE` action.
    pub fn delete<I, T>(&self, ids: I) -> Result<Action, ActionError>
    where
        I: IntoIterator<Item = T>,
        T: Into<Id>,
    {
        self.require(OpKind::Delete)?;
        Ok(Action::new(self.path.clone(), Operation::Delete, coerce(ids)))
    }

    /// Plain `GEN@<path>/INVALIDATE` action. Available on every resource.
    pub fn invalidate<I, T>(&self, ids: I, partial: bool) -> Action
    where
        I: IntoIterator<Item = T>,
        T: Into<Id>,
    {
        Action::new(
            self.path.clone(),
            Operation::Invalidate { partial },
            coerce(ids),
        )
    }

    /// `invalidate` with no ids: applies to the whole branch.
    pub fn invalidate_all(&self, partial: bool) -> Action {
        self.invalidate(Vec::<Id>::new(), partial)
    }
}

impl Index<&str> for ActionBundle {
    type Output = ActionBundle;

    /// Panics if `name` is not a declared subresource.
    fn index(&self, name: &str) -> &ActionBundle {
        match self.children.get(name) {
            Some(bundle) => bundle,
            None => panic!("'{}' has no subresource '{}'", self.path, name),
        }
    }
}
