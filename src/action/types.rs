//! Action values and the `GEN@<path>/<OP>` type string.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::id::Id;
use crate::schema::{OpKind, ResourcePath};
use crate::state::Fields;
use crate::store::Dispatcher;

/// Prefix of every generated action type.
pub const TYPE_PREFIX: &str = "GEN@";

/// Errors from parsing an action-type string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionTypeError {
    #[error("Action type '{0}' does not start with 'GEN@'")]
    MissingPrefix(String),

    #[error("Action type '{0}' has no '/<OP>' suffix")]
    MissingOperation(String),

    #[error("Action type '{ty}' has unknown operation '{op}'")]
    UnknownOperation { ty: String, op: String },

    #[error("Action type '{0}' has an empty resource path")]
    EmptyPath(String),
}

/// The `(namespace, operation)` pair an action is routed on.
///
/// Rendered as `GEN@<dotted.path>/<OP>`. External tooling matches on that
/// literal form, so the separator and casing are fixed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionType {
    pub path: ResourcePath,
    pub op: OpKind,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", TYPE_PREFIX, self.path, self.op)
    }
}

impl FromStr for ActionType {
    type Err = ActionTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix(TYPE_PREFIX)
            .ok_or_else(|| ActionTypeError::MissingPrefix(s.to_string()))?;
        let (path, op) = rest
            .rsplit_once('/')
            .ok_or_else(|| ActionTypeError::MissingOperation(s.to_string()))?;
        let op = OpKind::parse(op).ok_or_else(|| ActionTypeError::UnknownOperation {
            ty: s.to_string(),
            op: op.to_string(),
        })?;
        let path = ResourcePath::parse(path);
        if path.is_empty() {
            return Err(ActionTypeError::EmptyPath(s.to_string()));
        }
        Ok(Self { path, op })
    }
}

/// One page of a paginated listing, already adapted from the API response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub items: Vec<Fields>,
    pub pages: i64,
    pub results: i64,
}

impl Page {
    pub fn new(items: Vec<Fields>, pages: i64, results: i64) -> Self {
        Self {
            items,
            pages,
            results,
        }
    }
}

/// What an action does, with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Create or overlay a single entity.
    One { resource: Fields },
    /// Fold a page of entities into the collection.
    Many { page: Page },
    /// Remove the entity keyed by the last id.
    Delete,
    /// Mark stale (`partial`) or purge.
    Invalidate { partial: bool },
}

impl Operation {
    pub fn kind(&self) -> OpKind {
        match self {
            Self::One { .. } => OpKind::One,
            Self::Many { .. } => OpKind::Many,
            Self::Delete => OpKind::Delete,
            Self::Invalidate { .. } => OpKind::Invalidate,
        }
    }
}

/// A dispatched action.
///
/// `ids` lists one id per level of the path that needs one: the parent
/// entity ids first, then (optionally) the target's own id.
#[derive(Debug, Clone)]
pub struct Action {
    pub path: ResourcePath,
    pub op: Operation,
    pub ids: Vec<Id>,
    /// Present when the action was produced by a thunk; enables computed
    /// fields on the merged entity.
    pub dispatch: Option<Dispatcher>,
}

impl Action {
    pub fn new(path: ResourcePath, op: Operation, ids: Vec<Id>) -> Self {
        Self {
            path,
            op,
            ids,
            dispatch: None,
        }
    }

    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatch = Some(dispatcher);
        self
    }

    pub fn kind(&self) -> OpKind {
        self.op.kind()
    }

    pub fn action_type(&self) -> ActionType {
        ActionType {
            path: self.path.clone(),
            op: self.kind(),
        }
    }
}
