//! Normalized state tree.
//!
//! ```text
//! StateTree
//!  └─ branch per root resource ── ResourceState
//!                                  ├─ Collection { ids, entities: id → Entity }
//!                                  │                 └─ Entity { fields, slots: key → ResourceState }
//!                                  └─ Singleton { fields }
//! ```
//!
//! Every level is behind an `Arc`. Reducers rebuild only the spine from the
//! root to the changed node; everything else is shared with the previous
//! tree and stays pointer-equal.

mod computed;
mod json;
pub mod shape;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::SystemTime;

use serde_json::Value;

use crate::action::Id;
use crate::schema::Schema;

pub use computed::ComputedField;

/// Raw entity fields as received from the API.
pub type Fields = serde_json::Map<String, Value>;

/// Sentinel for `total_pages` / `total_results` before the first fetch.
pub const NEVER_FETCHED: i64 = -1;

/// A single API entity plus its bookkeeping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entity {
    pub fields: Fields,
    /// Stamped on every merge (`__updatedAt`).
    pub updated_at: Option<SystemTime>,
    pub invalid: bool,
    /// One state slot per declared subresource, keyed by subresource key.
    pub subresources: BTreeMap<String, Arc<ResourceState>>,
    pub computed: BTreeMap<String, ComputedField>,
}

impl Entity {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn slot(&self, key: &str) -> Option<&Arc<ResourceState>> {
        self.subresources.get(key)
    }

    pub fn computed(&self, name: &str) -> Option<&ComputedField> {
        self.computed.get(name)
    }
}

/// Normalized collection: entities by id plus the ordered id list.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    /// Plural name; the entity map is serialized under this key.
    pub name: String,
    pub total_pages: i64,
    pub total_results: i64,
    pub ids: Vec<Id>,
    pub entities: BTreeMap<Id, Arc<Entity>>,
    pub invalid: bool,
    pub updated_at: Option<SystemTime>,
}

impl Collection {
    pub fn entity(&self, id: impl Into<Id>) -> Option<&Arc<Entity>> {
        self.entities.get(&id.into())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// False until a page has been merged.
    pub fn is_fetched(&self) -> bool {
        self.total_pages != NEVER_FETCHED
    }
}

/// State of a resource without a plural name (e.g. `account`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Singleton {
    pub fields: Fields,
    pub updated_at: Option<SystemTime>,
    pub invalid: bool,
}

impl Singleton {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResourceState {
    Collection(Collection),
    Singleton(Singleton),
}

impl ResourceState {
    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Self::Collection(c) => Some(c),
            Self::Singleton(_) => None,
        }
    }

    pub fn as_singleton(&self) -> Option<&Singleton> {
        match self {
            Self::Singleton(s) => Some(s),
            Self::Collection(_) => None,
        }
    }

    pub fn updated_at(&self) -> Option<SystemTime> {
        match self {
            Self::Collection(c) => c.updated_at,
            Self::Singleton(s) => s.updated_at,
        }
    }

    pub fn is_invalid(&self) -> bool {
        match self {
            Self::Collection(c) => c.invalid,
            Self::Singleton(s) => s.invalid,
        }
    }
}

/// Top-level state: one branch per root resource, keyed by resource name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StateTree {
    branches: BTreeMap<String, Arc<ResourceState>>,
}

impl StateTree {
    /// Default state for every root resource in `schema`.
    pub fn initial(schema: &Schema) -> Self {
        let branches = schema
            .roots()
            .map(|(name, id)| {
                let state = shape::generate_default_state_full(schema.node(id));
                (name.to_string(), Arc::new(state))
            })
            .collect();
        Self { branches }
    }

    pub fn branch(&self, name: &str) -> Option<&Arc<ResourceState>> {
        self.branches.get(name)
    }

    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.branch(name).and_then(|b| b.as_collection())
    }

    pub fn singleton(&self, name: &str) -> Option<&Singleton> {
        self.branch(name).and_then(|b| b.as_singleton())
    }

    pub fn branches(&self) -> impl Iterator<Item = (&str, &Arc<ResourceState>)> + '_ {
        self.branches.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copy of this tree with one branch replaced; the rest is shared.
    pub fn with_branch(&self, name: &str, state: Arc<ResourceState>) -> Self {
        let mut branches = self.branches.clone();
        branches.insert(name.to_string(), state);
        Self { branches }
    }
}
