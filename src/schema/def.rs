//! Uncompiled resource definitions.
//!
//! A `ResourceDef` is the raw, nested description of one API resource.
//! Definitions are plain values: build them with the chained setters below
//! (or load them from TOML through [`crate::config`]) and hand the roots to
//! [`Schema::compile`](super::Schema::compile).

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::action::Id;
use crate::state::Fields;
use crate::store::Dispatchable;

/// Operations an action can carry.
///
/// `as_str()` is part of the action-type wire format; do not rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OpKind {
    One,
    Many,
    Delete,
    Invalidate,
}

impl OpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::One => "ONE",
            Self::Many => "MANY",
            Self::Delete => "DELETE",
            Self::Invalidate => "INVALIDATE",
        }
    }

    pub fn all() -> &'static [OpKind] {
        &[Self::One, Self::Many, Self::Delete, Self::Invalidate]
    }

    /// Parse the upper-case wire name. Unknown names return `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ONE" => Some(Self::One),
            "MANY" => Some(Self::Many),
            "DELETE" => Some(Self::Delete),
            "INVALIDATE" => Some(Self::Invalidate),
            _ => None,
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed id orderings available from configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ascending" | "asc" => Ok(Self::Ascending),
            "descending" | "desc" => Ok(Self::Descending),
            other => Err(format!("unknown sort order '{}'", other)),
        }
    }
}

/// Comparator applied to a collection's `ids` after every merge.
pub type SortFn = Arc<dyn Fn(&Id, &Id) -> Ordering + Send + Sync>;

/// Deferred computation for a computed field: given the partial resource
/// that carried the field, produce something to dispatch.
pub type Accessor = Arc<dyn Fn(&Fields) -> Dispatchable + Send + Sync>;

/// Raw definition of one resource and its subresources.
#[derive(Clone, Default)]
pub struct ResourceDef {
    pub(crate) singular: Option<String>,
    pub(crate) plural: Option<String>,
    pub(crate) primary_key: Option<String>,
    pub(crate) supports: BTreeSet<OpKind>,
    pub(crate) subresources: BTreeMap<String, ResourceDef>,
    pub(crate) properties: BTreeMap<String, Accessor>,
    pub(crate) property_masks: Vec<String>,
    pub(crate) sort: Option<SortFn>,
}

impl ResourceDef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a collection resource supporting ONE, MANY and DELETE.
    pub fn collection(singular: &str, plural: &str) -> Self {
        Self::new()
            .singular(singular)
            .plural(plural)
            .supports([OpKind::One, OpKind::Many, OpKind::Delete])
    }

    pub fn singular(mut self, name: &str) -> Self {
        self.singular = Some(name.to_string());
        self
    }

    pub fn plural(mut self, name: &str) -> Self {
        self.plural = Some(name.to_string());
        self
    }

    pub fn primary_key(mut self, key: &str) -> Self {
        self.primary_key = Some(key.to_string());
        self
    }

    pub fn supports<I: IntoIterator<Item = OpKind>>(mut self, ops: I) -> Self {
        self.supports.extend(ops);
        self
    }

    pub fn subresource(mut self, key: &str, def: ResourceDef) -> Self {
        self.subresources.insert(key.to_string(), def);
        self
    }

    /// Declare a computed field resolved through `accessor`.
    pub fn property<F>(mut self, name: &str, accessor: F) -> Self
    where
        F: Fn(&Fields) -> Dispatchable + Send + Sync + 'static,
    {
        self.properties.insert(name.to_string(), Arc::new(accessor));
        self
    }

    /// Strip `key` from incoming resources before they are stored.
    pub fn mask(mut self, key: &str) -> Self {
        self.property_masks.push(key.to_string());
        self
    }

    pub fn sort_by<F>(mut self, cmp: F) -> Self
    where
        F: Fn(&Id, &Id) -> Ordering + Send + Sync + 'static,
    {
        self.sort = Some(Arc::new(cmp));
        self
    }

    pub fn sort_order(self, order: SortOrder) -> Self {
        match order {
            SortOrder::Ascending => self.sort_by(|a, b| a.cmp(b)),
            SortOrder::Descending => self.sort_by(|a, b| b.cmp(a)),
        }
    }
}

impl fmt::Debug for ResourceDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDef")
            .field("singular", &self.singular)
            .field("plural", &self.plural)
            .field("primary_key", &self.primary_key)
            .field("supports", &self.supports)
            .field("subresources", &self.subresources)
            .field("properties", &self.properties.keys().collect::<Vec<_>>())
            .field("property_masks", &self.property_masks)
            .field("sorted", &self.sort.is_some())
            .finish()
    }
}
