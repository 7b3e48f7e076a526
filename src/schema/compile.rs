//! Compilation of resource definitions into a frozen, parent-linked arena.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use thiserror::Error;

use super::def::{Accessor, OpKind, ResourceDef, SortFn};
use super::path::ResourcePath;

/// Errors raised while compiling resource definitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Resource '{key}' has neither a plural nor a singular name")]
    Unnamed { key: String },

    #[error("Resource name '{name}' is declared twice under '{parent}'")]
    DuplicateName { parent: String, name: String },

    #[error("Resource '{path}' has an empty primary key")]
    EmptyPrimaryKey { path: String },
}

/// Handle to a node in a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(usize);

/// A compiled resource: a `ResourceDef` with defaults filled in and
/// links to its parent and children.
pub struct ResourceNode {
    key: String,
    name: String,
    singular: Option<String>,
    plural: Option<String>,
    primary_key: String,
    supports: BTreeSet<OpKind>,
    properties: BTreeMap<String, Accessor>,
    property_masks: Vec<String>,
    sort: Option<SortFn>,
    parent: Option<ResourceId>,
    /// Declared subresource key -> node.
    children: BTreeMap<String, ResourceId>,
    path: ResourcePath,
}

impl ResourceNode {
    /// Key this resource was declared under (root table or subresource key).
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Plural name if present, else singular. Used as the path segment.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn singular(&self) -> Option<&str> {
        self.singular.as_deref()
    }

    pub fn plural(&self) -> Option<&str> {
        self.plural.as_deref()
    }

    /// Collections are resources with a plural name; everything else is a
    /// singleton such as `account`.
    pub fn is_collection(&self) -> bool {
        self.plural.is_some()
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// INVALIDATE is implicit for every resource.
    pub fn supports(&self, op: OpKind) -> bool {
        op == OpKind::Invalidate || self.supports.contains(&op)
    }

    pub fn properties(&self) -> &BTreeMap<String, Accessor> {
        &self.properties
    }

    pub fn property_masks(&self) -> &[String] {
        &self.property_masks
    }

    pub fn sort(&self) -> Option<&SortFn> {
        self.sort.as_ref()
    }

    pub fn parent(&self) -> Option<ResourceId> {
        self.parent
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, ResourceId)> + '_ {
        self.children.iter().map(|(k, id)| (k.as_str(), *id))
    }

    /// Fully-qualified path, computed once at compile time.
    pub fn path(&self) -> &ResourcePath {
        &self.path
    }
}

impl fmt::Debug for ResourceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceNode")
            .field("path", &self.path.to_string())
            .field("primary_key", &self.primary_key)
            .field("supports", &self.supports)
            .field("children", &self.children)
            .finish()
    }
}

/// Immutable, compiled resource tree.
///
/// Nodes live in an arena and refer to each other by [`ResourceId`]; the
/// parent back-references are plain handles, so there is no ownership
/// cycle. Construct one per store (or per test) and share it by `Arc`.
#[derive(Debug)]
pub struct Schema {
    nodes: Vec<ResourceNode>,
    /// Root name -> node.
    roots: BTreeMap<String, ResourceId>,
}

impl Schema {
    /// Compile root definitions keyed by their declared key.
    pub fn compile<I, K>(roots: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (K, ResourceDef)>,
        K: Into<String>,
    {
        let mut schema = Schema {
            nodes: Vec::new(),
            roots: BTreeMap::new(),
        };

        for (key, def) in roots {
            let id = schema.compile_node(key.into(), def, None)?;
            let name = schema.nodes[id.0].name.clone();
            if schema.roots.insert(name.clone(), id).is_some() {
                return Err(SchemaError::DuplicateName {
                    parent: "<root>".to_string(),
                    name,
                });
            }
        }

        for index in 0..schema.nodes.len() {
            let path = schema.fully_qualified(ResourceId(index));
            if schema.nodes[index].primary_key.is_empty() {
                return Err(SchemaError::EmptyPrimaryKey {
                    path: path.to_string(),
                });
            }
            schema.nodes[index].path = path;
        }

        tracing::debug!(
            resources = schema.nodes.len(),
            roots = schema.roots.len(),
            "Compiled resource schema"
        );
        Ok(schema)
    }

    fn compile_node(
        &mut self,
        key: String,
        def: ResourceDef,
        parent: Option<ResourceId>,
    ) -> Result<ResourceId, SchemaError> {
        let name = def
            .plural
            .clone()
            .or_else(|| def.singular.clone())
            .ok_or_else(|| SchemaError::Unnamed { key: key.clone() })?;

        // Reserve the slot first so children can link back to it.
        let id = ResourceId(self.nodes.len());
        self.nodes.push(ResourceNode {
            key,
            name,
            singular: def.singular,
            plural: def.plural,
            primary_key: def.primary_key.unwrap_or_else(|| "id".to_string()),
            supports: def.supports,
            properties: def.properties,
            property_masks: def.property_masks,
            sort: def.sort,
            parent,
            children: BTreeMap::new(),
            path: ResourcePath::default(),
        });

        let mut children = BTreeMap::new();
        let mut names = BTreeSet::new();
        for (child_key, child_def) in def.subresources {
            let child = self.compile_node(child_key.clone(), child_def, Some(id))?;
            let child_name = self.nodes[child.0].name.clone();
            if !names.insert(child_name.clone()) {
                return Err(SchemaError::DuplicateName {
                    parent: self.nodes[id.0].name.clone(),
                    name: child_name,
                });
            }
            children.insert(child_key, child);
        }
        self.nodes[id.0].children = children;

        Ok(id)
    }

    pub fn node(&self, id: ResourceId) -> &ResourceNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Root resources by name.
    pub fn roots(&self) -> impl Iterator<Item = (&str, ResourceId)> + '_ {
        self.roots.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn root(&self, name: &str) -> Option<ResourceId> {
        self.roots.get(name).copied()
    }

    /// Child of `parent` whose name (not key) is `name`.
    pub fn child(&self, parent: ResourceId, name: &str) -> Option<ResourceId> {
        self.node(parent)
            .children
            .values()
            .copied()
            .find(|id| self.node(*id).name == name)
    }

    /// Resolve a dotted path to a node.
    pub fn find(&self, path: &ResourcePath) -> Option<ResourceId> {
        let mut segments = path.segments().iter();
        let mut current = self.root(segments.next()?)?;
        for segment in segments {
            current = self.child(current, segment)?;
        }
        Some(current)
    }

    /// Walk the parent chain to the root and join the names with `.`.
    pub fn fully_qualified(&self, id: ResourceId) -> ResourcePath {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id);
            names.push(node.name.clone());
            current = node.parent;
        }
        names.reverse();
        ResourcePath::new(names)
    }

    /// Every node, parents before children.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &ResourceNode)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (ResourceId(index), node))
    }
}
