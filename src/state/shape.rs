//! Default state shapes for collections, singletons and new entities.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{Collection, Entity, Fields, ResourceState, Singleton, NEVER_FETCHED};
use crate::schema::{ResourceId, ResourceNode, Schema};

/// Empty, never-fetched collection stored under `name`.
pub fn plural_default_state(name: &str) -> Collection {
    Collection {
        name: name.to_string(),
        total_pages: NEVER_FETCHED,
        total_results: NEVER_FETCHED,
        ids: Vec::new(),
        entities: BTreeMap::new(),
        invalid: false,
        updated_at: None,
    }
}

/// Default state for a whole resource branch.
pub fn generate_default_state_full(node: &ResourceNode) -> ResourceState {
    match node.plural() {
        Some(plural) => ResourceState::Collection(plural_default_state(plural)),
        None => ResourceState::Singleton(Singleton::default()),
    }
}

/// New entity from `raw` with a default slot for every declared
/// subresource, so nested collections are never absent.
pub fn generate_default_state_one(schema: &Schema, node: ResourceId, raw: Fields) -> Entity {
    let subresources = schema
        .node(node)
        .children()
        .map(|(key, child)| {
            let slot = generate_default_state_full(schema.node(child));
            (key.to_string(), Arc::new(slot))
        })
        .collect();

    Entity {
        fields: raw,
        subresources,
        ..Entity::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ResourceDef;
    use serde_json::json;

    #[test]
    fn plural_default_is_never_fetched() {
        let state = plural_default_state("whatever");
        assert_eq!(state.total_pages, -1);
        assert_eq!(state.total_results, -1);
        assert!(state.ids.is_empty());
        assert!(state.entities.is_empty());
        assert!(!state.is_fetched());
    }

    #[test]
    fn singleton_default_is_empty() {
        let schema =
            Schema::compile([("account", ResourceDef::new().singular("account"))]).unwrap();
        let node = schema.node(schema.root("account").unwrap());
        assert_eq!(
            generate_default_state_full(node),
            ResourceState::Singleton(Singleton::default())
        );
    }

    #[test]
    fn new_entity_gets_every_subresource_slot() {
        let def = ResourceDef::collection("linode", "linodes")
            .subresource("_configs", ResourceDef::new().plural("configs"))
            .subresource("_stats", ResourceDef::new().singular("stats"));
        let schema = Schema::compile([("linodes", def)]).unwrap();
        let root = schema.root("linodes").unwrap();

        let mut raw = Fields::new();
        raw.insert("label".to_string(), json!("one"));
        let entity = generate_default_state_one(&schema, root, raw);

        assert_eq!(entity.get("label"), Some(&json!("one")));
        let configs = entity.slot("_configs").unwrap().as_collection().unwrap();
        assert_eq!(configs.name, "configs");
        assert!(entity.slot("_stats").unwrap().as_singleton().is_some());
    }

    #[test]
    fn entity_without_subresources_is_just_fields() {
        let schema = Schema::compile([("volumes", ResourceDef::new().plural("volumes"))]).unwrap();
        let root = schema.root("volumes").unwrap();
        let entity = generate_default_state_one(&schema, root, Fields::new());
        assert!(entity.subresources.is_empty());
        assert!(entity.updated_at.is_none());
    }
}
