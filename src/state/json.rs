//! JSON view of the state tree.
//!
//! Collections serialize as `{totalPages, totalResults, ids, <plural>: {..}}`
//! and entities flatten their fields next to `__updatedAt` (milliseconds
//! since the Unix epoch) and their subresource slots.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::{Collection, Entity, ResourceState, Singleton, StateTree};

const UPDATED_AT: &str = "__updatedAt";

fn epoch_millis(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        // A slot shadows a raw field of the same name.
        for (key, value) in &self.fields {
            if !self.subresources.contains_key(key) {
                map.serialize_entry(key, value)?;
            }
        }
        for (key, slot) in &self.subresources {
            map.serialize_entry(key, slot.as_ref())?;
        }
        if let Some(t) = self.updated_at {
            map.serialize_entry(UPDATED_AT, &epoch_millis(t))?;
        }
        if self.invalid {
            map.serialize_entry("invalid", &true)?;
        }
        map.end()
    }
}

struct EntityMap<'a>(&'a Collection);

impl Serialize for EntityMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.entities.len()))?;
        for (id, entity) in &self.0.entities {
            map.serialize_entry(&id.to_string(), entity.as_ref())?;
        }
        map.end()
    }
}

impl Serialize for Collection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("totalPages", &self.total_pages)?;
        map.serialize_entry("totalResults", &self.total_results)?;
        map.serialize_entry("ids", &self.ids)?;
        map.serialize_entry(&self.name, &EntityMap(self))?;
        if let Some(t) = self.updated_at {
            map.serialize_entry(UPDATED_AT, &epoch_millis(t))?;
        }
        if self.invalid {
            map.serialize_entry("invalid", &true)?;
        }
        map.end()
    }
}

impl Serialize for Singleton {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        if let Some(t) = self.updated_at {
            map.serialize_entry(UPDATED_AT, &epoch_millis(t))?;
        }
        if self.invalid {
            map.serialize_entry("invalid", &true)?;
        }
        map.end()
    }
}

impl Serialize for ResourceState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Collection(c) => c.serialize(serializer),
            Self::Singleton(s) => s.serialize(serializer),
        }
    }
}

impl Serialize for StateTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (name, branch) in self.branches() {
            map.serialize_entry(name, branch.as_ref())?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::super::shape::plural_default_state;
    use super::*;
    use crate::action::Id;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn default_collection_shape() {
        let value = serde_json::to_value(plural_default_state("whatever")).unwrap();
        assert_eq!(
            value,
            json!({"totalPages": -1, "totalResults": -1, "ids": [], "whatever": {}})
        );
    }

    #[test]
    fn entity_flattens_fields_and_stamp() {
        let mut collection = plural_default_state("parts");
        let mut entity = Entity::default();
        entity.fields.insert("name".to_string(), json!("bolt"));
        entity.updated_at = Some(UNIX_EPOCH + Duration::from_millis(1_500));
        collection.ids.push(Id::Num(1));
        collection.entities.insert(Id::Num(1), Arc::new(entity));

        let value = serde_json::to_value(&collection).unwrap();
        assert_eq!(
            value["parts"]["1"],
            json!({"name": "bolt", "__updatedAt": 1500})
        );
        assert_eq!(value["ids"], json!([1]));
    }

    #[test]
    fn slot_shadows_field_with_same_name() {
        let mut entity = Entity::default();
        entity.fields.insert("configs".to_string(), json!([1, 2]));
        entity.fields.insert("label".to_string(), json!("web"));
        entity.subresources.insert(
            "configs".to_string(),
            Arc::new(ResourceState::Collection(plural_default_state("configs"))),
        );

        let text = serde_json::to_string(&entity).unwrap();
        assert_eq!(text.matches("\"configs\":").count(), 2);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["configs"]["totalPages"], json!(-1));
        assert_eq!(value["label"], json!("web"));
    }
}
