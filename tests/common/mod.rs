//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use genstore::action::{Action, Id, Operation, Page};
use genstore::engine::ResourceReducer;
use genstore::schema::{OpKind, ResourceDef, ResourcePath, Schema};
use genstore::state::Fields;
use genstore::store::Store;
use serde_json::Value;

/// Timestamp stamped on every merge in tests.
pub fn fixed_now() -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(1_700_000_000_000)
}

pub fn fixed_now_millis() -> u64 {
    1_700_000_000_000
}

/// Object literal to `Fields`.
pub fn fields(value: Value) -> Fields {
    value
        .as_object()
        .cloned()
        .expect("fixture must be a JSON object")
}

pub fn page(items: Vec<Value>, pages: i64, results: i64) -> Page {
    Page::new(items.into_iter().map(fields).collect(), pages, results)
}

/// linodes { configs, disks } plus an `account` singleton.
pub fn linode_schema() -> Arc<Schema> {
    let linodes = ResourceDef::collection("linode", "linodes")
        .subresource("configs", ResourceDef::collection("config", "configs"))
        .subresource("disks", ResourceDef::collection("disk", "disks"));
    let account = ResourceDef::new()
        .singular("account")
        .supports([OpKind::One]);
    Arc::new(Schema::compile([("linodes", linodes), ("account", account)]).unwrap())
}

/// Store with a fixed clock.
pub fn store(schema: Arc<Schema>) -> Store {
    Store::with_reducer(ResourceReducer::new(schema).with_clock(fixed_now))
}

/// Plain (non-thunk) ONE action.
pub fn plain_one(path: &str, resource: Value, ids: Vec<Id>) -> Action {
    Action::new(
        ResourcePath::parse(path),
        Operation::One {
            resource: fields(resource),
        },
        ids,
    )
}
