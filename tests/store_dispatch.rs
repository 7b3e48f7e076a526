mod common;

use std::sync::Arc;

use common::{fields, plain_one, store};
use genstore::action::{Action, ActionBundle, Id, Operation};
use genstore::engine::ReduceError;
use genstore::schema::{ResourceDef, ResourcePath, Schema};
use genstore::state::Fields;
use genstore::store::{Dispatchable, Store, StoreError};
use serde_json::json;

/// linodes with a `_disks` computed field that loads disk 100 for the
/// linode it was read from.
fn disks_schema() -> Arc<Schema> {
    let linodes = ResourceDef::collection("linode", "linodes")
        .subresource("disks", ResourceDef::collection("disk", "disks"))
        .property("_disks", |partial: &Fields| {
            let parent = partial.get("id").and_then(Id::from_value).unwrap_or(Id::Num(0));
            let mut disk = Fields::new();
            disk.insert("id".to_string(), json!(100));
            disk.insert("size".to_string(), json!(25600));
            Action::new(
                ResourcePath::parse("linodes.disks"),
                Operation::One { resource: disk },
                vec![parent, Id::Num(100)],
            )
            .into()
        })
        .mask("_disks");
    Arc::new(Schema::compile([("linodes", linodes)]).unwrap())
}

fn linode_path() -> ResourcePath {
    ResourcePath::parse("linodes")
}

#[test]
fn thunk_dispatch_installs_computed_field() {
    let schema = disks_schema();
    let mut store = store(schema.clone());
    let linodes = ActionBundle::for_root(&schema, "linodes").unwrap();

    store
        .dispatch(
            linodes
                .one(fields(json!({"id": 1, "label": "web", "_disks": true})), [1])
                .unwrap(),
        )
        .unwrap();

    let entity = store.entity(&linode_path(), &[Id::Num(1)]).unwrap();
    assert!(entity.get("_disks").is_none());
    assert_eq!(entity.get("label"), Some(&json!("web")));

    let computed = entity.computed("_disks").unwrap();
    assert!(!computed.is_resolved());
    assert_eq!(computed.partial().get("_disks"), Some(&json!(true)));
}

#[test]
fn resolving_computed_field_fetches_once() {
    let schema = disks_schema();
    let mut store = store(schema.clone());
    let linodes = ActionBundle::for_root(&schema, "linodes").unwrap();
    store
        .dispatch(
            linodes
                .one(fields(json!({"id": 1, "_disks": null})), [1])
                .unwrap(),
        )
        .unwrap();

    assert!(store
        .resolve_computed(&linode_path(), &[Id::Num(1)], "_disks")
        .unwrap());

    let disk = store
        .entity(
            &ResourcePath::parse("linodes.disks"),
            &[Id::Num(1), Id::Num(100)],
        )
        .unwrap();
    assert_eq!(disk.get("size"), Some(&json!(25600)));

    assert!(!store
        .resolve_computed(&linode_path(), &[Id::Num(1)], "_disks")
        .unwrap());
}

#[test]
fn plain_action_has_no_computed_fields() {
    let schema = disks_schema();
    let mut store = store(schema);

    store
        .dispatch(plain_one("linodes", json!({"id": 2, "_disks": true}), vec![Id::Num(2)]))
        .unwrap();

    let entity = store.entity(&linode_path(), &[Id::Num(2)]).unwrap();
    assert!(entity.computed.is_empty());
    assert!(entity.get("_disks").is_none());

    let err = store
        .resolve_computed(&linode_path(), &[Id::Num(2)], "_disks")
        .unwrap_err();
    assert_eq!(
        err,
        StoreError::UnknownField {
            path: linode_path(),
            name: "_disks".to_string()
        }
    );
}

#[test]
fn entity_lookup_checks_id_count() {
    let store = store(disks_schema());
    let err = store
        .entity(&ResourcePath::parse("linodes.disks"), &[Id::Num(1)])
        .unwrap_err();
    assert_eq!(
        err,
        StoreError::IdCount {
            path: ResourcePath::parse("linodes.disks"),
            expected: 2,
            actual: 1
        }
    );

    let err = store.entity(&linode_path(), &[Id::Num(3)]).unwrap_err();
    assert_eq!(
        err,
        StoreError::MissingEntity {
            path: linode_path(),
            id: Id::Num(3)
        }
    );
}

#[test]
fn thunks_run_in_dispatch_order() {
    let mut store = store(disks_schema());

    let thunk = Dispatchable::thunk(|dispatcher| {
        dispatcher.dispatch(plain_one("linodes", json!({"id": 1, "label": "first"}), vec![Id::Num(1)]));
        dispatcher.dispatch(plain_one("linodes", json!({"id": 1, "label": "second"}), vec![Id::Num(1)]));
    });
    store.dispatch(thunk).unwrap();

    let entity = store.entity(&linode_path(), &[Id::Num(1)]).unwrap();
    assert_eq!(entity.get("label"), Some(&json!("second")));
}

#[test]
fn actions_from_one_thunk_apply_in_dispatch_order() {
    let schema = disks_schema();
    let mut store = store(schema.clone());
    let linodes = ActionBundle::for_root(&schema, "linodes").unwrap();

    let thunk = Dispatchable::thunk(move |dispatcher| {
        dispatcher.dispatch(linodes.one(fields(json!({"id": 9})), [9]).unwrap());
        dispatcher.dispatch(linodes.delete([9]).unwrap());
    });
    store.dispatch(thunk).unwrap();

    let state = store.state();
    let collection = state.collection("linodes").unwrap();
    assert!(collection.entity(9).is_none());
    assert!(collection.ids.is_empty());
}

#[test]
fn nested_thunk_runs_before_later_dispatches() {
    let schema = disks_schema();
    let mut store = store(schema.clone());
    let linodes = ActionBundle::for_root(&schema, "linodes").unwrap();

    let thunk = Dispatchable::thunk(move |dispatcher| {
        dispatcher.dispatch(
            linodes
                .one(fields(json!({"id": 4, "label": "first"})), [4])
                .unwrap(),
        );
        dispatcher.dispatch(plain_one(
            "linodes",
            json!({"id": 4, "label": "second"}),
            vec![Id::Num(4)],
        ));
    });
    store.dispatch(thunk).unwrap();

    let entity = store.entity(&linode_path(), &[Id::Num(4)]).unwrap();
    assert_eq!(entity.get("label"), Some(&json!("second")));
}

#[test]
fn reducer_error_discards_rest_of_queue() {
    let mut store = store(disks_schema());
    let dispatcher = store.dispatcher();

    dispatcher.dispatch(plain_one(
        "linodes.disks",
        json!({"id": 1}),
        vec![Id::Num(404), Id::Num(1)],
    ));
    dispatcher.dispatch(plain_one("linodes", json!({"id": 9}), vec![Id::Num(9)]));

    let err = store.drain().unwrap_err();
    assert_eq!(
        err,
        StoreError::Reduce(ReduceError::MissingEntity {
            path: linode_path(),
            id: Id::Num(404)
        })
    );
    assert_eq!(dispatcher.pending(), 0);
    assert!(store.state().collection("linodes").unwrap().is_empty());
}

#[test]
fn store_dispatcher_shares_the_queue() {
    let store: Store = store(disks_schema());
    assert!(store.dispatcher().same_queue(&store.dispatcher()));
}
