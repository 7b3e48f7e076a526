use std::fs;

use genstore::config::{Config, ConfigError};
use genstore::schema::{OpKind, ResourcePath, SchemaError, SortOrder};
use tempfile::TempDir;

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("resources.toml");
    fs::write(&path, content).unwrap();
    path
}

const LINODES: &str = r#"
[logging]
level = "debug"

[resources.linodes]
singular = "linode"
plural = "linodes"
supports = ["ONE", "MANY", "DELETE", "PUT"]
sort = "descending"
properiesMasks = ["_configs"]

[resources.linodes.subresources.configs]
plural = "configs"
supports = ["ONE", "MANY"]

[resources.account]
singular = "account"
supports = ["ONE"]
"#;

#[test]
fn loads_resource_tree() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, LINODES);

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.logging.level, "debug");

    let linodes = &config.resources["linodes"];
    assert_eq!(linodes.sort, Some(SortOrder::Descending));
    assert_eq!(linodes.property_masks, vec!["_configs".to_string()]);
    assert_eq!(linodes.subresources["configs"].plural.as_deref(), Some("configs"));

    let schema = config.compile().unwrap();
    assert_eq!(schema.len(), 3);
    let root = schema.root("linodes").unwrap();
    let node = schema.node(root);
    assert!(node.supports(OpKind::Delete));
    assert!(node.supports(OpKind::Invalidate));
    assert_eq!(node.primary_key(), "id");
    assert!(node.sort().is_some());

    let configs = schema.find(&ResourcePath::parse("linodes.configs")).unwrap();
    assert!(!schema.node(configs).supports(OpKind::Delete));
    assert!(!schema.node(schema.root("account").unwrap()).is_collection());
}

#[test]
fn logging_defaults_to_info() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[resources.volumes]\nplural = \"volumes\"\n");

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.logging.level, "info");
    assert!(config.resources["volumes"].supports.is_empty());
}

#[test]
fn snake_case_mask_key_is_accepted() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "[resources.volumes]\nplural = \"volumes\"\nproperty_masks = [\"_raw\"]\n",
    );

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.resources["volumes"].property_masks, vec!["_raw".to_string()]);
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let err = Config::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ReadError { .. }));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[resources.linodes\nplural = ");

    let err = Config::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
    assert!(err.to_string().contains("resources.toml"));
}

#[test]
fn unnamed_resource_fails_validation() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[resources.ghost]\nsupports = [\"ONE\"]\n");

    let err = Config::load_from(&path).unwrap_err();
    match err {
        ConfigError::ValidationError(SchemaError::Unnamed { key }) => assert_eq!(key, "ghost"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn duplicate_sibling_names_fail_validation() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[resources.a]
plural = "items"

[resources.b]
plural = "items"
"#,
    );

    let err = Config::load_from(&path).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::ValidationError(SchemaError::DuplicateName { .. })
    ));
}
