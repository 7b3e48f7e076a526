use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::{OpKind, ResourceDef, Schema, SchemaError, SortOrder};

/// Root configuration container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Root resources keyed by their declared key.
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceEntry>,
}

/// Logging settings. `RUST_LOG` takes precedence when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive (default: "info").
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// One resource as written in the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceEntry {
    #[serde(default)]
    pub singular: Option<String>,
    #[serde(default)]
    pub plural: Option<String>,
    /// Primary key field (default: "id").
    #[serde(default)]
    pub primary_key: Option<String>,
    /// Upper-case operation names. Unknown names (PUT, POST, ...) are
    /// ignored.
    #[serde(default)]
    pub supports: Vec<String>,
    #[serde(default)]
    pub sort: Option<SortOrder>,
    /// Keys stripped from incoming resources. The file key keeps its
    /// historical spelling.
    #[serde(default, rename = "properiesMasks", alias = "property_masks")]
    pub property_masks: Vec<String>,
    #[serde(default)]
    pub subresources: BTreeMap<String, ResourceEntry>,
}

impl ResourceEntry {
    /// Convert into a builder definition, recursively.
    pub fn to_def(&self, key: &str) -> ResourceDef {
        let mut def = ResourceDef::new();
        if let Some(singular) = &self.singular {
            def = def.singular(singular);
        }
        if let Some(plural) = &self.plural {
            def = def.plural(plural);
        }
        if let Some(primary_key) = &self.primary_key {
            def = def.primary_key(primary_key);
        }

        let mut ops = Vec::new();
        for name in &self.supports {
            match OpKind::parse(name) {
                Some(op) => ops.push(op),
                None => tracing::debug!(
                    resource = key,
                    capability = %name,
                    "Ignoring unknown capability"
                ),
            }
        }
        def = def.supports(ops);

        if let Some(order) = self.sort {
            def = def.sort_order(order);
        }
        for mask in &self.property_masks {
            def = def.mask(mask);
        }
        for (child_key, child) in &self.subresources {
            def = def.subresource(child_key, child.to_def(child_key));
        }
        def
    }
}

impl Config {
    /// Root definitions in declaration-key order.
    pub fn definitions(&self) -> Vec<(String, ResourceDef)> {
        self.resources
            .iter()
            .map(|(key, entry)| (key.clone(), entry.to_def(key)))
            .collect()
    }

    pub fn compile(&self) -> Result<Schema, SchemaError> {
        Schema::compile(self.definitions())
    }
}
