//! TOML configuration: logging settings and the resource schema.
//!
//! ```toml
//! [logging]
//! level = "debug"
//!
//! [resources.linodes]
//! singular = "linode"
//! plural = "linodes"
//! supports = ["ONE", "MANY", "DELETE", "PUT"]
//! sort = "descending"
//!
//! [resources.linodes.subresources.configs]
//! plural = "configs"
//! supports = ["ONE", "MANY"]
//! ```

mod loader;
mod types;

pub use loader::ConfigError;
pub use types::{Config, LoggingConfig, ResourceEntry};
