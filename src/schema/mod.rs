//! Resource schema: raw definitions and their compiled, frozen form.
//!
//! - `def.rs` - `ResourceDef` builder, operations, sort orders
//! - `compile.rs` - `Schema` arena with parent links and validation
//! - `path.rs` - dotted fully-qualified resource paths

mod compile;
mod def;
mod path;

pub use compile::{ResourceId, ResourceNode, Schema, SchemaError};
pub use def::{Accessor, OpKind, ResourceDef, SortFn, SortOrder};
pub use path::ResourcePath;
