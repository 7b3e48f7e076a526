//! genstore: configuration-driven resource-state engine.
//!
//! A declarative tree of API resources ([`schema::ResourceDef`]) compiles
//! into a frozen [`schema::Schema`]. From that schema come namespaced action
//! creators ([`action::ActionBundle`]) and a recursive reducer
//! ([`engine::ResourceReducer`]) that normalizes, merges, paginates and
//! invalidates nested entity collections. [`store::Store`] is a small host
//! dispatch loop tying them together.
//!
//! ```ignore
//! let schema = Arc::new(Schema::compile([(
//!     "widgets",
//!     ResourceDef::new().plural("widgets").supports([OpKind::One])
//!         .subresource("parts", ResourceDef::new().plural("parts").supports([OpKind::One])),
//! )])?);
//! let mut store = Store::new(schema.clone());
//! let widgets = ActionBundle::for_root(&schema, "widgets")?;
//! store.dispatch(widgets.one(fields, [42])?)?;
//! store.dispatch(widgets["parts"].one(part, [42, 1])?)?;
//! ```

pub mod action;
pub mod config;
pub mod engine;
pub mod logging;
pub mod schema;
pub mod state;
pub mod store;
