//! Actions: ids, action values, the wire format, and generated creators.

mod factory;
mod id;
mod types;
mod wire;

pub use factory::{gen_actions, ActionBundle, ActionError};
pub use id::{coerce, coerce_values, Id};
pub use types::{Action, ActionType, ActionTypeError, Operation, Page, TYPE_PREFIX};
pub use wire::{WireAction, WireError};
