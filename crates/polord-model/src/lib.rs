//! polord-model
//!
//! Order Model: the caller's desired two-level ordering of a policy.
//!
//! - Containers (sections) carry a 1-based target index among themselves.
//! - Items (rules) carry the name of their owning container and a 1-based
//!   index inside it, plus an opaque payload that is never interpreted here.
//!
//! Validation is pure and synchronous. No IO. No backend calls.

mod error;
mod types;
mod validate;

pub use error::{Scope, ValidationError};
pub use types::{ContainerSpec, DesiredOrder, ItemSpec, OrderModel, Payload};
pub use validate::validate;
