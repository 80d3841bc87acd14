//! Gatehouse core — domain models, role algebra, error taxonomy,
//! identity-store traits, per-request context, and the saga
//! compensation mechanism shared by every other crate.

pub mod context;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod repository;
pub mod roles;
pub mod saga;

pub use context::RequestContext;
pub use error::{ErrorKind, GateError, GateResult};
pub use roles::Role;
pub use saga::Saga;
