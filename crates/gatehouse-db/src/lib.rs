//! Gatehouse Database — SurrealDB connection management, schema
//! migrations, and the repository implementations behind the
//! identity-store traits in `gatehouse-core`.

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use repository::SurrealStore;
pub use schema::{run_migrations, schema_v1};
