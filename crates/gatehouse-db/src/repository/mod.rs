//! SurrealDB-backed identity store.
//!
//! One [`SurrealStore`] implements every repository trait from
//! `gatehouse-core`, so workflow managers can be generic over a
//! single store type.

mod configuration;
mod group;
mod partner;
mod profile;
mod user;

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// SurrealDB implementation of the identity store.
#[derive(Clone)]
pub struct SurrealStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    pub(crate) fn db(&self) -> &Surreal<C> {
        &self.db
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub total: u64,
}

pub(crate) fn parse_uuid(entity: &'static str, value: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value)
        .map_err(|e| DbError::Corrupt(format!("invalid {entity} UUID '{value}': {e}")))
}
