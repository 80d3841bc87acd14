//! SurrealDB implementation of [`ConfigurationRepository`].

use chrono::{DateTime, Utc};
use gatehouse_core::error::GateResult;
use gatehouse_core::models::configuration::{ConfigType, Configuration, CreateConfiguration};
use gatehouse_core::repository::ConfigurationRepository;
use surrealdb::Connection;
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{SurrealStore, parse_uuid};
use crate::error::{DbError, commit_error};

#[derive(Debug, SurrealValue)]
struct ConfigurationRow {
    config_type: String,
    name: String,
    version: i64,
    status: bool,
    contents: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ConfigurationRowWithId {
    record_id: String,
    config_type: String,
    name: String,
    version: i64,
    status: bool,
    contents: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_type(s: &str) -> Result<ConfigType, DbError> {
    ConfigType::parse(s)
        .ok_or_else(|| DbError::Corrupt(format!("unknown configuration type: {s}")))
}

impl ConfigurationRow {
    fn into_configuration(self, id: Uuid) -> Result<Configuration, DbError> {
        Ok(Configuration {
            id,
            config_type: parse_type(&self.config_type)?,
            name: self.name,
            version: self.version,
            status: self.status,
            contents: self.contents,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl<C: Connection> ConfigurationRepository for SurrealStore<C> {
    async fn create_configuration(&self, input: CreateConfiguration) -> GateResult<Configuration> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db()
            .query(
                "CREATE type::record('configuration', $id) SET \
                 config_type = $config_type, name = $name, \
                 version = $version, status = $status, \
                 contents = $contents",
            )
            .bind(("id", id_str.clone()))
            .bind(("config_type", input.config_type.as_str().to_string()))
            .bind(("name", input.name))
            .bind(("version", input.version))
            .bind(("status", input.status))
            .bind(("contents", input.contents))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(commit_error)?;

        let rows: Vec<ConfigurationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "configuration",
            id: id_str,
        })?;

        Ok(row.into_configuration(id)?)
    }

    async fn latest_configuration(
        &self,
        config_type: ConfigType,
        name: &str,
    ) -> GateResult<Option<Configuration>> {
        let mut result = self
            .db()
            .query(
                "SELECT meta::id(id) AS record_id, * FROM configuration \
                 WHERE config_type = $config_type AND name = $name \
                 AND status = true \
                 ORDER BY version DESC LIMIT 1",
            )
            .bind(("config_type", config_type.as_str().to_string()))
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ConfigurationRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => {
                let id = parse_uuid("configuration", &row.record_id)?;
                let inner = ConfigurationRow {
                    config_type: row.config_type,
                    name: row.name,
                    version: row.version,
                    status: row.status,
                    contents: row.contents,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                };
                Ok(Some(inner.into_configuration(id)?))
            }
            None => Ok(None),
        }
    }
}
