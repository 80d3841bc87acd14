//! SurrealDB implementation of [`UserGroupRepository`].

use chrono::{DateTime, Utc};
use gatehouse_core::error::GateResult;
use gatehouse_core::models::group::{CreateUserGroup, UserGroup};
use gatehouse_core::repository::{Page, PageRequest, UserGroupRepository};
use surrealdb::Connection;
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{SurrealStore, parse_uuid};
use crate::error::{DbError, commit_error};

#[derive(Debug, SurrealValue)]
struct GroupRow {
    name: String,
    group_type: Option<String>,
    description: Option<String>,
    permissions: serde_json::Value,
    status: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct GroupRowWithId {
    record_id: String,
    name: String,
    group_type: Option<String>,
    description: Option<String>,
    permissions: serde_json::Value,
    status: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GroupRow {
    fn into_group(self, id: Uuid) -> UserGroup {
        UserGroup {
            id,
            name: self.name,
            group_type: self.group_type,
            description: self.description,
            permissions: self.permissions,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl<C: Connection> UserGroupRepository for SurrealStore<C> {
    async fn create_group(&self, input: CreateUserGroup) -> GateResult<UserGroup> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let permissions = input
            .permissions
            .unwrap_or(serde_json::Value::Object(Default::default()));

        let result = self
            .db()
            .query(
                "CREATE type::record('user_group', $id) SET \
                 name = $name, group_type = $group_type, \
                 description = $description, \
                 permissions = $permissions, status = $status",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("group_type", input.group_type))
            .bind(("description", input.description))
            .bind(("permissions", permissions))
            .bind(("status", input.status))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(commit_error)?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "user_group",
            id: id_str,
        })?;

        Ok(row.into_group(id))
    }

    async fn get_group(&self, id: Uuid) -> GateResult<Option<UserGroup>> {
        let mut result = self
            .db()
            .query("SELECT * FROM type::record('user_group', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(|row| row.into_group(id)))
    }

    async fn list_groups(&self, page: PageRequest) -> GateResult<Page<UserGroup>> {
        let fetch = page.limit + 1;

        let mut result = match page.marker {
            Some(marker) => {
                self.db()
                    .query(
                        "SELECT meta::id(id) AS record_id, * FROM user_group \
                         WHERE meta::id(id) > $marker \
                         ORDER BY record_id ASC LIMIT $limit",
                    )
                    .bind(("marker", marker.to_string()))
                    .bind(("limit", fetch))
                    .await
            }
            None => {
                self.db()
                    .query(
                        "SELECT meta::id(id) AS record_id, * FROM user_group \
                         ORDER BY record_id ASC LIMIT $limit",
                    )
                    .bind(("limit", fetch))
                    .await
            }
        }
        .map_err(DbError::from)?;

        let rows: Vec<GroupRowWithId> = result.take(0).map_err(DbError::from)?;

        let mut items = rows
            .into_iter()
            .map(|row| {
                let id = parse_uuid("user_group", &row.record_id)?;
                Ok(UserGroup {
                    id,
                    name: row.name,
                    group_type: row.group_type,
                    description: row.description,
                    permissions: row.permissions,
                    status: row.status,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        let next_marker = if items.len() as u64 > page.limit {
            items.pop();
            items.last().map(|g| g.id)
        } else {
            None
        };

        Ok(Page { items, next_marker })
    }
}
