//! SurrealDB implementation of [`UserRepository`].
//!
//! Updates are version-checked: every committed update bumps the
//! `version` column, and a stale expected version surfaces as a
//! typed conflict instead of silently overwriting a concurrent
//! change.

use chrono::{DateTime, Utc};
use gatehouse_core::error::GateResult;
use gatehouse_core::models::user::{
    AccountType, CreateUser, UpdateUser, User, UserStatus, UserType,
};
use gatehouse_core::repository::{Page, PageRequest, UserRepository};
use gatehouse_core::roles::Role;
use surrealdb::Connection;
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, SurrealStore, parse_uuid};
use crate::error::{DbError, commit_error};

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    user_name: String,
    email: String,
    password: String,
    status: String,
    user_type: String,
    account_type: String,
    role: String,
    level: i64,
    group_id: String,
    profile_id: String,
    is_active: bool,
    data: serde_json::Value,
    last_login: Option<DateTime<Utc>>,
    deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    user_name: String,
    email: String,
    password: String,
    status: String,
    user_type: String,
    account_type: String,
    role: String,
    level: i64,
    group_id: String,
    profile_id: String,
    is_active: bool,
    data: serde_json::Value,
    last_login: Option<DateTime<Utc>>,
    deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<UserStatus, DbError> {
    UserStatus::parse(s).ok_or_else(|| DbError::Corrupt(format!("unknown user status: {s}")))
}

fn parse_role(s: &str) -> Result<Role, DbError> {
    Role::parse(s).ok_or_else(|| DbError::Corrupt(format!("unknown user role: {s}")))
}

impl UserRow {
    fn into_user(self, id: Uuid) -> Result<User, DbError> {
        Ok(User {
            id,
            group_id: parse_uuid("group", &self.group_id)?,
            profile_id: parse_uuid("profile", &self.profile_id)?,
            status: parse_status(&self.status)?,
            user_type: UserType::parse(&self.user_type)
                .ok_or_else(|| DbError::Corrupt(format!("unknown user type: {}", self.user_type)))?,
            account_type: AccountType::parse(&self.account_type).ok_or_else(|| {
                DbError::Corrupt(format!("unknown account type: {}", self.account_type))
            })?,
            role: parse_role(&self.role)?,
            user_name: self.user_name,
            email: self.email,
            password: self.password,
            level: self.level,
            is_active: self.is_active,
            data: self.data,
            last_login: self.last_login,
            deleted: self.deleted,
            deleted_at: self.deleted_at,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = parse_uuid("user", &self.record_id)?;
        let row = UserRow {
            user_name: self.user_name,
            email: self.email,
            password: self.password,
            status: self.status,
            user_type: self.user_type,
            account_type: self.account_type,
            role: self.role,
            level: self.level,
            group_id: self.group_id,
            profile_id: self.profile_id,
            is_active: self.is_active,
            data: self.data,
            last_login: self.last_login,
            deleted: self.deleted,
            deleted_at: self.deleted_at,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        row.into_user(id)
    }
}

impl<C: Connection> UserRepository for SurrealStore<C> {
    async fn create_user(&self, input: CreateUser) -> GateResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let data = input
            .data
            .unwrap_or(serde_json::Value::Object(Default::default()));

        let result = self
            .db()
            .query(
                "CREATE type::record('user', $id) SET \
                 user_name = $user_name, email = $email, \
                 password = $password, \
                 status = $status, user_type = $user_type, \
                 account_type = $account_type, role = $role, \
                 level = $level, group_id = $group_id, \
                 profile_id = $profile_id, is_active = $is_active, \
                 data = $data, last_login = NONE, \
                 deleted = false, deleted_at = NONE, version = 1",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_name", input.user_name))
            .bind(("email", input.email))
            .bind(("password", input.password))
            .bind(("status", input.status.as_str().to_string()))
            .bind(("user_type", input.user_type.as_str().to_string()))
            .bind(("account_type", input.account_type.as_str().to_string()))
            .bind(("role", input.role.as_str().to_string()))
            .bind(("level", input.level))
            .bind(("group_id", input.group_id.to_string()))
            .bind(("profile_id", input.profile_id.to_string()))
            .bind(("is_active", input.is_active))
            .bind(("data", data))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(commit_error)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "user",
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_user(&self, id: Uuid) -> GateResult<Option<User>> {
        let id_str = id.to_string();

        let mut result = self
            .db()
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.into_user(id)?)),
            None => Ok(None),
        }
    }

    async fn find_user_by_name_or_email(&self, identifier: &str) -> GateResult<Option<User>> {
        let identifier = identifier.trim().to_lowercase();

        let mut result = self
            .db()
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE user_name = $identifier OR email = $identifier",
            )
            .bind(("identifier", identifier))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_user()?)),
            None => Ok(None),
        }
    }

    async fn find_user(&self, identifier: &str) -> GateResult<Option<User>> {
        // An identifier that parses as a UUID is tried as a primary
        // key first; anything else is a name/e-mail lookup.
        if let Ok(id) = Uuid::parse_str(identifier.trim()) {
            return self.get_user(id).await;
        }
        self.find_user_by_name_or_email(identifier).await
    }

    async fn user_name_or_email_taken(&self, candidates: &[String]) -> GateResult<bool> {
        let names: Vec<String> = candidates
            .iter()
            .map(|c| c.trim().to_lowercase())
            .collect();

        let mut result = self
            .db()
            .query(
                "SELECT count() AS total FROM user \
                 WHERE user_name IN $names OR email IN $names \
                 GROUP ALL",
            )
            .bind(("names", names))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }

    async fn update_user(
        &self,
        id: Uuid,
        expected_version: u64,
        input: UpdateUser,
    ) -> GateResult<User> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.password.is_some() {
            sets.push("password = $password");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.user_type.is_some() {
            sets.push("user_type = $user_type");
        }
        if input.account_type.is_some() {
            sets.push("account_type = $account_type");
        }
        if input.role.is_some() {
            sets.push("role = $role");
        }
        if input.level.is_some() {
            sets.push("level = $level");
        }
        if input.group_id.is_some() {
            sets.push("group_id = $group_id");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        if input.data.is_some() {
            sets.push("data = $data");
        }
        if input.last_login.is_some() {
            sets.push("last_login = $last_login");
        }
        if input.deleted.is_some() {
            sets.push("deleted = $deleted");
        }
        if input.deleted_at.is_some() {
            sets.push("deleted_at = $deleted_at");
        }
        sets.push("version = version + 1");
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('user', $id) SET {} \
             WHERE version = $expected_version",
            sets.join(", ")
        );

        let mut builder = self
            .db()
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("expected_version", expected_version));

        if let Some(password) = input.password {
            builder = builder.bind(("password", password));
        }
        if let Some(ref status) = input.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }
        if let Some(ref user_type) = input.user_type {
            builder = builder.bind(("user_type", user_type.as_str().to_string()));
        }
        if let Some(ref account_type) = input.account_type {
            builder = builder.bind(("account_type", account_type.as_str().to_string()));
        }
        if let Some(ref role) = input.role {
            builder = builder.bind(("role", role.as_str().to_string()));
        }
        if let Some(level) = input.level {
            builder = builder.bind(("level", level));
        }
        if let Some(group_id) = input.group_id {
            builder = builder.bind(("group_id", group_id.to_string()));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }
        if let Some(data) = input.data {
            builder = builder.bind(("data", data));
        }
        if let Some(last_login) = input.last_login {
            builder = builder.bind(("last_login", last_login));
        }
        if let Some(deleted) = input.deleted {
            builder = builder.bind(("deleted", deleted));
        }
        if let Some(deleted_at) = input.deleted_at {
            // Option<Option<_>>: Some(None) clears the timestamp.
            builder = builder.bind(("deleted_at", deleted_at));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(commit_error)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(row.into_user(id)?),
            None => {
                // Zero rows: either the row is gone or the version
                // guard did not match.
                if self.get_user(id).await?.is_some() {
                    Err(DbError::VersionConflict {
                        entity: "user",
                        id: id_str,
                    }
                    .into())
                } else {
                    Err(DbError::NotFound {
                        entity: "user",
                        id: id_str,
                    }
                    .into())
                }
            }
        }
    }

    async fn delete_user(&self, id: Uuid) -> GateResult<()> {
        self.db()
            .query("DELETE type::record('user', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(commit_error)
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn list_users(&self, page: PageRequest) -> GateResult<Page<User>> {
        // Fetch one row past the limit; the extra row becomes the
        // next marker.
        let fetch = page.limit + 1;

        let mut result = match page.marker {
            Some(marker) => {
                self.db()
                    .query(
                        "SELECT meta::id(id) AS record_id, * FROM user \
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
                        "SELECT meta::id(id) AS record_id, * FROM user \
                         ORDER BY record_id ASC LIMIT $limit",
                    )
                    .bind(("limit", fetch))
                    .await
            }
        }
        .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;

        let mut items = rows
            .into_iter()
            .map(UserRowWithId::try_into_user)
            .collect::<Result<Vec<_>, DbError>>()?;

        let next_marker = if items.len() as u64 > page.limit {
            items.pop();
            items.last().map(|u| u.id)
        } else {
            None
        };

        Ok(Page { items, next_marker })
    }

    async fn purge_deleted_users(&self, cutoff: DateTime<Utc>) -> GateResult<u64> {
        let result = self
            .db()
            .query(
                "DELETE user \
                 WHERE deleted = true AND deleted_at != NONE \
                 AND deleted_at < $cutoff \
                 RETURN BEFORE",
            )
            .bind(("cutoff", cutoff))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(commit_error)?;
        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.len() as u64)
    }
}
