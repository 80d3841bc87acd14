//! SurrealDB implementation of [`PartnerRepository`] and
//! [`PartnerProfileRepository`].

use chrono::{DateTime, Utc};
use gatehouse_core::error::GateResult;
use gatehouse_core::models::partner::{
    CreatePartner, CreatePartnerProfile, Partner, PartnerProfile, UpdatePartner,
    UpdatePartnerProfile,
};
use gatehouse_core::models::user::UserStatus;
use gatehouse_core::repository::{
    Page, PageRequest, PartnerProfileRepository, PartnerRepository,
};
use surrealdb::Connection;
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, SurrealStore, parse_uuid};
use crate::error::{DbError, commit_error};

#[derive(Debug, SurrealValue)]
struct PartnerRow {
    code: String,
    email: String,
    password: String,
    status: String,
    profile_id: String,
    objective: Option<String>,
    level: i64,
    is_active: bool,
    approved: bool,
    deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct PartnerRowWithId {
    record_id: String,
    code: String,
    email: String,
    password: String,
    status: String,
    profile_id: String,
    objective: Option<String>,
    level: i64,
    is_active: bool,
    approved: bool,
    deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PartnerRow {
    fn into_partner(self, id: Uuid) -> Result<Partner, DbError> {
        Ok(Partner {
            id,
            profile_id: parse_uuid("partner_profile", &self.profile_id)?,
            status: UserStatus::parse(&self.status)
                .ok_or_else(|| DbError::Corrupt(format!("unknown partner status: {}", self.status)))?,
            code: self.code,
            email: self.email,
            password: self.password,
            objective: self.objective,
            level: self.level,
            is_active: self.is_active,
            approved: self.approved,
            deleted: self.deleted,
            deleted_at: self.deleted_at,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl PartnerRowWithId {
    fn try_into_partner(self) -> Result<Partner, DbError> {
        let id = parse_uuid("partner", &self.record_id)?;
        let row = PartnerRow {
            code: self.code,
            email: self.email,
            password: self.password,
            status: self.status,
            profile_id: self.profile_id,
            objective: self.objective,
            level: self.level,
            is_active: self.is_active,
            approved: self.approved,
            deleted: self.deleted,
            deleted_at: self.deleted_at,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        row.into_partner(id)
    }
}

impl<C: Connection> PartnerRepository for SurrealStore<C> {
    async fn create_partner(&self, input: CreatePartner) -> GateResult<Partner> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db()
            .query(
                "CREATE type::record('partner', $id) SET \
                 code = $code, email = $email, password = $password, \
                 status = $status, profile_id = $profile_id, \
                 objective = $objective, level = $level, \
                 is_active = $is_active, approved = $approved, \
                 deleted = false, deleted_at = NONE, version = 1",
            )
            .bind(("id", id_str.clone()))
            .bind(("code", input.code))
            .bind(("email", input.email))
            .bind(("password", input.password))
            .bind(("status", input.status.as_str().to_string()))
            .bind(("profile_id", input.profile_id.to_string()))
            .bind(("objective", input.objective))
            .bind(("level", input.level))
            .bind(("is_active", input.is_active))
            .bind(("approved", input.approved))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(commit_error)?;

        let rows: Vec<PartnerRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "partner",
            id: id_str,
        })?;

        Ok(row.into_partner(id)?)
    }

    async fn get_partner(&self, id: Uuid) -> GateResult<Option<Partner>> {
        let mut result = self
            .db()
            .query("SELECT * FROM type::record('partner', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PartnerRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.into_partner(id)?)),
            None => Ok(None),
        }
    }

    async fn find_partner_by_code_or_email(&self, identifier: &str) -> GateResult<Option<Partner>> {
        let identifier = identifier.trim().to_lowercase();

        let mut result = self
            .db()
            .query(
                "SELECT meta::id(id) AS record_id, * FROM partner \
                 WHERE code = $identifier OR email = $identifier",
            )
            .bind(("identifier", identifier))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PartnerRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_partner()?)),
            None => Ok(None),
        }
    }

    async fn partner_code_or_email_taken(&self, candidates: &[String]) -> GateResult<bool> {
        let names: Vec<String> = candidates
            .iter()
            .map(|c| c.trim().to_lowercase())
            .collect();

        let mut result = self
            .db()
            .query(
                "SELECT count() AS total FROM partner \
                 WHERE code IN $names OR email IN $names GROUP ALL",
            )
            .bind(("names", names))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }

    async fn update_partner(
        &self,
        id: Uuid,
        expected_version: u64,
        input: UpdatePartner,
    ) -> GateResult<Partner> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.password.is_some() {
            sets.push("password = $password");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.objective.is_some() {
            sets.push("objective = $objective");
        }
        if input.level.is_some() {
            sets.push("level = $level");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        if input.approved.is_some() {
            sets.push("approved = $approved");
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
            "UPDATE type::record('partner', $id) SET {} \
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
        if let Some(objective) = input.objective {
            builder = builder.bind(("objective", objective));
        }
        if let Some(level) = input.level {
            builder = builder.bind(("level", level));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }
        if let Some(approved) = input.approved {
            builder = builder.bind(("approved", approved));
        }
        if let Some(deleted) = input.deleted {
            builder = builder.bind(("deleted", deleted));
        }
        if let Some(deleted_at) = input.deleted_at {
            builder = builder.bind(("deleted_at", deleted_at));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(commit_error)?;

        let rows: Vec<PartnerRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(row.into_partner(id)?),
            None => {
                if self.get_partner(id).await?.is_some() {
                    Err(DbError::VersionConflict {
                        entity: "partner",
                        id: id_str,
                    }
                    .into())
                } else {
                    Err(DbError::NotFound {
                        entity: "partner",
                        id: id_str,
                    }
                    .into())
                }
            }
        }
    }

    async fn delete_partner(&self, id: Uuid) -> GateResult<()> {
        self.db()
            .query("DELETE type::record('partner', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(commit_error)
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn list_partners(&self, page: PageRequest) -> GateResult<Page<Partner>> {
        let fetch = page.limit + 1;

        let mut result = match page.marker {
            Some(marker) => {
                self.db()
                    .query(
                        "SELECT meta::id(id) AS record_id, * FROM partner \
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
                        "SELECT meta::id(id) AS record_id, * FROM partner \
                         ORDER BY record_id ASC LIMIT $limit",
                    )
                    .bind(("limit", fetch))
                    .await
            }
        }
        .map_err(DbError::from)?;

        let rows: Vec<PartnerRowWithId> = result.take(0).map_err(DbError::from)?;

        let mut items = rows
            .into_iter()
            .map(PartnerRowWithId::try_into_partner)
            .collect::<Result<Vec<_>, DbError>>()?;

        let next_marker = if items.len() as u64 > page.limit {
            items.pop();
            items.last().map(|p| p.id)
        } else {
            None
        };

        Ok(Page { items, next_marker })
    }
}

#[derive(Debug, SurrealValue)]
struct PartnerProfileRow {
    full_name: Option<String>,
    job_title: Option<String>,
    work_phone: Option<String>,
    role: Option<String>,
    org_name: Option<String>,
    org_work_phone: Option<String>,
    org_postal_code: Option<String>,
    org_address: Option<String>,
    org_city: Option<String>,
    org_country_code: Option<String>,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PartnerProfileRow {
    fn into_profile(self, id: Uuid) -> PartnerProfile {
        PartnerProfile {
            id,
            full_name: self.full_name,
            job_title: self.job_title,
            work_phone: self.work_phone,
            role: self.role,
            org_name: self.org_name,
            org_work_phone: self.org_work_phone,
            org_postal_code: self.org_postal_code,
            org_address: self.org_address,
            org_city: self.org_city,
            org_country_code: self.org_country_code,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl<C: Connection> PartnerProfileRepository for SurrealStore<C> {
    async fn create_partner_profile(
        &self,
        input: CreatePartnerProfile,
    ) -> GateResult<PartnerProfile> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db()
            .query(
                "CREATE type::record('partner_profile', $id) SET \
                 full_name = $full_name, job_title = $job_title, \
                 work_phone = $work_phone, role = $role, \
                 org_name = $org_name, \
                 org_work_phone = $org_work_phone, \
                 org_postal_code = $org_postal_code, \
                 org_address = $org_address, org_city = $org_city, \
                 org_country_code = $org_country_code, \
                 description = $description",
            )
            .bind(("id", id_str.clone()))
            .bind(("full_name", input.full_name))
            .bind(("job_title", input.job_title))
            .bind(("work_phone", input.work_phone))
            .bind(("role", input.role))
            .bind(("org_name", input.org_name))
            .bind(("org_work_phone", input.org_work_phone))
            .bind(("org_postal_code", input.org_postal_code))
            .bind(("org_address", input.org_address))
            .bind(("org_city", input.org_city))
            .bind(("org_country_code", input.org_country_code))
            .bind(("description", input.description))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(commit_error)?;

        let rows: Vec<PartnerProfileRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "partner_profile",
            id: id_str,
        })?;

        Ok(row.into_profile(id))
    }

    async fn get_partner_profile(&self, id: Uuid) -> GateResult<Option<PartnerProfile>> {
        let mut result = self
            .db()
            .query("SELECT * FROM type::record('partner_profile', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PartnerProfileRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(|row| row.into_profile(id)))
    }

    async fn update_partner_profile(
        &self,
        id: Uuid,
        input: UpdatePartnerProfile,
    ) -> GateResult<PartnerProfile> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.full_name.is_some() {
            sets.push("full_name = $full_name");
        }
        if input.job_title.is_some() {
            sets.push("job_title = $job_title");
        }
        if input.work_phone.is_some() {
            sets.push("work_phone = $work_phone");
        }
        if input.role.is_some() {
            sets.push("role = $role");
        }
        if input.org_name.is_some() {
            sets.push("org_name = $org_name");
        }
        if input.org_work_phone.is_some() {
            sets.push("org_work_phone = $org_work_phone");
        }
        if input.org_postal_code.is_some() {
            sets.push("org_postal_code = $org_postal_code");
        }
        if input.org_address.is_some() {
            sets.push("org_address = $org_address");
        }
        if input.org_city.is_some() {
            sets.push("org_city = $org_city");
        }
        if input.org_country_code.is_some() {
            sets.push("org_country_code = $org_country_code");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('partner_profile', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db().query(&query).bind(("id", id_str.clone()));

        if let Some(full_name) = input.full_name {
            builder = builder.bind(("full_name", full_name));
        }
        if let Some(job_title) = input.job_title {
            builder = builder.bind(("job_title", job_title));
        }
        if let Some(work_phone) = input.work_phone {
            builder = builder.bind(("work_phone", work_phone));
        }
        if let Some(role) = input.role {
            builder = builder.bind(("role", role));
        }
        if let Some(org_name) = input.org_name {
            builder = builder.bind(("org_name", org_name));
        }
        if let Some(org_work_phone) = input.org_work_phone {
            builder = builder.bind(("org_work_phone", org_work_phone));
        }
        if let Some(org_postal_code) = input.org_postal_code {
            builder = builder.bind(("org_postal_code", org_postal_code));
        }
        if let Some(org_address) = input.org_address {
            builder = builder.bind(("org_address", org_address));
        }
        if let Some(org_city) = input.org_city {
            builder = builder.bind(("org_city", org_city));
        }
        if let Some(org_country_code) = input.org_country_code {
            builder = builder.bind(("org_country_code", org_country_code));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(commit_error)?;

        let rows: Vec<PartnerProfileRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "partner_profile",
            id: id_str,
        })?;

        Ok(row.into_profile(id))
    }

    async fn delete_partner_profile(&self, id: Uuid) -> GateResult<()> {
        self.db()
            .query("DELETE type::record('partner_profile', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(commit_error)
            .map_err(DbError::from)?;
        Ok(())
    }
}
