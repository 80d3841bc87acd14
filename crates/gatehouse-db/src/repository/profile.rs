//! SurrealDB implementation of [`UserProfileRepository`].

use chrono::{DateTime, Utc};
use gatehouse_core::error::GateResult;
use gatehouse_core::models::profile::{
    CreateUserProfile, Gender, UpdateUserProfile, UserProfile,
};
use gatehouse_core::repository::UserProfileRepository;
use surrealdb::Connection;
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::SurrealStore;
use crate::error::{DbError, commit_error};

#[derive(Debug, SurrealValue)]
struct ProfileRow {
    full_name: String,
    short_name: Option<String>,
    birthday: Option<DateTime<Utc>>,
    gender: String,
    tax_no: Option<String>,
    id_no: Option<String>,
    id_created_at: Option<DateTime<Utc>>,
    id_location: Option<String>,
    id_expired_at: Option<DateTime<Utc>>,
    phone_num: Option<String>,
    address: Option<String>,
    city: Option<String>,
    country_code: Option<String>,
    ref_name: Option<String>,
    ref_phone: Option<String>,
    ref_email: Option<String>,
    rep_name: Option<String>,
    rep_phone: Option<String>,
    rep_email: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProfileRow {
    fn into_profile(self, id: Uuid) -> Result<UserProfile, DbError> {
        Ok(UserProfile {
            id,
            gender: Gender::parse(&self.gender)
                .ok_or_else(|| DbError::Corrupt(format!("unknown gender: {}", self.gender)))?,
            full_name: self.full_name,
            short_name: self.short_name,
            birthday: self.birthday,
            tax_no: self.tax_no,
            id_no: self.id_no,
            id_created_at: self.id_created_at,
            id_location: self.id_location,
            id_expired_at: self.id_expired_at,
            phone_num: self.phone_num,
            address: self.address,
            city: self.city,
            country_code: self.country_code,
            ref_name: self.ref_name,
            ref_phone: self.ref_phone,
            ref_email: self.ref_email,
            rep_name: self.rep_name,
            rep_phone: self.rep_phone,
            rep_email: self.rep_email,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl<C: Connection> UserProfileRepository for SurrealStore<C> {
    async fn create_profile(&self, input: CreateUserProfile) -> GateResult<UserProfile> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let gender = input.gender.unwrap_or(Gender::Other);

        let result = self
            .db()
            .query(
                "CREATE type::record('user_profile', $id) SET \
                 full_name = $full_name, short_name = $short_name, \
                 birthday = $birthday, gender = $gender, \
                 tax_no = $tax_no, id_no = $id_no, \
                 id_created_at = $id_created_at, \
                 id_location = $id_location, \
                 id_expired_at = $id_expired_at, \
                 phone_num = $phone_num, address = $address, \
                 city = $city, country_code = $country_code, \
                 ref_name = $ref_name, ref_phone = $ref_phone, \
                 ref_email = $ref_email, rep_name = $rep_name, \
                 rep_phone = $rep_phone, rep_email = $rep_email",
            )
            .bind(("id", id_str.clone()))
            .bind(("full_name", input.full_name))
            .bind(("short_name", input.short_name))
            .bind(("birthday", input.birthday))
            .bind(("gender", gender.as_str().to_string()))
            .bind(("tax_no", input.tax_no))
            .bind(("id_no", input.id_no))
            .bind(("id_created_at", input.id_created_at))
            .bind(("id_location", input.id_location))
            .bind(("id_expired_at", input.id_expired_at))
            .bind(("phone_num", input.phone_num))
            .bind(("address", input.address))
            .bind(("city", input.city))
            .bind(("country_code", input.country_code))
            .bind(("ref_name", input.ref_name))
            .bind(("ref_phone", input.ref_phone))
            .bind(("ref_email", input.ref_email))
            .bind(("rep_name", input.rep_name))
            .bind(("rep_phone", input.rep_phone))
            .bind(("rep_email", input.rep_email))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(commit_error)?;

        let rows: Vec<ProfileRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "user_profile",
            id: id_str,
        })?;

        Ok(row.into_profile(id)?)
    }

    async fn get_profile(&self, id: Uuid) -> GateResult<Option<UserProfile>> {
        let mut result = self
            .db()
            .query("SELECT * FROM type::record('user_profile', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProfileRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.into_profile(id)?)),
            None => Ok(None),
        }
    }

    async fn update_profile(&self, id: Uuid, input: UpdateUserProfile) -> GateResult<UserProfile> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.full_name.is_some() {
            sets.push("full_name = $full_name");
        }
        if input.short_name.is_some() {
            sets.push("short_name = $short_name");
        }
        if input.birthday.is_some() {
            sets.push("birthday = $birthday");
        }
        if input.gender.is_some() {
            sets.push("gender = $gender");
        }
        if input.tax_no.is_some() {
            sets.push("tax_no = $tax_no");
        }
        if input.id_no.is_some() {
            sets.push("id_no = $id_no");
        }
        if input.id_created_at.is_some() {
            sets.push("id_created_at = $id_created_at");
        }
        if input.id_location.is_some() {
            sets.push("id_location = $id_location");
        }
        if input.id_expired_at.is_some() {
            sets.push("id_expired_at = $id_expired_at");
        }
        if input.phone_num.is_some() {
            sets.push("phone_num = $phone_num");
        }
        if input.address.is_some() {
            sets.push("address = $address");
        }
        if input.city.is_some() {
            sets.push("city = $city");
        }
        if input.country_code.is_some() {
            sets.push("country_code = $country_code");
        }
        if input.ref_name.is_some() {
            sets.push("ref_name = $ref_name");
        }
        if input.ref_phone.is_some() {
            sets.push("ref_phone = $ref_phone");
        }
        if input.ref_email.is_some() {
            sets.push("ref_email = $ref_email");
        }
        if input.rep_name.is_some() {
            sets.push("rep_name = $rep_name");
        }
        if input.rep_phone.is_some() {
            sets.push("rep_phone = $rep_phone");
        }
        if input.rep_email.is_some() {
            sets.push("rep_email = $rep_email");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('user_profile', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db().query(&query).bind(("id", id_str.clone()));

        if let Some(full_name) = input.full_name {
            builder = builder.bind(("full_name", full_name));
        }
        if let Some(short_name) = input.short_name {
            builder = builder.bind(("short_name", short_name));
        }
        if let Some(birthday) = input.birthday {
            builder = builder.bind(("birthday", birthday));
        }
        if let Some(ref gender) = input.gender {
            builder = builder.bind(("gender", gender.as_str().to_string()));
        }
        if let Some(tax_no) = input.tax_no {
            builder = builder.bind(("tax_no", tax_no));
        }
        if let Some(id_no) = input.id_no {
            builder = builder.bind(("id_no", id_no));
        }
        if let Some(id_created_at) = input.id_created_at {
            builder = builder.bind(("id_created_at", id_created_at));
        }
        if let Some(id_location) = input.id_location {
            builder = builder.bind(("id_location", id_location));
        }
        if let Some(id_expired_at) = input.id_expired_at {
            builder = builder.bind(("id_expired_at", id_expired_at));
        }
        if let Some(phone_num) = input.phone_num {
            builder = builder.bind(("phone_num", phone_num));
        }
        if let Some(address) = input.address {
            builder = builder.bind(("address", address));
        }
        if let Some(city) = input.city {
            builder = builder.bind(("city", city));
        }
        if let Some(country_code) = input.country_code {
            builder = builder.bind(("country_code", country_code));
        }
        if let Some(ref_name) = input.ref_name {
            builder = builder.bind(("ref_name", ref_name));
        }
        if let Some(ref_phone) = input.ref_phone {
            builder = builder.bind(("ref_phone", ref_phone));
        }
        if let Some(ref_email) = input.ref_email {
            builder = builder.bind(("ref_email", ref_email));
        }
        if let Some(rep_name) = input.rep_name {
            builder = builder.bind(("rep_name", rep_name));
        }
        if let Some(rep_phone) = input.rep_phone {
            builder = builder.bind(("rep_phone", rep_phone));
        }
        if let Some(rep_email) = input.rep_email {
            builder = builder.bind(("rep_email", rep_email));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(commit_error)?;

        let rows: Vec<ProfileRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "user_profile",
            id: id_str,
        })?;

        Ok(row.into_profile(id)?)
    }

    async fn delete_profile(&self, id: Uuid) -> GateResult<()> {
        self.db()
            .query("DELETE type::record('user_profile', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(commit_error)
            .map_err(DbError::from)?;
        Ok(())
    }
}
