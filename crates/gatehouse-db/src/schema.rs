//! Schema definitions and migration runner.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation. `user_name`/`email` (and
//! partner `code`/`email`) carry UNIQUE indexes; cross-column
//! uniqueness between the two is enforced by the workflow-level
//! probe.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- User groups
-- =======================================================================
DEFINE TABLE user_group SCHEMAFULL;
DEFINE FIELD name ON TABLE user_group TYPE string;
DEFINE FIELD group_type ON TABLE user_group TYPE option<string>;
DEFINE FIELD description ON TABLE user_group TYPE option<string>;
DEFINE FIELD permissions ON TABLE user_group TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD status ON TABLE user_group TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE user_group TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user_group TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- User profiles
-- =======================================================================
DEFINE TABLE user_profile SCHEMAFULL;
DEFINE FIELD full_name ON TABLE user_profile TYPE string;
DEFINE FIELD short_name ON TABLE user_profile TYPE option<string>;
DEFINE FIELD birthday ON TABLE user_profile TYPE option<datetime>;
DEFINE FIELD gender ON TABLE user_profile TYPE string \
    ASSERT $value IN ['MALE', 'FEMALE', 'OTHER'];
DEFINE FIELD tax_no ON TABLE user_profile TYPE option<string>;
DEFINE FIELD id_no ON TABLE user_profile TYPE option<string>;
DEFINE FIELD id_created_at ON TABLE user_profile TYPE option<datetime>;
DEFINE FIELD id_location ON TABLE user_profile TYPE option<string>;
DEFINE FIELD id_expired_at ON TABLE user_profile TYPE option<datetime>;
DEFINE FIELD phone_num ON TABLE user_profile TYPE option<string>;
DEFINE FIELD address ON TABLE user_profile TYPE option<string>;
DEFINE FIELD city ON TABLE user_profile TYPE option<string>;
DEFINE FIELD country_code ON TABLE user_profile TYPE option<string>;
DEFINE FIELD ref_name ON TABLE user_profile TYPE option<string>;
DEFINE FIELD ref_phone ON TABLE user_profile TYPE option<string>;
DEFINE FIELD ref_email ON TABLE user_profile TYPE option<string>;
DEFINE FIELD rep_name ON TABLE user_profile TYPE option<string>;
DEFINE FIELD rep_phone ON TABLE user_profile TYPE option<string>;
DEFINE FIELD rep_email ON TABLE user_profile TYPE option<string>;
DEFINE FIELD created_at ON TABLE user_profile TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user_profile TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD user_name ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD password ON TABLE user TYPE string;
DEFINE FIELD status ON TABLE user TYPE string \
    ASSERT $value IN ['ACTIVE', 'DEACTIVATED', 'BLOCKED', 'DELETED'];
DEFINE FIELD user_type ON TABLE user TYPE string \
    ASSERT $value IN ['PERSONAL', 'COMPANY'];
DEFINE FIELD account_type ON TABLE user TYPE string \
    ASSERT $value IN ['MERCHANT', 'EU'];
DEFINE FIELD role ON TABLE user TYPE string \
    ASSERT $value IN ['USER', 'SALE_ADMIN', 'IT_ADMIN', 'ADMIN'];
DEFINE FIELD level ON TABLE user TYPE int DEFAULT 0;
DEFINE FIELD group_id ON TABLE user TYPE string;
DEFINE FIELD profile_id ON TABLE user TYPE string;
DEFINE FIELD is_active ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD data ON TABLE user TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD last_login ON TABLE user TYPE option<datetime>;
DEFINE FIELD deleted ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD deleted_at ON TABLE user TYPE option<datetime>;
DEFINE FIELD version ON TABLE user TYPE int DEFAULT 1;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_name ON TABLE user COLUMNS user_name UNIQUE;
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- =======================================================================
-- Partner profiles
-- =======================================================================
DEFINE TABLE partner_profile SCHEMAFULL;
DEFINE FIELD full_name ON TABLE partner_profile TYPE option<string>;
DEFINE FIELD job_title ON TABLE partner_profile TYPE option<string>;
DEFINE FIELD work_phone ON TABLE partner_profile TYPE option<string>;
DEFINE FIELD role ON TABLE partner_profile TYPE option<string>;
DEFINE FIELD org_name ON TABLE partner_profile TYPE option<string>;
DEFINE FIELD org_work_phone ON TABLE partner_profile \
    TYPE option<string>;
DEFINE FIELD org_postal_code ON TABLE partner_profile \
    TYPE option<string>;
DEFINE FIELD org_address ON TABLE partner_profile TYPE option<string>;
DEFINE FIELD org_city ON TABLE partner_profile TYPE option<string>;
DEFINE FIELD org_country_code ON TABLE partner_profile \
    TYPE option<string>;
DEFINE FIELD description ON TABLE partner_profile TYPE option<string>;
DEFINE FIELD created_at ON TABLE partner_profile TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE partner_profile TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Partners
-- =======================================================================
DEFINE TABLE partner SCHEMAFULL;
DEFINE FIELD code ON TABLE partner TYPE string;
DEFINE FIELD email ON TABLE partner TYPE string;
DEFINE FIELD password ON TABLE partner TYPE string;
DEFINE FIELD status ON TABLE partner TYPE string \
    ASSERT $value IN ['ACTIVE', 'DEACTIVATED', 'BLOCKED', 'DELETED'];
DEFINE FIELD profile_id ON TABLE partner TYPE string;
DEFINE FIELD objective ON TABLE partner TYPE option<string>;
DEFINE FIELD level ON TABLE partner TYPE int DEFAULT 0;
DEFINE FIELD is_active ON TABLE partner TYPE bool DEFAULT false;
DEFINE FIELD approved ON TABLE partner TYPE bool DEFAULT false;
DEFINE FIELD deleted ON TABLE partner TYPE bool DEFAULT false;
DEFINE FIELD deleted_at ON TABLE partner TYPE option<datetime>;
DEFINE FIELD version ON TABLE partner TYPE int DEFAULT 1;
DEFINE FIELD created_at ON TABLE partner TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE partner TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_partner_code ON TABLE partner COLUMNS code UNIQUE;
DEFINE INDEX idx_partner_email ON TABLE partner COLUMNS email UNIQUE;

-- =======================================================================
-- Configurations (type+name+version keyed settings records)
-- =======================================================================
DEFINE TABLE configuration SCHEMAFULL;
DEFINE FIELD config_type ON TABLE configuration TYPE string \
    ASSERT $value IN ['APP', 'COMPUTE', 'NETWORK', 'BACKEND'];
DEFINE FIELD name ON TABLE configuration TYPE string;
DEFINE FIELD version ON TABLE configuration TYPE int;
DEFINE FIELD status ON TABLE configuration TYPE bool DEFAULT true;
DEFINE FIELD contents ON TABLE configuration TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD created_at ON TABLE configuration TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE configuration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_configuration_type_name_version ON TABLE configuration \
    COLUMNS config_type, name, version UNIQUE;
";

/// Apply any schema migrations newer than the recorded version.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Query(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Query(format!(
                    "migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query("CREATE _migration SET version = $version, name = $name")
                .bind(("version", migration.version))
                .bind(("name", migration.name.to_string()))
                .await?
                .check()
                .map_err(|e| {
                    DbError::Query(format!(
                        "failed to record migration v{}: {}",
                        migration.version, e,
                    ))
                })?;

            info!(version = migration.version, "migration applied");
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for tests that poke at the schema directly.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
