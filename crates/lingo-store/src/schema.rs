//! Schema creation and versioning

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};

/// Current schema version
pub const SCHEMA_VERSION: i64 = 1;

const V1: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS languages (
        code TEXT PRIMARY KEY,
        display_name TEXT NOT NULL,
        rtl BOOLEAN NOT NULL DEFAULT 0,
        supported BOOLEAN NOT NULL DEFAULT 1,
        updated_at DATETIME NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS entities (
        id TEXT PRIMARY KEY,
        kind TEXT NOT NULL,
        owner TEXT NOT NULL,
        attributes TEXT NOT NULL, -- JSON object
        source_language TEXT NOT NULL REFERENCES languages (code),
        revision INTEGER NOT NULL DEFAULT 1,
        created_at DATETIME NOT NULL,
        updated_at DATETIME NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_entities_kind ON entities (kind, created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS translations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        entity_id TEXT NOT NULL REFERENCES entities (id) ON DELETE CASCADE,
        language TEXT NOT NULL REFERENCES languages (code),
        fields TEXT NOT NULL, -- JSON object
        source_revision INTEGER NOT NULL,
        writes INTEGER NOT NULL DEFAULT 1,
        updated_at DATETIME NOT NULL,
        UNIQUE (entity_id, language)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_translations_language ON translations (language)",
    r#"
    CREATE TABLE IF NOT EXISTS consent_records (
        principal TEXT PRIMARY KEY,
        terms_of_service BOOLEAN NOT NULL,
        privacy_policy BOOLEAN NOT NULL,
        data_processing BOOLEAN NOT NULL,
        marketing BOOLEAN NOT NULL,
        third_party_sharing BOOLEAN NOT NULL,
        cross_border_transfer BOOLEAN NOT NULL,
        policy_version TEXT NOT NULL,
        recorded_at DATETIME NOT NULL,
        ip_address TEXT,
        user_agent TEXT,
        method TEXT NOT NULL,
        revision INTEGER NOT NULL DEFAULT 1
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS consent_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        principal TEXT NOT NULL,
        terms_of_service BOOLEAN NOT NULL,
        privacy_policy BOOLEAN NOT NULL,
        data_processing BOOLEAN NOT NULL,
        marketing BOOLEAN NOT NULL,
        third_party_sharing BOOLEAN NOT NULL,
        cross_border_transfer BOOLEAN NOT NULL,
        policy_version TEXT NOT NULL,
        recorded_at DATETIME NOT NULL,
        ip_address TEXT,
        user_agent TEXT,
        method TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_consent_history_principal ON consent_history (principal, id)",
    r#"
    CREATE TRIGGER IF NOT EXISTS consent_history_no_update
    BEFORE UPDATE ON consent_history
    BEGIN
        SELECT RAISE(ABORT, 'consent_history is append-only');
    END
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS consent_history_no_delete
    BEFORE DELETE ON consent_history
    BEGIN
        SELECT RAISE(ABORT, 'consent_history is append-only');
    END
    "#,
];

/// Creates or upgrades the schema.
pub async fn initialize_schema(pool: &SqlitePool) -> StoreResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    let current_version: Option<i64> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    match current_version {
        Some(version) if version >= SCHEMA_VERSION => {
            debug!("Database schema is up to date (version {})", version);
            return Ok(());
        }
        Some(version) => {
            info!("Upgrading database schema from version {} to {}", version, SCHEMA_VERSION);
        }
        None => {
            info!("Creating initial database schema (version {})", SCHEMA_VERSION);
        }
    }

    apply(pool, SCHEMA_VERSION, V1)
        .await
        .map_err(|source| StoreError::Migration {
            version: SCHEMA_VERSION,
            source,
        })
}

async fn apply(pool: &SqlitePool, version: i64, statements: &[&str]) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for statement in statements {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}
