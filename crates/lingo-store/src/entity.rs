//! Base entity persistence

use async_trait::async_trait;
use chrono::Utc;
use lingo_common::{EntityId, EntityKind, LanguageCode, PrincipalId};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{Entity, EntityUpdate, NewEntity};
use crate::pool::SqliteStore;
use crate::store::EntityStore;

const ENTITY_COLUMNS: &str =
    "id, kind, owner, attributes, source_language, revision, created_at, updated_at";

pub(crate) fn entity_from_row(row: &SqliteRow) -> StoreResult<Entity> {
    let id: String = row.try_get("id")?;
    let kind: String = row.try_get("kind")?;
    let owner: String = row.try_get("owner")?;
    let attributes: String = row.try_get("attributes")?;
    let source_language: String = row.try_get("source_language")?;

    Ok(Entity {
        id: EntityId(Uuid::parse_str(&id).map_err(|e| StoreError::corrupt("entities", e))?),
        kind: kind
            .parse::<EntityKind>()
            .map_err(|e| StoreError::corrupt("entities", e))?,
        owner: PrincipalId(owner),
        attributes: serde_json::from_str(&attributes)?,
        source_language: LanguageCode::parse(&source_language)
            .map_err(|e| StoreError::corrupt("entities", e))?,
        revision: row.try_get("revision")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn language_error(err: sqlx::Error, language: &LanguageCode) -> StoreError {
    if StoreError::is_foreign_key(&err) {
        StoreError::UnknownLanguage(language.to_string())
    } else {
        StoreError::from_write(err)
    }
}

#[async_trait]
impl EntityStore for SqliteStore {
    async fn create_entity(&self, new: NewEntity) -> StoreResult<Entity> {
        let now = Utc::now();
        let entity = Entity {
            id: EntityId::new(),
            kind: new.kind,
            owner: new.owner,
            attributes: new.attributes,
            source_language: new.source_language,
            revision: 1,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO entities (
                id, kind, owner, attributes, source_language, revision, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entity.id.to_string())
        .bind(entity.kind.as_str())
        .bind(entity.owner.as_str())
        .bind(serde_json::to_string(&entity.attributes)?)
        .bind(entity.source_language.as_str())
        .bind(entity.revision)
        .bind(entity.created_at)
        .bind(entity.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| language_error(e, &entity.source_language))?;

        info!(entity_id = %entity.id, kind = %entity.kind, "Created entity");
        Ok(entity)
    }

    async fn get_entity(&self, id: EntityId) -> StoreResult<Option<Entity>> {
        let row = sqlx::query(&format!("SELECT {ENTITY_COLUMNS} FROM entities WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(entity_from_row).transpose()
    }

    async fn update_entity(&self, id: EntityId, update: EntityUpdate) -> StoreResult<Option<Entity>> {
        let attributes = update
            .attributes
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE entities SET
                attributes = COALESCE(?, attributes),
                source_language = COALESCE(?, source_language),
                revision = revision + 1,
                updated_at = ?
            WHERE id = ?
            RETURNING {ENTITY_COLUMNS}
            "#
        ))
        .bind(attributes)
        .bind(update.source_language.as_ref().map(LanguageCode::as_str))
        .bind(Utc::now())
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match &update.source_language {
            Some(language) => language_error(e, language),
            None => StoreError::from_write(e),
        })?;

        let entity = row.as_ref().map(entity_from_row).transpose()?;
        if let Some(entity) = &entity {
            debug!(entity_id = %id, revision = entity.revision, "Updated entity");
        }
        Ok(entity)
    }

    async fn delete_entity(&self, id: EntityId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM entities WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(entity_id = %id, "Deleted entity");
        } else {
            debug!(entity_id = %id, "Attempted to delete non-existent entity");
        }
        Ok(deleted)
    }

    async fn list_entities(&self, kind: Option<EntityKind>, limit: u32) -> StoreResult<Vec<Entity>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ENTITY_COLUMNS} FROM entities
            WHERE (?1 IS NULL OR kind = ?1)
            ORDER BY created_at DESC, id
            LIMIT ?2
            "#
        ))
        .bind(kind.map(|k| k.as_str()))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(entity_from_row).collect()
    }
}
