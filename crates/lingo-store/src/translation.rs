//! Translation row persistence

use async_trait::async_trait;
use chrono::Utc;
use lingo_common::{EntityId, LanguageCode, TextFields};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{Translation, UpsertOutcome};
use crate::pool::SqliteStore;
use crate::store::TranslationStore;

// Last writer wins, except that a row from an older entity revision never
// replaces a newer one and identical content is left untouched. Nothing is
// written for a language that has been retired.
const UPSERT_TRANSLATION: &str = r#"
    INSERT INTO translations (entity_id, language, fields, source_revision, writes, updated_at)
    SELECT ?1, ?2, ?3, ?4, 1, ?5
    WHERE EXISTS (SELECT 1 FROM languages WHERE code = ?2 AND supported = 1)
    ON CONFLICT (entity_id, language) DO UPDATE SET
        fields = excluded.fields,
        source_revision = excluded.source_revision,
        writes = translations.writes + 1,
        updated_at = excluded.updated_at
    WHERE excluded.source_revision > translations.source_revision
       OR (excluded.source_revision = translations.source_revision
           AND excluded.fields <> translations.fields)
    RETURNING writes
"#;

fn translation_from_row(row: &SqliteRow) -> StoreResult<Translation> {
    let entity_id: String = row.try_get("entity_id")?;
    let language: String = row.try_get("language")?;
    let fields: String = row.try_get("fields")?;

    Ok(Translation {
        entity_id: EntityId(
            Uuid::parse_str(&entity_id).map_err(|e| StoreError::corrupt("translations", e))?,
        ),
        language: LanguageCode::parse(&language)
            .map_err(|e| StoreError::corrupt("translations", e))?,
        fields: serde_json::from_str(&fields)?,
        source_revision: row.try_get("source_revision")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl SqliteStore {
    async fn try_upsert(
        &self,
        entity_id: EntityId,
        language: &LanguageCode,
        fields_json: &str,
        source_revision: i64,
    ) -> StoreResult<Option<i64>> {
        let result = sqlx::query_scalar::<_, i64>(UPSERT_TRANSLATION)
            .bind(entity_id.to_string())
            .bind(language.as_str())
            .bind(fields_json)
            .bind(source_revision)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await;

        match result {
            Ok(writes) => Ok(writes),
            Err(err) if StoreError::is_foreign_key(&err) => Err(self.missing_reference(entity_id, language).await),
            Err(err) => Err(StoreError::from_write(err)),
        }
    }

    /// Explains why the upsert statement wrote nothing.
    async fn skipped_upsert(
        &self,
        entity_id: EntityId,
        language: &LanguageCode,
        source_revision: i64,
    ) -> StoreResult<UpsertOutcome> {
        let supported: Option<bool> = sqlx::query_scalar("SELECT supported FROM languages WHERE code = ?")
            .bind(language.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match supported {
            None => return Err(StoreError::UnknownLanguage(language.to_string())),
            Some(false) => {
                debug!(%entity_id, %language, "Skipped translation for retired language");
                return Ok(UpsertOutcome::LanguageRetired);
            }
            Some(true) => {}
        }

        let stored: Option<i64> = sqlx::query_scalar(
            "SELECT source_revision FROM translations WHERE entity_id = ? AND language = ?",
        )
        .bind(entity_id.to_string())
        .bind(language.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(match stored {
            Some(stored) if stored > source_revision => UpsertOutcome::Stale,
            _ => UpsertOutcome::Unchanged,
        })
    }

    async fn missing_reference(&self, entity_id: EntityId, language: &LanguageCode) -> StoreError {
        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM entities WHERE id = ?")
            .bind(entity_id.to_string())
            .fetch_one(&self.pool)
            .await;

        match exists {
            Ok(0) => StoreError::EntityMissing(entity_id),
            Ok(_) => StoreError::UnknownLanguage(language.to_string()),
            Err(err) => StoreError::Database(err),
        }
    }
}

#[async_trait]
impl TranslationStore for SqliteStore {
    async fn upsert_translation(
        &self,
        entity_id: EntityId,
        language: &LanguageCode,
        fields: &TextFields,
        source_revision: i64,
    ) -> StoreResult<UpsertOutcome> {
        let fields_json = serde_json::to_string(fields)?;

        let writes = match self.try_upsert(entity_id, language, &fields_json, source_revision).await {
            // The conflicting row exists now, so a second attempt takes the update path.
            Err(StoreError::ConstraintViolation(message)) => {
                warn!(%entity_id, %language, %message, "Uniqueness conflict on upsert, retrying as update");
                self.try_upsert(entity_id, language, &fields_json, source_revision).await?
            }
            other => other?,
        };

        let outcome = match writes {
            Some(1) => UpsertOutcome::Inserted,
            Some(_) => UpsertOutcome::Updated,
            None => self.skipped_upsert(entity_id, language, source_revision).await?,
        };

        debug!(%entity_id, %language, source_revision, ?outcome, "Upserted translation");
        Ok(outcome)
    }

    async fn get_translation(
        &self,
        entity_id: EntityId,
        language: &LanguageCode,
    ) -> StoreResult<Option<Translation>> {
        let row = sqlx::query(
            r#"
            SELECT entity_id, language, fields, source_revision, updated_at
            FROM translations
            WHERE entity_id = ? AND language = ?
            "#,
        )
        .bind(entity_id.to_string())
        .bind(language.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(translation_from_row).transpose()
    }

    async fn list_translations(&self, entity_id: EntityId) -> StoreResult<Vec<Translation>> {
        let rows = sqlx::query(
            r#"
            SELECT entity_id, language, fields, source_revision, updated_at
            FROM translations
            WHERE entity_id = ?
            ORDER BY language
            "#,
        )
        .bind(entity_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(translation_from_row).collect()
    }

    async fn delete_translations_for_entity(&self, entity_id: EntityId) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM translations WHERE entity_id = ?")
            .bind(entity_id.to_string())
            .execute(&self.pool)
            .await?;

        debug!(%entity_id, removed = result.rows_affected(), "Deleted translations");
        Ok(result.rows_affected())
    }
}
