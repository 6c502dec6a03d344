//! Language reference table

use async_trait::async_trait;
use chrono::Utc;
use lingo_common::LanguageCode;
use lingo_i18n::Language;
use sqlx::Row;
use tracing::info;

use crate::error::{StoreError, StoreResult};
use crate::pool::SqliteStore;
use crate::store::LanguageStore;

#[async_trait]
impl LanguageStore for SqliteStore {
    async fn seed_languages(&self, languages: &[Language]) -> StoreResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        for language in languages {
            sqlx::query(
                r#"
                INSERT INTO languages (code, display_name, rtl, supported, updated_at)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT (code) DO UPDATE SET
                    display_name = excluded.display_name,
                    rtl = excluded.rtl,
                    supported = excluded.supported,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(language.code.as_str())
            .bind(&language.display_name)
            .bind(language.rtl)
            .bind(language.supported)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(count = languages.len(), "Seeded languages");
        Ok(())
    }

    async fn list_languages(&self) -> StoreResult<Vec<Language>> {
        let rows = sqlx::query("SELECT code, display_name, rtl, supported FROM languages ORDER BY code")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let code: String = row.try_get("code")?;
                Ok(Language {
                    code: LanguageCode::parse(&code).map_err(|e| StoreError::corrupt("languages", e))?,
                    display_name: row.try_get("display_name")?,
                    rtl: row.try_get("rtl")?,
                    supported: row.try_get("supported")?,
                })
            })
            .collect()
    }

    async fn retire_language(&self, code: &LanguageCode) -> StoreResult<u64> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE languages SET supported = 0, updated_at = ? WHERE code = ?")
            .bind(Utc::now())
            .bind(code.as_str())
            .execute(&mut *tx)
            .await?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::UnknownLanguage(code.to_string()));
        }

        let removed = sqlx::query("DELETE FROM translations WHERE language = ?")
            .bind(code.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        info!(language = %code, removed, "Retired language");
        Ok(removed)
    }
}
