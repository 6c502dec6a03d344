//! Consent records and the append-only consent ledger

use async_trait::async_trait;
use chrono::Utc;
use lingo_common::{mask_ip, PrincipalId};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::info;

use crate::error::{StoreError, StoreResult};
use crate::models::{
    AuditContext, ConsentFlags, ConsentHistoryEntry, ConsentMethod, ConsentRecord, ConsentUpdate,
};
use crate::pool::SqliteStore;
use crate::store::ConsentStore;

const FLAG_COLUMNS: &str = "terms_of_service, privacy_policy, data_processing, marketing, \
                            third_party_sharing, cross_border_transfer";

fn flags_from_row(row: &SqliteRow) -> StoreResult<ConsentFlags> {
    Ok(ConsentFlags {
        terms_of_service: row.try_get("terms_of_service")?,
        privacy_policy: row.try_get("privacy_policy")?,
        data_processing: row.try_get("data_processing")?,
        marketing: row.try_get("marketing")?,
        third_party_sharing: row.try_get("third_party_sharing")?,
        cross_border_transfer: row.try_get("cross_border_transfer")?,
    })
}

fn method_from_row(row: &SqliteRow, table: &'static str) -> StoreResult<ConsentMethod> {
    let method: String = row.try_get("method")?;
    method.parse().map_err(|e: String| StoreError::corrupt(table, e))
}

fn record_from_row(row: &SqliteRow) -> StoreResult<ConsentRecord> {
    Ok(ConsentRecord {
        principal: PrincipalId(row.try_get("principal")?),
        flags: flags_from_row(row)?,
        policy_version: row.try_get("policy_version")?,
        recorded_at: row.try_get("recorded_at")?,
        ip_address: row.try_get("ip_address")?,
        user_agent: row.try_get("user_agent")?,
        method: method_from_row(row, "consent_records")?,
        revision: row.try_get("revision")?,
    })
}

fn history_from_row(row: &SqliteRow) -> StoreResult<ConsentHistoryEntry> {
    Ok(ConsentHistoryEntry {
        id: row.try_get("id")?,
        principal: PrincipalId(row.try_get("principal")?),
        flags: flags_from_row(row)?,
        policy_version: row.try_get("policy_version")?,
        recorded_at: row.try_get("recorded_at")?,
        ip_address: row.try_get("ip_address")?,
        user_agent: row.try_get("user_agent")?,
        method: method_from_row(row, "consent_history")?,
    })
}

#[async_trait]
impl ConsentStore for SqliteStore {
    async fn record_consent(
        &self,
        principal: &PrincipalId,
        update: &ConsentUpdate,
        audit: &AuditContext,
    ) -> StoreResult<ConsentRecord> {
        let now = Utc::now();
        let flags = &update.flags;
        let mut tx = self.pool.begin().await?;

        // Ledger first: the record is never ahead of its history.
        sqlx::query(&format!(
            r#"
            INSERT INTO consent_history (
                principal, {FLAG_COLUMNS}, policy_version, recorded_at, ip_address, user_agent, method
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        ))
        .bind(principal.as_str())
        .bind(flags.terms_of_service)
        .bind(flags.privacy_policy)
        .bind(flags.data_processing)
        .bind(flags.marketing)
        .bind(flags.third_party_sharing)
        .bind(flags.cross_border_transfer)
        .bind(&update.policy_version)
        .bind(now)
        .bind(&audit.ip_address)
        .bind(&audit.user_agent)
        .bind(audit.method.as_str())
        .execute(&mut *tx)
        .await
        .map_err(StoreError::from_write)?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO consent_records (
                principal, {FLAG_COLUMNS}, policy_version, recorded_at, ip_address, user_agent, method, revision
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1)
            ON CONFLICT (principal) DO UPDATE SET
                terms_of_service = excluded.terms_of_service,
                privacy_policy = excluded.privacy_policy,
                data_processing = excluded.data_processing,
                marketing = excluded.marketing,
                third_party_sharing = excluded.third_party_sharing,
                cross_border_transfer = excluded.cross_border_transfer,
                policy_version = excluded.policy_version,
                recorded_at = excluded.recorded_at,
                ip_address = excluded.ip_address,
                user_agent = excluded.user_agent,
                method = excluded.method,
                revision = consent_records.revision + 1
            RETURNING principal, {FLAG_COLUMNS}, policy_version, recorded_at, ip_address, user_agent, method, revision
            "#
        ))
        .bind(principal.as_str())
        .bind(flags.terms_of_service)
        .bind(flags.privacy_policy)
        .bind(flags.data_processing)
        .bind(flags.marketing)
        .bind(flags.third_party_sharing)
        .bind(flags.cross_border_transfer)
        .bind(&update.policy_version)
        .bind(now)
        .bind(&audit.ip_address)
        .bind(&audit.user_agent)
        .bind(audit.method.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(StoreError::from_write)?;

        let record = record_from_row(&row)?;
        tx.commit().await?;

        info!(
            principal = %principal,
            revision = record.revision,
            policy_version = %record.policy_version,
            ip = %audit.ip_address.as_deref().map(mask_ip).unwrap_or_default(),
            method = %audit.method,
            "Recorded consent"
        );
        Ok(record)
    }

    async fn get_consent(&self, principal: &PrincipalId) -> StoreResult<Option<ConsentRecord>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT principal, {FLAG_COLUMNS}, policy_version, recorded_at, ip_address, user_agent, method, revision
            FROM consent_records
            WHERE principal = ?
            "#
        ))
        .bind(principal.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn consent_history(&self, principal: &PrincipalId) -> StoreResult<Vec<ConsentHistoryEntry>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT id, principal, {FLAG_COLUMNS}, policy_version, recorded_at, ip_address, user_agent, method
            FROM consent_history
            WHERE principal = ?
            ORDER BY id
            "#
        ))
        .bind(principal.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(history_from_row).collect()
    }
}
