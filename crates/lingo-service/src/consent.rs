//! Consent recording with an audit trail

use lingo_common::PrincipalId;
use lingo_store::{AuditContext, ConsentHistoryEntry, ConsentRecord, ConsentStore, ConsentUpdate};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::error::{ServiceError, ServiceResult};

const MAX_POLICY_VERSION_LEN: usize = 32;
const MAX_USER_AGENT_LEN: usize = 512;

/// Records consent decisions. Every change lands in the append-only history
/// in the same transaction as the current record.
#[derive(Clone)]
pub struct ConsentService {
    store: Arc<dyn ConsentStore>,
}

impl ConsentService {
    pub fn new(store: Arc<dyn ConsentStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, update, audit), fields(principal = %principal, method = %audit.method))]
    pub async fn record_consent(
        &self,
        principal: &PrincipalId,
        update: ConsentUpdate,
        mut audit: AuditContext,
    ) -> ServiceResult<ConsentRecord> {
        let version = update.policy_version.trim();
        if version.is_empty() || version.len() > MAX_POLICY_VERSION_LEN {
            return Err(ServiceError::validation(
                "policy_version",
                format!("must be 1 to {MAX_POLICY_VERSION_LEN} characters"),
            ));
        }
        // Oversized headers are stored truncated rather than rejected.
        audit.user_agent = audit
            .user_agent
            .map(|agent| lingo_common::utils::truncate_string(&agent, MAX_USER_AGENT_LEN));

        let record = self.store.record_consent(principal, &update, &audit).await?;
        info!(revision = record.revision, policy_version = %record.policy_version, "Consent recorded");
        Ok(record)
    }

    pub async fn get_consent(&self, principal: &PrincipalId) -> ServiceResult<ConsentRecord> {
        self.store
            .get_consent(principal)
            .await?
            .ok_or_else(|| ServiceError::not_found("consent record", principal))
    }

    /// History entries of `principal`, oldest first.
    pub async fn consent_history(&self, principal: &PrincipalId) -> ServiceResult<Vec<ConsentHistoryEntry>> {
        Ok(self.store.consent_history(principal).await?)
    }
}
