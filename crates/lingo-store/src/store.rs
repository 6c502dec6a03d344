//! Store traits
//!
//! Population and the services depend on these traits rather than on
//! [`crate::SqliteStore`] directly.

use async_trait::async_trait;
use lingo_common::{EntityId, EntityKind, LanguageCode, PrincipalId, TextFields};
use lingo_i18n::Language;

use crate::error::StoreResult;
use crate::models::{
    AuditContext, ConsentHistoryEntry, ConsentRecord, ConsentUpdate, Entity, EntityUpdate, NewEntity,
    Translation, UpsertOutcome,
};

/// Base entity persistence.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Persists a new entity at revision 1.
    async fn create_entity(&self, new: NewEntity) -> StoreResult<Entity>;

    /// Loads an entity.
    async fn get_entity(&self, id: EntityId) -> StoreResult<Option<Entity>>;

    /// Applies `update` and bumps the revision. `None` if the entity does not exist.
    async fn update_entity(&self, id: EntityId, update: EntityUpdate) -> StoreResult<Option<Entity>>;

    /// Deletes an entity and, through the cascade, its translations.
    async fn delete_entity(&self, id: EntityId) -> StoreResult<bool>;

    /// Most recently created entities first.
    async fn list_entities(&self, kind: Option<EntityKind>, limit: u32) -> StoreResult<Vec<Entity>>;
}

/// Per-language translation rows.
#[async_trait]
pub trait TranslationStore: Send + Sync {
    /// Inserts or replaces the row for `(entity_id, language)`.
    ///
    /// A row produced from an older `source_revision` never replaces one
    /// produced from a newer revision.
    async fn upsert_translation(
        &self,
        entity_id: EntityId,
        language: &LanguageCode,
        fields: &TextFields,
        source_revision: i64,
    ) -> StoreResult<UpsertOutcome>;

    /// Loads the row for `(entity_id, language)`.
    async fn get_translation(
        &self,
        entity_id: EntityId,
        language: &LanguageCode,
    ) -> StoreResult<Option<Translation>>;

    /// All rows of one entity, ordered by language.
    async fn list_translations(&self, entity_id: EntityId) -> StoreResult<Vec<Translation>>;

    /// Deletes all rows of one entity, returning how many were removed.
    async fn delete_translations_for_entity(&self, entity_id: EntityId) -> StoreResult<u64>;
}

/// The languages reference table.
#[async_trait]
pub trait LanguageStore: Send + Sync {
    /// Inserts or refreshes the given languages.
    async fn seed_languages(&self, languages: &[Language]) -> StoreResult<()>;

    /// All stored languages, ordered by code.
    async fn list_languages(&self) -> StoreResult<Vec<Language>>;

    /// Marks a language unsupported and deletes its translations atomically.
    /// Returns the number of translation rows removed.
    async fn retire_language(&self, code: &LanguageCode) -> StoreResult<u64>;
}

/// Consent records and the consent ledger.
#[async_trait]
pub trait ConsentStore: Send + Sync {
    /// Appends to the ledger and upserts the record in one transaction.
    async fn record_consent(
        &self,
        principal: &PrincipalId,
        update: &ConsentUpdate,
        audit: &AuditContext,
    ) -> StoreResult<ConsentRecord>;

    /// Current consent state.
    async fn get_consent(&self, principal: &PrincipalId) -> StoreResult<Option<ConsentRecord>>;

    /// Ledger rows of one principal, oldest first.
    async fn consent_history(&self, principal: &PrincipalId) -> StoreResult<Vec<ConsentHistoryEntry>>;
}
