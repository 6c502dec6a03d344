//! The localized projection resolver
//!
//! Reads only. A missing translation falls back along the registry's chain
//! and, when nothing matches, yields the base record with empty text rather
//! than an error. Resolution never schedules population.

use chrono::{DateTime, Utc};
use lingo_common::{EntityId, EntityKind, LanguageCode, PrincipalId, TextFields};
use lingo_i18n::{canonicalize_tag, LocaleRegistry};
use lingo_store::{EntityStore, Translation, TranslationStore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::{ServiceError, ServiceResult};
use crate::store::LocalizedStore;

/// An entity projected into one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizedView {
    pub entity_id: EntityId,
    pub kind: EntityKind,
    pub owner: PrincipalId,
    /// Language-agnostic fields, exactly as stored on the base record.
    pub attributes: serde_json::Value,
    pub revision: i64,
    /// The language tag as the caller asked for it.
    pub requested_language: String,
    /// Language of `fields`, `None` when no translation exists yet.
    pub served_language: Option<LanguageCode>,
    pub is_fallback: bool,
    pub fields: TextFields,
    /// Entity revision the served text was produced from.
    pub source_revision: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

/// Builds [`LocalizedView`]s from the store and the locale registry.
#[derive(Clone)]
pub struct ProjectionResolver {
    store: Arc<dyn LocalizedStore>,
    registry: Arc<LocaleRegistry>,
}

impl ProjectionResolver {
    pub fn new(store: Arc<dyn LocalizedStore>, registry: Arc<LocaleRegistry>) -> Self {
        Self { store, registry }
    }

    /// Projects `entity_id` into `requested`, walking the fallback chain.
    #[instrument(skip(self), fields(entity_id = %entity_id))]
    pub async fn get_localized_view(&self, entity_id: EntityId, requested: &str) -> ServiceResult<LocalizedView> {
        let entity = self
            .store
            .get_entity(entity_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("entity", entity_id))?;

        let chain = self.registry.resolve_fallback_chain(requested);
        let mut rows: HashMap<LanguageCode, Translation> = self
            .store
            .list_translations(entity_id)
            .await?
            .into_iter()
            .map(|row| (row.language.clone(), row))
            .collect();

        let served = chain.iter().find_map(|language| rows.remove(&language.code));
        let requested_code = canonicalize_tag(requested);

        let (served_language, fields, source_revision) = match served {
            Some(row) => (Some(row.language), row.fields, Some(row.source_revision)),
            None => {
                debug!(requested, "No translation stored yet, serving base record");
                (None, TextFields::new(), None)
            }
        };
        let is_fallback = match (&served_language, &requested_code) {
            (Some(served), Some(requested)) => served != requested,
            (Some(_), None) => true,
            (None, _) => false,
        };

        Ok(LocalizedView {
            entity_id,
            kind: entity.kind,
            owner: entity.owner,
            attributes: entity.attributes,
            revision: entity.revision,
            requested_language: requested.to_string(),
            served_language,
            is_fallback,
            fields,
            source_revision,
            updated_at: entity.updated_at,
        })
    }
}
