//! Write orchestration for localized entities

use lingo_common::{EntityId, EntityKind, LanguageCode, PrincipalId, TextFields};
use lingo_i18n::{Language, LocaleRegistry};
use lingo_population::{PopulationJob, PopulationScheduler, PopulationTicket};
use lingo_store::{Entity, EntityStore, EntityUpdate, LanguageStore, NewEntity, TranslationStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::resolver::{LocalizedView, ProjectionResolver};
use crate::store::LocalizedStore;

const MAX_FIELD_NAME_LEN: usize = 64;

/// Input for [`LocalizationService::create_entity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLocalizedEntity {
    pub kind: EntityKind,
    #[serde(default = "empty_object")]
    pub attributes: serde_json::Value,
    /// Language `fields` are written in.
    pub source_language: String,
    #[serde(default)]
    pub fields: TextFields,
}

/// Input for [`LocalizationService::update_entity`]. Absent parts are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalizedEntityUpdate {
    pub attributes: Option<serde_json::Value>,
    pub source_language: Option<String>,
    pub fields: Option<TextFields>,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Result of a write: the stored base record and, when text changed, the
/// ticket of the population job it scheduled.
#[derive(Debug)]
pub struct EntityWrite {
    pub entity: Entity,
    pub population: Option<PopulationTicket>,
}

/// Creates, updates and deletes localized entities.
///
/// Writes return as soon as the base record is stored; translation rows
/// follow asynchronously through the [`PopulationScheduler`].
#[derive(Clone)]
pub struct LocalizationService {
    store: Arc<dyn LocalizedStore>,
    registry: Arc<LocaleRegistry>,
    scheduler: Arc<PopulationScheduler>,
    resolver: ProjectionResolver,
}

impl LocalizationService {
    pub fn new(
        store: Arc<dyn LocalizedStore>,
        registry: Arc<LocaleRegistry>,
        scheduler: Arc<PopulationScheduler>,
    ) -> Self {
        let resolver = ProjectionResolver::new(Arc::clone(&store), Arc::clone(&registry));
        Self {
            store,
            registry,
            scheduler,
            resolver,
        }
    }

    pub fn registry(&self) -> &Arc<LocaleRegistry> {
        &self.registry
    }

    pub fn scheduler(&self) -> &Arc<PopulationScheduler> {
        &self.scheduler
    }

    /// Stores a new entity and schedules population of its text.
    #[instrument(skip(self, new), fields(kind = %new.kind, owner = %owner))]
    pub async fn create_entity(&self, owner: PrincipalId, new: NewLocalizedEntity) -> ServiceResult<EntityWrite> {
        let source_language = self.source_language(&new.source_language)?;
        validate_attributes(&new.attributes)?;
        validate_fields(&new.fields)?;

        let entity = self
            .store
            .create_entity(NewEntity {
                kind: new.kind,
                owner,
                attributes: new.attributes,
                source_language,
            })
            .await?;
        info!(entity_id = %entity.id, "Entity created");

        self.store_source_text(&entity, &new.fields).await?;
        let population = self.schedule(&entity, new.fields);
        Ok(EntityWrite { entity, population })
    }

    /// Applies `update` to an entity.
    ///
    /// Population is scheduled only when new text is supplied. Changing the
    /// source language requires new text.
    #[instrument(skip(self, update), fields(entity_id = %id))]
    pub async fn update_entity(&self, id: EntityId, update: LocalizedEntityUpdate) -> ServiceResult<EntityWrite> {
        let source_language = update
            .source_language
            .as_deref()
            .map(|tag| self.source_language(tag))
            .transpose()?;
        if let Some(attributes) = &update.attributes {
            validate_attributes(attributes)?;
        }
        if let Some(fields) = &update.fields {
            validate_fields(fields)?;
        }

        if update.fields.is_none() {
            if let Some(language) = &source_language {
                let current = self.get_entity(id).await?;
                if &current.source_language != language {
                    return Err(ServiceError::validation(
                        "fields",
                        "changing source_language requires new fields",
                    ));
                }
            }
        }

        let entity = self
            .store
            .update_entity(
                id,
                EntityUpdate {
                    attributes: update.attributes,
                    source_language,
                },
            )
            .await?
            .ok_or_else(|| ServiceError::not_found("entity", id))?;
        info!(revision = entity.revision, "Entity updated");

        let population = match update.fields {
            Some(fields) => {
                self.store_source_text(&entity, &fields).await?;
                self.schedule(&entity, fields)
            }
            None => None,
        };
        Ok(EntityWrite { entity, population })
    }

    /// Deletes an entity together with all of its translations.
    #[instrument(skip(self), fields(entity_id = %id))]
    pub async fn delete_entity(&self, id: EntityId) -> ServiceResult<()> {
        if !self.store.delete_entity(id).await? {
            return Err(ServiceError::not_found("entity", id));
        }
        info!("Entity deleted");
        Ok(())
    }

    pub async fn get_entity(&self, id: EntityId) -> ServiceResult<Entity> {
        self.store
            .get_entity(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("entity", id))
    }

    /// See [`ProjectionResolver::get_localized_view`].
    pub async fn get_localized_view(&self, id: EntityId, requested: &str) -> ServiceResult<LocalizedView> {
        self.resolver.get_localized_view(id, requested).await
    }

    /// Runs population again from the stored source-language text.
    ///
    /// Used to retry languages that failed persistently and to backfill a
    /// newly added language.
    #[instrument(skip(self), fields(entity_id = %id))]
    pub async fn repopulate(&self, id: EntityId) -> ServiceResult<PopulationTicket> {
        let entity = self.get_entity(id).await?;
        let source = self
            .store
            .get_translation(id, &entity.source_language)
            .await?
            .ok_or_else(|| ServiceError::not_found("source text", id))?;

        let job = PopulationJob::for_entity(&entity, source.fields);
        let ticket = self.scheduler.schedule(job)?;
        info!(revision = entity.revision, "Repopulation scheduled");
        Ok(ticket)
    }

    /// All configured languages, retired ones included.
    pub fn languages(&self) -> Vec<Language> {
        self.registry.all_languages()
    }

    /// Removes a language from the supported set and deletes its
    /// translations. The default language cannot be retired.
    #[instrument(skip(self))]
    pub async fn retire_language(&self, code: &str) -> ServiceResult<u64> {
        let language = self
            .registry
            .get(code)
            .ok_or_else(|| ServiceError::not_found("language", code))?;

        self.registry.set_supported(&language.code, false)?;
        match self.store.retire_language(&language.code).await {
            Ok(removed) => {
                info!(language = %language.code, removed, "Language retired");
                Ok(removed)
            }
            Err(err) => {
                self.registry.set_supported(&language.code, language.supported)?;
                Err(err.into())
            }
        }
    }

    fn source_language(&self, tag: &str) -> ServiceResult<LanguageCode> {
        let language = self
            .registry
            .get(tag)
            .ok_or_else(|| ServiceError::validation("source_language", format!("unknown language '{tag}'")))?;
        if !self.registry.is_supported(language.code.as_str()) {
            return Err(ServiceError::validation(
                "source_language",
                format!("language '{}' is not supported", language.code),
            ));
        }
        Ok(language.code)
    }

    /// Writes the source-language row on the write path, so the text
    /// survives even when no population job runs.
    async fn store_source_text(&self, entity: &Entity, fields: &TextFields) -> ServiceResult<()> {
        let outcome = self
            .store
            .upsert_translation(entity.id, &entity.source_language, fields, entity.revision)
            .await?;
        debug!(entity_id = %entity.id, ?outcome, "Source text stored");
        Ok(())
    }

    /// Hands the text to the scheduler. A refused job is logged, not
    /// returned: the base record and source text are already stored and
    /// [`Self::repopulate`] can translate them later.
    fn schedule(&self, entity: &Entity, fields: TextFields) -> Option<PopulationTicket> {
        match self.scheduler.schedule(PopulationJob::for_entity(entity, fields)) {
            Ok(ticket) => Some(ticket),
            Err(err) => {
                warn!(entity_id = %entity.id, error = %err, "Population not scheduled");
                None
            }
        }
    }
}

fn validate_attributes(attributes: &serde_json::Value) -> ServiceResult<()> {
    if attributes.is_object() {
        Ok(())
    } else {
        Err(ServiceError::validation("attributes", "must be a JSON object"))
    }
}

fn validate_fields(fields: &TextFields) -> ServiceResult<()> {
    for name in fields.keys() {
        if name.trim().is_empty() || name.len() > MAX_FIELD_NAME_LEN {
            return Err(ServiceError::validation(
                "fields",
                format!("field names must be 1 to {MAX_FIELD_NAME_LEN} characters"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_must_be_object() {
        assert!(validate_attributes(&serde_json::json!({ "rent": 1 })).is_ok());
        assert!(validate_attributes(&serde_json::json!([1, 2])).is_err());
        assert!(validate_attributes(&serde_json::Value::Null).is_err());
    }

    #[test]
    fn test_field_names_are_checked() {
        let mut fields = TextFields::new();
        fields.insert("title".into(), "Hello".into());
        assert!(validate_fields(&fields).is_ok());

        fields.insert(" ".into(), "blank".into());
        assert!(matches!(
            validate_fields(&fields),
            Err(ServiceError::Validation { field: "fields", .. })
        ));
    }

    #[test]
    fn test_new_entity_defaults() {
        let new: NewLocalizedEntity =
            serde_json::from_str(r#"{ "kind": "tag", "source_language": "en" }"#).unwrap();
        assert!(new.attributes.is_object());
        assert!(new.fields.is_empty());
    }
}
