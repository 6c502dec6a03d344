//! Population jobs and their reports

use lingo_common::{EntityId, LanguageCode, TextFields};
use lingo_store::{Entity, UpsertOutcome};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Everything needed to populate one entity revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationJob {
    pub entity_id: EntityId,
    /// Entity revision the text belongs to.
    pub revision: i64,
    /// Language `fields` are written in. Never inferred.
    pub source_language: LanguageCode,
    pub fields: TextFields,
}

impl PopulationJob {
    /// A job for the current revision of `entity`.
    pub fn for_entity(entity: &Entity, fields: TextFields) -> Self {
        Self {
            entity_id: entity.id,
            revision: entity.revision,
            source_language: entity.source_language.clone(),
            fields,
        }
    }
}

/// Result of populating one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LanguageOutcome {
    /// The row was written (or already held this content).
    Translated { upsert: UpsertOutcome, attempts: u32 },
    /// Every attempt failed.
    Failed { error: String, attempts: u32 },
    /// A newer entity revision already populated this language.
    Superseded,
    /// The entity was deleted while the job ran.
    EntityGone,
    /// The language was retired while the job ran; nothing was stored.
    LanguageRetired,
}

impl LanguageOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Translated { .. } | Self::Superseded | Self::LanguageRetired)
    }
}

/// Outcome for one language of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageReport {
    pub language: LanguageCode,
    pub outcome: LanguageOutcome,
}

/// Outcome of a whole job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationReport {
    pub entity_id: EntityId,
    pub revision: i64,
    pub source: LanguageReport,
    pub targets: Vec<LanguageReport>,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl PopulationReport {
    /// Reports for every language, source first.
    pub fn languages(&self) -> impl Iterator<Item = &LanguageReport> {
        std::iter::once(&self.source).chain(self.targets.iter())
    }

    /// Outcome for one language.
    pub fn outcome(&self, language: &LanguageCode) -> Option<&LanguageOutcome> {
        self.languages()
            .find(|report| &report.language == language)
            .map(|report| &report.outcome)
    }

    /// Languages whose population failed.
    pub fn failed_languages(&self) -> Vec<&LanguageCode> {
        self.languages()
            .filter(|report| matches!(report.outcome, LanguageOutcome::Failed { .. }))
            .map(|report| &report.language)
            .collect()
    }

    /// Whether every language succeeded.
    pub fn is_complete(&self) -> bool {
        self.languages().all(|report| report.outcome.is_success())
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis().min(u128::from(u64::MAX)) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
