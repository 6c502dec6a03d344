//! Domain records persisted by the store

use chrono::{DateTime, Utc};
use lingo_common::{EntityId, EntityKind, LanguageCode, PrincipalId, TextFields};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Language-agnostic base record of a translatable entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub owner: PrincipalId,
    /// Prices, dates, foreign keys. Never translated.
    pub attributes: serde_json::Value,
    /// Language the translatable text was authored in.
    pub source_language: LanguageCode,
    /// Bumped on every update; translation rows record the revision they came from.
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for [`crate::EntityStore::create_entity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntity {
    pub kind: EntityKind,
    pub owner: PrincipalId,
    pub attributes: serde_json::Value,
    pub source_language: LanguageCode,
}

/// Partial update for [`crate::EntityStore::update_entity`]. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityUpdate {
    pub attributes: Option<serde_json::Value>,
    pub source_language: Option<LanguageCode>,
}

/// Text of one entity in one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub entity_id: EntityId,
    pub language: LanguageCode,
    pub fields: TextFields,
    /// Entity revision this row was produced from.
    pub source_revision: i64,
    pub updated_at: DateTime<Utc>,
}

/// What an upsert did to the `(entity, language)` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    /// No row existed.
    Inserted,
    /// The existing row was replaced.
    Updated,
    /// The existing row already held identical content.
    Unchanged,
    /// The existing row came from a newer entity revision and was kept.
    Stale,
    /// The language is no longer supported, so nothing was written.
    LanguageRetired,
}

impl UpsertOutcome {
    /// Whether the stored row now holds the written content.
    pub fn is_current(&self) -> bool {
        !matches!(self, Self::Stale | Self::LanguageRetired)
    }
}

/// The six consent flags tracked per principal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsentFlags {
    pub terms_of_service: bool,
    pub privacy_policy: bool,
    pub data_processing: bool,
    pub marketing: bool,
    pub third_party_sharing: bool,
    pub cross_border_transfer: bool,
}

/// How consent was captured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentMethod {
    #[default]
    Api,
    Onboarding,
    Settings,
    Admin,
}

impl ConsentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Onboarding => "onboarding",
            Self::Settings => "settings",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for ConsentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "api" => Ok(Self::Api),
            "onboarding" => Ok(Self::Onboarding),
            "settings" => Ok(Self::Settings),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown consent method: {other}")),
        }
    }
}

/// A consent mutation requested by the principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentUpdate {
    pub flags: ConsentFlags,
    pub policy_version: String,
}

/// Where a consent mutation came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub method: ConsentMethod,
}

/// Current consent state of one principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub principal: PrincipalId,
    pub flags: ConsentFlags,
    pub policy_version: String,
    pub recorded_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub method: ConsentMethod,
    /// Number of mutations recorded so far.
    pub revision: i64,
}

/// One immutable row of the consent ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentHistoryEntry {
    pub id: i64,
    pub principal: PrincipalId,
    pub flags: ConsentFlags,
    pub policy_version: String,
    pub recorded_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub method: ConsentMethod,
}
