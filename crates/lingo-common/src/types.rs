//! Common type definitions and newtype wrappers for domain modeling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::LingoError;

/// Identifier of a translatable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Generates a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = LingoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| LingoError::validation_field(format!("invalid entity id: {s}"), "id"))
    }
}

/// Opaque id of an authenticated principal, as supplied by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(pub String);

impl PrincipalId {
    /// Wraps a principal id. Blank ids are rejected.
    pub fn new(id: impl Into<String>) -> Result<Self, LingoError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(LingoError::validation_field("principal id cannot be empty", "principal"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A language tag in canonical casing (`en`, `ja`, `zh-Hant`, `pt-BR`).
///
/// Only the casing is normalized here; whether a code is *supported* is
/// decided by the locale registry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Parses and canonicalizes a language tag.
    ///
    /// Accepts `_` as a subtag separator. The primary subtag must be 2-8
    /// ASCII letters; further subtags must be 1-8 ASCII alphanumerics.
    pub fn parse(raw: &str) -> Result<Self, LingoError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(LingoError::validation_field("language code cannot be empty", "language"));
        }

        let mut canonical = Vec::new();
        for (index, subtag) in raw.split(['-', '_']).enumerate() {
            let valid = if index == 0 {
                (2..=8).contains(&subtag.len()) && subtag.chars().all(|c| c.is_ascii_alphabetic())
            } else {
                (1..=8).contains(&subtag.len()) && subtag.chars().all(|c| c.is_ascii_alphanumeric())
            };
            if !valid {
                return Err(LingoError::validation_field(
                    format!("invalid language code: {raw}"),
                    "language",
                ));
            }

            let subtag = if index == 0 {
                subtag.to_ascii_lowercase()
            } else if subtag.len() == 2 && subtag.chars().all(|c| c.is_ascii_alphabetic()) {
                subtag.to_ascii_uppercase()
            } else if subtag.len() == 4 && subtag.chars().all(|c| c.is_ascii_alphabetic()) {
                let lower = subtag.to_ascii_lowercase();
                let mut chars = lower.chars();
                chars
                    .next()
                    .map(|first| first.to_ascii_uppercase().to_string() + chars.as_str())
                    .unwrap_or_default()
            } else {
                subtag.to_ascii_lowercase()
            };
            canonical.push(subtag);
        }

        Ok(Self(canonical.join("-")))
    }

    /// Returns the canonical tag.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the primary language subtag (`zh` for `zh-Hant-TW`).
    pub fn primary(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }

    /// Whether this tag carries subtags beyond the primary language.
    pub fn has_subtags(&self) -> bool {
        self.0.contains('-')
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LanguageCode {
    type Err = LingoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = LingoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.0
    }
}

/// Kinds of translatable domain objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A user account.
    User,
    /// A user profile.
    Profile,
    /// A search/listing tag.
    Tag,
    /// A rental property listing.
    Property,
    /// A real-estate agency.
    Agency,
}

impl EntityKind {
    /// Storage representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Profile => "profile",
            Self::Tag => "tag",
            Self::Property => "property",
            Self::Agency => "agency",
        }
    }

    /// All kinds.
    pub fn all() -> [Self; 5] {
        [Self::User, Self::Profile, Self::Tag, Self::Property, Self::Agency]
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = LingoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LingoError::validation_field(format!("unknown entity kind: {s}"), "kind"))
    }
}

/// Translatable text fields keyed by field name (`title`, `description`, ...).
pub type TextFields = std::collections::BTreeMap<String, String>;
