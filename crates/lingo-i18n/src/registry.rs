//! Locale registry and fallback chain resolution

use lingo_common::LanguageCode;
use lingo_config::LocalesConfig;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::error::{I18nError, I18nResult};
use crate::language::Language;
use crate::negotiation::{canonicalize_tag, parse_accept_language};

/// Registered languages, their fallbacks and the global default.
///
/// The set of languages is fixed at construction; only the `supported`
/// flag can change afterwards (see [`LocaleRegistry::set_supported`]).
#[derive(Debug)]
pub struct LocaleRegistry {
    languages: Vec<Language>,
    index: HashMap<LanguageCode, usize>,
    fallbacks: HashMap<LanguageCode, Vec<LanguageCode>>,
    supported: RwLock<HashSet<LanguageCode>>,
    default: LanguageCode,
}

impl LocaleRegistry {
    /// Builds a registry from `(language, fallbacks)` pairs.
    pub fn new(
        entries: Vec<(Language, Vec<LanguageCode>)>,
        default: LanguageCode,
    ) -> I18nResult<Self> {
        let mut languages = Vec::with_capacity(entries.len());
        let mut index = HashMap::new();
        let mut fallbacks = HashMap::new();
        let mut supported = HashSet::new();

        for (language, language_fallbacks) in entries {
            if index.contains_key(&language.code) {
                return Err(I18nError::DuplicateLanguage(language.code.to_string()));
            }
            if language.supported {
                supported.insert(language.code.clone());
            }
            index.insert(language.code.clone(), languages.len());
            fallbacks.insert(language.code.clone(), language_fallbacks);
            languages.push(language);
        }

        for (code, targets) in &fallbacks {
            if let Some(unknown) = targets.iter().find(|t| !index.contains_key(*t)) {
                return Err(I18nError::UnknownFallback {
                    language: code.to_string(),
                    fallback: unknown.to_string(),
                });
            }
        }

        if !supported.contains(&default) {
            return Err(I18nError::InvalidDefault(default.to_string()));
        }

        info!(
            languages = languages.len(),
            supported = supported.len(),
            default = %default,
            "Locale registry initialized"
        );

        Ok(Self {
            languages,
            index,
            fallbacks,
            supported: RwLock::new(supported),
            default,
        })
    }

    /// Builds a registry from the `locales` configuration section.
    pub fn from_config(config: &LocalesConfig) -> I18nResult<Self> {
        let default = canonicalize_tag(&config.default_language)
            .ok_or_else(|| I18nError::InvalidLanguageId(config.default_language.clone()))?;

        let entries = config
            .languages
            .iter()
            .map(|entry| {
                let language = Language::from_config(entry)?;
                let fallbacks = entry
                    .fallbacks
                    .iter()
                    .map(|f| canonicalize_tag(f).ok_or_else(|| I18nError::InvalidLanguageId(f.clone())))
                    .collect::<I18nResult<Vec<_>>>()?;
                Ok((language, fallbacks))
            })
            .collect::<I18nResult<Vec<_>>>()?;

        Self::new(entries, default)
    }

    /// The global default language.
    pub fn default_language(&self) -> Language {
        self.snapshot(&self.default)
            .unwrap_or_else(|| Language::new(self.default.clone(), self.default.to_string()))
    }

    /// The global default language code.
    pub fn default_code(&self) -> &LanguageCode {
        &self.default
    }

    /// Looks up a registered language by tag, supported or not.
    pub fn get(&self, code: &str) -> Option<Language> {
        canonicalize_tag(code).and_then(|code| self.snapshot(&code))
    }

    /// Whether `code` is registered and currently supported.
    pub fn is_supported(&self, code: &str) -> bool {
        canonicalize_tag(code).is_some_and(|code| self.supported.read().contains(&code))
    }

    /// Every registered language, in configuration order.
    pub fn all_languages(&self) -> Vec<Language> {
        let supported = self.supported.read();
        self.languages
            .iter()
            .map(|language| Language {
                supported: supported.contains(&language.code),
                ..language.clone()
            })
            .collect()
    }

    /// Supported languages, in configuration order.
    pub fn supported_languages(&self) -> Vec<Language> {
        let supported = self.supported.read();
        self.languages
            .iter()
            .filter(|language| supported.contains(&language.code))
            .cloned()
            .map(|language| Language { supported: true, ..language })
            .collect()
    }

    /// Adds or removes a registered language from the supported set.
    ///
    /// The default language can never be removed.
    pub fn set_supported(&self, code: &LanguageCode, supported: bool) -> I18nResult<()> {
        if !self.index.contains_key(code) {
            return Err(I18nError::UnknownLanguage(code.to_string()));
        }
        if !supported && *code == self.default {
            return Err(I18nError::DefaultLanguageRetired(code.to_string()));
        }

        let mut set = self.supported.write();
        let changed = if supported {
            set.insert(code.clone())
        } else {
            set.remove(code)
        };
        if changed {
            info!(language = %code, supported, "Language support changed");
        }
        Ok(())
    }

    /// Ordered languages to try for a request in `requested`.
    ///
    /// The chain starts with the exact tag, continues with its shorter
    /// prefixes (`zh-Hant-TW`, `zh-Hant`, `zh`), then the configured
    /// fallbacks of each of those, and ends with the global default.
    /// Unsupported languages are skipped and each language appears once.
    /// A malformed or unknown request yields just the default.
    pub fn resolve_fallback_chain(&self, requested: &str) -> Vec<Language> {
        let supported = self.supported.read();
        let mut seen = HashSet::new();
        let mut chain = Vec::new();

        if let Some(code) = canonicalize_tag(requested) {
            let mut pending: Vec<LanguageCode> = prefixes(&code);
            let mut cursor = 0;
            while cursor < pending.len() {
                let candidate = pending[cursor].clone();
                cursor += 1;
                if !seen.insert(candidate.clone()) {
                    continue;
                }
                if let Some(next) = self.fallbacks.get(&candidate) {
                    pending.extend(next.iter().cloned());
                }
                if candidate == self.default || !supported.contains(&candidate) {
                    continue;
                }
                if let Some(language) = self.language(&candidate) {
                    chain.push(Language { supported: true, ..language.clone() });
                }
            }
        }

        if let Some(default) = self.language(&self.default) {
            chain.push(Language { supported: true, ..default.clone() });
        }

        debug!(requested, chain = ?chain.iter().map(|l| l.code.as_str()).collect::<Vec<_>>(), "Resolved fallback chain");
        chain
    }

    /// Picks the best supported language for an `Accept-Language` header.
    ///
    /// Falls back to the default when nothing in the header is supported.
    pub fn negotiate(&self, accept_language: &str) -> LanguageCode {
        let supported = self.supported.read();
        for range in parse_accept_language(accept_language) {
            match range.code {
                None => return self.default.clone(),
                Some(code) => {
                    if let Some(hit) = prefixes(&code).into_iter().find(|c| supported.contains(c)) {
                        return hit;
                    }
                }
            }
        }
        self.default.clone()
    }

    fn language(&self, code: &LanguageCode) -> Option<&Language> {
        self.index.get(code).map(|&i| &self.languages[i])
    }

    fn snapshot(&self, code: &LanguageCode) -> Option<Language> {
        let supported = self.supported.read().contains(code);
        self.language(code).map(|language| Language { supported, ..language.clone() })
    }
}

/// `zh-Hant-TW` -> `[zh-Hant-TW, zh-Hant, zh]`.
fn prefixes(code: &LanguageCode) -> Vec<LanguageCode> {
    let subtags: Vec<&str> = code.as_str().split('-').collect();
    (1..=subtags.len())
        .rev()
        .filter_map(|n| LanguageCode::parse(&subtags[..n].join("-")).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingo_config::LanguageConfig;

    fn registry() -> LocaleRegistry {
        let config = LocalesConfig {
            default_language: "en".to_string(),
            languages: vec![
                LanguageConfig::new("en", "English"),
                LanguageConfig::new("ja", "日本語").with_fallbacks(&["en"]),
                LanguageConfig::new("zh", "中文"),
                LanguageConfig::new("zh-TW", "繁體中文").with_fallbacks(&["zh", "ja"]),
                LanguageConfig::new("ko", "한국어").with_fallbacks(&["ja"]),
                LanguageConfig::new("ar", "العربية").rtl().unsupported(),
            ],
        };
        LocaleRegistry::from_config(&config).unwrap()
    }

    fn chain(registry: &LocaleRegistry, requested: &str) -> Vec<String> {
        registry
            .resolve_fallback_chain(requested)
            .into_iter()
            .map(|l| l.code.to_string())
            .collect()
    }

    #[test]
    fn test_exact_then_primary_then_fallbacks_then_default() {
        let registry = registry();
        assert_eq!(chain(&registry, "zh-TW"), vec!["zh-TW", "zh", "ja", "en"]);
        assert_eq!(chain(&registry, "ja"), vec!["ja", "en"]);
        assert_eq!(chain(&registry, "en"), vec!["en"]);
    }

    #[test]
    fn test_fallbacks_are_followed_transitively() {
        let registry = registry();
        assert_eq!(chain(&registry, "ko"), vec!["ko", "ja", "en"]);
    }

    #[test]
    fn test_region_falls_back_to_primary() {
        let registry = registry();
        assert_eq!(chain(&registry, "ja-JP"), vec!["ja", "en"]);
        assert_eq!(chain(&registry, "zh_tw"), vec!["zh-TW", "zh", "ja", "en"]);
    }

    #[test]
    fn test_unknown_or_malformed_yields_default() {
        let registry = registry();
        assert_eq!(chain(&registry, "fr"), vec!["en"]);
        assert_eq!(chain(&registry, ""), vec!["en"]);
        assert_eq!(chain(&registry, "???"), vec!["en"]);
    }

    #[test]
    fn test_unsupported_languages_are_skipped() {
        let registry = registry();
        assert_eq!(chain(&registry, "ar"), vec!["en"]);
        assert!(registry.get("ar").is_some());
        assert!(!registry.is_supported("ar"));
    }

    #[test]
    fn test_set_supported_updates_chains() {
        let registry = registry();
        let ja = LanguageCode::parse("ja").unwrap();

        registry.set_supported(&ja, false).unwrap();
        assert_eq!(chain(&registry, "ko"), vec!["ko", "en"]);
        assert!(!registry.get("ja").unwrap().supported);
        assert_eq!(registry.supported_languages().len(), 4);

        registry.set_supported(&ja, true).unwrap();
        assert_eq!(chain(&registry, "ko"), vec!["ko", "ja", "en"]);
    }

    #[test]
    fn test_default_cannot_be_retired() {
        let registry = registry();
        let en = LanguageCode::parse("en").unwrap();
        assert_eq!(
            registry.set_supported(&en, false),
            Err(I18nError::DefaultLanguageRetired("en".to_string()))
        );

        let fr = LanguageCode::parse("fr").unwrap();
        assert!(matches!(
            registry.set_supported(&fr, true),
            Err(I18nError::UnknownLanguage(_))
        ));
    }

    #[test]
    fn test_negotiate() {
        let registry = registry();
        assert_eq!(registry.negotiate("ja-JP,ja;q=0.9,en;q=0.8").as_str(), "ja");
        assert_eq!(registry.negotiate("fr-CH, fr;q=0.9, zh-TW;q=0.5").as_str(), "zh-TW");
        assert_eq!(registry.negotiate("ar, ko;q=0.2").as_str(), "ko");
        assert_eq!(registry.negotiate("fr, *;q=0.5").as_str(), "en");
        assert_eq!(registry.negotiate("").as_str(), "en");
        assert_eq!(registry.negotiate("garbage!!").as_str(), "en");
    }

    #[test]
    fn test_construction_errors() {
        let en = LanguageCode::parse("en").unwrap();
        let ja = LanguageCode::parse("ja").unwrap();
        let ko = LanguageCode::parse("ko").unwrap();

        let duplicate = LocaleRegistry::new(
            vec![
                (Language::new(en.clone(), "English"), vec![]),
                (Language::new(en.clone(), "English"), vec![]),
            ],
            en.clone(),
        );
        assert!(matches!(duplicate, Err(I18nError::DuplicateLanguage(_))));

        let unknown_fallback = LocaleRegistry::new(
            vec![
                (Language::new(en.clone(), "English"), vec![]),
                (Language::new(ja.clone(), "日本語"), vec![ko]),
            ],
            en.clone(),
        );
        assert!(matches!(unknown_fallback, Err(I18nError::UnknownFallback { .. })));

        let missing_default = LocaleRegistry::new(vec![(Language::new(ja, "日本語"), vec![])], en);
        assert!(matches!(missing_default, Err(I18nError::InvalidDefault(_))));
    }
}
