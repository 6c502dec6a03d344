//! Property tests for fallback chain resolution.

use lingo_common::test_utils::config_fixtures::minimal_config_yaml;
use lingo_common::test_utils::property_testing::{arbitrary_request_strategy, language_tag_strategy};
use lingo_config::ConfigLoader;
use lingo_i18n::LocaleRegistry;
use proptest::prelude::*;
use std::collections::HashSet;

fn registry() -> LocaleRegistry {
    let config = ConfigLoader::from_yaml_str(minimal_config_yaml()).expect("fixture config is valid");
    LocaleRegistry::from_config(&config.locales).expect("fixture locales are valid")
}

fn assert_chain_shape(registry: &LocaleRegistry, requested: &str) -> Result<(), TestCaseError> {
    let chain = registry.resolve_fallback_chain(requested);
    let default = registry.default_code().clone();

    prop_assert!(!chain.is_empty());
    prop_assert_eq!(&chain.last().unwrap().code, &default);
    prop_assert_eq!(chain.iter().filter(|l| l.code == default).count(), 1);

    let unique: HashSet<_> = chain.iter().map(|l| l.code.clone()).collect();
    prop_assert_eq!(unique.len(), chain.len());

    for language in &chain {
        prop_assert!(language.supported);
        prop_assert!(registry.is_supported(language.code.as_str()));
    }
    Ok(())
}

proptest! {
    #[test]
    fn chain_is_well_formed_for_any_tag(tag in language_tag_strategy()) {
        let registry = registry();
        assert_chain_shape(&registry, &tag)?;
    }

    #[test]
    fn chain_is_well_formed_for_arbitrary_input(input in arbitrary_request_strategy()) {
        let registry = registry();
        assert_chain_shape(&registry, &input)?;
    }

    #[test]
    fn supported_request_starts_with_itself(index in 0usize..4) {
        let registry = registry();
        let languages = registry.supported_languages();
        let language = &languages[index % languages.len()];
        let chain = registry.resolve_fallback_chain(language.code.as_str());
        prop_assert_eq!(&chain[0].code, &language.code);
    }

    #[test]
    fn negotiation_always_returns_a_supported_language(input in arbitrary_request_strategy()) {
        let registry = registry();
        let chosen = registry.negotiate(&input);
        prop_assert!(registry.is_supported(chosen.as_str()));
    }
}

#[test]
fn fixture_chains() {
    let registry = registry();
    let codes = |requested: &str| -> Vec<String> {
        registry
            .resolve_fallback_chain(requested)
            .into_iter()
            .map(|l| l.code.to_string())
            .collect()
    };

    assert_eq!(codes("zh-TW"), vec!["zh-TW", "zh", "en"]);
    assert_eq!(codes("ja"), vec!["ja", "en"]);
    assert_eq!(codes("de"), vec!["en"]);
}
