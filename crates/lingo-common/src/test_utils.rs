//! Test utilities and shared test helpers for Lingo.
//!
//! Enabled for other crates through the `testing` feature.

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

use crate::types::TextFields;

/// Initialize test logging once per test run.
static INIT: Once = Once::new();

/// Initialize logging for tests with a sensible default configuration.
/// Safe to call from every test.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}

/// Create a temporary directory for tests that automatically cleans up.
#[cfg(feature = "tempfile")]
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Builds text fields from `(name, text)` pairs.
pub fn text_fields(pairs: &[(&str, &str)]) -> TextFields {
    pairs
        .iter()
        .map(|(name, text)| ((*name).to_string(), (*text).to_string()))
        .collect()
}

/// Configuration-related test fixtures.
pub mod config_fixtures {
    /// A minimal YAML configuration with three languages.
    pub fn minimal_config_yaml() -> &'static str {
        r#"
database:
  url: "sqlite::memory:"
  max_connections: 1

locales:
  default_language: "en"
  languages:
    - code: "en"
      display_name: "English"
    - code: "ja"
      display_name: "日本語"
      fallbacks: ["en"]
    - code: "zh-TW"
      display_name: "繁體中文"
      fallbacks: ["zh"]
    - code: "zh"
      display_name: "中文"

provider:
  kind: "disabled"
"#
    }
}

/// Property-based testing strategies.
#[cfg(feature = "proptest")]
pub mod property_testing {
    use proptest::prelude::*;

    /// Strategy for syntactically valid language tags (`xx`, `xx-YY`).
    pub fn language_tag_strategy() -> impl Strategy<Value = String> {
        (r"[a-z]{2,3}", proptest::option::of(r"[A-Z]{2}")).prop_map(|(lang, region)| match region {
            Some(region) => format!("{lang}-{region}"),
            None => lang,
        })
    }

    /// Strategy for arbitrary header-ish junk.
    pub fn arbitrary_request_strategy() -> impl Strategy<Value = String> {
        r"[ -~]{0,24}"
    }
}
