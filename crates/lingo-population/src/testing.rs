//! Test doubles for population.
//!
//! Enabled for other crates through the `testing` feature.

use async_trait::async_trait;
use lingo_common::LanguageCode;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ProviderError;
use crate::provider::TranslationProvider;

#[derive(Debug, Clone)]
enum Script {
    Dictionary(HashMap<String, String>),
    Fail(ProviderError),
    FailTimes { remaining: u32, error: ProviderError },
    Delay(Duration),
}

enum Plan {
    Answer(Option<String>),
    Fail(ProviderError),
    Sleep(Duration),
}

/// A provider whose behavior is scripted per target language.
///
/// Unscripted languages translate `text` to `"[{target}] {text}"`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    scripts: Arc<Mutex<HashMap<LanguageCode, Script>>>,
    calls: Arc<Mutex<HashMap<LanguageCode, u32>>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(self, target: &str, script: Script) -> Self {
        let code = LanguageCode::parse(target).expect("valid language tag in test script");
        self.scripts.lock().insert(code, script);
        self
    }

    /// Translates exact source strings for `target`.
    pub fn with_translation(self, target: &str, source: &str, translated: &str) -> Self {
        let code = LanguageCode::parse(target).expect("valid language tag in test script");
        let mut scripts = self.scripts.lock();
        match scripts.entry(code).or_insert_with(|| Script::Dictionary(HashMap::new())) {
            Script::Dictionary(entries) => {
                entries.insert(source.to_string(), translated.to_string());
            }
            other => *other = Script::Dictionary(HashMap::from([(source.to_string(), translated.to_string())])),
        }
        drop(scripts);
        self
    }

    /// Every call for `target` fails with `error`.
    pub fn failing(self, target: &str, error: ProviderError) -> Self {
        self.script(target, Script::Fail(error))
    }

    /// The first `failures` calls for `target` fail with `error`.
    pub fn flaky(self, target: &str, failures: u32, error: ProviderError) -> Self {
        self.script(
            target,
            Script::FailTimes {
                remaining: failures,
                error,
            },
        )
    }

    /// Calls for `target` take `delay` before answering.
    pub fn slow(self, target: &str, delay: Duration) -> Self {
        self.script(target, Script::Delay(delay))
    }

    /// Calls made for `target` so far.
    pub fn calls(&self, target: &str) -> u32 {
        LanguageCode::parse(target)
            .ok()
            .and_then(|code| self.calls.lock().get(&code).copied())
            .unwrap_or(0)
    }

    /// Calls made for any language so far.
    pub fn total_calls(&self) -> u32 {
        self.calls.lock().values().sum()
    }
}

#[async_trait]
impl TranslationProvider for ScriptedProvider {
    async fn translate(
        &self,
        text: &str,
        _source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<String, ProviderError> {
        *self.calls.lock().entry(target.clone()).or_insert(0) += 1;
        let default = format!("[{target}] {text}");

        let plan = {
            let mut scripts = self.scripts.lock();
            match scripts.get_mut(target) {
                None => Plan::Answer(None),
                Some(Script::Dictionary(entries)) => Plan::Answer(entries.get(text).cloned()),
                Some(Script::Fail(error)) => Plan::Fail(error.clone()),
                Some(Script::FailTimes { remaining, error }) => {
                    if *remaining > 0 {
                        *remaining -= 1;
                        Plan::Fail(error.clone())
                    } else {
                        Plan::Answer(None)
                    }
                }
                Some(Script::Delay(delay)) => Plan::Sleep(*delay),
            }
        };

        match plan {
            Plan::Answer(translated) => Ok(translated.unwrap_or(default)),
            Plan::Fail(error) => Err(error),
            Plan::Sleep(delay) => {
                tokio::time::sleep(delay).await;
                Ok(default)
            }
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
