//! The population algorithm for a single job

use futures::stream::{self, StreamExt};
use lingo_common::{LanguageCode, TextFields};
use lingo_config::PopulationConfig;
use lingo_i18n::LocaleRegistry;
use lingo_store::{StoreError, TranslationStore, UpsertOutcome};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{PopulationError, ProviderError};
use crate::job::{LanguageOutcome, LanguageReport, PopulationJob, PopulationReport};
use crate::metrics::PopulationMetrics;
use crate::provider::TranslationProvider;
use crate::retry::RetryPolicy;

/// Tunables of a [`PopulationTask`].
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationSettings {
    /// Target languages translated at once.
    pub max_concurrent_languages: usize,
    /// Timeout of one attempt for one language.
    pub provider_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for PopulationSettings {
    fn default() -> Self {
        Self::from_config(&PopulationConfig::default())
    }
}

impl PopulationSettings {
    pub fn from_config(config: &PopulationConfig) -> Self {
        Self {
            max_concurrent_languages: config.max_concurrent_languages.max(1),
            provider_timeout: config.provider_timeout(),
            retry: RetryPolicy::from_config(&config.retry),
        }
    }
}

/// Runs population jobs against a store and a provider.
pub struct PopulationTask {
    store: Arc<dyn TranslationStore>,
    provider: Arc<dyn TranslationProvider>,
    registry: Arc<LocaleRegistry>,
    metrics: Arc<PopulationMetrics>,
    settings: PopulationSettings,
    cancel: CancellationToken,
}

enum AttemptError {
    Provider(ProviderError),
    Store(StoreError),
}

impl PopulationTask {
    pub fn new(
        store: Arc<dyn TranslationStore>,
        provider: Arc<dyn TranslationProvider>,
        registry: Arc<LocaleRegistry>,
        metrics: Arc<PopulationMetrics>,
        settings: PopulationSettings,
    ) -> Self {
        Self {
            store,
            provider,
            registry,
            metrics,
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Ties backoff sleeps to `cancel`, so a shutdown does not wait them out.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn metrics(&self) -> &Arc<PopulationMetrics> {
        &self.metrics
    }

    /// Populates every supported language for `job`.
    ///
    /// Only a failure to store the source-language row is an error; target
    /// language failures are reported in the returned [`PopulationReport`].
    #[instrument(skip(self, job), fields(entity_id = %job.entity_id, revision = job.revision))]
    pub async fn run(&self, job: PopulationJob) -> Result<PopulationReport, PopulationError> {
        let started = Instant::now();
        let timer = self.metrics.start_job();

        let result = self.run_inner(&job, started).await;

        timer.finish(matches!(&result, Ok(report) if report.source.outcome.is_success()));

        match &result {
            Ok(report) if report.is_complete() => {
                info!(languages = report.targets.len() + 1, "Population complete");
            }
            Ok(report) => {
                warn!(failed = ?report.failed_languages(), "Population finished with failures");
            }
            Err(err) => {
                error!(error = %err, "Population failed to store source text");
            }
        }
        result
    }

    async fn run_inner(&self, job: &PopulationJob, started: Instant) -> Result<PopulationReport, PopulationError> {
        // The source row never depends on the provider.
        let source_outcome = match self
            .store
            .upsert_translation(job.entity_id, &job.source_language, &job.fields, job.revision)
            .await
        {
            Ok(UpsertOutcome::Stale) => LanguageOutcome::Superseded,
            Ok(UpsertOutcome::LanguageRetired) => LanguageOutcome::LanguageRetired,
            Ok(upsert) => LanguageOutcome::Translated { upsert, attempts: 1 },
            Err(StoreError::EntityMissing(_)) => {
                info!("Entity deleted before population started");
                return Ok(PopulationReport {
                    entity_id: job.entity_id,
                    revision: job.revision,
                    source: LanguageReport {
                        language: job.source_language.clone(),
                        outcome: LanguageOutcome::EntityGone,
                    },
                    targets: Vec::new(),
                    duration: started.elapsed(),
                });
            }
            Err(err) => return Err(err.into()),
        };

        let targets: Vec<LanguageCode> = self
            .registry
            .supported_languages()
            .into_iter()
            .map(|language| language.code)
            .filter(|code| code != &job.source_language)
            .collect();

        debug!(targets = targets.len(), "Translating into target languages");

        let mut reports: Vec<LanguageReport> = stream::iter(targets)
            .map(|language| async move {
                let outcome = self.populate_language(job, &language).await;
                LanguageReport { language, outcome }
            })
            .buffer_unordered(self.settings.max_concurrent_languages)
            .collect()
            .await;
        reports.sort_by(|a, b| a.language.cmp(&b.language));

        Ok(PopulationReport {
            entity_id: job.entity_id,
            revision: job.revision,
            source: LanguageReport {
                language: job.source_language.clone(),
                outcome: source_outcome,
            },
            targets: reports,
            duration: started.elapsed(),
        })
    }

    /// Translates and stores one language with its own timeout and retries.
    async fn populate_language(&self, job: &PopulationJob, target: &LanguageCode) -> LanguageOutcome {
        let policy = &self.settings.retry;
        let mut attempts = 0;

        loop {
            attempts += 1;
            let error = match self.attempt(job, target).await {
                Ok(UpsertOutcome::Stale) => {
                    debug!(language = %target, "Newer revision already stored");
                    return LanguageOutcome::Superseded;
                }
                Ok(UpsertOutcome::LanguageRetired) => {
                    info!(language = %target, "Language retired during population");
                    return LanguageOutcome::LanguageRetired;
                }
                Ok(upsert) => {
                    self.metrics.record_language_success(target);
                    return LanguageOutcome::Translated { upsert, attempts };
                }
                Err(AttemptError::Store(StoreError::EntityMissing(_))) => {
                    debug!(language = %target, "Entity deleted during population");
                    return LanguageOutcome::EntityGone;
                }
                Err(AttemptError::Store(err)) => err.to_string(),
                Err(AttemptError::Provider(err)) => {
                    if matches!(err, ProviderError::Timeout(_)) {
                        self.metrics.record_timeout(target);
                    }
                    if err.is_retryable() && policy.can_retry(attempts) {
                        let delay = policy.delay_after(attempts);
                        warn!(language = %target, attempt = attempts, ?delay, error = %err, "Provider attempt failed, retrying");
                        self.metrics.record_retry(target);
                        let cancelled = tokio::select! {
                            _ = tokio::time::sleep(delay) => false,
                            _ = self.cancel.cancelled() => true,
                        };
                        if !cancelled {
                            continue;
                        }
                        "population cancelled".to_string()
                    } else {
                        err.to_string()
                    }
                }
            };

            error!(language = %target, attempts, %error, "Giving up on language");
            self.metrics.record_language_failure(target, &error);
            return LanguageOutcome::Failed { error, attempts };
        }
    }

    async fn attempt(&self, job: &PopulationJob, target: &LanguageCode) -> Result<UpsertOutcome, AttemptError> {
        let timeout = self.settings.provider_timeout;
        let translated = tokio::time::timeout(timeout, self.translate_fields(job, target))
            .await
            .map_err(|_| AttemptError::Provider(ProviderError::Timeout(timeout)))?
            .map_err(AttemptError::Provider)?;

        self.store
            .upsert_translation(job.entity_id, target, &translated, job.revision)
            .await
            .map_err(AttemptError::Store)
    }

    async fn translate_fields(
        &self,
        job: &PopulationJob,
        target: &LanguageCode,
    ) -> Result<TextFields, ProviderError> {
        let mut translated = TextFields::new();
        for (name, text) in &job.fields {
            let value = if text.trim().is_empty() {
                text.clone()
            } else {
                self.provider
                    .translate(text, &job.source_language, target)
                    .await?
            };
            translated.insert(name.clone(), value);
        }
        Ok(translated)
    }
}
