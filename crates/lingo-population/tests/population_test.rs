//! Integration tests for population jobs and the scheduler.

use lingo_common::test_utils::{init_test_logging, text_fields};
use lingo_common::{EntityId, EntityKind, LanguageCode, PrincipalId};
use lingo_config::{LanguageConfig, LocalesConfig};
use lingo_i18n::LocaleRegistry;
use lingo_population::testing::ScriptedProvider;
use lingo_population::{
    DisabledProvider, HealthStatus, LanguageOutcome, PopulationError, PopulationJob, PopulationMetrics,
    PopulationScheduler, PopulationSettings, PopulationTask, ProviderError, RetryPolicy,
    TranslationProvider,
};
use lingo_store::{
    EntityStore, EntityUpdate, LanguageStore, NewEntity, SqliteStore, TranslationStore, UpsertOutcome,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn code(tag: &str) -> LanguageCode {
    LanguageCode::parse(tag).unwrap()
}

fn registry() -> Arc<LocaleRegistry> {
    let config = LocalesConfig {
        default_language: "en".to_string(),
        languages: vec![
            LanguageConfig::new("en", "English"),
            LanguageConfig::new("ja", "日本語").with_fallbacks(&["en"]),
            LanguageConfig::new("ko", "한국어"),
            LanguageConfig::new("zh", "中文"),
        ],
    };
    Arc::new(LocaleRegistry::from_config(&config).unwrap())
}

struct Harness {
    store: SqliteStore,
    registry: Arc<LocaleRegistry>,
    metrics: Arc<PopulationMetrics>,
}

impl Harness {
    async fn new() -> Self {
        init_test_logging();
        let registry = registry();
        let store = SqliteStore::in_memory().await.unwrap();
        store.seed_languages(&registry.all_languages()).await.unwrap();
        Self {
            store,
            registry,
            metrics: Arc::new(PopulationMetrics::new(2).unwrap()),
        }
    }

    async fn entity(&self, title: &str) -> PopulationJob {
        let entity = self
            .store
            .create_entity(NewEntity {
                kind: EntityKind::Property,
                owner: PrincipalId::new("agent").unwrap(),
                attributes: serde_json::json!({ "rent": 100000 }),
                source_language: code("en"),
            })
            .await
            .unwrap();
        PopulationJob::for_entity(&entity, text_fields(&[("title", title)]))
    }

    fn task(&self, provider: Arc<dyn TranslationProvider>, settings: PopulationSettings) -> PopulationTask {
        PopulationTask::new(
            Arc::new(self.store.clone()),
            provider,
            Arc::clone(&self.registry),
            Arc::clone(&self.metrics),
            settings,
        )
    }

    async fn text(&self, id: EntityId, language: &str) -> Option<String> {
        self.store
            .get_translation(id, &code(language))
            .await
            .unwrap()
            .map(|t| t.fields["title"].clone())
    }
}

fn fast_settings() -> PopulationSettings {
    PopulationSettings {
        max_concurrent_languages: 4,
        provider_timeout: Duration::from_millis(200),
        retry: RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
            multiplier: 2.0,
        },
    }
}

#[tokio::test]
async fn source_text_is_stored_even_when_provider_is_down() {
    let harness = Harness::new().await;
    let job = harness.entity("Hello").await;
    let task = harness.task(Arc::new(DisabledProvider), fast_settings());

    let report = task.run(job.clone()).await.unwrap();

    assert!(report.source.outcome.is_success());
    assert_eq!(harness.text(job.entity_id, "en").await.as_deref(), Some("Hello"));
    assert_eq!(report.failed_languages().len(), 3);
    for language in ["ja", "ko", "zh"] {
        assert!(harness.text(job.entity_id, language).await.is_none());
    }
}

#[tokio::test]
async fn one_failing_language_does_not_stop_the_others() {
    let harness = Harness::new().await;
    let job = harness.entity("Hello").await;
    let provider = ScriptedProvider::new()
        .with_translation("ja", "Hello", "こんにちは")
        .failing("ko", ProviderError::Unavailable("ko engine offline".into()));
    let task = harness.task(Arc::new(provider.clone()), fast_settings());

    let report = task.run(job.clone()).await.unwrap();

    assert_eq!(harness.text(job.entity_id, "ja").await.as_deref(), Some("こんにちは"));
    assert_eq!(harness.text(job.entity_id, "zh").await.as_deref(), Some("[zh] Hello"));
    assert!(harness.text(job.entity_id, "ko").await.is_none());
    assert!(matches!(
        report.outcome(&code("ko")),
        Some(LanguageOutcome::Failed { attempts: 1, .. })
    ));
    assert_eq!(provider.calls("ko"), 1);
}

#[tokio::test]
async fn slow_language_times_out_without_blocking_others() {
    let harness = Harness::new().await;
    let job = harness.entity("Hello").await;
    let provider = ScriptedProvider::new().slow("zh", Duration::from_secs(30));
    let mut settings = fast_settings();
    settings.retry = RetryPolicy {
        max_attempts: 2,
        ..settings.retry
    };
    let task = harness.task(Arc::new(provider.clone()), settings);

    let started = Instant::now();
    let report = task.run(job.clone()).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(matches!(
        report.outcome(&code("zh")),
        Some(LanguageOutcome::Failed { attempts: 2, .. })
    ));
    assert!(report.outcome(&code("ja")).unwrap().is_success());
    assert!(report.outcome(&code("ko")).unwrap().is_success());
    assert_eq!(provider.calls("zh"), 2);

    let text = harness.metrics.encode_text().unwrap();
    assert!(text.contains("lingo_population_timeouts_total{language=\"zh\"} 2"));
}

#[tokio::test]
async fn language_retired_mid_job_leaves_no_row() {
    let harness = Harness::new().await;
    let job = harness.entity("Hello").await;
    let provider = ScriptedProvider::new().slow("ko", Duration::from_millis(300));
    let mut settings = fast_settings();
    settings.provider_timeout = Duration::from_secs(2);
    let task = harness.task(Arc::new(provider), settings);

    let (report, removed) = tokio::join!(task.run(job.clone()), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        harness.store.retire_language(&code("ko")).await.unwrap()
    });
    let report = report.unwrap();

    assert_eq!(removed, 0);
    assert_eq!(report.outcome(&code("ko")), Some(&LanguageOutcome::LanguageRetired));
    assert!(report.is_complete());
    assert!(harness.text(job.entity_id, "ko").await.is_none());
    assert_eq!(harness.text(job.entity_id, "ja").await.as_deref(), Some("[ja] Hello"));
}

#[tokio::test]
async fn transient_failures_are_retried_with_backoff() {
    let harness = Harness::new().await;
    let job = harness.entity("Hello").await;
    let provider = ScriptedProvider::new().flaky("ja", 2, ProviderError::Transient("502".into()));
    let task = harness.task(Arc::new(provider.clone()), fast_settings());

    let report = task.run(job.clone()).await.unwrap();

    assert!(matches!(
        report.outcome(&code("ja")),
        Some(LanguageOutcome::Translated { attempts: 3, .. })
    ));
    assert_eq!(provider.calls("ja"), 3);
    assert!(report.is_complete());
}

#[tokio::test]
async fn persistent_failures_mark_language_degraded() {
    let harness = Harness::new().await;
    let provider = ScriptedProvider::new().failing("ko", ProviderError::RateLimited);
    let task = harness.task(Arc::new(provider), fast_settings());

    for title in ["one", "two"] {
        let job = harness.entity(title).await;
        task.run(job).await.unwrap();
    }

    let health = harness.metrics.health_report();
    assert_eq!(health.status, HealthStatus::Degraded);
    assert_eq!(health.degraded_languages, vec![code("ko")]);
    assert_eq!(health.languages[&code("ko")].consecutive_failures, 2);
}

#[tokio::test]
async fn older_revision_does_not_overwrite_newer() {
    let harness = Harness::new().await;
    let stale_job = harness.entity("Old title").await;
    let updated = harness
        .store
        .update_entity(stale_job.entity_id, EntityUpdate::default())
        .await
        .unwrap()
        .unwrap();
    let fresh_job = PopulationJob::for_entity(&updated, text_fields(&[("title", "New title")]));
    let task = harness.task(Arc::new(ScriptedProvider::new()), fast_settings());

    task.run(fresh_job.clone()).await.unwrap();
    let report = task.run(stale_job.clone()).await.unwrap();

    assert_eq!(report.source.outcome, LanguageOutcome::Superseded);
    assert_eq!(report.outcome(&code("ja")), Some(&LanguageOutcome::Superseded));
    assert_eq!(harness.text(fresh_job.entity_id, "en").await.as_deref(), Some("New title"));
    assert_eq!(harness.text(fresh_job.entity_id, "ja").await.as_deref(), Some("[ja] New title"));
}

#[tokio::test]
async fn rerunning_a_job_is_idempotent() {
    let harness = Harness::new().await;
    let job = harness.entity("Hello").await;
    let task = harness.task(Arc::new(ScriptedProvider::new()), fast_settings());

    task.run(job.clone()).await.unwrap();
    let before = harness.store.list_translations(job.entity_id).await.unwrap();
    let report = task.run(job.clone()).await.unwrap();
    let after = harness.store.list_translations(job.entity_id).await.unwrap();

    assert_eq!(before, after);
    assert!(report.languages().all(|r| matches!(
        r.outcome,
        LanguageOutcome::Translated { upsert: UpsertOutcome::Unchanged, .. }
    )));
}

#[tokio::test]
async fn deleted_entity_is_reported_as_gone() {
    let harness = Harness::new().await;
    let job = harness.entity("Hello").await;
    harness.store.delete_entity(job.entity_id).await.unwrap();
    let provider = ScriptedProvider::new();
    let task = harness.task(Arc::new(provider.clone()), fast_settings());

    let report = task.run(job).await.unwrap();

    assert_eq!(report.source.outcome, LanguageOutcome::EntityGone);
    assert!(report.targets.is_empty());
    assert_eq!(provider.total_calls(), 0);
}

#[tokio::test]
async fn scheduler_runs_jobs_in_background() {
    let harness = Harness::new().await;
    let job = harness.entity("Hello").await;
    let task = harness.task(Arc::new(ScriptedProvider::new()), fast_settings());
    let scheduler = PopulationScheduler::new(task, 2, Duration::from_secs(5));

    let ticket = scheduler.schedule(job.clone()).unwrap();
    assert_eq!(ticket.entity_id(), job.entity_id);

    let report = ticket.wait().await.unwrap();
    assert!(report.is_complete());
    assert_eq!(harness.text(job.entity_id, "ko").await.as_deref(), Some("[ko] Hello"));

    assert!(scheduler.shutdown().await);
    assert!(matches!(scheduler.schedule(job), Err(PopulationError::ShuttingDown)));
}

#[tokio::test]
async fn dropped_ticket_still_populates() {
    let harness = Harness::new().await;
    let job = harness.entity("Hello").await;
    let task = harness.task(Arc::new(ScriptedProvider::new()), fast_settings());
    let scheduler = PopulationScheduler::new(task, 1, Duration::from_secs(5));

    drop(scheduler.schedule(job.clone()).unwrap());
    assert!(scheduler.shutdown().await);

    assert_eq!(harness.store.list_translations(job.entity_id).await.unwrap().len(), 4);
}

#[tokio::test]
async fn shutdown_aborts_jobs_after_timeout() {
    let harness = Harness::new().await;
    let job = harness.entity("Hello").await;
    let provider = ScriptedProvider::new().slow("ja", Duration::from_secs(60));
    let mut settings = fast_settings();
    settings.provider_timeout = Duration::from_secs(120);
    let task = harness.task(Arc::new(provider), settings);
    let scheduler = PopulationScheduler::new(task, 1, Duration::from_millis(100));

    let ticket = scheduler.schedule(job).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let started = Instant::now();
    assert!(!scheduler.shutdown().await);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(matches!(ticket.wait().await, Err(PopulationError::Cancelled)));
    assert_eq!(harness.metrics.jobs_in_flight(), 0);
}
