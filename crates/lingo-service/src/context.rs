//! Wiring of the shared application state

use lingo_common::LingoError;
use lingo_config::Config;
use lingo_i18n::LocaleRegistry;
use lingo_population::{
    build_provider, PopulationMetrics, PopulationScheduler, PopulationSettings, PopulationTask, TranslationProvider,
};
use lingo_store::{LanguageStore, SqliteStore};
use std::sync::Arc;
use tracing::{info, warn};

use crate::consent::ConsentService;
use crate::localization::LocalizationService;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct ServiceContext {
    pub config: Arc<Config>,
    pub store: SqliteStore,
    pub registry: Arc<LocaleRegistry>,
    pub metrics: Arc<PopulationMetrics>,
    pub scheduler: Arc<PopulationScheduler>,
    pub localization: LocalizationService,
    pub consent: ConsentService,
}

impl ServiceContext {
    /// Connects to the database and builds every component from `config`.
    pub async fn from_config(config: Config) -> Result<Self, LingoError> {
        let provider = build_provider(&config.provider, config.population.provider_timeout())?;
        let store = SqliteStore::connect(&config.database).await?;
        Self::with_parts(config, store, provider).await
    }

    /// Builds the context around an existing store and provider.
    pub async fn with_parts(
        config: Config,
        store: SqliteStore,
        provider: Arc<dyn TranslationProvider>,
    ) -> Result<Self, LingoError> {
        let registry = Arc::new(LocaleRegistry::from_config(&config.locales)?);
        store.seed_languages(&registry.all_languages()).await?;

        let metrics = Arc::new(
            PopulationMetrics::new(config.population.degraded_after_failures)
                .map_err(|e| LingoError::with_source("failed to register population metrics", e))?,
        );
        let task = PopulationTask::new(
            Arc::new(store.clone()),
            provider,
            Arc::clone(&registry),
            Arc::clone(&metrics),
            PopulationSettings::from_config(&config.population),
        );
        let scheduler = Arc::new(PopulationScheduler::new(
            task,
            config.population.max_concurrent_jobs,
            config.population.shutdown_timeout(),
        ));

        let localization = LocalizationService::new(
            Arc::new(store.clone()),
            Arc::clone(&registry),
            Arc::clone(&scheduler),
        );
        let consent = ConsentService::new(Arc::new(store.clone()));

        info!(
            languages = registry.supported_languages().len(),
            default_language = %registry.default_code(),
            "Service context ready"
        );

        Ok(Self {
            config: Arc::new(config),
            store,
            registry,
            metrics,
            scheduler,
            localization,
            consent,
        })
    }

    /// Stops population and closes the database pool.
    pub async fn shutdown(&self) {
        let clean = self.scheduler.shutdown().await;
        if !clean {
            warn!("Some population jobs were aborted during shutdown");
        }
        self.store.close().await;
        info!("Service context shut down");
    }
}
