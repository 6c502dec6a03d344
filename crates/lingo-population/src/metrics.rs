//! Prometheus metrics and per-language health for population

use chrono::{DateTime, Utc};
use lingo_common::LanguageCode;
use parking_lot::RwLock;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::warn;

/// Overall population health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// Failure bookkeeping for one target language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageHealth {
    pub consecutive_failures: u32,
    pub total_failures: u64,
    pub total_successes: u64,
    pub last_error: Option<String>,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub degraded: bool,
}

/// Snapshot returned by [`PopulationMetrics::health_report`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub degraded_languages: Vec<LanguageCode>,
    pub languages: BTreeMap<LanguageCode, LanguageHealth>,
}

/// In-flight marker for one job. Dropping it without [`JobTimer::finish`]
/// (a cancelled job) still releases the in-flight gauge.
pub struct JobTimer<'a> {
    metrics: &'a PopulationMetrics,
    started: Instant,
    finished: bool,
}

impl JobTimer<'_> {
    /// Records the job duration and whether the source row was stored.
    pub fn finish(mut self, source_stored: bool) -> Duration {
        let elapsed = self.started.elapsed();
        self.metrics.job_duration.observe(elapsed.as_secs_f64());
        if !source_stored {
            self.metrics.jobs_failed_total.inc();
        }
        self.finished = true;
        elapsed
    }
}

impl Drop for JobTimer<'_> {
    fn drop(&mut self) {
        self.metrics.jobs_in_flight.dec();
        if !self.finished {
            self.metrics.job_duration.observe(self.started.elapsed().as_secs_f64());
        }
    }
}

/// Prometheus collectors plus the per-language health table.
///
/// Each instance owns its own [`Registry`].
pub struct PopulationMetrics {
    registry: Registry,
    jobs_total: IntCounter,
    jobs_failed_total: IntCounter,
    jobs_in_flight: IntGauge,
    job_duration: Histogram,
    languages_total: IntCounterVec,
    retries_total: IntCounterVec,
    timeouts_total: IntCounterVec,
    health: RwLock<BTreeMap<LanguageCode, LanguageHealth>>,
    degraded_after_failures: u32,
}

impl std::fmt::Debug for PopulationMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PopulationMetrics")
            .field("degraded_after_failures", &self.degraded_after_failures)
            .finish_non_exhaustive()
    }
}

impl PopulationMetrics {
    /// Creates and registers all collectors.
    pub fn new(degraded_after_failures: u32) -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let jobs_total = IntCounter::with_opts(Opts::new(
            "lingo_population_jobs_total",
            "Total number of population jobs started",
        ))?;

        let jobs_failed_total = IntCounter::with_opts(Opts::new(
            "lingo_population_jobs_failed_total",
            "Population jobs that could not store the source-language row",
        ))?;

        let jobs_in_flight = IntGauge::with_opts(Opts::new(
            "lingo_population_jobs_in_flight",
            "Population jobs currently running",
        ))?;

        let job_duration = Histogram::with_opts(
            HistogramOpts::new("lingo_population_job_duration_seconds", "Population job duration in seconds")
                .buckets(vec![0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0]),
        )?;

        let languages_total = IntCounterVec::new(
            Opts::new("lingo_population_languages_total", "Per-language population results"),
            &["language", "result"],
        )?;

        let retries_total = IntCounterVec::new(
            Opts::new("lingo_population_retries_total", "Provider retry attempts per language"),
            &["language"],
        )?;

        let timeouts_total = IntCounterVec::new(
            Opts::new("lingo_population_timeouts_total", "Provider attempts that timed out per language"),
            &["language"],
        )?;

        registry.register(Box::new(jobs_total.clone()))?;
        registry.register(Box::new(jobs_failed_total.clone()))?;
        registry.register(Box::new(jobs_in_flight.clone()))?;
        registry.register(Box::new(job_duration.clone()))?;
        registry.register(Box::new(languages_total.clone()))?;
        registry.register(Box::new(retries_total.clone()))?;
        registry.register(Box::new(timeouts_total.clone()))?;

        Ok(Self {
            registry,
            jobs_total,
            jobs_failed_total,
            jobs_in_flight,
            job_duration,
            languages_total,
            retries_total,
            timeouts_total,
            health: RwLock::new(BTreeMap::new()),
            degraded_after_failures: degraded_after_failures.max(1),
        })
    }

    /// Counts a job as running until the returned guard is finished or dropped.
    pub fn start_job(&self) -> JobTimer<'_> {
        self.jobs_total.inc();
        self.jobs_in_flight.inc();
        JobTimer {
            metrics: self,
            started: Instant::now(),
            finished: false,
        }
    }

    pub fn record_retry(&self, language: &LanguageCode) {
        self.retries_total.with_label_values(&[language.as_str()]).inc();
    }

    pub fn record_timeout(&self, language: &LanguageCode) {
        self.timeouts_total.with_label_values(&[language.as_str()]).inc();
    }

    /// A language was populated; resets its consecutive failure count.
    pub fn record_language_success(&self, language: &LanguageCode) {
        self.languages_total
            .with_label_values(&[language.as_str(), "success"])
            .inc();

        let mut health = self.health.write();
        let entry = health.entry(language.clone()).or_default();
        entry.consecutive_failures = 0;
        entry.total_successes += 1;
        entry.last_success_at = Some(Utc::now());
        entry.degraded = false;
    }

    /// A language exhausted its attempts.
    pub fn record_language_failure(&self, language: &LanguageCode, error: &str) {
        self.languages_total
            .with_label_values(&[language.as_str(), "failure"])
            .inc();

        let mut health = self.health.write();
        let entry = health.entry(language.clone()).or_default();
        entry.consecutive_failures = entry.consecutive_failures.saturating_add(1);
        entry.total_failures += 1;
        entry.last_error = Some(error.to_string());
        entry.last_failure_at = Some(Utc::now());

        if !entry.degraded && entry.consecutive_failures >= self.degraded_after_failures {
            entry.degraded = true;
            warn!(
                %language,
                consecutive_failures = entry.consecutive_failures,
                "Translation population degraded for language"
            );
        }
    }

    /// Current health of every language seen so far.
    pub fn health_report(&self) -> HealthReport {
        let languages = self.health.read().clone();
        let degraded_languages: Vec<LanguageCode> = languages
            .iter()
            .filter(|(_, health)| health.degraded)
            .map(|(language, _)| language.clone())
            .collect();

        HealthReport {
            status: if degraded_languages.is_empty() {
                HealthStatus::Healthy
            } else {
                HealthStatus::Degraded
            },
            degraded_languages,
            languages,
        }
    }

    /// Jobs currently running.
    pub fn jobs_in_flight(&self) -> i64 {
        self.jobs_in_flight.get()
    }

    /// The registry, for callers that merge it into a larger export.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// All collectors in the Prometheus text exposition format.
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(tag: &str) -> LanguageCode {
        LanguageCode::parse(tag).unwrap()
    }

    #[test]
    fn test_language_degrades_after_threshold() {
        let metrics = PopulationMetrics::new(2).unwrap();
        let ja = code("ja");

        metrics.record_language_failure(&ja, "timeout");
        assert_eq!(metrics.health_report().status, HealthStatus::Healthy);

        metrics.record_language_failure(&ja, "timeout again");
        let report = metrics.health_report();
        assert_eq!(report.status, HealthStatus::Degraded);
        assert_eq!(report.degraded_languages, vec![ja.clone()]);
        assert_eq!(report.languages[&ja].last_error.as_deref(), Some("timeout again"));
        assert_eq!(report.languages[&ja].total_failures, 2);
    }

    #[test]
    fn test_success_clears_degradation() {
        let metrics = PopulationMetrics::new(1).unwrap();
        let ko = code("ko");

        metrics.record_language_failure(&ko, "rejected");
        assert_eq!(metrics.health_report().status, HealthStatus::Degraded);

        metrics.record_language_success(&ko);
        let report = metrics.health_report();
        assert_eq!(report.status, HealthStatus::Healthy);
        assert_eq!(report.languages[&ko].consecutive_failures, 0);
        assert_eq!(report.languages[&ko].total_successes, 1);
    }

    #[test]
    fn test_encode_text_contains_collectors() {
        let metrics = PopulationMetrics::new(3).unwrap();
        let timer = metrics.start_job();
        assert_eq!(metrics.jobs_in_flight(), 1);
        metrics.record_retry(&code("ja"));
        metrics.record_language_success(&code("ja"));
        timer.finish(true);

        let text = metrics.encode_text().unwrap();
        assert!(text.contains("lingo_population_jobs_total 1"));
        assert!(text.contains("lingo_population_retries_total{language=\"ja\"} 1"));
        assert!(text.contains("result=\"success\""));
        assert_eq!(metrics.jobs_in_flight(), 0);
    }

    #[test]
    fn test_instances_do_not_share_registries() {
        let first = PopulationMetrics::new(3).unwrap();
        let second = PopulationMetrics::new(3).unwrap();
        drop(first.start_job());
        assert_eq!(first.jobs_in_flight(), 0);
        assert!(second.encode_text().unwrap().contains("lingo_population_jobs_total 0"));
    }
}
