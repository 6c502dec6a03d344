//! # Lingo Population
//!
//! Produces per-language translation rows for an entity after it is written.
//!
//! A [`PopulationJob`] is handed to the [`PopulationScheduler`], which runs it
//! as a detached task. The job first stores the source-language text verbatim
//! and then asks the [`TranslationProvider`] for every other supported
//! language. Languages are independent: each has its own timeout and retry
//! loop, and a failing language never cancels the others. Failures end up in
//! the logs, in [`PopulationMetrics`] and in the [`PopulationReport`], never in
//! the write that triggered the job.

pub mod error;
pub mod http_provider;
pub mod job;
pub mod metrics;
pub mod provider;
pub mod retry;
pub mod scheduler;
pub mod task;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{PopulationError, ProviderError};
pub use http_provider::HttpTranslationProvider;
pub use job::{LanguageOutcome, LanguageReport, PopulationJob, PopulationReport};
pub use metrics::{HealthReport, HealthStatus, LanguageHealth, PopulationMetrics};
pub use provider::{build_provider, DisabledProvider, TranslationProvider};
pub use retry::RetryPolicy;
pub use scheduler::{PopulationScheduler, PopulationTicket};
pub use task::{PopulationSettings, PopulationTask};
