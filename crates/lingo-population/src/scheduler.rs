//! Detached execution of population jobs with graceful shutdown

use lingo_common::EntityId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Semaphore};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::error::PopulationError;
use crate::job::{PopulationJob, PopulationReport};
use crate::metrics::PopulationMetrics;
use crate::task::PopulationTask;

/// Handle to a scheduled job.
///
/// Dropping it leaves the job running; awaiting [`PopulationTicket::wait`]
/// yields its report.
#[derive(Debug)]
pub struct PopulationTicket {
    entity_id: EntityId,
    revision: i64,
    receiver: oneshot::Receiver<Result<PopulationReport, PopulationError>>,
}

impl PopulationTicket {
    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    pub fn revision(&self) -> i64 {
        self.revision
    }

    /// Waits for the job to finish.
    pub async fn wait(self) -> Result<PopulationReport, PopulationError> {
        self.receiver.await.unwrap_or(Err(PopulationError::Cancelled))
    }
}

/// Runs population jobs as detached tokio tasks.
///
/// At most `max_concurrent_jobs` run at once; later jobs wait for a permit.
/// Nothing orders jobs relative to each other.
pub struct PopulationScheduler {
    task: Arc<PopulationTask>,
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
    cancel: CancellationToken,
    shutdown_timeout: Duration,
}

impl PopulationScheduler {
    pub fn new(task: PopulationTask, max_concurrent_jobs: usize, shutdown_timeout: Duration) -> Self {
        let cancel = CancellationToken::new();
        let task = task.with_cancellation(cancel.child_token());

        Self {
            task: Arc::new(task),
            permits: Arc::new(Semaphore::new(max_concurrent_jobs.max(1))),
            tracker: TaskTracker::new(),
            cancel,
            shutdown_timeout,
        }
    }

    /// Starts `job` in the background and returns immediately.
    pub fn schedule(&self, job: PopulationJob) -> Result<PopulationTicket, PopulationError> {
        if self.tracker.is_closed() {
            return Err(PopulationError::ShuttingDown);
        }

        let (sender, receiver) = oneshot::channel();
        let entity_id = job.entity_id;
        let revision = job.revision;
        let task = Arc::clone(&self.task);
        let permits = Arc::clone(&self.permits);
        let cancel = self.cancel.clone();

        let span = info_span!("population_job", %entity_id, revision);
        self.tracker.spawn(
            async move {
                let result = tokio::select! {
                    result = async {
                        let _permit = permits
                            .acquire_owned()
                            .await
                            .map_err(|_| PopulationError::ShuttingDown)?;
                        task.run(job).await
                    } => result,
                    _ = cancel.cancelled() => {
                        warn!("Population job aborted by shutdown");
                        Err(PopulationError::Cancelled)
                    }
                };
                // The caller may have dropped the ticket.
                let _ = sender.send(result);
            }
            .instrument(span),
        );

        debug!(%entity_id, revision, in_flight = self.tracker.len(), "Scheduled population job");
        Ok(PopulationTicket {
            entity_id,
            revision,
            receiver,
        })
    }

    /// Jobs that are queued or running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.tracker.is_closed()
    }

    pub fn metrics(&self) -> &Arc<PopulationMetrics> {
        self.task.metrics()
    }

    /// Stops accepting jobs and waits up to the shutdown timeout for running
    /// ones; whatever is left is then aborted.
    ///
    /// Returns `true` when every job finished on its own.
    pub async fn shutdown(&self) -> bool {
        self.tracker.close();
        let pending = self.tracker.len();
        if pending == 0 {
            info!("Population scheduler stopped, no jobs in flight");
            return true;
        }

        info!(pending, timeout = ?self.shutdown_timeout, "Waiting for population jobs to finish");
        if timeout(self.shutdown_timeout, self.tracker.wait()).await.is_ok() {
            info!("All population jobs finished");
            return true;
        }

        warn!(remaining = self.tracker.len(), "Shutdown timeout elapsed, aborting population jobs");
        self.cancel.cancel();
        self.tracker.wait().await;
        false
    }
}
