//! Download queue and worker.
//!
//! [`DownloadQueue`] is the cloneable producer side handed to the HTTP layer;
//! [`DownloadWorker`] drains jobs one at a time through the download use case.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::application::dto::HistoricalDataRequest;
use crate::application::ports::{CandleRepositoryPort, InvestGatewayPort};
use crate::application::use_cases::DownloadHistoricalCandlesUseCase;

/// Identifier of an enqueued download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generate a new random task id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A queued download.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    /// Task id returned to the caller.
    pub id: TaskId,
    /// What to download.
    pub request: HistoricalDataRequest,
}

/// Errors when enqueueing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// Queue is at capacity.
    #[error("download queue is full")]
    Full,

    /// Worker has stopped.
    #[error("download queue is closed")]
    Closed,
}

/// Producer side of the download queue.
#[derive(Debug, Clone)]
pub struct DownloadQueue {
    sender: mpsc::Sender<DownloadJob>,
}

impl DownloadQueue {
    /// Enqueue a download without waiting for capacity.
    pub fn enqueue(&self, request: HistoricalDataRequest) -> Result<TaskId, QueueError> {
        let id = TaskId::generate();
        self.sender
            .try_send(DownloadJob { id, request })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => QueueError::Full,
                mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
            })?;
        tracing::info!(task_id = %id, "Download task enqueued");
        Ok(id)
    }
}

/// Outcome counts of a worker run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    /// Jobs that completed.
    pub succeeded: usize,
    /// Jobs that failed.
    pub failed: usize,
}

/// Consumer side of the download queue.
pub struct DownloadWorker<G, R>
where
    G: InvestGatewayPort,
    R: CandleRepositoryPort,
{
    receiver: mpsc::Receiver<DownloadJob>,
    use_case: Arc<DownloadHistoricalCandlesUseCase<G, R>>,
}

impl<G, R> DownloadWorker<G, R>
where
    G: InvestGatewayPort,
    R: CandleRepositoryPort,
{
    /// Create a worker and its queue with room for `capacity` pending jobs.
    pub fn new(
        use_case: Arc<DownloadHistoricalCandlesUseCase<G, R>>,
        capacity: usize,
    ) -> (DownloadQueue, Self) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (DownloadQueue { sender }, Self { receiver, use_case })
    }

    /// Process jobs until `shutdown` fires or every queue handle is dropped.
    ///
    /// A job in progress when `shutdown` fires is abandoned.
    pub async fn run(mut self, shutdown: CancellationToken) -> WorkerReport {
        let mut report = WorkerReport::default();
        tracing::info!("Download worker started");

        loop {
            let job = tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    tracing::info!("Download worker shutting down");
                    break;
                }
                job = self.receiver.recv() => match job {
                    Some(job) => job,
                    None => {
                        tracing::info!("Download queue closed");
                        break;
                    }
                },
            };

            let outcome = tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    tracing::warn!(task_id = %job.id, "Download task abandoned on shutdown");
                    break;
                }
                outcome = self.use_case.execute(&job.request) => outcome,
            };

            match outcome {
                Ok(count) => {
                    report.succeeded += 1;
                    tracing::info!(task_id = %job.id, isin = %job.request.isin, count, "Download task finished");
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(task_id = %job.id, isin = %job.request.isin, error = %e, "Download task failed");
                }
            }
        }

        report
    }
}
