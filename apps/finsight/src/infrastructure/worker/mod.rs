//! Background Workers
//!
//! Queue and worker that run candle downloads outside the request path.

mod download_worker;

pub use download_worker::{DownloadJob, DownloadQueue, DownloadWorker, QueueError, TaskId, WorkerReport};
