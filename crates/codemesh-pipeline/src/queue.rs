//! Ingestion job queue abstraction: jobs are stream entries
//! `{job_type, project_id, source_id?, index_run_id}` with consumer
//! groups for horizontal worker scale. `InMemoryQueue` is the only
//! implementation this repo ships — a production deployment swaps in a
//! real stream (Redis Streams / Kafka) behind the same trait.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use codemesh_core::ids::{IndexRunId, ProjectId, SourceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobType {
    Index,
}

#[derive(Debug, Clone)]
pub struct IngestJob {
    pub job_type: JobType,
    pub project_id: ProjectId,
    pub source_id: Option<SourceId>,
    pub index_run_id: IndexRunId,
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: IngestJob);

    /// Long-polls for the next job visible to `consumer_group`, returning
    /// `None` once `timeout` elapses with nothing queued.
    async fn dequeue(&self, consumer_group: &str, timeout: Duration) -> Option<IngestJob>;
}

/// Every worker calling `dequeue` races on the same receiver lock, so a
/// queued job is handed to exactly one caller — the round-robin dispatch
/// a real consumer group gives you, without a broker behind it.
pub struct InMemoryQueue {
    sender: mpsc::UnboundedSender<IngestJob>,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<IngestJob>>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobQueue for InMemoryQueue {
    async fn enqueue(&self, job: IngestJob) {
        tracing::debug!(project_id = %job.project_id, index_run_id = %job.index_run_id, "enqueued index job");
        // The receiver is never dropped while `self` is alive, so this
        // can only fail if the queue itself is being torn down.
        let _ = self.sender.send(job);
    }

    async fn dequeue(&self, consumer_group: &str, timeout: Duration) -> Option<IngestJob> {
        let mut receiver = self.receiver.lock().await;
        match tokio::time::timeout(timeout, receiver.recv()).await {
            Ok(Some(job)) => {
                tracing::debug!(consumer_group, project_id = %job.project_id, "dequeued index job");
                Some(job)
            }
            Ok(None) | Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> IngestJob {
        IngestJob {
            job_type: JobType::Index,
            project_id: ProjectId::new(),
            source_id: None,
            index_run_id: IndexRunId::new(),
        }
    }

    #[tokio::test]
    async fn dequeue_returns_enqueued_job() {
        let queue = InMemoryQueue::new();
        let sent = job();
        queue.enqueue(sent.clone()).await;
        let received = queue.dequeue("workers", Duration::from_millis(100)).await.unwrap();
        assert_eq!(received.project_id, sent.project_id);
    }

    #[tokio::test]
    async fn dequeue_times_out_when_empty() {
        let queue = InMemoryQueue::new();
        let received = queue.dequeue("workers", Duration::from_millis(20)).await;
        assert!(received.is_none());
    }

    #[tokio::test]
    async fn two_pollers_split_the_backlog() {
        let queue = Arc::new(InMemoryQueue::new());
        for _ in 0..4 {
            queue.enqueue(job()).await;
        }
        let a = queue.dequeue("workers", Duration::from_millis(50)).await;
        let b = queue.dequeue("workers", Duration::from_millis(50)).await;
        assert!(a.is_some());
        assert!(b.is_some());
    }
}
