//! Push Dispatch Queue
//!
//! A bounded FIFO between request handlers and a single delivery worker. Enqueueing
//! never waits: when the buffer is full the job is dropped and counted. The worker
//! polls with a short timeout so it idles without spinning, and contains every failure
//! (including panics) to the job that caused it.

use super::sender::PushSender;
use super::subscriptions::SubscriptionStore;
use super::types::{DeliveryOutcome, PushJob};

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

/// How long the worker waits for a job before checking for shutdown again.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(1);

pub struct PushQueue {
    tx: mpsc::Sender<PushJob>,
    capacity: usize,
    enqueued: AtomicU64,
    dropped: AtomicU64,
}

impl PushQueue {
    /// Creates the queue and the receiving half for its worker.
    pub fn bounded(capacity: usize) -> (Arc<Self>, mpsc::Receiver<PushJob>) {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let queue = Arc::new(Self {
            tx,
            capacity,
            enqueued: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        });
        (queue, rx)
    }

    /// Non-blocking enqueue. Returns `false` if the job was dropped.
    pub fn enqueue(&self, job: PushJob) -> bool {
        match self.tx.try_send(job) {
            Ok(()) => {
                self.enqueued.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(job)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    "Push queue full ({} jobs); dropping push to {}",
                    self.capacity,
                    job.subscription.subject_id
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Push worker stopped; dropping push");
                false
            }
        }
    }

    /// Jobs waiting for the worker.
    pub fn depth(&self) -> usize {
        self.capacity - self.tx.capacity()
    }

    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Single consumer of the push queue.
pub struct PushWorker {
    rx: mpsc::Receiver<PushJob>,
    sender: Arc<dyn PushSender>,
    subscriptions: Arc<dyn SubscriptionStore>,
}

impl PushWorker {
    pub fn new(
        rx: mpsc::Receiver<PushJob>,
        sender: Arc<dyn PushSender>,
        subscriptions: Arc<dyn SubscriptionStore>,
    ) -> Self {
        Self {
            rx,
            sender,
            subscriptions,
        }
    }

    /// Delivers jobs until `cancel` fires or every queue handle is dropped.
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!("Push worker started");

        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => break,
                next = tokio::time::timeout(POLL_TIMEOUT, self.rx.recv()) => next,
            };

            match next {
                Ok(Some(job)) => self.process(job).await,
                Ok(None) => break,
                Err(_) => continue,
            }
        }

        tracing::info!("Push worker stopped");
    }

    /// Handles one job. Never propagates a failure, not even a panic.
    pub async fn process(&self, job: PushJob) {
        let subject = job.subscription.subject_id.clone();

        let result = AssertUnwindSafe(self.deliver(job)).catch_unwind().await;
        if result.is_err() {
            tracing::error!("Push delivery to {} panicked; job dropped", subject);
        }
    }

    async fn deliver(&self, job: PushJob) {
        let subscription = &job.subscription;

        match self.sender.send(&job).await {
            Ok(DeliveryOutcome::Delivered) => {
                tracing::debug!("Push delivered to {}", subscription.subject_id);
            }
            Ok(DeliveryOutcome::Skipped) => {
                tracing::debug!("Push to {} skipped", subscription.subject_id);
            }
            Ok(DeliveryOutcome::Gone) => {
                tracing::info!(
                    "Subscription gone for {}; removing",
                    subscription.subject_id
                );
                if let Err(e) = self
                    .subscriptions
                    .delete(&subscription.subject_id, &subscription.endpoint)
                    .await
                {
                    tracing::warn!("Failed to remove expired subscription: {:#}", e);
                }
            }
            Ok(DeliveryOutcome::Rejected(status)) => {
                tracing::warn!(
                    "Push to {} rejected with status {}",
                    subscription.subject_id,
                    status
                );
            }
            Err(e) => {
                tracing::warn!("Push to {} failed: {}", subscription.subject_id, e);
            }
        }
    }
}
