//! Durable Push Subscription Store
//!
//! Subscriptions are keyed by `(subject_id, endpoint)`. The file-backed store keeps them
//! in a `DashMap` for lock-free reads and rewrites `push_subscriptions.json` after every
//! change.

use super::types::PushSubscription;
use crate::storage::snapshot::SnapshotFile;

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Inserts or replaces the subscription for its `(subject_id, endpoint)` pair.
    async fn upsert(&self, subscription: PushSubscription) -> Result<()>;

    /// Removes a subscription. Returns whether it existed.
    async fn delete(&self, subject_id: &str, endpoint: &str) -> Result<bool>;

    fn by_subject(&self, subject_id: &str) -> Vec<PushSubscription>;

    fn all(&self) -> Vec<PushSubscription>;

    fn len(&self) -> usize {
        self.all().len()
    }
}

type SubscriptionKey = (String, String);

pub struct FileSubscriptionStore {
    subscriptions: DashMap<SubscriptionKey, PushSubscription>,
    file: SnapshotFile,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileSubscriptionStore {
    pub async fn load(file: SnapshotFile) -> Self {
        let subscriptions = DashMap::new();
        for subscription in file.load::<Vec<PushSubscription>>().await.unwrap_or_default() {
            subscriptions.insert(key_of(&subscription), subscription);
        }

        tracing::info!("Loaded {} push subscriptions", subscriptions.len());

        Self {
            subscriptions,
            file,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    async fn persist(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut document = self.all();
        document.sort_by(|a, b| (&a.subject_id, &a.endpoint).cmp(&(&b.subject_id, &b.endpoint)));
        self.file.store(&document).await
    }
}

#[async_trait]
impl SubscriptionStore for FileSubscriptionStore {
    async fn upsert(&self, subscription: PushSubscription) -> Result<()> {
        self.subscriptions.insert(key_of(&subscription), subscription);
        self.persist().await
    }

    async fn delete(&self, subject_id: &str, endpoint: &str) -> Result<bool> {
        let removed = self
            .subscriptions
            .remove(&(subject_id.to_string(), endpoint.to_string()))
            .is_some();

        if removed {
            self.persist().await?;
        }
        Ok(removed)
    }

    fn by_subject(&self, subject_id: &str) -> Vec<PushSubscription> {
        self.subscriptions
            .iter()
            .filter(|entry| entry.key().0 == subject_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn all(&self) -> Vec<PushSubscription> {
        self.subscriptions
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn len(&self) -> usize {
        self.subscriptions.len()
    }
}

fn key_of(subscription: &PushSubscription) -> SubscriptionKey {
    (
        subscription.subject_id.clone(),
        subscription.endpoint.clone(),
    )
}
