//! Job progress store.
//!
//! The automation engine reports a percentage per job id and the upload page
//! polls it. Entries expire after a configurable TTL; expired entries read as
//! zero and are removed lazily on read and periodically by a sweeper task.
//! Writes are last-writer-wins: a smaller value may replace a larger one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use pidview_core::Progress;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn set(&self, job_id: &str, progress: Progress);

    /// Progress for `job_id`, zero when unknown or expired.
    async fn get(&self, job_id: &str) -> Progress;

    /// Drop expired entries and return how many were removed.
    async fn purge_expired(&self) -> usize;
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    progress: Progress,
    updated_at: Instant,
}

/// Process-local progress store behind a single mutex.
pub struct InMemoryProgressStore {
    entries: Mutex<HashMap<String, Entry>>,
    ttl: Duration,
}

impl InMemoryProgressStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_expired(&self, entry: &Entry, now: Instant) -> bool {
        now.saturating_duration_since(entry.updated_at) > self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn set(&self, job_id: &str, progress: Progress) {
        self.entries().insert(
            job_id.to_string(),
            Entry {
                progress,
                updated_at: Instant::now(),
            },
        );
    }

    async fn get(&self, job_id: &str) -> Progress {
        let now = Instant::now();
        let mut entries = self.entries();
        match entries.get(job_id).copied() {
            Some(entry) if self.is_expired(&entry, now) => {
                entries.remove(job_id);
                Progress::default()
            }
            Some(entry) => entry.progress,
            None => Progress::default(),
        }
    }

    async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        before - entries.len()
    }
}

/// Start a background task that purges expired progress entries every `every`.
pub fn spawn_progress_sweeper(store: Arc<dyn ProgressStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // First tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = store.purge_expired().await;
            if removed > 0 {
                tracing::debug!(removed = removed, "Purged expired progress entries");
            }
        }
    })
}
