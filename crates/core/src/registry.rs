//! Download registry and cancellation.
//!
//! The registry maps each active job id to its kill switch and temp prefix.
//! It is owned by the coordinator and shared by cloning; there is no global
//! instance. Two parties mutate it: `cancel`, and each job's terminal
//! handler through `complete`.
//!
//! A cancelled job disappears from every public view at once, but its entry
//! stays behind as a tombstone until the job's own `complete` runs. Until
//! then the id cannot be registered again, so the old job's cleanup can
//! never touch files of a newer job with the same id.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::pipeline::{JobState, TempPrefix};

/// Errors returned by the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// An entry for this id already exists.
    #[error("Job already registered: {0}")]
    AlreadyRegistered(String),
}

struct RegistryEntry {
    serial: u64,
    token: CancellationToken,
    prefix: TempPrefix,
    source_url: String,
    state: JobState,
    started_at: DateTime<Utc>,
    purge: Option<JoinHandle<usize>>,
}

impl RegistryEntry {
    fn is_live(&self) -> bool {
        !self.token.is_cancelled()
    }
}

/// Proof of registration held by a running job.
///
/// The serial ties it to exactly one entry, so `complete` can never remove
/// an entry created later under the same id.
#[derive(Debug, Clone)]
pub struct Registration {
    id: String,
    serial: u64,
    token: CancellationToken,
}

impl Registration {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The job's kill switch.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Public view of an active job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSnapshot {
    pub id: String,
    pub source_url: String,
    pub state: JobState,
    pub started_at: DateTime<Utc>,
}

/// Registry of active jobs.
#[derive(Clone, Default)]
pub struct DownloadRegistry {
    entries: Arc<RwLock<HashMap<String, RegistryEntry>>>,
    next_serial: Arc<AtomicU64>,
}

impl DownloadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the entry for a job.
    pub async fn register(
        &self,
        id: &str,
        prefix: TempPrefix,
        source_url: &str,
    ) -> Result<Registration, RegistryError> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(id) {
            return Err(RegistryError::AlreadyRegistered(id.to_string()));
        }

        let serial = self.next_serial.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        entries.insert(
            id.to_string(),
            RegistryEntry {
                serial,
                token: token.clone(),
                prefix,
                source_url: source_url.to_string(),
                state: JobState::Registered,
                started_at: Utc::now(),
                purge: None,
            },
        );
        debug!(job_id = %id, serial, "Registered job");

        Ok(Registration {
            id: id.to_string(),
            serial,
            token,
        })
    }

    /// Moves a job into its first running state.
    pub async fn mark_running(&self, id: &str) {
        self.set_state(id, JobState::Extracting).await;
    }

    /// Updates the reported state of an active job. Unknown ids are ignored.
    pub async fn set_state(&self, id: &str, state: JobState) {
        if let Some(entry) = self.entries.write().await.get_mut(id).filter(|e| e.is_live()) {
            entry.state = state;
        }
    }

    /// Whether the job registered under `id` has been cancelled and has not
    /// finished yet.
    pub async fn is_cancelled(&self, id: &str) -> bool {
        self.entries
            .read()
            .await
            .get(id)
            .is_some_and(|e| !e.is_live())
    }

    /// Whether a live, uncancelled job exists for `id`.
    pub async fn contains(&self, id: &str) -> bool {
        self.entries.read().await.get(id).is_some_and(RegistryEntry::is_live)
    }

    /// Cancels a job.
    ///
    /// Fires the kill switch, schedules deletion of every prefixed temp file
    /// and hides the job from every public view. Returns `false` without side
    /// effects when no live entry exists, including for a job that was
    /// already cancelled.
    pub async fn cancel(&self, id: &str) -> bool {
        let mut entries = self.entries.write().await;
        let Some(entry) = entries.get_mut(id).filter(|e| e.is_live()) else {
            debug!(job_id = %id, "Cancel for unknown job ignored");
            return false;
        };

        entry.token.cancel();
        entry.state = JobState::Cancelled;

        let prefix = entry.prefix.clone();
        entry.purge = Some(tokio::spawn(async move { prefix.purge().await }));

        info!(job_id = %id, "Job cancelled");
        true
    }

    /// Removes the entry belonging to `registration`.
    ///
    /// A purge scheduled by `cancel` is awaited first, so the id only
    /// becomes free once none of its files can still be deleted. Returns
    /// `false` if the entry belongs to a different registration.
    pub async fn complete(&self, registration: &Registration) -> bool {
        let pending_purge = {
            let mut entries = self.entries.write().await;
            match entries.get_mut(&registration.id) {
                Some(entry) if entry.serial == registration.serial => entry.purge.take(),
                _ => return false,
            }
        };

        if let Some(purge) = pending_purge {
            if let Err(e) = purge.await {
                debug!(job_id = %registration.id, "Cancel purge task failed: {}", e);
            }
        }

        let mut entries = self.entries.write().await;
        match entries.get(&registration.id) {
            Some(entry) if entry.serial == registration.serial => {
                entries.remove(&registration.id);
                debug!(job_id = %registration.id, "Deregistered job");
                true
            }
            _ => false,
        }
    }

    /// Live jobs, oldest first.
    pub async fn snapshot(&self) -> Vec<JobSnapshot> {
        let mut jobs: Vec<JobSnapshot> = self
            .entries
            .read()
            .await
            .iter()
            .filter(|(_, entry)| entry.is_live())
            .map(|(id, entry)| JobSnapshot {
                id: id.clone(),
                source_url: entry.source_url.clone(),
                state: entry.state,
                started_at: entry.started_at,
            })
            .collect();
        jobs.sort_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.id.cmp(&b.id)));
        jobs
    }

    /// Number of entries, cancelled jobs that are still winding down
    /// included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
