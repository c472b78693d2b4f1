//! Verification status storage
//!
//! Tracks whether a proof request is still pending or has been verified.
//! `not_found` is what readers see for ids with no entry; it is never stored.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use common_types::{RequestId, VerificationStatus};
use dashmap::DashMap;
use thiserror::Error;

/// Result type for status storage operations
pub type StatusStoreResult<T> = Result<T, StatusStoreError>;

/// Errors that can occur during status storage operations
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StatusStoreError {
    /// Backing store failure
    #[error("Status backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recorded {
    Pending,
    Success,
}

#[derive(Debug, Clone, Copy)]
struct StatusEntry {
    recorded: Recorded,
    created_at: DateTime<Utc>,
}

/// Storage of per-request verification status
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Records a freshly issued request as pending. An existing entry is
    /// left untouched, so a success is never regressed.
    ///
    /// # Errors
    ///
    /// Backend failures only.
    async fn init_pending(&self, request_id: RequestId) -> StatusStoreResult<()>;

    /// Marks a request as verified. Idempotent.
    ///
    /// # Errors
    ///
    /// Backend failures only.
    async fn mark_success(&self, request_id: RequestId) -> StatusStoreResult<()>;

    /// Resolves the status of a request, `NotFound` when nothing is stored
    ///
    /// # Errors
    ///
    /// Backend failures only.
    async fn get(&self, request_id: &RequestId) -> StatusStoreResult<VerificationStatus>;

    /// Evicts entries created more than `ttl` ago, returning how many
    ///
    /// # Errors
    ///
    /// Backend failures only.
    async fn purge_expired(&self, ttl: Duration) -> StatusStoreResult<usize>;
}

/// Process-local status store
#[derive(Debug, Default)]
pub struct InMemoryStatusStore {
    statuses: DashMap<RequestId, StatusEntry>,
}

impl InMemoryStatusStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn init_pending(&self, request_id: RequestId) -> StatusStoreResult<()> {
        self.statuses.entry(request_id).or_insert(StatusEntry {
            recorded: Recorded::Pending,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn mark_success(&self, request_id: RequestId) -> StatusStoreResult<()> {
        self.statuses
            .entry(request_id)
            .and_modify(|entry| entry.recorded = Recorded::Success)
            .or_insert(StatusEntry {
                recorded: Recorded::Success,
                created_at: Utc::now(),
            });
        Ok(())
    }

    async fn get(&self, request_id: &RequestId) -> StatusStoreResult<VerificationStatus> {
        let status = self
            .statuses
            .get(request_id)
            .map_or(VerificationStatus::NotFound, |entry| match entry.recorded {
                Recorded::Pending => VerificationStatus::Pending,
                Recorded::Success => VerificationStatus::Success,
            });
        Ok(status)
    }

    async fn purge_expired(&self, ttl: Duration) -> StatusStoreResult<usize> {
        let ttl = TimeDelta::from_std(ttl).map_err(|e| StatusStoreError::Backend(e.to_string()))?;
        let now = Utc::now();
        let before = self.statuses.len();

        self.statuses.retain(|_, entry| now - entry.created_at <= ttl);

        let purged = before.saturating_sub(self.statuses.len());
        if purged > 0 {
            tracing::debug!("Purged {purged} expired status entries");
        }
        Ok(purged)
    }
}
