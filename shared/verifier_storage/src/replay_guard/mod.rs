//! Replay guard
//!
//! Ledger of verified nullifiers. The proof system derives one nullifier per
//! credential per verifier context, so recording it on first verification and
//! refusing it afterwards makes each credential single-use with this verifier.
//!
//! Policy: entries are keyed by nullifier and a key that is already verified
//! is rejected unconditionally, whatever session or presenter comes with it.

mod error;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common_types::SessionId;
use dashmap::{mapref::entry::Entry, DashMap};
use serde::Serialize;
use strum::Display;

pub use error::{ReplayGuardError, ReplayGuardResult};

/// Ledger entry for a verified nullifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    /// Session whose callback recorded this entry
    pub session_id: SessionId,
    pub verified: bool,
    pub nullifier: String,
    /// DID of the holder that presented the proof
    pub presenter: String,
    pub verified_at: DateTime<Utc>,
}

/// Why a verification attempt was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RejectReason {
    #[strum(serialize = "already verified")]
    AlreadyVerified {
        /// Session that verified the key first
        first_session_id: SessionId,
    },
}

/// Outcome of [`ReplayGuard::try_record_verification`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayDecision {
    Accepted,
    Rejected(RejectReason),
}

impl ReplayDecision {
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// At-most-once verification ledger
#[async_trait]
pub trait ReplayGuard: Send + Sync {
    /// Records a verification for `key` unless one is already recorded.
    ///
    /// Check and write are a single atomic step: concurrent calls for the
    /// same key yield exactly one `Accepted`.
    ///
    /// # Errors
    ///
    /// Backend failures only. A replay is an `Ok(Rejected(..))`.
    async fn try_record_verification(
        &self,
        key: &str,
        session_id: SessionId,
        nullifier: &str,
        presenter: &str,
    ) -> ReplayGuardResult<ReplayDecision>;

    /// Looks up the record stored for `key`
    ///
    /// # Errors
    ///
    /// Backend failures only.
    async fn get(&self, key: &str) -> ReplayGuardResult<Option<VerificationRecord>>;
}

/// Process-local replay guard
#[derive(Debug, Default)]
pub struct InMemoryReplayGuard {
    records: DashMap<String, VerificationRecord>,
}

impl InMemoryReplayGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl ReplayGuard for InMemoryReplayGuard {
    async fn try_record_verification(
        &self,
        key: &str,
        session_id: SessionId,
        nullifier: &str,
        presenter: &str,
    ) -> ReplayGuardResult<ReplayDecision> {
        if key.is_empty() {
            return Err(ReplayGuardError::EmptyKey);
        }

        let record = VerificationRecord {
            session_id,
            verified: true,
            nullifier: nullifier.to_string(),
            presenter: presenter.to_string(),
            verified_at: Utc::now(),
        };

        let decision = match self.records.entry(key.to_string()) {
            Entry::Occupied(existing) if existing.get().verified => {
                ReplayDecision::Rejected(RejectReason::AlreadyVerified {
                    first_session_id: existing.get().session_id,
                })
            }
            Entry::Occupied(mut unverified) => {
                unverified.insert(record);
                ReplayDecision::Accepted
            }
            Entry::Vacant(slot) => {
                slot.insert(record);
                ReplayDecision::Accepted
            }
        };

        Ok(decision)
    }

    async fn get(&self, key: &str) -> ReplayGuardResult<Option<VerificationRecord>> {
        Ok(self.records.get(key).map(|r| r.value().clone()))
    }
}
