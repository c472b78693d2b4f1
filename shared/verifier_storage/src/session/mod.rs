//! Session storage
//!
//! A session maps the opaque id embedded in the wallet callback URL to the
//! authorization request issued for it, and tracks where the session is in
//! the verification protocol:
//!
//! `Issued -> CallbackReceived -> {Verified | Rejected}`
//!
//! Terminal states are never left.

mod error;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use common_types::{AuthorizationRequest, RequestId, SessionId};
use dashmap::{mapref::entry::Entry, DashMap};
use strum::Display;

pub use error::{SessionStoreError, SessionStoreResult};

/// Protocol state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SessionState {
    /// Authorization request handed out, waiting for the wallet
    Issued,
    /// Wallet posted a proof, verification in progress
    CallbackReceived,
    /// Proof verified and accepted by the replay guard
    Verified,
    /// Callback failed; the session cannot be retried
    Rejected,
}

/// Terminal outcome of a callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Verified,
    Rejected,
}

impl From<SessionOutcome> for SessionState {
    fn from(outcome: SessionOutcome) -> Self {
        match outcome {
            SessionOutcome::Verified => Self::Verified,
            SessionOutcome::Rejected => Self::Rejected,
        }
    }
}

/// An outstanding verification session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Key the session is filed under
    pub session_id: SessionId,
    /// Id carried by every proof request in `request`
    pub request_id: RequestId,
    /// The authorization request handed to the wallet
    pub request: AuthorizationRequest,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Creates a freshly issued session.
    ///
    /// # Errors
    ///
    /// Returns `SessionStoreError::RequestIdMismatch` if any scope entry of
    /// `request` carries an id other than the one derived from `session_id`.
    pub fn new(session_id: SessionId, request: AuthorizationRequest) -> SessionStoreResult<Self> {
        let request_id = RequestId::from(session_id);

        if let Some(entry) = request.body.scope.iter().find(|s| s.id != request_id) {
            return Err(SessionStoreError::RequestIdMismatch {
                session_id,
                request_id: entry.id,
            });
        }

        Ok(Self {
            session_id,
            request_id,
            request,
            state: SessionState::Issued,
            created_at: Utc::now(),
        })
    }

    fn is_expired(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        now - self.created_at > ttl
    }
}

/// Storage of outstanding sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Files a new session. Check and insert happen atomically.
    ///
    /// # Errors
    ///
    /// `DuplicateSession` if the id is already present.
    async fn create(&self, session: Session) -> SessionStoreResult<()>;

    /// Looks up a session without changing it
    ///
    /// # Errors
    ///
    /// Backend failures only.
    async fn get(&self, session_id: &SessionId) -> SessionStoreResult<Option<Session>>;

    /// Atomically moves a session from `Issued` to `CallbackReceived` and
    /// returns it. At most one caller wins per session.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent, `AlreadyUsed` if the session left `Issued`.
    async fn begin_callback(&self, session_id: &SessionId) -> SessionStoreResult<Session>;

    /// Records the terminal outcome of a callback
    ///
    /// # Errors
    ///
    /// `NotFound` if absent, `InvalidTransition` unless the session is in
    /// `CallbackReceived`.
    async fn complete(&self, session_id: &SessionId, outcome: SessionOutcome)
        -> SessionStoreResult<()>;

    /// Removes a session. Removing an absent session is a no-op.
    ///
    /// # Errors
    ///
    /// Backend failures only.
    async fn delete(&self, session_id: &SessionId) -> SessionStoreResult<()>;

    /// Evicts sessions created more than `ttl` ago, returning how many
    ///
    /// # Errors
    ///
    /// Backend failures only.
    async fn purge_expired(&self, ttl: Duration) -> SessionStoreResult<usize>;
}

/// Process-local session store
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<SessionId, Session>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, session: Session) -> SessionStoreResult<()> {
        match self.sessions.entry(session.session_id) {
            Entry::Occupied(_) => Err(SessionStoreError::DuplicateSession(session.session_id)),
            Entry::Vacant(slot) => {
                slot.insert(session);
                Ok(())
            }
        }
    }

    async fn get(&self, session_id: &SessionId) -> SessionStoreResult<Option<Session>> {
        Ok(self.sessions.get(session_id).map(|s| s.value().clone()))
    }

    async fn begin_callback(&self, session_id: &SessionId) -> SessionStoreResult<Session> {
        let mut session = self
            .sessions
            .get_mut(session_id)
            .ok_or(SessionStoreError::NotFound(*session_id))?;

        if session.state != SessionState::Issued {
            return Err(SessionStoreError::AlreadyUsed {
                session_id: *session_id,
                state: session.state,
            });
        }

        session.state = SessionState::CallbackReceived;
        Ok(session.value().clone())
    }

    async fn complete(
        &self,
        session_id: &SessionId,
        outcome: SessionOutcome,
    ) -> SessionStoreResult<()> {
        let mut session = self
            .sessions
            .get_mut(session_id)
            .ok_or(SessionStoreError::NotFound(*session_id))?;

        let to = SessionState::from(outcome);
        if session.state != SessionState::CallbackReceived {
            return Err(SessionStoreError::InvalidTransition {
                session_id: *session_id,
                from: session.state,
                to,
            });
        }

        session.state = to;
        Ok(())
    }

    async fn delete(&self, session_id: &SessionId) -> SessionStoreResult<()> {
        self.sessions.remove(session_id);
        Ok(())
    }

    async fn purge_expired(&self, ttl: Duration) -> SessionStoreResult<usize> {
        let ttl = TimeDelta::from_std(ttl).map_err(|e| SessionStoreError::Backend(e.to_string()))?;
        let now = Utc::now();
        let before = self.sessions.len();

        self.sessions.retain(|_, session| !session.is_expired(now, ttl));

        let purged = before.saturating_sub(self.sessions.len());
        if purged > 0 {
            tracing::debug!("Purged {purged} expired sessions");
        }
        Ok(purged)
    }
}
