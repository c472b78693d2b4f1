//! Verifier storage services
//!
//! Shared mutable state of the verification flow: outstanding sessions,
//! per-request verification status and the replay guard. Each store is an
//! async trait with an atomicity contract; the in-memory implementations
//! lock per key and never across an `.await`.

pub mod replay_guard;
pub mod session;
pub mod status;

pub use replay_guard::{
    InMemoryReplayGuard, RejectReason, ReplayDecision, ReplayGuard, ReplayGuardError,
    ReplayGuardResult, VerificationRecord,
};
pub use session::{
    InMemorySessionStore, Session, SessionOutcome, SessionState, SessionStore, SessionStoreError,
    SessionStoreResult,
};
pub use status::{InMemoryStatusStore, StatusStore, StatusStoreError, StatusStoreResult};
