//! SSI verifier backend
//!
//! Issues iden3 authorization requests, verifies the proofs wallets post
//! back through an external proof verifier and lets each credential verify
//! at most once.

#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

/// Request/callback orchestration
pub mod flow;

/// HTTP middleware
pub mod middleware;

/// Proof verification service boundary
pub mod proof_verifier;

/// API routes
pub mod routes;

/// Server assembly
pub mod server;

/// Configuration, errors and extractors
pub mod types;

/// Verification configuration registry
pub mod verification_config;
