//! Verification configuration registry
//!
//! Static catalogue of the credential checks this verifier can run, keyed by
//! use case. Every entry targets the AtomicQueryV3 circuit so proofs carry a
//! nullifier the replay guard can key on.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use common_types::{
    ProofQuery, ProofRequest, ProofRequestParams, RequestId, CREDENTIAL_ATOMIC_QUERY_V3,
};
use thiserror::Error;
use uuid::Uuid;

/// Returned when a use case key has no registry entry
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown verification use case: {use_case}. Available options: {available}")]
pub struct UnknownUseCase {
    /// Key as requested
    pub use_case: String,
    /// Comma separated list of valid keys
    pub available: String,
}

/// Returned when a nullifier session id is not a positive integer
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Nullifier session id must be a positive integer, got {0:?}")]
pub struct InvalidNullifierSessionId(String);

/// Credential check template for a use case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationConfig {
    /// Registry key, upper case
    pub use_case: String,
    pub name: String,
    /// Shown to the holder as the reason of the request
    pub description: String,
    pub circuit_id: String,
    pub query: ProofQuery,
}

impl VerificationConfig {
    /// Replaces the issuer allow-list, e.g. from deployment configuration
    #[must_use]
    pub fn with_allowed_issuers(mut self, allowed_issuers: Vec<String>) -> Self {
        self.query.allowed_issuers = allowed_issuers;
        self
    }

    /// Composes a proof request from this template
    #[must_use]
    pub fn proof_request(
        &self,
        request_id: RequestId,
        nullifier_session_id: &NullifierSessionId,
    ) -> ProofRequest {
        ProofRequest {
            circuit_id: self.circuit_id.clone(),
            id: request_id,
            params: ProofRequestParams {
                nullifier_session_id: nullifier_session_id.to_string(),
            },
            query: self.query.clone(),
        }
    }
}

fn config(
    use_case: &str,
    name: &str,
    description: &str,
    allowed_issuers: &[&str],
    context: &str,
    credential_type: &str,
) -> VerificationConfig {
    VerificationConfig {
        use_case: use_case.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        circuit_id: CREDENTIAL_ATOMIC_QUERY_V3.to_string(),
        query: ProofQuery {
            allowed_issuers: allowed_issuers.iter().map(ToString::to_string).collect(),
            context: context.to_string(),
            credential_type: credential_type.to_string(),
        },
    }
}

static VERIFICATION_CONFIGS: LazyLock<Vec<VerificationConfig>> = LazyLock::new(|| {
    vec![
        // Proof of humanity
        config(
            "POH",
            "Human Credential",
            "Verify you are a human",
            &["did:iden3:billions:main:2VmnvBNtpxCUbiEH3R2DNuXqPxuaBQJsG6mwU1J8PD"],
            "ipfs://QmcomGJQwJDCg3RE6FjsFYCjjMSTWJXY3fUWeq43Mc5CCJ",
            "LivenessCredential",
        ),
        // Proof of verified humanity
        config(
            "POVH",
            "Verified Human Credential",
            "Verify you are a verified human",
            &[
                "did:iden3:billions:test:2VxnoiNqdMPxzqp7X6MV7GfoPkDZ7ij499mDZAo72y",
                "did:iden3:billions:test:2VxnoiNqdMPyMXmEKpP8wGqrY6Vb7mgeQQUywyVeWe",
            ],
            "ipfs://QmZbsTnRwtCmbdg3r9o7Txid37LmvPcvmzVi1Abvqu1WKL",
            "BasicPerson",
        ),
        // Proof of uniqueness
        config(
            "POU",
            "Uniqueness Credential",
            "Verify you are a unique human",
            &["did:iden3:billions:main:2VmnvBNtpxCUbiEH3R2DNuXqPxuaBQJsG6mwU1J8PD"],
            "ipfs://QmcUEDa42Er4nfNFmGQVjiNYFaik6kvNQjfTeBrdSx83At",
            "UniquenessCredential",
        ),
    ]
});

/// Keys of all registered use cases, in registry order
#[must_use]
pub fn available_use_cases() -> Vec<&'static str> {
    VERIFICATION_CONFIGS
        .iter()
        .map(|c| c.use_case.as_str())
        .collect()
}

/// Looks up the configuration of a use case, case-insensitively.
///
/// # Errors
///
/// Returns `UnknownUseCase` listing every valid key if `use_case` is not
/// registered.
pub fn resolve_config(use_case: &str) -> Result<VerificationConfig, UnknownUseCase> {
    let key = use_case.trim().to_uppercase();

    VERIFICATION_CONFIGS
        .iter()
        .find(|c| c.use_case == key)
        .cloned()
        .ok_or_else(|| UnknownUseCase {
            use_case: use_case.to_string(),
            available: available_use_cases().join(", "),
        })
}

/// Builds the proof request for `use_case` without touching the registry.
///
/// # Errors
///
/// Returns `UnknownUseCase` if `use_case` is not registered.
pub fn build_proof_request(
    use_case: &str,
    request_id: RequestId,
    nullifier_session_id: &NullifierSessionId,
) -> Result<ProofRequest, UnknownUseCase> {
    resolve_config(use_case).map(|c| c.proof_request(request_id, nullifier_session_id))
}

/// Verifier-side input to the nullifier derivation.
///
/// Holders derive the same nullifier for every proof bound to the same
/// value, so it must stay fixed across sessions for the replay guard to see
/// repeated credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullifierSessionId(u64);

impl NullifierSessionId {
    /// Derives a random positive value from the first 16 hex digits of a
    /// UUID v4
    #[must_use]
    pub fn generate() -> Self {
        let (high, _) = Uuid::new_v4().as_u64_pair();
        Self(high.max(1))
    }
}

impl FromStr for NullifierSessionId {
    type Err = InvalidNullifierSessionId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<u64>() {
            Ok(value) if value > 0 => Ok(Self(value)),
            _ => Err(InvalidNullifierSessionId(s.to_string())),
        }
    }
}

impl fmt::Display for NullifierSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use common_types::SessionId;

    use super::*;

    #[test]
    fn test_every_use_case_resolves() {
        for use_case in available_use_cases() {
            let config = resolve_config(use_case).expect("registered use case");
            assert!(!config.query.credential_type.is_empty());
            assert!(!config.circuit_id.is_empty());
            assert!(!config.query.allowed_issuers.is_empty());
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let config = resolve_config("pou").unwrap();
        assert_eq!(config.use_case, "POU");
        assert_eq!(config.query.credential_type, "UniquenessCredential");
    }

    #[test]
    fn test_unknown_use_case_lists_keys() {
        let err = resolve_config("KYC").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown verification use case: KYC. Available options: POH, POVH, POU"
        );
    }

    #[test]
    fn test_build_proof_request() {
        let request_id = RequestId::from(SessionId::new_v4());
        let nullifier_session_id: NullifierSessionId = "8472917364519283".parse().unwrap();

        let request = build_proof_request("POVH", request_id, &nullifier_session_id).unwrap();

        assert_eq!(request.id, request_id);
        assert_eq!(request.circuit_id, CREDENTIAL_ATOMIC_QUERY_V3);
        assert_eq!(request.params.nullifier_session_id, "8472917364519283");
        assert_eq!(request.query.credential_type, "BasicPerson");
        assert_eq!(request.query.allowed_issuers.len(), 2);

        // The registry itself is untouched
        assert_eq!(resolve_config("POVH").unwrap().query, request.query);
    }

    #[test]
    fn test_allowed_issuers_override() {
        let config = resolve_config("POU")
            .unwrap()
            .with_allowed_issuers(vec!["did:iden3:custom".to_string()]);
        assert_eq!(config.query.allowed_issuers, vec!["did:iden3:custom"]);
        assert_ne!(resolve_config("POU").unwrap().query, config.query);
    }

    #[test]
    fn test_nullifier_session_id_must_be_positive() {
        assert!("0".parse::<NullifierSessionId>().is_err());
        assert!("-5".parse::<NullifierSessionId>().is_err());
        assert!("abc".parse::<NullifierSessionId>().is_err());
        assert_eq!(
            "42".parse::<NullifierSessionId>().unwrap().to_string(),
            "42"
        );
        assert_ne!(NullifierSessionId::generate().to_string(), "0");
    }
}
