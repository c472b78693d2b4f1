use std::str::FromStr;

use ruint::aliases::U256;

use super::error::ProofVerifierError;

/// Position of the holder's user id in the AtomicQueryV3 public signals
const USER_ID_INDEX: usize = 0;

/// Position of the nullifier in the AtomicQueryV3 public signals
const NULLIFIER_INDEX: usize = 4;

/// A field element as found in public signals.
///
/// Signals arrive as decimal strings; `0x`-prefixed hex is accepted too.
/// Equal values always render to the same 0x-prefixed, 32-byte hex string,
/// which makes it usable as a storage key.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct FieldElement(pub U256);

impl FieldElement {
    /// Outputs a hex string representation padded to 32 bytes (plus 0x prefix)
    #[must_use]
    pub fn to_hex_string(&self) -> String {
        format!("{:#066x}", self.0)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == U256::ZERO
    }
}

impl FromStr for FieldElement {
    type Err = ProofVerifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => U256::from_str_radix(hex, 16),
            None => U256::from_str_radix(s, 10),
        };

        parsed.map(Self).map_err(|e| {
            ProofVerifierError::InvalidPublicSignals(format!("Invalid field element {s:?}: {e}"))
        })
    }
}

impl std::fmt::Display for FieldElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex_string())
    }
}

/// Public signals of a credential proof relevant to replay protection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicSignals {
    /// Holder identity as committed in the proof
    pub user_id: FieldElement,
    /// Per-credential, per-verifier uniqueness value
    pub nullifier: FieldElement,
}

impl PublicSignals {
    /// Decodes AtomicQueryV3 public signals.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPublicSignals` if the list is too short, a value is
    /// not a field element, or the nullifier is zero (the holder proved
    /// without a nullifier session id).
    pub fn from_atomic_query_v3(pub_signals: &[String]) -> Result<Self, ProofVerifierError> {
        let signal = |index: usize, name: &str| -> Result<FieldElement, ProofVerifierError> {
            pub_signals
                .get(index)
                .ok_or_else(|| {
                    ProofVerifierError::InvalidPublicSignals(format!(
                        "Missing {name} at position {index}, got {} signals",
                        pub_signals.len()
                    ))
                })?
                .parse()
        };

        let user_id = signal(USER_ID_INDEX, "userID")?;
        let nullifier = signal(NULLIFIER_INDEX, "nullifier")?;

        if nullifier.is_zero() {
            return Err(ProofVerifierError::InvalidPublicSignals(
                "Proof carries no nullifier".to_string(),
            ));
        }

        Ok(Self { user_id, nullifier })
    }
}
