use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Returned when a session or request identifier is not a valid UUID
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid identifier: {0}")]
pub struct IdParseError(String);

/// Opaque identifier of a verification session.
///
/// Embedded in the callback URL handed to the wallet, so it must be
/// unguessable. Always a random UUID v4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SessionId(Uuid);

/// Identifier of a proof request inside an authorization request scope.
///
/// The status endpoint is keyed by this value. Within a session it always
/// equals the session id the request was filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl SessionId {
    /// Generates a fresh random session id
    #[must_use]
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl RequestId {
    /// The underlying UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<SessionId> for RequestId {
    fn from(session_id: SessionId) -> Self {
        Self(session_id.0)
    }
}

impl From<Uuid> for SessionId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<Uuid> for RequestId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for SessionId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| IdParseError(s.to_string()))
    }
}

impl FromStr for RequestId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| IdParseError(s.to_string()))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_distinct() {
        assert_ne!(SessionId::new_v4(), SessionId::new_v4());
    }

    #[test]
    fn test_request_id_mirrors_session_id() {
        let session_id = SessionId::new_v4();
        let request_id = RequestId::from(session_id);
        assert_eq!(session_id.to_string(), request_id.to_string());
    }

    #[test]
    fn test_parse_rejects_non_uuid() {
        assert!("1234".parse::<SessionId>().is_err());
        assert!("".parse::<RequestId>().is_err());
        assert!("not-a-uuid".parse::<RequestId>().is_err());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id: SessionId = "6f1c2d9e-8b4a-4c3e-9f7d-2a1b0c9d8e7f".parse().unwrap();
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            "\"6f1c2d9e-8b4a-4c3e-9f7d-2a1b0c9d8e7f\""
        );
    }
}
