//! Environment configuration for different deployment stages

use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::flow::FlowSettings;
use crate::middleware::rate_limit::{DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW};
use crate::middleware::RateLimitConfig;
use crate::proof_verifier::remote::VerifierContext;
use crate::proof_verifier::{StateResolver, VerifyOptions};
use crate::verification_config::{
    resolve_config, InvalidNullifierSessionId, NullifierSessionId, UnknownUseCase,
};

/// Use case served when none is configured in development
const DEFAULT_USE_CASE: &str = "POU";
/// Default session lifetime
const DEFAULT_SESSION_TTL_SECS: u64 = 15 * 60;
const DEFAULT_PORT: u16 = 8080;

/// Default on-chain state contract shared by all supported networks
const DEFAULT_STATE_CONTRACT: &str = "0x3C9acB2205Aa72A05F6D77d708b5Cf85FCa3a896";

/// Network namespace, RPC env var, contract env var, default RPC URL
const STATE_RESOLVERS: [(&str, &str, &str, &str); 3] = [
    (
        "billions:main",
        "BILLIONS_RPC_URL",
        "BILLIONS_CONTRACT",
        "https://rpc-mainnet.billions.network/",
    ),
    (
        "privado:main",
        "PRIVADO_RPC_URL",
        "PRIVADO_CONTRACT",
        "https://rpc-mainnet.privado.id",
    ),
    (
        "billions:test",
        "BILLIONS_TEST_RPC_URL",
        "BILLIONS_TEST_CONTRACT",
        "https://billions-testnet-rpc.eu-north-2.gateway.fm",
    ),
];

/// Configuration errors, fatal at startup
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid {
        /// Offending variable
        var: &'static str,
        reason: String,
    },

    #[error(transparent)]
    UnknownUseCase(#[from] UnknownUseCase),
}

impl From<InvalidNullifierSessionId> for ConfigError {
    fn from(err: InvalidNullifierSessionId) -> Self {
        Self::Invalid {
            var: "NULLIFIER_SESSION_ID",
            reason: err.to_string(),
        }
    }
}

/// Everything the verifier reads from the environment
#[derive(Debug, Clone)]
pub struct VerifierSettings {
    /// Registry key of the active use case
    pub use_case: String,
    /// Public base URL, used to build callback URLs
    pub host_url: Option<String>,
    pub verifier_did: Option<String>,
    /// Replaces the registry's issuer allow-list when set
    pub allowed_issuers: Option<Vec<String>>,
    pub nullifier_session_id: NullifierSessionId,
    pub proof_verifier_url: String,
    pub verifier_context: VerifierContext,
    pub rate_limit: RateLimitConfig,
    /// Lifetime of sessions and status entries
    pub session_ttl: Duration,
    /// Restricts CORS to these origins when set
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl VerifierSettings {
    /// Resolves the configured use case into flow settings.
    ///
    /// # Errors
    ///
    /// `UnknownUseCase` if the use case is not registered.
    pub fn flow_settings(&self) -> Result<FlowSettings, ConfigError> {
        let mut config = resolve_config(&self.use_case)?;
        if let Some(issuers) = &self.allowed_issuers {
            config = config.with_allowed_issuers(issuers.clone());
        }

        Ok(FlowSettings {
            config,
            host_url: self.host_url.clone(),
            verifier_did: self.verifier_did.clone(),
            nullifier_session_id: self.nullifier_session_id,
            verify_options: VerifyOptions::default(),
        })
    }
}

/// Application environment configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment
    Development,
}

/// Reads a variable, treating blank values as unset
fn var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    var(name).map_or(Ok(default), |v| {
        v.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: name,
            reason: e.to_string(),
        })
    })
}

fn list_var(name: &str) -> Option<Vec<String>> {
    var(name)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect::<Vec<_>>()
        })
        .filter(|list| !list.is_empty())
}

fn url_var(name: &'static str, value: String) -> Result<String, ConfigError> {
    Url::parse(&value).map_err(|e| ConfigError::Invalid {
        var: name,
        reason: e.to_string(),
    })?;
    Ok(value.trim_end_matches('/').to_string())
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => Self::Development,
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Whether to show API docs
    #[must_use]
    pub const fn show_api_docs(&self) -> bool {
        matches!(self, Self::Development | Self::Staging)
    }

    /// Whether logs are emitted as JSON
    #[must_use]
    pub const fn json_logs(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }

    /// Port to listen on, `PORT` or 8080
    ///
    /// # Errors
    ///
    /// If `PORT` is not a valid port number
    pub fn port() -> Result<u16, ConfigError> {
        parse_var("PORT", DEFAULT_PORT)
    }

    /// Reads a value that deployed environments must set explicitly
    fn required(&self, name: &'static str) -> Result<Option<String>, ConfigError> {
        match (var(name), self) {
            (Some(value), _) => Ok(Some(value)),
            (None, Self::Development) => Ok(None),
            (None, Self::Production | Self::Staging) => Err(ConfigError::Missing(name)),
        }
    }

    /// Loads the verifier settings.
    ///
    /// Production and staging refuse to start without `HOST_URL`,
    /// `VERIFIER_DID`, `USE_CASE` and `PROOF_VERIFIER_URL`. Development
    /// falls back to local defaults and reports a missing host URL or
    /// verifier identity at issuance time.
    ///
    /// # Errors
    ///
    /// Missing or invalid variables.
    pub fn verifier_settings(&self) -> Result<VerifierSettings, ConfigError> {
        let host_url = self
            .required("HOST_URL")?
            .map(|v| url_var("HOST_URL", v))
            .transpose()?;

        let verifier_did = match var("VERIFIER_DID").or_else(|| var("AUDIENCE_DID")) {
            Some(did) => Some(did),
            None => self.required("VERIFIER_DID")?,
        };

        let use_case = self
            .required("USE_CASE")?
            .unwrap_or_else(|| DEFAULT_USE_CASE.to_string());

        let allowed_issuers =
            list_var("ALLOWED_ISSUERS").or_else(|| var("ALLOWED_ISSUER").map(|i| vec![i]));

        let nullifier_session_id = match var("NULLIFIER_SESSION_ID") {
            Some(value) => value.parse()?,
            None => NullifierSessionId::generate(),
        };

        let proof_verifier_url = url_var(
            "PROOF_VERIFIER_URL",
            self.required("PROOF_VERIFIER_URL")?
                .unwrap_or_else(|| "http://localhost:3001".to_string()),
        )?;

        let mut state_resolvers = BTreeMap::new();
        for (network, rpc_var, contract_var, default_rpc) in STATE_RESOLVERS {
            state_resolvers.insert(
                network.to_string(),
                StateResolver {
                    rpc_url: var(rpc_var).unwrap_or_else(|| default_rpc.to_string()),
                    contract_address: var(contract_var)
                        .unwrap_or_else(|| DEFAULT_STATE_CONTRACT.to_string()),
                },
            );
        }

        let verifier_context = VerifierContext {
            state_resolvers,
            circuits_dir: var("KEY_DIR").unwrap_or_else(|| "./keys".to_string()),
            ipfs_gateway_url: var("IPFS_GATEWAY").unwrap_or_else(|| "https://ipfs.io".to_string()),
        };

        let rate_limit = RateLimitConfig {
            max_requests: parse_var("RATE_LIMIT_MAX_REQUESTS", DEFAULT_MAX_REQUESTS)?,
            window: Duration::from_secs(parse_var(
                "RATE_LIMIT_WINDOW_SECS",
                DEFAULT_WINDOW.as_secs(),
            )?),
        };
        if rate_limit.max_requests == 0 || rate_limit.window.is_zero() {
            return Err(ConfigError::Invalid {
                var: "RATE_LIMIT_MAX_REQUESTS",
                reason: "rate limit and window must be positive".to_string(),
            });
        }

        let session_ttl =
            Duration::from_secs(parse_var("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?);
        if session_ttl.is_zero() {
            return Err(ConfigError::Invalid {
                var: "SESSION_TTL_SECS",
                reason: "must be positive".to_string(),
            });
        }

        Ok(VerifierSettings {
            use_case,
            host_url,
            verifier_did,
            allowed_issuers,
            nullifier_session_id,
            proof_verifier_url,
            verifier_context,
            rate_limit,
            session_ttl,
            cors_allowed_origins: list_var("CORS_ALLOWED_ORIGINS"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 22] = [
        "APP_ENV",
        "HOST_URL",
        "VERIFIER_DID",
        "AUDIENCE_DID",
        "USE_CASE",
        "ALLOWED_ISSUERS",
        "ALLOWED_ISSUER",
        "NULLIFIER_SESSION_ID",
        "PROOF_VERIFIER_URL",
        "KEY_DIR",
        "IPFS_GATEWAY",
        "BILLIONS_RPC_URL",
        "BILLIONS_CONTRACT",
        "PRIVADO_RPC_URL",
        "PRIVADO_CONTRACT",
        "BILLIONS_TEST_RPC_URL",
        "BILLIONS_TEST_CONTRACT",
        "RATE_LIMIT_MAX_REQUESTS",
        "RATE_LIMIT_WINDOW_SECS",
        "SESSION_TTL_SECS",
        "CORS_ALLOWED_ORIGINS",
        "PORT",
    ];

    fn clear_env() {
        for name in VARS {
            env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn test_environment_from_env() {
        clear_env();
        assert_eq!(Environment::from_env(), Environment::Development);

        env::set_var("APP_ENV", "staging");
        assert_eq!(Environment::from_env(), Environment::Staging);

        env::set_var("APP_ENV", " Production ");
        assert_eq!(Environment::from_env(), Environment::Production);
        clear_env();
    }

    #[test]
    #[serial]
    #[should_panic(expected = "Invalid environment: invalid")]
    fn test_invalid_environment() {
        env::set_var("APP_ENV", "invalid");
        let _ = Environment::from_env();
    }

    #[test]
    #[serial]
    fn test_development_defaults() {
        clear_env();
        let settings = Environment::Development.verifier_settings().unwrap();

        assert_eq!(settings.use_case, "POU");
        assert_eq!(settings.host_url, None);
        assert_eq!(settings.verifier_did, None);
        assert_eq!(settings.allowed_issuers, None);
        assert_eq!(settings.proof_verifier_url, "http://localhost:3001");
        assert_eq!(settings.rate_limit, RateLimitConfig::default());
        assert_eq!(settings.session_ttl, Duration::from_secs(900));
        assert_eq!(settings.verifier_context.circuits_dir, "./keys");
        assert_eq!(settings.verifier_context.state_resolvers.len(), 3);
        assert_eq!(
            settings.verifier_context.state_resolvers["privado:main"].rpc_url,
            "https://rpc-mainnet.privado.id"
        );
        assert_eq!(Environment::port(), Ok(8080));
    }

    #[test]
    #[serial]
    fn test_production_requires_explicit_values() {
        clear_env();
        assert_eq!(
            Environment::Production.verifier_settings().unwrap_err(),
            ConfigError::Missing("HOST_URL")
        );

        env::set_var("HOST_URL", "https://verifier.example/");
        env::set_var("AUDIENCE_DID", "did:iden3:billions:main:verifier");
        assert_eq!(
            Environment::Production.verifier_settings().unwrap_err(),
            ConfigError::Missing("USE_CASE")
        );

        env::set_var("USE_CASE", "povh");
        env::set_var("PROOF_VERIFIER_URL", "http://verifier-service:3001");
        let settings = Environment::Production.verifier_settings().unwrap();
        assert_eq!(settings.host_url.as_deref(), Some("https://verifier.example"));
        assert_eq!(
            settings.verifier_did.as_deref(),
            Some("did:iden3:billions:main:verifier")
        );
        assert_eq!(settings.flow_settings().unwrap().config.use_case, "POVH");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_are_rejected() {
        clear_env();
        env::set_var("HOST_URL", "not a url");
        assert!(matches!(
            Environment::Development.verifier_settings(),
            Err(ConfigError::Invalid { var: "HOST_URL", .. })
        ));

        env::remove_var("HOST_URL");
        env::set_var("NULLIFIER_SESSION_ID", "0");
        assert!(matches!(
            Environment::Development.verifier_settings(),
            Err(ConfigError::Invalid {
                var: "NULLIFIER_SESSION_ID",
                ..
            })
        ));

        env::remove_var("NULLIFIER_SESSION_ID");
        env::set_var("SESSION_TTL_SECS", "soon");
        assert!(Environment::Development.verifier_settings().is_err());

        env::remove_var("SESSION_TTL_SECS");
        env::set_var("USE_CASE", "KYC");
        let settings = Environment::Development.verifier_settings().unwrap();
        assert!(matches!(
            settings.flow_settings(),
            Err(ConfigError::UnknownUseCase(_))
        ));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        env::set_var("ALLOWED_ISSUER", "did:iden3:single");
        env::set_var("NULLIFIER_SESSION_ID", "8472917364519283");
        env::set_var("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example");
        env::set_var("RATE_LIMIT_MAX_REQUESTS", "5");

        let settings = Environment::Development.verifier_settings().unwrap();
        assert_eq!(
            settings.allowed_issuers,
            Some(vec!["did:iden3:single".to_string()])
        );
        assert_eq!(settings.nullifier_session_id.to_string(), "8472917364519283");
        assert_eq!(settings.rate_limit.max_requests, 5);
        assert_eq!(
            settings.cors_allowed_origins,
            Some(vec![
                "https://a.example".to_string(),
                "https://b.example".to_string()
            ])
        );

        let flow = settings.flow_settings().unwrap();
        assert_eq!(flow.config.query.allowed_issuers, vec!["did:iden3:single"]);

        env::set_var("ALLOWED_ISSUERS", "did:iden3:a,did:iden3:b");
        let settings = Environment::Development.verifier_settings().unwrap();
        assert_eq!(settings.allowed_issuers.map(|i| i.len()), Some(2));
        clear_env();
    }
}
