mod environment;
mod error;
mod extractors;

pub use environment::{ConfigError, Environment, VerifierSettings};
pub use error::{ApiErrorResponse, AppError};
pub use extractors::ProofToken;
