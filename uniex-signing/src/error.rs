use thiserror::Error;

/// All request authentication errors generated in `uniex-signing`.
///
/// Signing never panics: malformed secrets, missing credential fields and unsupported
/// configuration all surface as typed errors.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum SigningError {
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("invalid signing parameters: {0}")]
    InvalidParameters(String),
}

impl From<serde_urlencoded::ser::Error> for SigningError {
    fn from(error: serde_urlencoded::ser::Error) -> Self {
        Self::InvalidParameters(format!("query string serialisation: {error}"))
    }
}
