use crate::error::SigningError;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};

/// Caller-owned API credentials, passed by value per call and never persisted.
///
/// `password` is the API passphrase some exchanges require alongside the key pair.
#[derive(Clone, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct Credentials {
    pub api_key: String,
    pub secret: String,
    pub password: Option<String>,
    #[serde(default)]
    pub sandbox: bool,
}

impl Credentials {
    pub fn new<S>(api_key: S, secret: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            api_key: api_key.into(),
            secret: secret.into(),
            password: None,
            sandbox: false,
        }
    }

    pub fn with_password<S>(mut self, password: S) -> Self
    where
        S: Into<String>,
    {
        self.password = Some(password.into());
        self
    }

    /// Check the mandatory key pair is present.
    pub fn validate(&self) -> Result<(), SigningError> {
        if self.api_key.is_empty() {
            return Err(SigningError::InvalidCredentials("api_key is required".into()));
        }
        if self.secret.is_empty() {
            return Err(SigningError::InvalidCredentials("secret is required".into()));
        }
        Ok(())
    }

    /// The passphrase, for patterns that require one.
    pub fn require_password(&self) -> Result<&str, SigningError> {
        self.password
            .as_deref()
            .filter(|password| !password.is_empty())
            .ok_or_else(|| {
                SigningError::InvalidCredentials(
                    "password is required by this signing pattern".into(),
                )
            })
    }
}

// Secrets stay out of logs and error output.
impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret", &"[redacted]")
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .field("sandbox", &self.sandbox)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_key_pair() {
        assert!(Credentials::new("key", "secret").validate().is_ok());
        assert!(Credentials::new("", "secret").validate().is_err());
        assert!(Credentials::new("key", "").validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secret_material() {
        let credentials = Credentials::new("key", "super-secret").with_password("hunter2");
        let output = format!("{credentials:?}");
        assert!(!output.contains("super-secret"));
        assert!(!output.contains("hunter2"));
    }
}
