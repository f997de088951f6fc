use crate::{clock::TimestampFormat, encoder::SignatureEncoding};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The closed set of parameterised authentication recipes.
///
/// Every supported exchange re-uses one of these by parameterisation; `custom` escapes to
/// a named per-exchange implementation for the few that fit no shared recipe.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningPattern {
    HmacSha256Query,
    HmacSha256Headers,
    HmacSha256IsoPassphrase,
    HmacSha256PassphraseSigned,
    HmacSha512Nonce,
    HmacSha512Gate,
    HmacSha384Payload,
    Deribit,
    Custom,
}

impl SigningPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            SigningPattern::HmacSha256Query => "hmac_sha256_query",
            SigningPattern::HmacSha256Headers => "hmac_sha256_headers",
            SigningPattern::HmacSha256IsoPassphrase => "hmac_sha256_iso_passphrase",
            SigningPattern::HmacSha256PassphraseSigned => "hmac_sha256_passphrase_signed",
            SigningPattern::HmacSha512Nonce => "hmac_sha512_nonce",
            SigningPattern::HmacSha512Gate => "hmac_sha512_gate",
            SigningPattern::HmacSha384Payload => "hmac_sha384_payload",
            SigningPattern::Deribit => "deribit",
            SigningPattern::Custom => "custom",
        }
    }

    /// Every supported pattern name.
    pub fn all() -> &'static [SigningPattern] {
        &[
            SigningPattern::HmacSha256Query,
            SigningPattern::HmacSha256Headers,
            SigningPattern::HmacSha256IsoPassphrase,
            SigningPattern::HmacSha256PassphraseSigned,
            SigningPattern::HmacSha512Nonce,
            SigningPattern::HmacSha512Gate,
            SigningPattern::HmacSha384Payload,
            SigningPattern::Deribit,
            SigningPattern::Custom,
        ]
    }

    /// Whether `name` is a supported pattern name.
    pub fn is_pattern(name: &str) -> bool {
        Self::all().iter().any(|pattern| pattern.as_str() == name)
    }

    /// Whether this pattern requires the credentials `password` field.
    pub fn requires_password(&self) -> bool {
        matches!(
            self,
            SigningPattern::HmacSha256IsoPassphrase | SigningPattern::HmacSha256PassphraseSigned
        )
    }
}

impl Display for SigningPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-exchange parameterisation of a [`SigningPattern`]: header names, encoding choices
/// and timing options.
///
/// Unrecognised keys in the on-disk form are ignored on deserialisation.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct SignConfig {
    pub pattern: SigningPattern,
    #[serde(default)]
    pub api_key_header: Option<String>,
    #[serde(default)]
    pub timestamp_header: Option<String>,
    #[serde(default)]
    pub signature_header: Option<String>,
    #[serde(default)]
    pub passphrase_header: Option<String>,
    #[serde(default)]
    pub recv_window_header: Option<String>,
    #[serde(default)]
    pub recv_window: Option<u64>,
    #[serde(default)]
    pub timestamp_format: TimestampFormat,
    #[serde(default)]
    pub signature_encoding: SignatureEncoding,
    #[serde(default)]
    pub sign_body: bool,
    #[serde(default)]
    pub nonce_in_body: bool,
    /// Named per-exchange module dispatched to by the `custom` pattern.
    #[serde(default)]
    pub custom_module: Option<String>,
}

impl SignConfig {
    pub fn new(pattern: SigningPattern) -> Self {
        Self {
            pattern,
            api_key_header: None,
            timestamp_header: None,
            signature_header: None,
            passphrase_header: None,
            recv_window_header: None,
            recv_window: None,
            timestamp_format: TimestampFormat::default(),
            signature_encoding: SignatureEncoding::default(),
            sign_body: false,
            nonce_in_body: false,
            custom_module: None,
        }
    }

    pub(crate) fn api_key_header(&self, default: &'static str) -> String {
        self.api_key_header.clone().unwrap_or_else(|| default.into())
    }

    pub(crate) fn timestamp_header(&self, default: &'static str) -> String {
        self.timestamp_header
            .clone()
            .unwrap_or_else(|| default.into())
    }

    pub(crate) fn signature_header(&self, default: &'static str) -> String {
        self.signature_header
            .clone()
            .unwrap_or_else(|| default.into())
    }

    pub(crate) fn passphrase_header(&self, default: &'static str) -> String {
        self.passphrase_header
            .clone()
            .unwrap_or_else(|| default.into())
    }

    pub(crate) fn recv_window_header(&self, default: &'static str) -> String {
        self.recv_window_header
            .clone()
            .unwrap_or_else(|| default.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_names() {
        assert!(SigningPattern::is_pattern("hmac_sha256_query"));
        assert!(SigningPattern::is_pattern("deribit"));
        assert!(!SigningPattern::is_pattern("rsa_sha256"));
        assert_eq!(SigningPattern::all().len(), 9);
    }

    #[test]
    fn test_config_ignores_unknown_keys() {
        let config = serde_json::from_str::<SignConfig>(
            r#"{
                "pattern": "hmac_sha256_headers",
                "recv_window": 5000,
                "some_future_knob": true
            }"#,
        )
        .unwrap();
        assert_eq!(config.pattern, SigningPattern::HmacSha256Headers);
        assert_eq!(config.recv_window, Some(5000));
    }
}
