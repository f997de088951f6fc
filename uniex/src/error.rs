use serde_json::Value;
use smol_str::SmolStr;
use thiserror::Error;
use uniex_signing::SigningError;
use uniex_spec::{ErrorVariant, ResponseErrorConfig, Spec};
use uniex_symbol::SymbolError;

/// Unified exchange error: one closed variant set across every exchange, with enough
/// context for callers to decide whether and how to retry.
///
/// Constructed at the point of failure and flowed outward unchanged. Credentials are
/// never placed in `raw` or `hints`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("[{kind}] {message}")]
pub struct ExchangeError {
    pub kind: ErrorVariant,
    /// Exchange-reported error code, where one was present.
    pub code: Option<SmolStr>,
    pub message: String,
    pub exchange: Option<SmolStr>,
    /// Milliseconds to wait before retrying, for `rate_limited`.
    pub retry_after: Option<u64>,
    /// Raw error payload as returned by the exchange.
    pub raw: Option<Value>,
    pub hints: Vec<&'static str>,
    pub recoverable: bool,
}

impl ExchangeError {
    pub fn new<S>(kind: ErrorVariant, message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            kind,
            code: None,
            message: message.into(),
            exchange: None,
            retry_after: None,
            raw: None,
            hints: hints(kind),
            recoverable: is_recoverable(kind),
        }
    }

    pub fn not_supported<S>(method: S) -> Self
    where
        S: std::fmt::Display,
    {
        Self::new(
            ErrorVariant::NotSupported,
            format!("{method} is not supported by this exchange"),
        )
    }

    pub fn invalid_parameters<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self::new(ErrorVariant::InvalidParameters, message)
    }

    pub fn invalid_credentials<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self::new(ErrorVariant::InvalidCredentials, message)
    }

    pub fn exchange_error<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self::new(ErrorVariant::ExchangeError, message)
    }

    pub fn order_not_found<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self::new(ErrorVariant::OrderNotFound, message)
    }

    pub fn network_error<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self::new(ErrorVariant::NetworkError, message)
    }

    pub fn circuit_open(exchange: &str) -> Self {
        Self::new(
            ErrorVariant::CircuitOpen,
            format!("circuit breaker open for {exchange}"),
        )
        .with_exchange(exchange)
    }

    pub fn with_exchange<S>(mut self, exchange: S) -> Self
    where
        S: Into<SmolStr>,
    {
        self.exchange = Some(exchange.into());
        self
    }

    pub fn with_code<S>(mut self, code: S) -> Self
    where
        S: Into<SmolStr>,
    {
        self.code = Some(code.into());
        self
    }

    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = Some(raw);
        self
    }

    pub fn with_retry_after(mut self, retry_after_ms: u64) -> Self {
        self.retry_after = Some(retry_after_ms);
        self
    }
}

/// Whether an error of this kind is worth retrying. Fixed per variant.
pub fn is_recoverable(kind: ErrorVariant) -> bool {
    matches!(
        kind,
        ErrorVariant::RateLimited | ErrorVariant::NetworkError | ErrorVariant::CircuitOpen
    )
}

/// Deterministic operator hints per variant.
fn hints(kind: ErrorVariant) -> Vec<&'static str> {
    match kind {
        ErrorVariant::RateLimited => vec![
            "reduce request frequency",
            "honour retry_after before the next attempt",
        ],
        ErrorVariant::InsufficientBalance => {
            vec!["check the account balance covers amount plus fees"]
        }
        ErrorVariant::InvalidCredentials => vec![
            "verify api_key and secret",
            "check whether this exchange also requires a password",
        ],
        ErrorVariant::InvalidParameters => vec!["check required arguments and their formats"],
        ErrorVariant::OrderNotFound => vec!["the order id may belong to another symbol or account"],
        ErrorVariant::InvalidOrder => vec!["check order type, price and amount constraints"],
        ErrorVariant::MarketClosed => vec!["the market is suspended or delisted"],
        ErrorVariant::NetworkError => vec!["transient connectivity problem; safe to retry"],
        ErrorVariant::AccessRestricted => {
            vec!["the API key may lack permissions or the region is restricted"]
        }
        ErrorVariant::NotSupported => vec!["consult the exchange capability flags"],
        ErrorVariant::CircuitOpen => vec!["wait for the breaker reset window to elapse"],
        ErrorVariant::ExchangeError => vec!["inspect the raw payload for exchange-side detail"],
    }
}

impl From<SigningError> for ExchangeError {
    fn from(error: SigningError) -> Self {
        match &error {
            SigningError::InvalidCredentials(_) => {
                Self::new(ErrorVariant::InvalidCredentials, error.to_string())
            }
            SigningError::InvalidParameters(_) => {
                Self::new(ErrorVariant::InvalidParameters, error.to_string())
            }
        }
    }
}

impl From<SymbolError> for ExchangeError {
    fn from(error: SymbolError) -> Self {
        Self::new(ErrorVariant::InvalidParameters, error.to_string())
    }
}

/// Map a plain HTTP status to an error variant, for responses whose body carries no
/// recognisable error shape.
pub fn classify_status(status: u16) -> ErrorVariant {
    match status {
        429 => ErrorVariant::RateLimited,
        401 => ErrorVariant::InvalidCredentials,
        403 | 451 => ErrorVariant::AccessRestricted,
        408 => ErrorVariant::NetworkError,
        500..=599 => ErrorVariant::NetworkError,
        _ => ErrorVariant::ExchangeError,
    }
}

/// Detect a body-level error in an HTTP 200 response using the spec's `response_error`
/// config, and classify it through the spec's error code maps.
///
/// Returns `None` when the body does not match the configured error shape.
pub fn classify_body(spec: &Spec, body: &Value) -> Option<ExchangeError> {
    let config = spec.response_error.as_ref()?;

    let (is_error, code_field, message_field) = match config {
        ResponseErrorConfig::SuccessCode {
            field,
            success_values,
            code_field,
            message_field,
        } => {
            let value = body.get(field)?;
            (
                !success_values.contains(value),
                code_field.as_deref().or(Some(field.as_str())),
                message_field.as_deref(),
            )
        }
        ResponseErrorConfig::ErrorPresent {
            field,
            code_field,
            message_field,
        } => (
            body.get(field).is_some_and(|value| !value.is_null()),
            code_field.as_deref(),
            message_field.as_deref(),
        ),
        ResponseErrorConfig::ErrorArray {
            field,
            code_field: _,
            message_field: _,
        } => {
            // Kraken-style: the first element of the error array is both code and
            // message, eg/ "EAPI:Invalid key".
            let first = body
                .get(field)
                .and_then(Value::as_array)
                .and_then(|errors| errors.first());
            let Some(first) = first else {
                return None;
            };
            let code = value_to_code(first);
            let message = first
                .as_str()
                .unwrap_or("exchange reported an error")
                .to_string();
            return Some(
                classify_code(spec, Some(code.as_str()), message).with_raw(body.clone()),
            );
        }
        ResponseErrorConfig::ErrorFieldPresent {
            field,
            code_field,
            message_field,
        } => (
            body.get(field).is_some(),
            code_field.as_deref(),
            message_field.as_deref(),
        ),
    };

    if !is_error {
        return None;
    }

    let code = code_field
        .and_then(|field| body.get(field))
        .map(value_to_code);
    let message = message_field
        .and_then(|field| body.get(field))
        .and_then(Value::as_str)
        .unwrap_or("exchange reported an error")
        .to_string();

    Some(classify_code(spec, code.as_deref(), message).with_raw(body.clone()))
}

/// Map an exchange-reported code to a unified error through `error_code_details` then
/// `error_codes`, falling back to `exchange_error`.
pub fn classify_code(spec: &Spec, code: Option<&str>, message: String) -> ExchangeError {
    let kind = code
        .and_then(|code| {
            spec.error_code_details
                .get(code)
                .map(|detail| detail.variant)
                .or_else(|| spec.error_codes.get(code).copied())
        })
        .unwrap_or(ErrorVariant::ExchangeError);

    let mut error = ExchangeError::new(kind, message).with_exchange(spec.id.clone());
    if let Some(code) = code {
        error = error.with_code(code);
    }
    error
}

fn value_to_code(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_with_response_error() -> Spec {
        uniex_spec::from_str(
            r#"{
                "id": "testex",
                "name": "TestEx",
                "classification": "supported",
                "urls": {"api": "https://api.testex.com"},
                "signing": {"pattern": "hmac_sha256_query"},
                "error_codes": {"-1021": "invalid_parameters", "-2010": "insufficient_balance"},
                "response_error": {
                    "type": "success_code",
                    "field": "code",
                    "success_values": [0],
                    "message_field": "msg"
                },
                "spec_format_version": 1
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_recoverability_is_fixed_per_variant() {
        assert!(is_recoverable(ErrorVariant::RateLimited));
        assert!(is_recoverable(ErrorVariant::NetworkError));
        assert!(!is_recoverable(ErrorVariant::InvalidCredentials));
        assert!(!is_recoverable(ErrorVariant::OrderNotFound));
    }

    #[test]
    fn test_classify_body_success_passes_through() {
        let spec = spec_with_response_error();
        let body = serde_json::json!({"code": 0, "data": []});
        assert_eq!(classify_body(&spec, &body), None);
    }

    #[test]
    fn test_classify_body_maps_known_code() {
        let spec = spec_with_response_error();
        let body = serde_json::json!({"code": -1021, "msg": "Timestamp outside recv window"});
        let error = classify_body(&spec, &body).unwrap();
        assert_eq!(error.kind, ErrorVariant::InvalidParameters);
        assert_eq!(error.code.as_deref(), Some("-1021"));
        assert_eq!(error.message, "Timestamp outside recv window");
        assert!(error.raw.is_some());
    }

    #[test]
    fn test_classify_body_unknown_code_falls_back() {
        let spec = spec_with_response_error();
        let body = serde_json::json!({"code": -9999, "msg": "mystery"});
        let error = classify_body(&spec, &body).unwrap();
        assert_eq!(error.kind, ErrorVariant::ExchangeError);
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(429), ErrorVariant::RateLimited);
        assert_eq!(classify_status(401), ErrorVariant::InvalidCredentials);
        assert_eq!(classify_status(503), ErrorVariant::NetworkError);
        assert_eq!(classify_status(404), ErrorVariant::ExchangeError);
    }

    #[test]
    fn test_signing_error_conversion() {
        let error: ExchangeError =
            SigningError::InvalidCredentials("secret is required".into()).into();
        assert_eq!(error.kind, ErrorVariant::InvalidCredentials);
        assert!(!error.recoverable);
    }
}
