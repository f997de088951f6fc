use crate::{
    clock::{Clock, TimestampFormat},
    config::{SignConfig, SigningPattern},
    credentials::Credentials,
    encoder::SignatureEncoding,
    error::SigningError,
    request::{Request, SignedRequest},
};
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha384, Sha512};

/// Escape hatch for the few exchanges whose authentication fits no shared recipe.
///
/// Implementations are registered by name and dispatched to by the `custom` pattern via
/// `SignConfig::custom_module`.
pub trait CustomSign: Send + Sync {
    fn name(&self) -> &str;

    fn sign(
        &self,
        request: &Request,
        credentials: &Credentials,
        config: &SignConfig,
        clock: &dyn Clock,
    ) -> Result<SignedRequest, SigningError>;
}

/// Sign a request with the pattern and parameterisation carried by `config`.
///
/// Purely a function of its inputs: fixing the clock fixes every produced header and
/// body byte.
pub fn sign(
    request: &Request,
    credentials: &Credentials,
    config: &SignConfig,
    clock: &dyn Clock,
) -> Result<SignedRequest, SigningError> {
    sign_with(request, credentials, config, clock, &[])
}

/// [`sign`], with per-exchange [`CustomSign`] modules available for the `custom` pattern.
pub fn sign_with(
    request: &Request,
    credentials: &Credentials,
    config: &SignConfig,
    clock: &dyn Clock,
    custom: &[&dyn CustomSign],
) -> Result<SignedRequest, SigningError> {
    credentials.validate()?;
    if config.pattern.requires_password() {
        credentials.require_password()?;
    }

    match config.pattern {
        SigningPattern::HmacSha256Query => hmac_sha256_query(request, credentials, config, clock),
        SigningPattern::HmacSha256Headers => {
            hmac_sha256_headers(request, credentials, config, clock)
        }
        SigningPattern::HmacSha256IsoPassphrase => {
            hmac_sha256_iso_passphrase(request, credentials, config, clock, false)
        }
        SigningPattern::HmacSha256PassphraseSigned => {
            hmac_sha256_iso_passphrase(request, credentials, config, clock, true)
        }
        SigningPattern::HmacSha512Nonce => hmac_sha512_nonce(request, credentials, config, clock),
        SigningPattern::HmacSha512Gate => hmac_sha512_gate(request, credentials, config, clock),
        SigningPattern::HmacSha384Payload => {
            hmac_sha384_payload(request, credentials, config, clock)
        }
        SigningPattern::Deribit => deribit(request, credentials, config, clock),
        SigningPattern::Custom => {
            let name = config.custom_module.as_deref().ok_or_else(|| {
                SigningError::InvalidParameters(
                    "custom signing pattern requires custom_module".into(),
                )
            })?;
            let module = custom
                .iter()
                .find(|module| module.name() == name)
                .ok_or_else(|| {
                    SigningError::InvalidParameters(format!(
                        "custom signing module not registered: {name}"
                    ))
                })?;
            module.sign(request, credentials, config, clock)
        }
    }
}

fn mac_sha256(secret: &[u8], message: &[u8]) -> Result<Vec<u8>, SigningError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret)
        .map_err(|_| SigningError::InvalidCredentials("secret rejected by HMAC".into()))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn mac_sha384(secret: &[u8], message: &[u8]) -> Result<Vec<u8>, SigningError> {
    let mut mac = Hmac::<Sha384>::new_from_slice(secret)
        .map_err(|_| SigningError::InvalidCredentials("secret rejected by HMAC".into()))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn mac_sha512(secret: &[u8], message: &[u8]) -> Result<Vec<u8>, SigningError> {
    let mut mac = Hmac::<Sha512>::new_from_slice(secret)
        .map_err(|_| SigningError::InvalidCredentials("secret rejected by HMAC".into()))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Sorted query string signing, eg/ Binance.
///
/// A caller-provided `timestamp` param wins over the clock so replayed requests can be
/// reproduced byte for byte.
fn hmac_sha256_query(
    request: &Request,
    credentials: &Credentials,
    config: &SignConfig,
    clock: &dyn Clock,
) -> Result<SignedRequest, SigningError> {
    let mut params = request.params.clone();
    params
        .entry("timestamp".into())
        .or_insert_with(|| config.timestamp_format.render(clock));
    if let Some(recv_window) = config.recv_window {
        params
            .entry("recvWindow".into())
            .or_insert_with(|| recv_window.to_string());
    }

    let query = serde_urlencoded::to_string(&params)?;
    let mut message = query.clone();
    if config.sign_body {
        if let Some(body) = &request.body {
            message.push_str(body);
        }
    }

    let signature = config
        .signature_encoding
        .encode(mac_sha256(credentials.secret.as_bytes(), message.as_bytes())?);

    Ok(SignedRequest {
        method: request.method,
        url: format!("{}?{query}&signature={signature}", request.path),
        headers: vec![(
            config.api_key_header("X-MBX-APIKEY"),
            credentials.api_key.clone(),
        )],
        body: request.body.clone(),
    })
}

/// Header-borne signature over `timestamp + api_key + recv_window + body`, eg/ Bybit.
fn hmac_sha256_headers(
    request: &Request,
    credentials: &Credentials,
    config: &SignConfig,
    clock: &dyn Clock,
) -> Result<SignedRequest, SigningError> {
    let timestamp = TimestampFormat::Ms.render(clock);
    let recv_window = config.recv_window.unwrap_or(5000).to_string();
    let body = request.body.as_deref().unwrap_or("");

    let message = format!("{timestamp}{}{recv_window}{body}", credentials.api_key);
    let signature = config
        .signature_encoding
        .encode(mac_sha256(credentials.secret.as_bytes(), message.as_bytes())?);

    Ok(SignedRequest {
        method: request.method,
        url: request.path_with_query()?,
        headers: vec![
            (
                config.api_key_header("X-BAPI-API-KEY"),
                credentials.api_key.clone(),
            ),
            (config.timestamp_header("X-BAPI-TIMESTAMP"), timestamp),
            (config.signature_header("X-BAPI-SIGN"), signature),
            (config.recv_window_header("X-BAPI-RECV-WINDOW"), recv_window),
        ],
        body: request.body.clone(),
    })
}

/// ISO-8601 timestamp prehash with a passphrase header, eg/ OKX and KuCoin.
///
/// With `signed_passphrase` the passphrase header value is itself
/// `HMAC-SHA256(secret, passphrase)`, per KuCoin API v2.
fn hmac_sha256_iso_passphrase(
    request: &Request,
    credentials: &Credentials,
    config: &SignConfig,
    clock: &dyn Clock,
    signed_passphrase: bool,
) -> Result<SignedRequest, SigningError> {
    let timestamp = TimestampFormat::Iso8601.render(clock);
    let path_with_query = request.path_with_query()?;
    let body = request.body.as_deref().unwrap_or("");

    let message = format!(
        "{timestamp}{}{path_with_query}{body}",
        request.method.as_str()
    );
    let signature = SignatureEncoding::Base64.encode(mac_sha256(
        credentials.secret.as_bytes(),
        message.as_bytes(),
    )?);

    let password = credentials.require_password()?;
    let passphrase = if signed_passphrase {
        SignatureEncoding::Base64.encode(mac_sha256(
            credentials.secret.as_bytes(),
            password.as_bytes(),
        )?)
    } else {
        password.to_string()
    };

    Ok(SignedRequest {
        method: request.method,
        url: path_with_query,
        headers: vec![
            (
                config.api_key_header("ACCESS-KEY"),
                credentials.api_key.clone(),
            ),
            (config.signature_header("ACCESS-SIGN"), signature),
            (config.timestamp_header("ACCESS-TIMESTAMP"), timestamp),
            (config.passphrase_header("ACCESS-PASSPHRASE"), passphrase),
        ],
        body: request.body.clone(),
    })
}

/// Nonce-in-body signing with a base64-decoded secret, eg/ Kraken.
fn hmac_sha512_nonce(
    request: &Request,
    credentials: &Credentials,
    config: &SignConfig,
    clock: &dyn Clock,
) -> Result<SignedRequest, SigningError> {
    let nonce = TimestampFormat::Ms.render(clock);
    let mut params = request.params.clone();
    params.insert("nonce".into(), nonce.clone());
    let encoded_params = serde_urlencoded::to_string(&params)?;

    let secret = base64::engine::general_purpose::STANDARD
        .decode(credentials.secret.as_bytes())
        .map_err(|_| SigningError::InvalidCredentials("secret is not valid base64".into()))?;

    let inner = Sha256::digest(format!("{nonce}{encoded_params}").as_bytes());
    let mut message = request.path.as_bytes().to_vec();
    message.extend_from_slice(&inner);

    let signature = SignatureEncoding::Base64.encode(mac_sha512(&secret, &message)?);

    // `nonce_in_body: false` moves the nonce-bearing params into the query for the
    // handful of GET-style private endpoints using this recipe.
    let (url, body) = if config.nonce_in_body || !request.method.is_idempotent() {
        (request.path.clone(), Some(encoded_params))
    } else {
        (format!("{}?{encoded_params}", request.path), None)
    };

    Ok(SignedRequest {
        method: request.method,
        url,
        headers: vec![
            (config.api_key_header("API-Key"), credentials.api_key.clone()),
            (config.signature_header("API-Sign"), signature),
        ],
        body,
    })
}

/// Newline-separated canonical request signing, eg/ Gate.
fn hmac_sha512_gate(
    request: &Request,
    credentials: &Credentials,
    config: &SignConfig,
    clock: &dyn Clock,
) -> Result<SignedRequest, SigningError> {
    let timestamp = TimestampFormat::Seconds.render(clock);
    let query = request.query_string()?;
    let body = request.body.as_deref().unwrap_or("");
    let body_hash = hex::encode(Sha512::digest(body.as_bytes()));

    let message = format!(
        "{}\n{}\n{query}\n{body_hash}\n{timestamp}",
        request.method.as_str(),
        request.path
    );
    let signature = SignatureEncoding::Hex.encode(mac_sha512(
        credentials.secret.as_bytes(),
        message.as_bytes(),
    )?);

    Ok(SignedRequest {
        method: request.method,
        url: request.path_with_query()?,
        headers: vec![
            (config.api_key_header("KEY"), credentials.api_key.clone()),
            (config.timestamp_header("Timestamp"), timestamp),
            (config.signature_header("SIGN"), signature),
        ],
        body: request.body.clone(),
    })
}

/// `/api/` path payload signing, eg/ Bitfinex.
fn hmac_sha384_payload(
    request: &Request,
    credentials: &Credentials,
    config: &SignConfig,
    clock: &dyn Clock,
) -> Result<SignedRequest, SigningError> {
    let nonce = TimestampFormat::Ms.render(clock);
    let body = request.body.as_deref().unwrap_or("");
    let path = request.path.trim_start_matches('/');

    let message = format!("/api/{path}{nonce}{body}");
    let signature = SignatureEncoding::Hex.encode(mac_sha384(
        credentials.secret.as_bytes(),
        message.as_bytes(),
    )?);

    Ok(SignedRequest {
        method: request.method,
        url: request.path_with_query()?,
        headers: vec![
            (
                config.api_key_header("X-BFX-APIKEY"),
                credentials.api_key.clone(),
            ),
            (config.timestamp_header("X-BFX-NONCE"), nonce),
            (config.signature_header("X-BFX-SIGNATURE"), signature),
        ],
        body: request.body.clone(),
    })
}

/// JSON-RPC `client_signature` grant: signed string is `timestamp\nnonce\ndata`, with the
/// result carried in auth params.
fn deribit(
    request: &Request,
    credentials: &Credentials,
    _config: &SignConfig,
    clock: &dyn Clock,
) -> Result<SignedRequest, SigningError> {
    let timestamp = TimestampFormat::Ms.render(clock);
    let nonce = timestamp.clone();
    let data = request.body.as_deref().unwrap_or("");

    let message = format!("{timestamp}\n{nonce}\n{data}");
    let signature = SignatureEncoding::Hex.encode(mac_sha256(
        credentials.secret.as_bytes(),
        message.as_bytes(),
    )?);

    let mut params = request.params.clone();
    params.insert("client_id".into(), credentials.api_key.clone());
    params.insert("timestamp".into(), timestamp);
    params.insert("nonce".into(), nonce);
    params.insert("signature".into(), signature);
    if !data.is_empty() {
        params.insert("data".into(), data.to_string());
    }

    Ok(SignedRequest {
        method: request.method,
        url: format!("{}?{}", request.path, serde_urlencoded::to_string(&params)?),
        headers: Vec::new(),
        body: request.body.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::FixedClock, request::Method};

    const FIXED_MILLIS: i64 = 1_700_000_000_000;

    fn clock() -> FixedClock {
        FixedClock::from_millis(FIXED_MILLIS)
    }

    fn credentials() -> Credentials {
        Credentials::new("test-api-key", "super-secret-material").with_password("passphrase")
    }

    // Valid standard base64, as the Kraken-style pattern requires.
    fn base64_credentials() -> Credentials {
        Credentials::new("test-api-key", "c3VwZXItc2VjcmV0LW1hdGVyaWFs")
    }

    fn every_config() -> Vec<SignConfig> {
        vec![
            SignConfig::new(SigningPattern::HmacSha256Query),
            SignConfig::new(SigningPattern::HmacSha256Headers),
            SignConfig::new(SigningPattern::HmacSha256IsoPassphrase),
            SignConfig::new(SigningPattern::HmacSha256PassphraseSigned),
            SignConfig::new(SigningPattern::HmacSha512Gate),
            SignConfig::new(SigningPattern::HmacSha384Payload),
            SignConfig::new(SigningPattern::Deribit),
        ]
    }

    fn request() -> Request {
        Request::new(Method::Post, "/api/v3/order")
            .with_param("symbol", "BTCUSDT")
            .with_body(r#"{"side":"buy"}"#)
    }

    #[test]
    fn test_signing_is_deterministic_under_a_fixed_clock() {
        for config in every_config() {
            let first = sign(&request(), &credentials(), &config, &clock()).unwrap();
            let second = sign(&request(), &credentials(), &config, &clock()).unwrap();
            assert_eq!(first, second, "pattern {}", config.pattern);
        }

        let kraken = SignConfig::new(SigningPattern::HmacSha512Nonce);
        let first = sign(&request(), &base64_credentials(), &kraken, &clock()).unwrap();
        let second = sign(&request(), &base64_credentials(), &kraken, &clock()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_secret_never_appears_in_output() {
        for config in every_config() {
            let signed = sign(&request(), &credentials(), &config, &clock()).unwrap();
            for (name, value) in &signed.headers {
                assert!(
                    !value.contains("super-secret-material"),
                    "pattern {} leaked the secret into header {name}",
                    config.pattern
                );
            }
            assert!(!signed.url.contains("super-secret-material"));
        }
    }

    #[test]
    fn test_hmac_sha256_query_literal_signature() {
        let request = Request::new(Method::Get, "/api/v3/account")
            .with_param("symbol", "BTCUSDT")
            .with_param("timestamp", "1700000000000");
        let credentials = Credentials::new("K", "S");
        let config = SignConfig::new(SigningPattern::HmacSha256Query);

        let signed = sign(&request, &credentials, &config, &clock()).unwrap();

        let expected = hex::encode(
            mac_sha256(b"S", b"symbol=BTCUSDT&timestamp=1700000000000").unwrap(),
        );
        assert_eq!(
            signed.url,
            format!("/api/v3/account?symbol=BTCUSDT&timestamp=1700000000000&signature={expected}")
        );
        assert_eq!(
            signed.headers,
            vec![("X-MBX-APIKEY".to_string(), "K".to_string())]
        );
    }

    #[test]
    fn test_hmac_sha256_headers_shape() {
        let config = SignConfig::new(SigningPattern::HmacSha256Headers);
        let signed = sign(&request(), &credentials(), &config, &clock()).unwrap();

        let names = signed
            .headers
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            ["X-BAPI-API-KEY", "X-BAPI-TIMESTAMP", "X-BAPI-SIGN", "X-BAPI-RECV-WINDOW"]
        );
        assert_eq!(signed.body.as_deref(), Some(r#"{"side":"buy"}"#));
    }

    #[test]
    fn test_iso_passphrase_timestamp_is_iso8601() {
        let config = SignConfig::new(SigningPattern::HmacSha256IsoPassphrase);
        let signed = sign(&request(), &credentials(), &config, &clock()).unwrap();

        let timestamp = signed
            .headers
            .iter()
            .find(|(name, _)| name == "ACCESS-TIMESTAMP")
            .map(|(_, value)| value.clone())
            .unwrap();
        assert_eq!(timestamp, "2023-11-14T22:13:20.000Z");
    }

    #[test]
    fn test_passphrase_signed_differs_from_plain() {
        let plain = sign(
            &request(),
            &credentials(),
            &SignConfig::new(SigningPattern::HmacSha256IsoPassphrase),
            &clock(),
        )
        .unwrap();
        let hashed = sign(
            &request(),
            &credentials(),
            &SignConfig::new(SigningPattern::HmacSha256PassphraseSigned),
            &clock(),
        )
        .unwrap();

        let passphrase = |signed: &SignedRequest| {
            signed
                .headers
                .iter()
                .find(|(name, _)| name == "ACCESS-PASSPHRASE")
                .map(|(_, value)| value.clone())
                .unwrap()
        };
        assert_eq!(passphrase(&plain), "passphrase");
        assert_ne!(passphrase(&hashed), "passphrase");
    }

    #[test]
    fn test_missing_password_is_invalid_credentials() {
        let config = SignConfig::new(SigningPattern::HmacSha256IsoPassphrase);
        let missing = Credentials::new("key", "secret");
        assert!(matches!(
            sign(&request(), &missing, &config, &clock()),
            Err(SigningError::InvalidCredentials(_))
        ));
    }

    #[test]
    fn test_malformed_base64_secret_is_invalid_credentials() {
        let config = SignConfig::new(SigningPattern::HmacSha512Nonce);
        assert!(matches!(
            sign(&request(), &credentials(), &config, &clock()),
            Err(SigningError::InvalidCredentials(_))
        ));
    }

    #[test]
    fn test_kraken_nonce_lands_in_body_for_post() {
        let config = SignConfig::new(SigningPattern::HmacSha512Nonce);
        let signed = sign(&request(), &base64_credentials(), &config, &clock()).unwrap();
        assert!(signed.body.as_deref().unwrap().contains("nonce=1700000000000"));
        assert_eq!(signed.url, "/api/v3/order");
    }

    #[test]
    fn test_gate_signs_newline_separated_message() {
        let config = SignConfig::new(SigningPattern::HmacSha512Gate);
        let signed = sign(&request(), &credentials(), &config, &clock()).unwrap();

        let expected_message = format!(
            "POST\n/api/v3/order\nsymbol=BTCUSDT\n{}\n1700000000",
            hex::encode(Sha512::digest(br#"{"side":"buy"}"#))
        );
        let expected = hex::encode(
            mac_sha512(b"super-secret-material", expected_message.as_bytes()).unwrap(),
        );
        assert!(signed
            .headers
            .iter()
            .any(|(name, value)| name == "SIGN" && *value == expected));
    }

    #[test]
    fn test_deribit_auth_params() {
        let config = SignConfig::new(SigningPattern::Deribit);
        let signed = sign(&request(), &credentials(), &config, &clock()).unwrap();
        assert!(signed.url.contains("client_id=test-api-key"));
        assert!(signed.url.contains("timestamp=1700000000000"));
        assert!(signed.url.contains("signature="));
        assert!(signed.headers.is_empty());
    }

    #[test]
    fn test_custom_pattern_requires_registration() {
        let mut config = SignConfig::new(SigningPattern::Custom);
        assert!(matches!(
            sign(&request(), &credentials(), &config, &clock()),
            Err(SigningError::InvalidParameters(_))
        ));

        config.custom_module = Some("bespoke".into());
        assert!(matches!(
            sign(&request(), &credentials(), &config, &clock()),
            Err(SigningError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_custom_pattern_dispatches_by_name() {
        #[derive(Debug)]
        struct Bespoke;

        impl CustomSign for Bespoke {
            fn name(&self) -> &str {
                "bespoke"
            }

            fn sign(
                &self,
                request: &Request,
                credentials: &Credentials,
                _config: &SignConfig,
                _clock: &dyn Clock,
            ) -> Result<SignedRequest, SigningError> {
                Ok(SignedRequest {
                    method: request.method,
                    url: request.path.clone(),
                    headers: vec![("X-CUSTOM-KEY".into(), credentials.api_key.clone())],
                    body: None,
                })
            }
        }

        let mut config = SignConfig::new(SigningPattern::Custom);
        config.custom_module = Some("bespoke".into());

        let modules: &[&dyn CustomSign] = &[&Bespoke];
        let signed = sign_with(&request(), &credentials(), &config, &clock(), modules).unwrap();
        assert_eq!(signed.headers[0].0, "X-CUSTOM-KEY");
    }
}
