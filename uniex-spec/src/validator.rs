use crate::{
    error::ValidateError,
    spec::{Capability, Spec},
};
use std::collections::BTreeSet;
use tracing::warn;
use uniex_signing::SigningPattern;

/// Structural validation, run at build time against every spec consumed by code
/// generation. Fatal problems surface as [`ValidateError`]; semantic oddities are logged
/// as warnings and never fail the build.
pub fn validate(spec: &Spec) -> Result<(), ValidateError> {
    if spec.id.is_empty() {
        return Err(ValidateError::EmptyField {
            spec: spec.id.clone(),
            field: "id",
        });
    }
    if spec.name.is_empty() {
        return Err(ValidateError::EmptyField {
            spec: spec.id.clone(),
            field: "name",
        });
    }
    if spec.urls.api.is_empty() {
        return Err(ValidateError::EmptyField {
            spec: spec.id.clone(),
            field: "urls.api",
        });
    }
    if spec.spec_format_version == 0 {
        return Err(ValidateError::InvalidFormatVersion {
            spec: spec.id.clone(),
        });
    }
    if spec.signing.pattern == SigningPattern::Custom && spec.signing.custom_module.is_none() {
        return Err(ValidateError::MissingCustomModule {
            spec: spec.id.clone(),
        });
    }

    let mut seen = BTreeSet::new();
    for endpoint in &spec.endpoints {
        if !is_identifier(&endpoint.name) {
            return Err(ValidateError::InvalidEndpointName {
                spec: spec.id.clone(),
                name: endpoint.name.clone(),
            });
        }
        if endpoint.path.is_empty() {
            return Err(ValidateError::EmptyEndpointPath {
                spec: spec.id.clone(),
                name: endpoint.name.clone(),
            });
        }
        if !seen.insert(endpoint.name.clone()) {
            return Err(ValidateError::DuplicateEndpoint {
                spec: spec.id.clone(),
                name: endpoint.name.clone(),
            });
        }
    }

    warn_semantics(spec);

    Ok(())
}

/// Non-fatal semantic checks, logged during extraction and build.
fn warn_semantics(spec: &Spec) {
    for (method, capability) in &spec.has {
        if matches!(capability, Capability::Flag(true)) && spec.endpoint(method).is_none() {
            warn!(
                spec = %spec.id,
                method = %method,
                "capability flag has no backing endpoint"
            );
        }
    }

    for endpoint in &spec.endpoints {
        if let Some(market_type) = endpoint.market_type {
            if !spec.features.contains_key(market_type.as_str()) {
                warn!(
                    spec = %spec.id,
                    endpoint = %endpoint.name,
                    market_type = %market_type,
                    "endpoint market_type not listed in features"
                );
            }
        }
    }

    if let Some(fees) = &spec.fees {
        let trading = fees.get("trading");
        let has_maker = trading.and_then(|trading| trading.get("maker")).is_some();
        let has_taker = trading.and_then(|trading| trading.get("taker")).is_some();
        if !has_maker && !has_taker {
            warn!(spec = %spec.id, "fees map present but missing trading.maker and trading.taker");
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader;

    fn base_spec() -> Spec {
        loader::from_str(
            r#"{
                "id": "testex",
                "name": "TestEx",
                "classification": "supported",
                "urls": {"api": "https://api.testex.com"},
                "signing": {"pattern": "hmac_sha256_query"},
                "endpoints": [
                    {"name": "fetch_time", "method": "GET", "path": "/time", "auth": false, "params": []}
                ],
                "spec_format_version": 1
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_accepts_minimal_spec() {
        assert!(validate(&base_spec()).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_id() {
        let mut spec = base_spec();
        spec.id = "".into();
        assert!(matches!(
            validate(&spec),
            Err(ValidateError::EmptyField { field: "id", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_duplicate_endpoints() {
        let mut spec = base_spec();
        let duplicate = spec.endpoints[0].clone();
        spec.endpoints.push(duplicate);
        assert!(matches!(
            validate(&spec),
            Err(ValidateError::DuplicateEndpoint { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_endpoint_name() {
        let mut spec = base_spec();
        spec.endpoints[0].name = "Fetch-Time".into();
        assert!(matches!(
            validate(&spec),
            Err(ValidateError::InvalidEndpointName { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_custom_pattern_without_module() {
        let mut spec = base_spec();
        spec.signing.pattern = SigningPattern::Custom;
        assert!(matches!(
            validate(&spec),
            Err(ValidateError::MissingCustomModule { .. })
        ));
    }
}
