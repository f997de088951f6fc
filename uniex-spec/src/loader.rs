use crate::{
    error::LoadError,
    spec::{CURRENT_SPEC_FORMAT_VERSION, Spec},
};
use serde::Deserialize;
use std::path::Path;

/// Load a [`Spec`] from its on-disk declarative form.
pub fn load<P>(path: P) -> Result<Spec, LoadError>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|error| LoadError::Io {
        path: path.display().to_string(),
        error,
    })?;
    from_str(&raw)
}

/// Materialise a [`Spec`] from raw declarative source.
///
/// The format version is gated before the full parse so that a spec written by a newer
/// extractor fails with an upgrade-required error rather than a field mismatch.
pub fn from_str(raw: &str) -> Result<Spec, LoadError> {
    #[derive(Deserialize)]
    struct VersionProbe {
        spec_format_version: u32,
    }

    let probe = serde_json::from_str::<VersionProbe>(raw)?;
    if probe.spec_format_version > CURRENT_SPEC_FORMAT_VERSION {
        return Err(LoadError::NewerThanSupported {
            found: probe.spec_format_version,
            supported: CURRENT_SPEC_FORMAT_VERSION,
        });
    }

    let spec = serde_json::from_str::<Spec>(raw)?;
    Ok(migrate(spec, probe.spec_format_version))
}

/// Migrate a spec parsed from an older format version up to the current shape.
///
/// Identity for v1.
fn migrate(spec: Spec, _from_version: u32) -> Spec {
    spec
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "id": "testex",
        "name": "TestEx",
        "classification": "supported",
        "urls": {"api": "https://api.testex.com"},
        "signing": {"pattern": "hmac_sha256_query"},
        "spec_format_version": 1
    }"#;

    #[test]
    fn test_from_str_minimal() {
        let spec = from_str(MINIMAL).unwrap();
        assert_eq!(spec.id, "testex");
        assert_eq!(spec.spec_format_version, 1);
        assert!(spec.endpoints.is_empty());
    }

    #[test]
    fn test_newer_format_version_is_rejected() {
        let newer = MINIMAL.replace(r#""spec_format_version": 1"#, r#""spec_format_version": 2"#);
        assert!(matches!(
            from_str(&newer),
            Err(LoadError::NewerThanSupported {
                found: 2,
                supported: CURRENT_SPEC_FORMAT_VERSION
            })
        ));
    }

    #[test]
    fn test_missing_version_is_a_parse_error() {
        let missing = MINIMAL.replace(r#""spec_format_version": 1"#, r#""unrelated": 1"#);
        assert!(matches!(from_str(&missing), Err(LoadError::Parse(_))));
    }
}
