use smol_str::SmolStr;
use std::collections::{BTreeMap, BTreeSet};
use uniex_spec::{Capability, Spec};

/// Which exchanges support a unified capability, natively or emulated.
pub fn which_support<'a, I>(specs: I, capability: &str) -> Vec<SmolStr>
where
    I: IntoIterator<Item = &'a Spec>,
{
    specs
        .into_iter()
        .filter(|spec| spec.supports(capability))
        .map(|spec| spec.id.clone())
        .collect()
}

/// Which exchanges support every listed capability.
pub fn which_support_all<'a, I>(specs: I, capabilities: &[&str]) -> Vec<SmolStr>
where
    I: IntoIterator<Item = &'a Spec>,
{
    specs
        .into_iter()
        .filter(|spec| {
            capabilities
                .iter()
                .all(|capability| spec.supports(capability))
        })
        .map(|spec| spec.id.clone())
        .collect()
}

/// Capability flag per exchange, for side-by-side comparison.
pub fn compare<'a, I>(specs: I, capability: &str) -> BTreeMap<SmolStr, Capability>
where
    I: IntoIterator<Item = &'a Spec>,
{
    specs
        .into_iter()
        .map(|spec| (spec.id.clone(), spec.capability(capability)))
        .collect()
}

/// Union of every capability flag declared across the given specs.
pub fn all_capabilities<'a, I>(specs: I) -> BTreeSet<SmolStr>
where
    I: IntoIterator<Item = &'a Spec>,
{
    specs
        .into_iter()
        .flat_map(|spec| spec.has.keys().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(id: &str, has: &str) -> Spec {
        uniex_spec::from_str(&format!(
            r#"{{
                "id": "{id}",
                "name": "{id}",
                "classification": "supported",
                "urls": {{"api": "https://api.example.com"}},
                "signing": {{"pattern": "hmac_sha256_query"}},
                "has": {has},
                "spec_format_version": 1
            }}"#
        ))
        .unwrap()
    }

    #[test]
    fn test_which_support_includes_emulated() {
        let specs = vec![
            spec("a", r#"{"fetch_ticker": true, "fetch_ohlcv": true}"#),
            spec("b", r#"{"fetch_ticker": "emulated"}"#),
            spec("c", r#"{"fetch_ticker": false}"#),
        ];

        assert_eq!(
            which_support(&specs, "fetch_ticker"),
            vec![SmolStr::new("a"), SmolStr::new("b")]
        );
        assert_eq!(
            which_support_all(&specs, &["fetch_ticker", "fetch_ohlcv"]),
            vec![SmolStr::new("a")]
        );
    }

    #[test]
    fn test_compare_and_union() {
        let specs = vec![
            spec("a", r#"{"fetch_ticker": true}"#),
            spec("b", r#"{"fetch_ohlcv": "emulated"}"#),
        ];

        let compared = compare(&specs, "fetch_ticker");
        assert_eq!(compared[&SmolStr::new("a")], Capability::Flag(true));
        assert_eq!(compared[&SmolStr::new("b")], Capability::Flag(false));

        let union = all_capabilities(&specs);
        assert!(union.contains("fetch_ticker"));
        assert!(union.contains("fetch_ohlcv"));
    }
}
