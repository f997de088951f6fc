use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::BTreeMap;

/// Unified -> exchange currency alias table, eg/ `{"BTC": "XBT"}` for Kraken and BitMEX.
///
/// The reverse (exchange -> unified) direction is derived on demand; alias tables are
/// small enough that a linear scan beats carrying a second map.
#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct CurrencyAliases(BTreeMap<SmolStr, SmolStr>);

impl CurrencyAliases {
    pub fn new(aliases: BTreeMap<SmolStr, SmolStr>) -> Self {
        Self(aliases)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Map a unified currency code to the exchange representation, identity when unmapped.
    pub fn to_exchange(&self, code: &str) -> SmolStr {
        self.0
            .get(code)
            .cloned()
            .unwrap_or_else(|| SmolStr::new(code))
    }

    /// Map an exchange currency code back to the unified representation, identity when
    /// unmapped.
    pub fn to_unified(&self, code: &str) -> SmolStr {
        self.0
            .iter()
            .find(|(_, exchange)| exchange.as_str() == code)
            .map(|(unified, _)| unified.clone())
            .unwrap_or_else(|| SmolStr::new(code))
    }
}

impl<K, V> FromIterator<(K, V)> for CurrencyAliases
where
    K: Into<SmolStr>,
    V: Into<SmolStr>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(unified, exchange)| (unified.into(), exchange.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_symmetry() {
        let aliases = CurrencyAliases::from_iter([("BTC", "XBT"), ("DOGE", "XDG")]);
        assert_eq!(aliases.to_exchange("BTC"), "XBT");
        assert_eq!(aliases.to_unified("XBT"), "BTC");
        assert_eq!(aliases.to_unified(aliases.to_exchange("DOGE").as_str()), "DOGE");
    }

    #[test]
    fn test_alias_identity_fallback() {
        let aliases = CurrencyAliases::default();
        assert_eq!(aliases.to_exchange("ETH"), "ETH");
        assert_eq!(aliases.to_unified("ETH"), "ETH");
    }
}
