use crate::convert::is_known_quote;
use smol_str::{SmolStr, format_smolstr};

/// Fiat codes Kraken pads to four characters with a `Z` prefix.
///
/// The `Z` heuristic keys on a 4-character total length; non-4-char fiat codes in that
/// position are left untouched.
const PADDED_FIAT: [&str; 7] = ["USD", "EUR", "GBP", "CAD", "JPY", "AUD", "CHF"];

/// Legacy crypto codes Kraken pads with an `X` prefix. Newer listings are unpadded.
const PADDED_CRYPTO: [&str; 11] = [
    "XBT", "ETH", "XRP", "LTC", "XLM", "XMR", "ZEC", "MLN", "REP", "ETC", "XDG",
];

/// Strip a Kraken currency prefix: `ZUSD` -> `USD`, `XXBT` -> `XBT`, `XETH` -> `ETH`.
pub fn strip_currency_prefix(code: &str) -> &str {
    if code.len() == 4 {
        if let Some(rest) = code.strip_prefix('Z') {
            if PADDED_FIAT.contains(&rest) {
                return rest;
            }
        }
        if let Some(rest) = code.strip_prefix('X') {
            if PADDED_CRYPTO.contains(&rest) || PADDED_FIAT.contains(&rest) {
                return rest;
            }
        }
    }
    code
}

/// Apply the Kraken currency prefix to a legacy code: `USD` -> `ZUSD`, `XBT` -> `XXBT`.
///
/// Codes outside the frozen legacy tables pass through unchanged.
pub fn add_currency_prefix(code: &str) -> SmolStr {
    if PADDED_FIAT.contains(&code) {
        format_smolstr!("Z{code}")
    } else if PADDED_CRYPTO.contains(&code) {
        format_smolstr!("X{code}")
    } else {
        SmolStr::new(code)
    }
}

/// Split a concatenated Kraken pair such as `XXBTZUSD` into prefix-stripped base and
/// quote codes.
///
/// Tries the padded 4-character quote form before the plain 3-character form.
pub fn split_pair(id: &str) -> Option<(SmolStr, SmolStr)> {
    for quote_len in [4usize, 3] {
        if id.len() > quote_len {
            let (base_raw, quote_raw) = id.split_at(id.len() - quote_len);
            let quote = strip_currency_prefix(quote_raw);
            if is_known_quote(quote) {
                return Some((
                    SmolStr::new(strip_currency_prefix(base_raw)),
                    SmolStr::new(quote),
                ));
            }
        }
    }
    None
}

/// KrakenFutures contract identifier prefixes.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum ContractPrefix {
    /// `PI_` - perpetual, inverse margined.
    PerpetualInverse,
    /// `PF_` - perpetual, flexibly margined.
    PerpetualFlexible,
    /// `FI_` - fixed maturity, inverse margined.
    FutureInverse,
    /// `FF_` - fixed maturity, flexibly margined.
    FutureFlexible,
    /// `PV_` - perpetual, vanilla margined.
    PerpetualVanilla,
}

impl ContractPrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractPrefix::PerpetualInverse => "PI_",
            ContractPrefix::PerpetualFlexible => "PF_",
            ContractPrefix::FutureInverse => "FI_",
            ContractPrefix::FutureFlexible => "FF_",
            ContractPrefix::PerpetualVanilla => "PV_",
        }
    }

    /// Strip a recognised contract prefix, returning it with the remaining identifier.
    pub fn strip(id: &str) -> Option<(Self, &str)> {
        const ALL: [ContractPrefix; 5] = [
            ContractPrefix::PerpetualInverse,
            ContractPrefix::PerpetualFlexible,
            ContractPrefix::FutureInverse,
            ContractPrefix::FutureFlexible,
            ContractPrefix::PerpetualVanilla,
        ];

        ALL.iter().find_map(|prefix| {
            id.strip_prefix(prefix.as_str())
                .map(|rest| (*prefix, rest))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_currency_prefix() {
        assert_eq!(strip_currency_prefix("ZUSD"), "USD");
        assert_eq!(strip_currency_prefix("XXBT"), "XBT");
        assert_eq!(strip_currency_prefix("XETH"), "ETH");
        assert_eq!(strip_currency_prefix("USDT"), "USDT");
        assert_eq!(strip_currency_prefix("SOL"), "SOL");
    }

    #[test]
    fn test_add_currency_prefix() {
        assert_eq!(add_currency_prefix("USD"), "ZUSD");
        assert_eq!(add_currency_prefix("XBT"), "XXBT");
        assert_eq!(add_currency_prefix("USDT"), "USDT");
        assert_eq!(add_currency_prefix("SOL"), "SOL");
    }

    #[test]
    fn test_split_pair() {
        assert_eq!(
            split_pair("XXBTZUSD"),
            Some((SmolStr::new("XBT"), SmolStr::new("USD")))
        );
        assert_eq!(
            split_pair("XBTUSDT"),
            Some((SmolStr::new("XBT"), SmolStr::new("USDT")))
        );
        assert_eq!(
            split_pair("SOLUSD"),
            Some((SmolStr::new("SOL"), SmolStr::new("USD")))
        );
        assert_eq!(split_pair("???"), None);
    }

    #[test]
    fn test_contract_prefix_strip() {
        assert_eq!(
            ContractPrefix::strip("PI_XBTUSD"),
            Some((ContractPrefix::PerpetualInverse, "XBTUSD"))
        );
        assert_eq!(
            ContractPrefix::strip("FF_ETHUSD_260327"),
            Some((ContractPrefix::FutureFlexible, "ETHUSD_260327"))
        );
        assert_eq!(ContractPrefix::strip("XBTUSD"), None);
    }
}
