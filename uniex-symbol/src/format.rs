use crate::{date::DateFormat, market::MarketType};
use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, StrExt};
use std::collections::BTreeMap;

/// Letter case an exchange applies to currency components of its market identifiers.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Case {
    Upper,
    Lower,
    /// Exchange-native casing, left untouched.
    Mixed,
}

impl Default for Case {
    fn default() -> Self {
        Self::Upper
    }
}

impl Case {
    /// Apply this case to the provided identifier component.
    pub fn apply(&self, value: &str) -> SmolStr {
        match self {
            Case::Upper => value.to_uppercase_smolstr(),
            Case::Lower => value.to_lowercase_smolstr(),
            Case::Mixed => SmolStr::new(value),
        }
    }
}

/// Exchange-specific currency prefix convention applied before splitting or joining
/// identifier components.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefixRule {
    None,
    /// Kraken spot currency padding: `X` for crypto (`XXBT`), `Z` for 4-char fiat (`ZUSD`).
    Kraken,
    /// KrakenFutures contract prefixes: `PI_`, `PF_`, `FI_`, `FF_`, `PV_`.
    KrakenFutures,
}

impl Default for PrefixRule {
    fn default() -> Self {
        Self::None
    }
}

/// How an exchange formats a plain market identifier: separator, case, and a sample taken
/// from live market data during extraction.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct SymbolFormat {
    #[serde(default)]
    pub separator: SmolStr,
    #[serde(default)]
    pub case: Case,
    #[serde(default)]
    pub sample: Option<SmolStr>,
    #[serde(default)]
    pub prefix: PrefixRule,
}

impl SymbolFormat {
    pub fn new<S>(separator: S, case: Case) -> Self
    where
        S: Into<SmolStr>,
    {
        Self {
            separator: separator.into(),
            case,
            sample: None,
            prefix: PrefixRule::None,
        }
    }
}

impl Default for SymbolFormat {
    fn default() -> Self {
        Self::new("", Case::Upper)
    }
}

/// Detected recipe name describing how an exchange encodes one market type.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    // Spot: separator and case are encoded in the name, mirrored in the recipe fields.
    NoSeparatorUpper,
    NoSeparatorLower,
    NoSeparatorMixed,
    UnderscoreUpper,
    UnderscoreLower,
    UnderscoreMixed,
    DashUpper,
    DashLower,
    DashMixed,
    // Swap: base + separator + quote, optionally followed by a contract suffix.
    Implicit,
    SuffixPerpetual,
    SuffixSwap,
    SuffixPerp,
    // Future: distinguished by expiry date encoding.
    FutureYymmdd,
    FutureDdmmmyy,
    FutureYyyymmdd,
    // Option.
    OptionDdmmmyy,
    OptionYymmdd,
    OptionWithSettle,
    OptionUnknown,
}

impl PatternKind {
    /// Default contract suffix for the swap suffix recipes.
    pub fn default_suffix(&self) -> Option<&'static str> {
        match self {
            PatternKind::SuffixPerpetual => Some("PERPETUAL"),
            PatternKind::SuffixSwap => Some("SWAP"),
            PatternKind::SuffixPerp => Some("PERP"),
            _ => None,
        }
    }

    /// Expiry [`DateFormat`] implied by the recipe name, where one is.
    pub fn date_format(&self) -> Option<DateFormat> {
        match self {
            PatternKind::FutureYymmdd | PatternKind::OptionYymmdd | PatternKind::OptionWithSettle => {
                Some(DateFormat::Yymmdd)
            }
            PatternKind::FutureDdmmmyy | PatternKind::OptionDdmmmyy => Some(DateFormat::Ddmmmyy),
            PatternKind::FutureYyyymmdd => Some(DateFormat::Yyyymmdd),
            _ => None,
        }
    }
}

/// Full derivative (or spot) conversion recipe for one market type, detected during
/// extraction from live market identifiers.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct SymbolPattern {
    pub pattern: PatternKind,
    #[serde(default)]
    pub separator: SmolStr,
    #[serde(default)]
    pub case: Case,
    #[serde(default)]
    pub date_format: Option<DateFormat>,
    #[serde(default)]
    pub suffix: Option<SmolStr>,
    #[serde(default)]
    pub component_order: Vec<SmolStr>,
    #[serde(default)]
    pub prefix: PrefixRule,
}

impl SymbolPattern {
    pub fn new<S>(pattern: PatternKind, separator: S, case: Case) -> Self
    where
        S: Into<SmolStr>,
    {
        Self {
            date_format: pattern.date_format(),
            pattern,
            separator: separator.into(),
            case,
            suffix: None,
            component_order: Vec::new(),
            prefix: PrefixRule::None,
        }
    }

    /// Expiry encoding for this recipe, preferring the detected `date_format` over the
    /// recipe name default.
    pub fn expiry_format(&self) -> Option<DateFormat> {
        self.date_format.or_else(|| self.pattern.date_format())
    }

    /// Contract suffix for swap recipes, preferring the detected `suffix`.
    pub fn contract_suffix(&self) -> Option<&str> {
        self.suffix
            .as_deref()
            .or_else(|| self.pattern.default_suffix())
    }

    /// Whether the detected component order keeps the quote as its own separated
    /// component (`BTC-USD-260327`) rather than concatenated into the pair
    /// (`BTCUSDT_260327`).
    pub fn keeps_quote_component(&self) -> bool {
        self.component_order.iter().any(|component| component == "quote")
    }
}

/// Per-market-type identifier formats for one exchange.
pub type SymbolFormats = BTreeMap<MarketType, SymbolFormat>;

/// Per-market-type conversion recipes for one exchange.
pub type SymbolPatterns = BTreeMap<MarketType, SymbolPattern>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_apply() {
        assert_eq!(Case::Upper.apply("btcUsdt"), "BTCUSDT");
        assert_eq!(Case::Lower.apply("BTCusdt"), "btcusdt");
        assert_eq!(Case::Mixed.apply("BtcUsdt"), "BtcUsdt");
    }

    #[test]
    fn test_symbol_pattern_deserialize_defaults() {
        let pattern = serde_json::from_str::<SymbolPattern>(
            r#"{"pattern": "future_ddmmmyy", "separator": "-"}"#,
        )
        .unwrap();
        assert_eq!(pattern.pattern, PatternKind::FutureDdmmmyy);
        assert_eq!(pattern.expiry_format(), Some(DateFormat::Ddmmmyy));
        assert_eq!(pattern.case, Case::Upper);
    }

    #[test]
    fn test_contract_suffix_prefers_detected() {
        let mut pattern = SymbolPattern::new(PatternKind::SuffixPerpetual, "_", Case::Upper);
        assert_eq!(pattern.contract_suffix(), Some("PERPETUAL"));
        pattern.suffix = Some(SmolStr::new("PERPS"));
        assert_eq!(pattern.contract_suffix(), Some("PERPS"));
    }
}
