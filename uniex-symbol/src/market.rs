use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Market type a symbol or endpoint is associated with.
///
/// Anything non-[`Spot`](MarketType::Spot) settles in a contract currency and is considered a
/// contract market.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketType {
    Spot,
    Swap,
    Future,
    Option,
    Margin,
}

impl MarketType {
    /// Return the &str representation of this [`MarketType`].
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketType::Spot => "spot",
            MarketType::Swap => "swap",
            MarketType::Future => "future",
            MarketType::Option => "option",
            MarketType::Margin => "margin",
        }
    }

    /// A contract market settles in a specific currency rather than exchanging spot assets.
    pub fn is_contract(&self) -> bool {
        matches!(
            self,
            MarketType::Swap | MarketType::Future | MarketType::Option
        )
    }
}

impl Display for MarketType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Option contract right - Call or Put.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    #[serde(alias = "C", alias = "CALL", alias = "Call")]
    Call,
    #[serde(alias = "P", alias = "PUT", alias = "Put")]
    Put,
}

impl OptionKind {
    /// Single letter code used in unified and most exchange identifiers.
    pub fn code(&self) -> char {
        match self {
            OptionKind::Call => 'C',
            OptionKind::Put => 'P',
        }
    }

    /// Parse an option right from a symbol component, eg/ "C", "P", "CALL", "put".
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "C" | "CALL" => Some(OptionKind::Call),
            "P" | "PUT" => Some(OptionKind::Put),
            _ => None,
        }
    }
}

impl Display for OptionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
