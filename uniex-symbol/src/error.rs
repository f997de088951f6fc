use crate::market::MarketType;
use thiserror::Error;

/// All symbol grammar and conversion errors generated in `uniex-symbol`.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum SymbolError {
    #[error("invalid unified symbol format: {0}")]
    InvalidFormat(String),

    #[error("no symbol pattern detected for market type: {0}")]
    PatternNotFound(MarketType),

    #[error("unknown quote currency in: {0}")]
    UnknownQuoteCurrency(String),

    #[error("invalid {format} date: {date}")]
    InvalidDate { date: String, format: &'static str },

    #[error("{symbol} is missing required {component} component")]
    MissingComponent {
        symbol: String,
        component: &'static str,
    },
}
