use crate::error::ExchangeError;
use smol_str::SmolStr;
use uniex_spec::Spec;
use uniex_symbol::{MarketType, SymbolError};

pub use uniex_symbol::{ParsedSymbol, build, parse};

fn market_for(symbol: &str, market_type: Option<MarketType>) -> MarketType {
    market_type
        .or_else(|| {
            uniex_symbol::parse(symbol)
                .ok()
                .map(|parsed| parsed.market_type())
        })
        .unwrap_or(MarketType::Spot)
}

/// Unified symbol -> exchange identifier using the spec's conversion recipe for the
/// market type, falling back to the plain identifier format.
pub fn to_exchange_id(
    symbol: &str,
    spec: &Spec,
    market_type: Option<MarketType>,
) -> Result<SmolStr, ExchangeError> {
    let market = market_for(symbol, market_type);
    if let Some(pattern) = spec.symbol_pattern_for(market) {
        Ok(uniex_symbol::try_to_exchange_id(
            symbol,
            pattern,
            &spec.currency_aliases,
        )?)
    } else if let Some(format) = spec.symbol_format_for(market) {
        Ok(uniex_symbol::try_denormalize(
            symbol,
            format,
            &spec.currency_aliases,
        )?)
    } else {
        Err(SymbolError::PatternNotFound(market).into())
    }
}

/// Exchange identifier -> unified symbol using the spec's conversion recipe for the
/// market type.
pub fn from_exchange_id(
    id: &str,
    spec: &Spec,
    market_type: MarketType,
) -> Result<SmolStr, ExchangeError> {
    if let Some(pattern) = spec.symbol_pattern_for(market_type) {
        Ok(uniex_symbol::try_from_exchange_id(
            id,
            pattern,
            &spec.currency_aliases,
        )?)
    } else if let Some(format) = spec.symbol_format_for(market_type) {
        Ok(uniex_symbol::try_normalize(
            id,
            format,
            &spec.currency_aliases,
        )?)
    } else {
        Err(SymbolError::PatternNotFound(market_type).into())
    }
}

/// Exchange pair identifier -> unified `BASE/QUOTE`, best effort.
pub fn normalize(id: &str, spec: &Spec) -> SmolStr {
    match spec.symbol_format_for(MarketType::Spot) {
        Some(format) => uniex_symbol::normalize(id, format, &spec.currency_aliases),
        None => SmolStr::new(id),
    }
}

/// Unified symbol -> plain exchange pair identifier, best effort.
pub fn denormalize(symbol: &str, spec: &Spec) -> SmolStr {
    match spec.symbol_format_for(MarketType::Spot) {
        Some(format) => uniex_symbol::denormalize(symbol, format, &spec.currency_aliases),
        None => SmolStr::new(symbol),
    }
}

/// Check a unified symbol converts cleanly for the given market type on this exchange.
pub fn validate_symbol_conversion(
    symbol: &str,
    spec: &Spec,
    market_type: Option<MarketType>,
) -> Result<(), ExchangeError> {
    Ok(uniex_symbol::validate_symbol_conversion(
        symbol,
        &spec.symbol_patterns,
        market_type,
    )?)
}
