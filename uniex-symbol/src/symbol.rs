use crate::{
    error::SymbolError,
    market::{MarketType, OptionKind},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, SmolStrBuilder};
use std::{fmt::Display, str::FromStr};

/// Components of a unified symbol: `BASE/QUOTE[:SETTLE[-EXPIRY[-STRIKE-TYPE]]]`.
///
/// Derivative components are only populated for non-spot symbols:
/// - `BTC/USDT` - spot
/// - `BTC/USDT:USDT` - perpetual swap settling in USDT
/// - `BTC/USDT:USDT-260327` - future expiring 2026-03-27
/// - `BTC/USD:BTC-260112-84000-C` - call option, strike 84000
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct ParsedSymbol {
    pub base: SmolStr,
    pub quote: SmolStr,
    pub settle: Option<SmolStr>,
    /// Expiry date in `yymmdd` form.
    pub expiry: Option<SmolStr>,
    pub strike: Option<Decimal>,
    pub option_type: Option<OptionKind>,
}

impl ParsedSymbol {
    /// Construct a spot [`Self`] from base and quote currency codes.
    pub fn spot<S>(base: S, quote: S) -> Self
    where
        S: Into<SmolStr>,
    {
        Self {
            base: base.into(),
            quote: quote.into(),
            settle: None,
            expiry: None,
            strike: None,
            option_type: None,
        }
    }

    /// Infer the [`MarketType`] from which derivative components are populated.
    pub fn market_type(&self) -> MarketType {
        match (&self.settle, &self.expiry, &self.strike) {
            (None, _, _) => MarketType::Spot,
            (Some(_), None, _) => MarketType::Swap,
            (Some(_), Some(_), None) => MarketType::Future,
            (Some(_), Some(_), Some(_)) => MarketType::Option,
        }
    }
}

impl Display for ParsedSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", build(self))
    }
}

/// Parse a unified symbol into its [`ParsedSymbol`] components.
///
/// Anything lacking a non-empty base and quote is rejected as
/// [`SymbolError::InvalidFormat`].
pub fn parse(symbol: &str) -> Result<ParsedSymbol, SymbolError> {
    let invalid = || SymbolError::InvalidFormat(symbol.to_string());

    let (pair, derivative) = match symbol.split_once(':') {
        Some((pair, derivative)) => (pair, Some(derivative)),
        None => (symbol, None),
    };

    let (base, quote) = pair.split_once('/').ok_or_else(invalid)?;
    if base.is_empty() || quote.is_empty() {
        return Err(invalid());
    }

    let mut parsed = ParsedSymbol::spot(base, quote);

    let Some(derivative) = derivative else {
        return Ok(parsed);
    };

    let mut parts = derivative.split('-');
    let settle = parts.next().filter(|part| !part.is_empty()).ok_or_else(invalid)?;
    parsed.settle = Some(SmolStr::new(settle));

    if let Some(expiry) = parts.next() {
        if expiry.is_empty() {
            return Err(invalid());
        }
        parsed.expiry = Some(SmolStr::new(expiry));
    }

    match (parts.next(), parts.next()) {
        (None, None) => {}
        (Some(strike), Some(kind)) => {
            parsed.strike = Some(Decimal::from_str(strike).map_err(|_| invalid())?);
            parsed.option_type = Some(OptionKind::parse(kind).ok_or_else(invalid)?);
        }
        _ => return Err(invalid()),
    }

    if parts.next().is_some() {
        return Err(invalid());
    }

    Ok(parsed)
}

/// Build a unified symbol string from [`ParsedSymbol`] components (inverse of [`parse`]).
pub fn build(parsed: &ParsedSymbol) -> SmolStr {
    let mut symbol = SmolStrBuilder::new();
    symbol.push_str(&parsed.base);
    symbol.push('/');
    symbol.push_str(&parsed.quote);

    if let Some(settle) = &parsed.settle {
        symbol.push(':');
        symbol.push_str(settle);
    }
    if let Some(expiry) = &parsed.expiry {
        symbol.push('-');
        symbol.push_str(expiry);
    }
    if let (Some(strike), Some(option_type)) = (&parsed.strike, &parsed.option_type) {
        symbol.push('-');
        symbol.push_str(&strike.to_string());
        symbol.push('-');
        symbol.push(option_type.code());
    }

    symbol.finish()
}
