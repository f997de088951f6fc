use crate::{
    alias::CurrencyAliases,
    date::{DateFormat, convert_date},
    error::SymbolError,
    format::{PatternKind, PrefixRule, SymbolFormat, SymbolPattern, SymbolPatterns},
    kraken,
    market::{MarketType, OptionKind},
    symbol::{self, ParsedSymbol},
};
use rust_decimal::Decimal;
use smol_str::{SmolStr, format_smolstr};
use std::str::FromStr;

/// Quote currencies recognised when splitting a separator-less pair.
///
/// Ordered longest first so that `BTCUSDT` splits as `BTC`/`USDT` rather than
/// `BTCUSD`/`T` or `BTCU`/`SDT`.
pub const KNOWN_QUOTE_CURRENCIES: &[&str] = &[
    "FDUSD", "USDT", "USDC", "BUSD", "TUSD", "USDD", "USDP", "USDE", "EURT", "USD", "EUR", "GBP",
    "JPY", "AUD", "CAD", "CHF", "TRY", "BRL", "KRW", "MXN", "DAI", "BTC", "XBT", "ETH", "BNB",
    "SOL", "DOT", "TRX",
];

/// Whether `code` (uppercase) is a recognised quote currency.
pub fn is_known_quote(code: &str) -> bool {
    KNOWN_QUOTE_CURRENCIES.contains(&code)
}

/// Split a separator-less pair on the longest matching known quote currency suffix.
fn split_by_quote_suffix(pair: &str) -> Option<(&str, &str)> {
    KNOWN_QUOTE_CURRENCIES.iter().find_map(|quote| {
        pair.strip_suffix(quote)
            .filter(|base| !base.is_empty())
            .map(|base| (base, *quote))
    })
}

/// Settle currency convention when only base and quote are known: USD-quoted contracts
/// are inverse (settle in base), everything else is linear (settle in quote).
fn infer_settle(base: &SmolStr, quote: &SmolStr) -> SmolStr {
    if quote == "USD" {
        base.clone()
    } else {
        quote.clone()
    }
}

/// Convert an exchange market identifier into a unified `BASE/QUOTE` symbol.
///
/// Best-effort legacy form: returns the input unchanged when conversion fails. Use
/// [`try_normalize`] for a typed error.
pub fn normalize(id: &str, format: &SymbolFormat, aliases: &CurrencyAliases) -> SmolStr {
    try_normalize(id, format, aliases).unwrap_or_else(|_| SmolStr::new(id))
}

/// Convert an exchange market identifier into a unified `BASE/QUOTE` symbol.
pub fn try_normalize(
    id: &str,
    format: &SymbolFormat,
    aliases: &CurrencyAliases,
) -> Result<SmolStr, SymbolError> {
    let mut working = id;
    if format.prefix == PrefixRule::KrakenFutures {
        if let Some((_, rest)) = kraken::ContractPrefix::strip(working) {
            working = rest;
        }
    }

    let canonical = working.to_uppercase();

    let (base_raw, quote_raw) = if !format.separator.is_empty() {
        let (base, quote) = canonical
            .split_once(format.separator.as_str())
            .filter(|(base, quote)| !base.is_empty() && !quote.is_empty())
            .ok_or_else(|| SymbolError::InvalidFormat(id.to_string()))?;
        (SmolStr::new(base), SmolStr::new(quote))
    } else if format.prefix == PrefixRule::Kraken {
        kraken::split_pair(&canonical)
            .ok_or_else(|| SymbolError::UnknownQuoteCurrency(id.to_string()))?
    } else {
        split_by_quote_suffix(&canonical)
            .map(|(base, quote)| (SmolStr::new(base), SmolStr::new(quote)))
            .ok_or_else(|| SymbolError::UnknownQuoteCurrency(id.to_string()))?
    };

    let base = aliases.to_unified(&base_raw);
    let quote = aliases.to_unified(&quote_raw);

    Ok(format_smolstr!("{base}/{quote}"))
}

/// Convert a unified symbol into a plain exchange market identifier, stripping any
/// `:SETTLE[...]` derivative suffix.
///
/// Best-effort legacy form: returns the input unchanged when conversion fails. Use
/// [`try_denormalize`] for a typed error.
pub fn denormalize(symbol: &str, format: &SymbolFormat, aliases: &CurrencyAliases) -> SmolStr {
    try_denormalize(symbol, format, aliases).unwrap_or_else(|_| SmolStr::new(symbol))
}

/// Convert a unified symbol into a plain exchange market identifier.
pub fn try_denormalize(
    symbol: &str,
    format: &SymbolFormat,
    aliases: &CurrencyAliases,
) -> Result<SmolStr, SymbolError> {
    let pair = symbol
        .split_once(':')
        .map(|(pair, _)| pair)
        .unwrap_or(symbol);

    let (base, quote) = pair
        .split_once('/')
        .filter(|(base, quote)| !base.is_empty() && !quote.is_empty())
        .ok_or_else(|| SymbolError::InvalidFormat(symbol.to_string()))?;

    let mut base = aliases.to_exchange(base);
    let mut quote = aliases.to_exchange(quote);
    if format.prefix == PrefixRule::Kraken {
        base = kraken::add_currency_prefix(&base);
        quote = kraken::add_currency_prefix(&quote);
    }

    Ok(format
        .case
        .apply(&format!("{base}{}{quote}", format.separator)))
}

/// Convert a unified symbol into the exchange identifier for one market type, using the
/// conversion recipe detected for that market type.
///
/// Best-effort legacy form: returns the input unchanged when conversion fails. Use
/// [`try_to_exchange_id`] for a typed error.
pub fn to_exchange_id(symbol: &str, pattern: &SymbolPattern, aliases: &CurrencyAliases) -> SmolStr {
    try_to_exchange_id(symbol, pattern, aliases).unwrap_or_else(|_| SmolStr::new(symbol))
}

/// Convert a unified symbol into the exchange identifier for one market type.
pub fn try_to_exchange_id(
    symbol: &str,
    pattern: &SymbolPattern,
    aliases: &CurrencyAliases,
) -> Result<SmolStr, SymbolError> {
    let parsed = symbol::parse(symbol)?;
    let mut base = aliases.to_exchange(&parsed.base);
    let mut quote = aliases.to_exchange(&parsed.quote);
    if pattern.prefix == PrefixRule::Kraken {
        base = kraken::add_currency_prefix(&base);
        quote = kraken::add_currency_prefix(&quote);
    }
    let sep = pattern.separator.as_str();

    let expiry = |component: &'static str| {
        parsed
            .expiry
            .clone()
            .ok_or_else(|| SymbolError::MissingComponent {
                symbol: symbol.to_string(),
                component,
            })
    };
    let settle = || {
        parsed
            .settle
            .as_deref()
            .map(|settle| aliases.to_exchange(settle))
            .ok_or_else(|| SymbolError::MissingComponent {
                symbol: symbol.to_string(),
                component: "settle",
            })
    };
    let option_leg = || -> Result<(Decimal, OptionKind), SymbolError> {
        match (parsed.strike, parsed.option_type) {
            (Some(strike), Some(option_type)) => Ok((strike, option_type)),
            _ => Err(SymbolError::MissingComponent {
                symbol: symbol.to_string(),
                component: "strike",
            }),
        }
    };

    let id = match pattern.pattern {
        PatternKind::NoSeparatorUpper
        | PatternKind::NoSeparatorLower
        | PatternKind::NoSeparatorMixed
        | PatternKind::UnderscoreUpper
        | PatternKind::UnderscoreLower
        | PatternKind::UnderscoreMixed
        | PatternKind::DashUpper
        | PatternKind::DashLower
        | PatternKind::DashMixed
        | PatternKind::Implicit => pattern.case.apply(&format!("{base}{sep}{quote}")),

        PatternKind::SuffixPerpetual | PatternKind::SuffixSwap | PatternKind::SuffixPerp => {
            let suffix = pattern.contract_suffix().unwrap_or("PERP");
            // Deribit-style perpetuals drop the USD quote: `BTC-PERPETUAL`.
            let joined = if sep == "-" && parsed.quote == "USD" {
                format!("{base}{sep}{suffix}")
            } else {
                format!("{base}{sep}{quote}{sep}{suffix}")
            };
            pattern.case.apply(&joined)
        }

        PatternKind::FutureYymmdd | PatternKind::FutureYyyymmdd => {
            let expiry = expiry("expiry")?;
            let date = match pattern.pattern {
                PatternKind::FutureYyyymmdd => {
                    convert_date(&expiry, DateFormat::Yymmdd, DateFormat::Yyyymmdd)?
                }
                _ => expiry.to_string(),
            };
            // A detected component order keeping the quote separate yields
            // `BTC-USD-260327`; the default concatenates the pair: `BTCUSDT_260327`.
            let pair = if pattern.keeps_quote_component() {
                pattern.case.apply(&format!("{base}{sep}{quote}"))
            } else {
                pattern.case.apply(&format!("{base}{quote}"))
            };
            format_smolstr!("{pair}{sep}{date}")
        }

        PatternKind::FutureDdmmmyy => {
            let date = convert_date(&expiry("expiry")?, DateFormat::Yymmdd, DateFormat::Ddmmmyy)?;
            // Deribit-style drops the quote for USD-quoted inverse futures with a dash
            // separator; Bybit-style keeps it.
            let joined = if sep == "-" && parsed.quote == "USD" {
                format!("{base}{sep}{date}")
            } else {
                format!("{base}{sep}{quote}{sep}{date}")
            };
            pattern.case.apply(&joined)
        }

        PatternKind::OptionDdmmmyy => {
            let date = convert_date(&expiry("expiry")?, DateFormat::Yymmdd, DateFormat::Ddmmmyy)?;
            let (strike, option_type) = option_leg()?;
            pattern
                .case
                .apply(&format!("{base}{sep}{date}{sep}{strike}{sep}{option_type}"))
        }

        PatternKind::OptionYymmdd => {
            let expiry = expiry("expiry")?;
            let (strike, option_type) = option_leg()?;
            pattern.case.apply(&format!(
                "{base}{sep}{quote}{sep}{expiry}{sep}{strike}{sep}{option_type}"
            ))
        }

        PatternKind::OptionWithSettle => {
            let expiry = expiry("expiry")?;
            let settle = settle()?;
            let (strike, option_type) = option_leg()?;
            pattern.case.apply(&format!(
                "{base}{sep}{settle}{sep}{expiry}{sep}{strike}{sep}{option_type}"
            ))
        }

        PatternKind::OptionUnknown => {
            return Err(SymbolError::PatternNotFound(MarketType::Option));
        }
    };

    if pattern.prefix == PrefixRule::KrakenFutures {
        let inverse = parsed.quote == "USD" && parsed.settle.as_ref() == Some(&parsed.base);
        let contract = match (parsed.expiry.is_some(), inverse) {
            (false, true) => kraken::ContractPrefix::PerpetualInverse,
            (false, false) => kraken::ContractPrefix::PerpetualFlexible,
            (true, true) => kraken::ContractPrefix::FutureInverse,
            (true, false) => kraken::ContractPrefix::FutureFlexible,
        };
        return Ok(format_smolstr!("{}{id}", contract.as_str()));
    }

    Ok(id)
}

/// Convert an exchange identifier back into a unified symbol using the conversion recipe
/// for its market type.
///
/// Best-effort legacy form: returns the input unchanged when conversion fails. Use
/// [`try_from_exchange_id`] for a typed error.
pub fn from_exchange_id(id: &str, pattern: &SymbolPattern, aliases: &CurrencyAliases) -> SmolStr {
    try_from_exchange_id(id, pattern, aliases).unwrap_or_else(|_| SmolStr::new(id))
}

/// Convert an exchange identifier back into a unified symbol.
pub fn try_from_exchange_id(
    id: &str,
    pattern: &SymbolPattern,
    aliases: &CurrencyAliases,
) -> Result<SmolStr, SymbolError> {
    let invalid = || SymbolError::InvalidFormat(id.to_string());
    let sep = pattern.separator.as_str();

    let mut working = id;
    let mut contract_prefix = None;
    if pattern.prefix == PrefixRule::KrakenFutures {
        if let Some((prefix, rest)) = kraken::ContractPrefix::strip(working) {
            contract_prefix = Some(prefix);
            working = rest;
        }
    }
    let canonical = working.to_uppercase();

    let split_pair = |pair: &str| -> Result<(SmolStr, SmolStr), SymbolError> {
        if !sep.is_empty() {
            pair.split_once(sep)
                .filter(|(base, quote)| !base.is_empty() && !quote.is_empty())
                .map(|(base, quote)| (SmolStr::new(base), SmolStr::new(quote)))
                .ok_or_else(invalid)
        } else if pattern.prefix == PrefixRule::Kraken {
            kraken::split_pair(pair)
                .ok_or_else(|| SymbolError::UnknownQuoteCurrency(id.to_string()))
        } else {
            split_by_quote_suffix(pair)
                .map(|(base, quote)| (SmolStr::new(base), SmolStr::new(quote)))
                .ok_or_else(|| SymbolError::UnknownQuoteCurrency(id.to_string()))
        }
    };

    // Settle inference honours an explicit KrakenFutures margining prefix over the
    // USD-quote heuristic.
    let settle_for = |base: &SmolStr, quote: &SmolStr| match contract_prefix {
        Some(kraken::ContractPrefix::PerpetualInverse | kraken::ContractPrefix::FutureInverse) => {
            base.clone()
        }
        Some(_) => quote.clone(),
        None => infer_settle(base, quote),
    };

    let unified = |parsed: ParsedSymbol| symbol::build(&parsed);

    match pattern.pattern {
        PatternKind::NoSeparatorUpper
        | PatternKind::NoSeparatorLower
        | PatternKind::NoSeparatorMixed
        | PatternKind::UnderscoreUpper
        | PatternKind::UnderscoreLower
        | PatternKind::UnderscoreMixed
        | PatternKind::DashUpper
        | PatternKind::DashLower
        | PatternKind::DashMixed => {
            let (base, quote) = split_pair(&canonical)?;
            Ok(format_smolstr!(
                "{}/{}",
                aliases.to_unified(&base),
                aliases.to_unified(&quote)
            ))
        }

        PatternKind::Implicit
        | PatternKind::SuffixPerpetual
        | PatternKind::SuffixSwap
        | PatternKind::SuffixPerp => {
            let mut pair = canonical.as_str();
            if let Some(suffix) = pattern.contract_suffix() {
                let suffix = suffix.to_uppercase();
                if let Some(stripped) = pair.strip_suffix(suffix.as_str()) {
                    pair = stripped.strip_suffix(sep).unwrap_or(stripped);
                }
            }
            // A bare base after suffix stripping is a Deribit-style USD perpetual.
            let (base, quote) = match split_pair(pair) {
                Ok(split) => split,
                Err(_) if pattern.contract_suffix().is_some() && !pair.is_empty() => {
                    (SmolStr::new(pair), SmolStr::new("USD"))
                }
                Err(error) => return Err(error),
            };
            let base = aliases.to_unified(&base);
            let quote = aliases.to_unified(&quote);
            let settle = settle_for(&base, &quote);
            Ok(unified(ParsedSymbol {
                settle: Some(settle),
                ..ParsedSymbol::spot(base, quote)
            }))
        }

        PatternKind::FutureYymmdd | PatternKind::FutureYyyymmdd => {
            let (pair, date) = if sep.is_empty() {
                let split_at = canonical
                    .len()
                    .checked_sub(if pattern.pattern == PatternKind::FutureYyyymmdd {
                        8
                    } else {
                        6
                    })
                    .ok_or_else(invalid)?;
                canonical.split_at(split_at)
            } else {
                canonical.rsplit_once(sep).ok_or_else(invalid)?
            };
            let expiry = match pattern.pattern {
                PatternKind::FutureYyyymmdd => {
                    convert_date(date, DateFormat::Yyyymmdd, DateFormat::Yymmdd)?
                }
                _ => convert_date(date, DateFormat::Yymmdd, DateFormat::Yymmdd)?,
            };
            let (base, quote) = if pattern.keeps_quote_component() && !sep.is_empty() {
                pair.split_once(sep)
                    .filter(|(base, quote)| !base.is_empty() && !quote.is_empty())
                    .map(|(base, quote)| (SmolStr::new(base), SmolStr::new(quote)))
                    .ok_or_else(invalid)?
            } else {
                split_by_quote_suffix(pair)
                    .map(|(base, quote)| (SmolStr::new(base), SmolStr::new(quote)))
                    .ok_or_else(|| SymbolError::UnknownQuoteCurrency(id.to_string()))?
            };
            let base = aliases.to_unified(&base);
            let quote = aliases.to_unified(&quote);
            let settle = settle_for(&base, &quote);
            Ok(unified(ParsedSymbol {
                settle: Some(settle),
                expiry: Some(SmolStr::new(expiry)),
                ..ParsedSymbol::spot(base, quote)
            }))
        }

        PatternKind::FutureDdmmmyy => {
            if sep.is_empty() {
                return Err(invalid());
            }
            let parts = canonical.split(sep).collect::<Vec<_>>();
            // Try the more specific Bybit-style [base, quote, date] before the
            // Deribit-style [base, date] with an implied USD quote.
            let (base, quote, date) = match parts.as_slice() {
                [base, quote, date] if is_known_quote(quote) => {
                    (SmolStr::new(base), SmolStr::new(quote), *date)
                }
                [base, date] => (SmolStr::new(base), SmolStr::new("USD"), *date),
                _ => return Err(invalid()),
            };
            let expiry = convert_date(date, DateFormat::Ddmmmyy, DateFormat::Yymmdd)?;
            let base = aliases.to_unified(&base);
            let quote = aliases.to_unified(&quote);
            let settle = settle_for(&base, &quote);
            Ok(unified(ParsedSymbol {
                settle: Some(settle),
                expiry: Some(SmolStr::new(expiry)),
                ..ParsedSymbol::spot(base, quote)
            }))
        }

        PatternKind::OptionDdmmmyy
        | PatternKind::OptionYymmdd
        | PatternKind::OptionWithSettle => {
            if sep.is_empty() {
                return Err(invalid());
            }
            let parts = canonical.split(sep).collect::<Vec<_>>();
            let (base, quote, settle, date, strike, kind) = match (pattern.pattern, parts.as_slice())
            {
                (PatternKind::OptionDdmmmyy, [base, date, strike, kind]) => {
                    let base = aliases.to_unified(base);
                    // Deribit-style inverse options: quoted in USD, settled in base.
                    (base.clone(), SmolStr::new("USD"), base, *date, *strike, *kind)
                }
                (PatternKind::OptionYymmdd, [base, quote, date, strike, kind]) => {
                    let base = aliases.to_unified(base);
                    let quote = aliases.to_unified(quote);
                    let settle = infer_settle(&base, &quote);
                    (base, quote, settle, *date, *strike, *kind)
                }
                (PatternKind::OptionWithSettle, [base, settle, date, strike, kind]) => {
                    let base = aliases.to_unified(base);
                    let settle = aliases.to_unified(settle);
                    // Linear options quote in their settle currency.
                    (base, settle.clone(), settle, *date, *strike, *kind)
                }
                _ => return Err(invalid()),
            };

            let expiry = match pattern.pattern {
                PatternKind::OptionDdmmmyy => {
                    convert_date(date, DateFormat::Ddmmmyy, DateFormat::Yymmdd)?
                }
                _ => convert_date(date, DateFormat::Yymmdd, DateFormat::Yymmdd)?,
            };
            let strike = Decimal::from_str(strike).map_err(|_| invalid())?;
            let option_type = OptionKind::parse(kind).ok_or_else(invalid)?;

            Ok(unified(ParsedSymbol {
                base,
                quote,
                settle: Some(settle),
                expiry: Some(SmolStr::new(expiry)),
                strike: Some(strike),
                option_type: Some(option_type),
            }))
        }

        PatternKind::OptionUnknown => Err(SymbolError::PatternNotFound(MarketType::Option)),
    }
}

/// Check that a unified symbol can be converted for the given market type with the
/// provided recipes.
///
/// `market_type` defaults to the type implied by the symbol's derivative components.
/// Margin symbols fall back to the spot recipe.
pub fn validate_symbol_conversion(
    symbol: &str,
    patterns: &SymbolPatterns,
    market_type: Option<MarketType>,
) -> Result<(), SymbolError> {
    let parsed = symbol::parse(symbol)?;
    let market = market_type.unwrap_or_else(|| parsed.market_type());

    let pattern = match patterns.get(&market) {
        Some(pattern) => pattern,
        None if market == MarketType::Margin => patterns
            .get(&MarketType::Spot)
            .ok_or(SymbolError::PatternNotFound(market))?,
        None => return Err(SymbolError::PatternNotFound(market)),
    };

    if pattern.separator.is_empty() && !is_known_quote(parsed.quote.to_uppercase().as_str()) {
        return Err(SymbolError::UnknownQuoteCurrency(symbol.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Case;

    fn no_aliases() -> CurrencyAliases {
        CurrencyAliases::default()
    }

    #[test]
    fn test_normalize_longest_quote_match() {
        let format = SymbolFormat::new("", Case::Upper);
        assert_eq!(normalize("BTCUSDT", &format, &no_aliases()), "BTC/USDT");
        assert_eq!(normalize("BTCUSD", &format, &no_aliases()), "BTC/USD");
        assert_eq!(normalize("ETHFDUSD", &format, &no_aliases()), "ETH/FDUSD");
    }

    #[test]
    fn test_normalize_with_separator_and_case() {
        let format = SymbolFormat::new("_", Case::Lower);
        assert_eq!(normalize("btc_usdt", &format, &no_aliases()), "BTC/USDT");
    }

    #[test]
    fn test_normalize_best_effort_returns_input() {
        let format = SymbolFormat::new("", Case::Upper);
        assert_eq!(normalize("??????", &format, &no_aliases()), "??????");
        assert!(try_normalize("??????", &format, &no_aliases()).is_err());
    }

    #[test]
    fn test_normalize_kraken_pair() {
        let mut format = SymbolFormat::new("", Case::Upper);
        format.prefix = PrefixRule::Kraken;
        let aliases = CurrencyAliases::from_iter([("BTC", "XBT")]);
        assert_eq!(normalize("XXBTZUSD", &format, &aliases), "BTC/USD");
    }

    #[test]
    fn test_denormalize_then_normalize_with_aliases() {
        let mut format = SymbolFormat::new("", Case::Upper);
        format.prefix = PrefixRule::Kraken;
        let aliases = CurrencyAliases::from_iter([("BTC", "XBT"), ("DOGE", "XDG")]);

        for symbol in ["BTC/USD", "DOGE/EUR", "ETH/USDT"] {
            let id = denormalize(symbol, &format, &aliases);
            assert_eq!(normalize(&id, &format, &aliases), symbol);
        }
    }

    #[test]
    fn test_spot_round_trip() {
        let pattern = SymbolPattern::new(PatternKind::NoSeparatorUpper, "", Case::Upper);
        let id = to_exchange_id("BTC/USDT", &pattern, &no_aliases());
        assert_eq!(id, "BTCUSDT");
        assert_eq!(from_exchange_id(&id, &pattern, &no_aliases()), "BTC/USDT");
    }

    #[test]
    fn test_spot_kraken_prefix_round_trip() {
        let mut pattern = SymbolPattern::new(PatternKind::NoSeparatorUpper, "", Case::Upper);
        pattern.prefix = PrefixRule::Kraken;
        let aliases = CurrencyAliases::from_iter([("BTC", "XBT")]);

        let id = to_exchange_id("BTC/USD", &pattern, &aliases);
        assert_eq!(id, "XXBTZUSD");
        assert_eq!(from_exchange_id(&id, &pattern, &aliases), "BTC/USD");
    }

    #[test]
    fn test_swap_round_trip_linear_and_inverse() {
        let implicit = SymbolPattern::new(PatternKind::Implicit, "", Case::Upper);
        for symbol in ["BTC/USDT:USDT", "BTC/USD:BTC"] {
            let id = to_exchange_id(symbol, &implicit, &no_aliases());
            assert_eq!(from_exchange_id(&id, &implicit, &no_aliases()), symbol);
        }

        let suffixed = SymbolPattern::new(PatternKind::SuffixPerpetual, "_", Case::Upper);
        let id = to_exchange_id("ETH/USDT:USDT", &suffixed, &no_aliases());
        assert_eq!(id, "ETH_USDT_PERPETUAL");
        assert_eq!(from_exchange_id(&id, &suffixed, &no_aliases()), "ETH/USDT:USDT");
    }

    #[test]
    fn test_suffix_swap_drops_usd_quote_with_dash_separator() {
        let pattern = SymbolPattern::new(PatternKind::SuffixPerpetual, "-", Case::Upper);
        let id = to_exchange_id("BTC/USD:BTC", &pattern, &no_aliases());
        assert_eq!(id, "BTC-PERPETUAL");
        assert_eq!(from_exchange_id(&id, &pattern, &no_aliases()), "BTC/USD:BTC");
    }

    #[test]
    fn test_future_yymmdd_with_separated_quote_component() {
        let mut pattern = SymbolPattern::new(PatternKind::FutureYymmdd, "-", Case::Upper);
        pattern.component_order = vec!["base".into(), "quote".into(), "expiry".into()];

        let id = to_exchange_id("BTC/USD:BTC-260327", &pattern, &no_aliases());
        assert_eq!(id, "BTC-USD-260327");
        assert_eq!(
            from_exchange_id(&id, &pattern, &no_aliases()),
            "BTC/USD:BTC-260327"
        );
    }

    #[test]
    fn test_future_yymmdd_binance_style() {
        let pattern = SymbolPattern::new(PatternKind::FutureYymmdd, "_", Case::Upper);
        let id = to_exchange_id("BTC/USDT:USDT-260327", &pattern, &no_aliases());
        assert_eq!(id, "BTCUSDT_260327");
        assert_eq!(
            from_exchange_id(&id, &pattern, &no_aliases()),
            "BTC/USDT:USDT-260327"
        );
    }

    #[test]
    fn test_future_ddmmmyy_deribit_drops_usd_quote() {
        let pattern = SymbolPattern::new(PatternKind::FutureDdmmmyy, "-", Case::Upper);
        let id = to_exchange_id("BTC/USD:BTC-260327", &pattern, &no_aliases());
        assert_eq!(id, "BTC-27MAR26");
        assert_eq!(
            from_exchange_id(&id, &pattern, &no_aliases()),
            "BTC/USD:BTC-260327"
        );
    }

    #[test]
    fn test_future_ddmmmyy_bybit_keeps_quote() {
        let pattern = SymbolPattern::new(PatternKind::FutureDdmmmyy, "-", Case::Upper);
        let id = to_exchange_id("BTC/USDT:USDT-260327", &pattern, &no_aliases());
        assert_eq!(id, "BTC-USDT-27MAR26");
        assert_eq!(
            from_exchange_id(&id, &pattern, &no_aliases()),
            "BTC/USDT:USDT-260327"
        );
    }

    #[test]
    fn test_future_yyyymmdd_pads_century() {
        let pattern = SymbolPattern::new(PatternKind::FutureYyyymmdd, "_", Case::Upper);
        let id = to_exchange_id("BTC/USDT:USDT-260327", &pattern, &no_aliases());
        assert_eq!(id, "BTCUSDT_20260327");
        assert_eq!(
            from_exchange_id(&id, &pattern, &no_aliases()),
            "BTC/USDT:USDT-260327"
        );
    }

    #[test]
    fn test_option_ddmmmyy_deribit_style() {
        let pattern = SymbolPattern::new(PatternKind::OptionDdmmmyy, "-", Case::Upper);
        let id = to_exchange_id("BTC/USD:BTC-260112-84000-C", &pattern, &no_aliases());
        assert_eq!(id, "BTC-12JAN26-84000-C");
        assert_eq!(
            from_exchange_id(&id, &pattern, &no_aliases()),
            "BTC/USD:BTC-260112-84000-C"
        );
    }

    #[test]
    fn test_option_yymmdd_round_trip() {
        let pattern = SymbolPattern::new(PatternKind::OptionYymmdd, "-", Case::Upper);
        let id = to_exchange_id("BTC/USD:BTC-260112-84000-C", &pattern, &no_aliases());
        assert_eq!(id, "BTC-USD-260112-84000-C");
        assert_eq!(
            from_exchange_id(&id, &pattern, &no_aliases()),
            "BTC/USD:BTC-260112-84000-C"
        );
    }

    #[test]
    fn test_option_with_settle_round_trip() {
        let pattern = SymbolPattern::new(PatternKind::OptionWithSettle, "-", Case::Upper);
        let id = to_exchange_id("ETH/USDT:USDT-261225-4000-P", &pattern, &no_aliases());
        assert_eq!(id, "ETH-USDT-261225-4000-P");
        assert_eq!(
            from_exchange_id(&id, &pattern, &no_aliases()),
            "ETH/USDT:USDT-261225-4000-P"
        );
    }

    #[test]
    fn test_kraken_futures_contract_prefix_round_trip() {
        let mut pattern = SymbolPattern::new(PatternKind::Implicit, "", Case::Upper);
        pattern.prefix = PrefixRule::KrakenFutures;
        let aliases = CurrencyAliases::from_iter([("BTC", "XBT")]);

        let id = to_exchange_id("BTC/USD:BTC", &pattern, &aliases);
        assert_eq!(id, "PI_XBTUSD");
        assert_eq!(from_exchange_id(&id, &pattern, &aliases), "BTC/USD:BTC");
    }

    #[test]
    fn test_to_exchange_id_missing_expiry() {
        let pattern = SymbolPattern::new(PatternKind::FutureYymmdd, "_", Case::Upper);
        assert!(matches!(
            try_to_exchange_id("BTC/USDT:USDT", &pattern, &no_aliases()),
            Err(SymbolError::MissingComponent { .. })
        ));
    }

    #[test]
    fn test_validate_symbol_conversion() {
        let mut patterns = SymbolPatterns::new();
        patterns.insert(
            MarketType::Spot,
            SymbolPattern::new(PatternKind::NoSeparatorUpper, "", Case::Upper),
        );

        assert_eq!(
            validate_symbol_conversion("BTC/USDT", &patterns, None),
            Ok(())
        );
        assert_eq!(
            validate_symbol_conversion("not a symbol", &patterns, None),
            Err(SymbolError::InvalidFormat("not a symbol".to_string()))
        );
        assert_eq!(
            validate_symbol_conversion("BTC/USDT:USDT", &patterns, None),
            Err(SymbolError::PatternNotFound(MarketType::Swap))
        );
        assert_eq!(
            validate_symbol_conversion("BTC/OBSCURE", &patterns, None),
            Err(SymbolError::UnknownQuoteCurrency("BTC/OBSCURE".to_string()))
        );
        assert_eq!(
            validate_symbol_conversion("BTC/USDT", &patterns, Some(MarketType::Margin)),
            Ok(())
        );
    }
}
