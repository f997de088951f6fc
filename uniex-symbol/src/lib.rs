#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms,
    rust_2024_compatibility
)]
#![allow(clippy::type_complexity, clippy::too_many_arguments, type_alias_bounds)]

//! # Uniex-Symbol
//! Unified symbol grammar and exchange identifier conversion for the Uniex ecosystem.
//!
//! Every market across every supported exchange is addressed with one canonical grammar,
//! `BASE/QUOTE[:SETTLE[-EXPIRY[-STRIKE-TYPE]]]`, and converted to and from the
//! exchange-native identifier using per-exchange conversion recipes detected during
//! extraction:
//! * **Parsing & building**: [`parse`] / [`build`] between the unified grammar and
//!   [`ParsedSymbol`] components.
//! * **Plain conversion**: [`normalize`] / [`denormalize`] between unified symbols and
//!   separator/case formatted exchange pairs.
//! * **Derivative conversion**: [`to_exchange_id`] / [`from_exchange_id`] applying
//!   spot, swap, future and option recipes, including expiry date re-encoding.
//!
//! All operations are pure functions with no shared state.

/// Unified -> exchange currency alias tables, eg/ `{"BTC": "XBT"}`.
pub mod alias;

/// Conversion between unified symbols and exchange identifiers using detected recipes.
pub mod convert;

/// Derivative expiry date encodings and conversion between them.
pub mod date;

/// Symbol grammar and conversion errors.
pub mod error;

/// Identifier formats and detected conversion recipes.
pub mod format;

/// Kraken currency padding and KrakenFutures contract prefixes.
pub mod kraken;

/// Market types and option rights.
pub mod market;

/// The unified symbol grammar: parsing and building.
pub mod symbol;

pub use alias::CurrencyAliases;
pub use convert::{
    denormalize, from_exchange_id, normalize, to_exchange_id, try_denormalize,
    try_from_exchange_id, try_normalize, try_to_exchange_id, validate_symbol_conversion,
};
pub use date::{DateFormat, convert_date};
pub use error::SymbolError;
pub use format::{
    Case, PatternKind, PrefixRule, SymbolFormat, SymbolFormats, SymbolPattern, SymbolPatterns,
};
pub use market::{MarketType, OptionKind};
pub use symbol::{ParsedSymbol, build, parse};
