use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use uniex_signing::{Method, SignConfig};
use uniex_symbol::{CurrencyAliases, MarketType, SymbolFormat, SymbolFormats, SymbolPattern,
    SymbolPatterns};

/// Highest on-disk spec format version this build understands. Newer files fail to load
/// with an upgrade-required error.
pub const CURRENT_SPEC_FORMAT_VERSION: u32 = 1;

/// Upstream support classification of an exchange.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    CertifiedPro,
    Pro,
    Supported,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::CertifiedPro => "certified_pro",
            Classification::Pro => "pro",
            Classification::Supported => "supported",
        }
    }
}

impl Display for Classification {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A unified method capability flag: implemented, absent, or synthesised from other
/// endpoints at runtime.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Capability {
    Flag(bool),
    Tag(EmulatedTag),
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmulatedTag {
    Emulated,
}

impl Capability {
    pub fn is_emulated(&self) -> bool {
        matches!(self, Capability::Tag(EmulatedTag::Emulated))
    }

    /// Whether the unified method is callable at all, natively or emulated.
    pub fn is_available(&self) -> bool {
        !matches!(self, Capability::Flag(false))
    }
}

/// API base url(s): a single url, or a section map for multi-API exchanges such as
/// spot vs. futures.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ApiUrls {
    Single(String),
    Sections(IndexMap<SmolStr, String>),
}

impl ApiUrls {
    /// Resolve the base url for an optional API section.
    ///
    /// With a section map and no section requested, the first declared section wins.
    pub fn resolve(&self, section: Option<&str>) -> Option<&str> {
        match (self, section) {
            (ApiUrls::Single(url), _) => Some(url.as_str()),
            (ApiUrls::Sections(sections), Some(section)) => {
                sections.get(section).map(String::as_str)
            }
            (ApiUrls::Sections(sections), None) => {
                sections.first().map(|(_, url)| url.as_str())
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ApiUrls::Single(url) => url.is_empty(),
            ApiUrls::Sections(sections) => {
                sections.is_empty() || sections.values().any(String::is_empty)
            }
        }
    }
}

/// Exchange url map with the required `api` entry and optional sandbox counterpart.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct Urls {
    pub api: ApiUrls,
    #[serde(default)]
    pub sandbox: Option<ApiUrls>,
    #[serde(default)]
    pub www: Option<String>,
    #[serde(default)]
    pub doc: Option<String>,
}

/// Declarative response transformer referenced by name from an endpoint record.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseTransformer {
    /// `[x]` -> `x`.
    UnwrapSingleElementList,
    /// Flat list with a `side` field -> `{bids, asks}` sorted by price.
    OrderBookFromFlatList,
    /// Walk nested keys, stopping at the first missing key.
    ExtractPath { path: Vec<String> },
    /// [`ExtractPath`](Self::ExtractPath) composed with
    /// [`UnwrapSingleElementList`](Self::UnwrapSingleElementList); an empty list becomes
    /// null.
    ExtractPathUnwrap { path: Vec<String> },
}

/// Body-level error detection config: how an HTTP 200 response signals failure.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseErrorConfig {
    /// A status field must hold one of `success_values`.
    SuccessCode {
        field: String,
        success_values: Vec<serde_json::Value>,
        #[serde(default)]
        code_field: Option<String>,
        #[serde(default)]
        message_field: Option<String>,
    },
    /// A non-null error object under `field` signals failure.
    ErrorPresent {
        field: String,
        #[serde(default)]
        code_field: Option<String>,
        #[serde(default)]
        message_field: Option<String>,
    },
    /// A non-empty error array under `field` signals failure.
    ErrorArray {
        field: String,
        #[serde(default)]
        code_field: Option<String>,
        #[serde(default)]
        message_field: Option<String>,
    },
    /// The mere presence of `field` signals failure.
    ErrorFieldPresent {
        field: String,
        #[serde(default)]
        code_field: Option<String>,
        #[serde(default)]
        message_field: Option<String>,
    },
}

/// Unified error variant names an exchange error code can map onto.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorVariant {
    RateLimited,
    InsufficientBalance,
    InvalidCredentials,
    InvalidParameters,
    OrderNotFound,
    InvalidOrder,
    MarketClosed,
    NetworkError,
    AccessRestricted,
    NotSupported,
    CircuitOpen,
    ExchangeError,
}

impl ErrorVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorVariant::RateLimited => "rate_limited",
            ErrorVariant::InsufficientBalance => "insufficient_balance",
            ErrorVariant::InvalidCredentials => "invalid_credentials",
            ErrorVariant::InvalidParameters => "invalid_parameters",
            ErrorVariant::OrderNotFound => "order_not_found",
            ErrorVariant::InvalidOrder => "invalid_order",
            ErrorVariant::MarketClosed => "market_closed",
            ErrorVariant::NetworkError => "network_error",
            ErrorVariant::AccessRestricted => "access_restricted",
            ErrorVariant::NotSupported => "not_supported",
            ErrorVariant::CircuitOpen => "circuit_open",
            ErrorVariant::ExchangeError => "exchange_error",
        }
    }
}

impl Display for ErrorVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An exchange error code mapping with its upstream description.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct ErrorCodeDetail {
    pub variant: ErrorVariant,
    #[serde(default)]
    pub description: Option<String>,
}

/// One callable endpoint of an exchange API.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct Endpoint {
    /// Unified method name, eg/ `fetch_ticker`. Unique per exchange.
    pub name: SmolStr,
    pub method: Method,
    pub path: String,
    #[serde(default)]
    pub auth: bool,
    /// Positional parameter names, in call order.
    #[serde(default)]
    pub params: Vec<SmolStr>,
    /// Section of a nested `urls.api` map this endpoint is served from.
    #[serde(default)]
    pub api_section: Option<SmolStr>,
    #[serde(default)]
    pub market_type: Option<MarketType>,
    #[serde(default)]
    pub response_transformer: Option<ResponseTransformer>,
    /// Result is derived or sampled upstream rather than exact.
    #[serde(default)]
    pub approximate: bool,
}

/// Coarse request pacing advertised by the exchange.
#[derive(Debug, Clone, Eq, PartialEq, Default, Deserialize, Serialize)]
pub struct RateLimits {
    #[serde(default)]
    pub max_requests: Option<u32>,
    #[serde(default)]
    pub interval_ms: Option<u64>,
}

/// Timestamp resolution of OHLCV rows returned by the exchange.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampResolution {
    Ms,
    Seconds,
}

impl Default for TimestampResolution {
    fn default() -> Self {
        Self::Ms
    }
}

fn default_true() -> bool {
    true
}

/// Which credential fields the exchange requires for private endpoints.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct RequiredCredentials {
    #[serde(default = "default_true")]
    pub api_key: bool,
    #[serde(default = "default_true")]
    pub secret: bool,
    #[serde(default)]
    pub password: bool,
}

impl Default for RequiredCredentials {
    fn default() -> Self {
        Self {
            api_key: true,
            secret: true,
            password: false,
        }
    }
}

/// Canonical immutable record of one exchange, produced by the offline extractor and
/// consumed at build time. Read-only after load.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Spec {
    /// Lowercase exchange identifier, eg/ `binance`.
    pub id: SmolStr,
    pub name: String,
    pub classification: Classification,
    #[serde(default)]
    pub version: Option<String>,
    pub urls: Urls,
    pub signing: SignConfig,
    #[serde(default)]
    pub has: BTreeMap<SmolStr, Capability>,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    /// Single-market identifier format; multi-market exchanges use `symbol_formats`.
    #[serde(default)]
    pub symbol_format: Option<SymbolFormat>,
    #[serde(default)]
    pub symbol_formats: SymbolFormats,
    #[serde(default)]
    pub symbol_patterns: SymbolPatterns,
    #[serde(default)]
    pub currency_aliases: CurrencyAliases,
    #[serde(default)]
    pub error_codes: BTreeMap<SmolStr, ErrorVariant>,
    #[serde(default)]
    pub error_code_details: BTreeMap<SmolStr, ErrorCodeDetail>,
    #[serde(default)]
    pub response_error: Option<ResponseErrorConfig>,
    #[serde(default)]
    pub rate_limits: Option<RateLimits>,
    #[serde(default)]
    pub features: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub fees: Option<serde_json::Value>,
    #[serde(default)]
    pub options: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub ohlcv_timestamp_resolution: TimestampResolution,
    #[serde(default)]
    pub path_prefix: Option<String>,
    /// Unified field name -> exchange field name request param renames.
    #[serde(default)]
    pub param_mappings: BTreeMap<SmolStr, SmolStr>,
    #[serde(default)]
    pub required_credentials: RequiredCredentials,
    pub spec_format_version: u32,
}

impl Spec {
    /// Look up an endpoint by unified method name.
    pub fn endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|endpoint| endpoint.name == name)
    }

    /// Capability flag for a unified method; absent flags read as `false`.
    pub fn capability(&self, method: &str) -> Capability {
        self.has
            .get(method)
            .copied()
            .unwrap_or(Capability::Flag(false))
    }

    /// Whether a unified method is flagged as emulated.
    pub fn is_emulated(&self, method: &str) -> bool {
        self.capability(method).is_emulated()
    }

    /// Whether a unified method is callable, natively or through an endpoint of the
    /// same name.
    pub fn supports(&self, method: &str) -> bool {
        self.capability(method).is_available() || self.endpoint(method).is_some()
    }

    /// Identifier format for one market type, falling back to the single-market format.
    pub fn symbol_format_for(&self, market_type: MarketType) -> Option<&SymbolFormat> {
        self.symbol_formats
            .get(&market_type)
            .or(self.symbol_format.as_ref())
    }

    /// Conversion recipe for one market type. Margin falls back to the spot recipe.
    pub fn symbol_pattern_for(&self, market_type: MarketType) -> Option<&SymbolPattern> {
        self.symbol_patterns.get(&market_type).or_else(|| {
            (market_type == MarketType::Margin)
                .then(|| self.symbol_patterns.get(&MarketType::Spot))
                .flatten()
        })
    }

    /// Resolve the base url for a call, honouring sandbox mode and the endpoint's API
    /// section.
    pub fn api_url(&self, section: Option<&str>, sandbox: bool) -> Option<&str> {
        if sandbox {
            self.urls.sandbox.as_ref()?.resolve(section)
        } else {
            self.urls.api.resolve(section)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_deserialize() {
        let has = serde_json::from_str::<BTreeMap<SmolStr, Capability>>(
            r#"{"fetch_ticker": "emulated", "fetch_tickers": true, "create_order": false}"#,
        )
        .unwrap();
        assert!(has["fetch_ticker"].is_emulated());
        assert!(has["fetch_tickers"].is_available());
        assert!(!has["create_order"].is_available());
    }

    #[test]
    fn test_api_urls_resolve() {
        let single = ApiUrls::Single("https://api.example.com".into());
        assert_eq!(single.resolve(None), Some("https://api.example.com"));
        assert_eq!(single.resolve(Some("spot")), Some("https://api.example.com"));

        let sections = serde_json::from_str::<ApiUrls>(
            r#"{"spot": "https://spot.example.com", "futures": "https://futures.example.com"}"#,
        )
        .unwrap();
        assert_eq!(
            sections.resolve(Some("futures")),
            Some("https://futures.example.com")
        );
        assert_eq!(sections.resolve(None), Some("https://spot.example.com"));
        assert_eq!(sections.resolve(Some("margin")), None);
    }

    #[test]
    fn test_response_transformer_deserialize() {
        let transformer = serde_json::from_str::<ResponseTransformer>(
            r#"{"type": "extract_path", "path": ["result", "list"]}"#,
        )
        .unwrap();
        assert_eq!(
            transformer,
            ResponseTransformer::ExtractPath {
                path: vec!["result".into(), "list".into()]
            }
        );
    }
}
