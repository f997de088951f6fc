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

//! # Uniex
//! A unified typed client for cryptocurrency exchange REST APIs - batteries included.
//!
//! One declarative spec per exchange drives everything: a build script turns the specs
//! into per-exchange facades ([`exchange`]), each endpoint call flowing through the
//! shared [`ExchangeClient`](client::ExchangeClient) runtime for symbol conversion,
//! request signing, rate-limit pacing, circuit breaking, error classification and
//! response transformation. Methods an exchange lacks natively are synthesised from
//! the endpoints it does have by the [`emulation`] dispatcher.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use uniex::{
//!     config::CallOptions,
//!     exchange::Binance,
//!     transport::ReqwestTransport,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let binance = Binance::new(Arc::new(ReqwestTransport::new()));
//!
//!     let ticker = binance
//!         .fetch_ticker("BTC/USDT", CallOptions::default())
//!         .await
//!         .unwrap();
//!     println!("{ticker}");
//! }
//! ```

/// Per-exchange circuit breaker: the `circuit_open` fast path.
pub mod circuit;

/// The [`ExchangeClient`](client::ExchangeClient) runtime behind every generated facade.
pub mod client;

/// Process-scoped runtime defaults and per-call options.
pub mod config;

/// Synthesis of missing unified methods from the endpoints an exchange does have.
pub mod emulation;

/// The unified error taxonomy and response classifier.
pub mod error;

/// Generated per-exchange facades.
pub mod exchange;

/// Exchange reachability checks composed from `fetch_time`.
pub mod health;

/// Concurrent many-exchange invocation with partial-failure semantics.
pub mod multi;

/// Sliding-window request pacing.
pub mod rate_limit;

/// Classification registry and cross-exchange capability discovery.
pub mod registry;

/// Spec-aware unified symbol conversion entry points.
pub mod symbol;

/// The versioned telemetry event contract.
pub mod telemetry;

/// Declarative response transformers applied after a successful call.
pub mod transformer;

/// The HTTP collaborator seam, with `reqwest` and mock implementations.
pub mod transport;

pub use client::{ExchangeClient, InstructionCoercer, ResponseCoercer};
pub use config::{CallOptions, CircuitBreakerConfig, RetryPolicy, RuntimeConfig};
pub use error::ExchangeError;
pub use multi::{MultiError, MultiOptions, MultiResults};
pub use uniex_signing::{Credentials, Method};
pub use uniex_spec::{Classification, ErrorVariant, Spec};
pub use uniex_symbol::MarketType;
