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

//! # Uniex-Signing
//! The request authentication recipe library shared by every Uniex exchange integration.
//!
//! Around eight parameterised [`SigningPattern`]s cover 95%+ of supported exchanges; each
//! turns an un-authenticated [`Request`] plus [`Credentials`] and a per-exchange
//! [`SignConfig`] into a [`SignedRequest`] ready for the HTTP collaborator.
//!
//! Signing is pure: no I/O, and the only ambient input - time - is injected through the
//! [`Clock`] trait so signatures are deterministic in tests.

/// Injectable time source and timestamp encodings.
pub mod clock;

/// Signing pattern identifiers and per-exchange parameterisation.
pub mod config;

/// Caller-owned API credentials.
pub mod credentials;

/// Signature digest output encodings.
pub mod encoder;

/// Request authentication errors.
pub mod error;

/// Signing input and output shapes.
pub mod request;

/// The pattern implementations and the [`sign`] entry point.
pub mod sign;

pub use clock::{Clock, FixedClock, SystemClock, TimestampFormat};
pub use config::{SignConfig, SigningPattern};
pub use credentials::Credentials;
pub use encoder::SignatureEncoding;
pub use error::SigningError;
pub use request::{Method, Request, SignedRequest};
pub use sign::{CustomSign, sign, sign_with};

/// Every supported pattern name, for introspection and spec validation.
pub fn patterns() -> Vec<&'static str> {
    SigningPattern::all()
        .iter()
        .map(SigningPattern::as_str)
        .collect()
}

/// Whether `name` is a supported pattern name.
pub fn is_pattern(name: &str) -> bool {
    SigningPattern::is_pattern(name)
}
