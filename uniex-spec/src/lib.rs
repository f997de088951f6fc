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

//! # Uniex-Spec
//! The declarative exchange specification model consumed at build time by the Uniex
//! facade generator.
//!
//! One [`Spec`] per exchange, produced by an offline extractor, loaded once per process
//! and never mutated: endpoints, signing parameterisation, symbol formats and conversion
//! recipes, capability flags, error code maps and body-level error detection.
//!
//! * [`loader`] materialises a [`Spec`] from the on-disk form, gating the
//!   `spec_format_version`.
//! * [`validator`] enforces structural invariants at build time and logs semantic
//!   warnings.
//! * [`coercion`] carries the instruction lists translating raw response maps into
//!   canonically named records for the external typed layer.

/// Instruction lists translating raw response maps to typed records.
pub mod coercion;

/// Spec load and validation errors.
pub mod error;

/// Materialise a [`Spec`] from its on-disk declarative form.
pub mod loader;

/// The [`Spec`] data model.
pub mod spec;

/// Build-time structural validation and semantic warnings.
pub mod validator;

pub use coercion::{CoerceKind, CoercionInstruction, apply as apply_coercion, get_field};
pub use error::{LoadError, ValidateError};
pub use loader::{from_str, load};
pub use spec::{
    ApiUrls, CURRENT_SPEC_FORMAT_VERSION, Capability, Classification, Endpoint, ErrorCodeDetail,
    ErrorVariant, RateLimits, RequiredCredentials, ResponseErrorConfig, ResponseTransformer, Spec,
    TimestampResolution, Urls,
};
pub use validator::validate;
