//! Per-exchange facades, generated at build time from the declarative specs under
//! `specs/`.
//!
//! Each exchange gets one struct with one async method per endpoint (public endpoints
//! take `(positional.., options)`, private ones `(credentials, positional.., options)`),
//! wrappers for its emulated methods, the `request`/`raw_request` passthroughs, and
//! introspection accessors. All of them delegate to the shared
//! [`ExchangeClient`](crate::client::ExchangeClient) runtime.

mod generated {
    include!(concat!(env!("OUT_DIR"), "/exchanges.rs"));
}

pub use generated::*;
