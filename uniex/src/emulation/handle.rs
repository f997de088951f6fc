use crate::{client::ExchangeClient, config::CallOptions, error::ExchangeError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use uniex_signing::Credentials;

/// The facade surface emulation handlers compose against.
///
/// Handlers never hold a module or client type directly; the cycle between facade and
/// emulation is cut by this interface, supplied by the facade at dispatch time.
#[async_trait]
pub trait ExchangeHandle: Send + Sync {
    fn exchange_id(&self) -> &str;

    /// Whether a unified method is callable, natively or emulated.
    fn endpoint_available(&self, name: &str) -> bool;

    /// Whether a unified method requires credentials.
    fn auth_required(&self, name: &str) -> bool;

    async fn call(
        &self,
        name: &str,
        params: &Map<String, Value>,
        options: &CallOptions,
        credentials: Option<&Credentials>,
    ) -> Result<Value, ExchangeError>;
}

#[async_trait]
impl ExchangeHandle for ExchangeClient {
    fn exchange_id(&self) -> &str {
        self.id()
    }

    fn endpoint_available(&self, name: &str) -> bool {
        self.spec().supports(name)
    }

    fn auth_required(&self, name: &str) -> bool {
        self.spec()
            .endpoint(name)
            .map(|endpoint| endpoint.auth)
            .unwrap_or(false)
    }

    async fn call(
        &self,
        name: &str,
        params: &Map<String, Value>,
        options: &CallOptions,
        credentials: Option<&Credentials>,
    ) -> Result<Value, ExchangeError> {
        self.call_with_params(name, params.clone(), options, credentials)
            .await
    }
}
