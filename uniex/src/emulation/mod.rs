use crate::{config::CallOptions, error::ExchangeError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smol_str::SmolStr;
use std::{
    collections::BTreeMap,
    sync::{Arc, OnceLock, RwLock},
};
use tracing::warn;
use uniex_signing::Credentials;
use uniex_spec::Spec;

/// The [`ExchangeHandle`] seam emulation reaches the facade through.
pub mod handle;

/// Since/limit windowing and raw-entry field access shared by the handlers.
pub mod filter;

mod handlers;

pub use handle::ExchangeHandle;

/// Whether an emulated method is synthesised for REST or WebSocket calls.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Rest,
    Ws,
}

fn default_scope() -> Scope {
    Scope::Rest
}

/// One entry of the emulated-methods extraction file.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct EmulatedEntry {
    pub name: SmolStr,
    #[serde(default = "default_scope")]
    pub scope: Scope,
    #[serde(default)]
    pub reasons: Vec<String>,
}

/// Index of which unified method is emulated on which exchange, keyed
/// `exchange -> scope -> method`.
#[derive(Debug, Default, Clone)]
pub struct EmulationIndex {
    entries: BTreeMap<SmolStr, BTreeMap<(Scope, SmolStr), EmulatedEntry>>,
}

impl EmulationIndex {
    pub fn entry(&self, exchange: &str, scope: Scope, method: &str) -> Option<&EmulatedEntry> {
        self.entries
            .get(exchange)
            .and_then(|methods| methods.get(&(scope, SmolStr::new(method))))
    }

    pub fn is_emulated(&self, exchange: &str, scope: Scope, method: &str) -> bool {
        self.entry(exchange, scope, method).is_some()
    }

    /// Every emulated method recorded for an exchange, both scopes.
    pub fn methods_for(&self, exchange: &str) -> Vec<&EmulatedEntry> {
        self.entries
            .get(exchange)
            .map(|methods| methods.values().collect())
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct EmulatedMethodsFile {
    emulated_methods: BTreeMap<SmolStr, Vec<EmulatedEntry>>,
}

const EMULATED_METHODS_JSON: &str = include_str!("../../data/emulated_methods.json");

fn build_index() -> Arc<EmulationIndex> {
    let file = match serde_json::from_str::<EmulatedMethodsFile>(EMULATED_METHODS_JSON) {
        Ok(file) => file,
        Err(error) => {
            warn!(%error, "emulated methods file is malformed; emulation index is empty");
            return Arc::new(EmulationIndex::default());
        }
    };

    let entries = file
        .emulated_methods
        .into_iter()
        .map(|(exchange, methods)| {
            let methods = methods
                .into_iter()
                .map(|entry| ((entry.scope, entry.name.clone()), entry))
                .collect();
            (exchange, methods)
        })
        .collect();

    Arc::new(EmulationIndex { entries })
}

fn index_cell() -> &'static RwLock<Arc<EmulationIndex>> {
    static INDEX: OnceLock<RwLock<Arc<EmulationIndex>>> = OnceLock::new();
    INDEX.get_or_init(|| RwLock::new(build_index()))
}

/// The process-lifetime emulation index, built on first use.
///
/// Concurrent first readers may race the build; the result is a pure function of the
/// embedded extraction file, so last-writer-wins publication is safe.
pub fn index() -> Arc<EmulationIndex> {
    index_cell()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// Rebuild the index from the extraction file. Test hook.
pub fn reload() {
    *index_cell()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = build_index();
}

/// Everything an emulation handler may touch: the facade handle, the raw call params,
/// the call options and the caller's credentials.
#[derive(Clone)]
pub struct EmulationContext<'a> {
    pub handle: Option<&'a dyn ExchangeHandle>,
    pub params: Map<String, Value>,
    pub options: CallOptions,
    pub credentials: Option<&'a Credentials>,
}

impl std::fmt::Debug for EmulationContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmulationContext")
            .field("handle", &self.handle.map(|handle| handle.exchange_id()))
            .field("params", &self.params)
            .field("options", &self.options)
            .finish()
    }
}

impl<'a> EmulationContext<'a> {
    pub fn new(handle: &'a dyn ExchangeHandle) -> Self {
        Self {
            handle: Some(handle),
            params: Map::new(),
            options: CallOptions::default(),
            credentials: None,
        }
    }

    fn handle(&self) -> Result<&'a dyn ExchangeHandle, ExchangeError> {
        self.handle.ok_or_else(|| {
            ExchangeError::invalid_parameters("Emulation context missing exchange module")
        })
    }

    fn available(&self, method: &str) -> bool {
        self.handle
            .map(|handle| handle.endpoint_available(method))
            .unwrap_or(false)
    }

    fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    fn param_i64(&self, key: &str) -> Option<i64> {
        match self.params.get(key) {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.parse().ok(),
            _ => None,
        }
    }

    fn param_usize(&self, key: &str) -> Option<usize> {
        self.param_i64(key).and_then(|value| usize::try_from(value).ok())
    }

    fn require_param(&self, method: &str, key: &str) -> Result<&str, ExchangeError> {
        self.param_str(key).ok_or_else(|| {
            ExchangeError::invalid_parameters(format!("{method} requires a {key} argument"))
        })
    }

    /// Params with the listed keys removed, for downstream calls that must not see them.
    fn params_without(&self, keys: &[&str]) -> Map<String, Value> {
        self.params
            .iter()
            .filter(|(key, _)| !keys.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Call a downstream unified method through the facade handle.
    async fn call(
        &self,
        method: &str,
        params: Map<String, Value>,
    ) -> Result<Value, ExchangeError> {
        self.handle()?
            .call(method, &params, &self.options, self.credentials)
            .await
    }

    /// Call a downstream method the emulated method cannot work without.
    async fn call_required(
        &self,
        emulated: &str,
        downstream: &str,
        params: Map<String, Value>,
    ) -> Result<Value, ExchangeError> {
        let handle = self.handle()?;
        if !handle.endpoint_available(downstream) {
            return Err(ExchangeError::not_supported(emulated));
        }
        handle
            .call(downstream, &params, &self.options, self.credentials)
            .await
    }
}

/// Outcome of an emulation dispatch attempt.
#[derive(Debug)]
pub enum Dispatch {
    /// Not emulated for this exchange; the facade proceeds to the normal HTTP path.
    Passthrough,
    Handled(Result<Value, ExchangeError>),
}

/// Dispatch an emulated method.
///
/// Returns [`Dispatch::Passthrough`] unless the spec flags the method as emulated *and*
/// a handler is implemented for it, regardless of context.
pub async fn dispatch(
    spec: &Spec,
    method: &str,
    scope: Scope,
    context: &EmulationContext<'_>,
) -> Dispatch {
    if scope == Scope::Ws {
        // WebSocket emulation is routed by the (external) WS dispatcher.
        return Dispatch::Passthrough;
    }
    if !spec.is_emulated(method) {
        return Dispatch::Passthrough;
    }
    handlers::dispatch(method, context).await
}
