use crate::{
    circuit::{CircuitBreaker, CircuitState},
    config::{CallOptions, RetryPolicy, RuntimeConfig},
    emulation::{self, Dispatch, EmulationContext, Scope},
    error::{ExchangeError, classify_body, classify_status},
    rate_limit::RateLimiter,
    telemetry::{NoopTelemetry, TelemetryEvent, TelemetryHook},
    transformer,
    transport::{HttpTransport, TransportError, TransportRequest},
};
use chrono::Utc;
use serde_json::{Map, Value};
use smol_str::SmolStr;
use std::{
    collections::BTreeMap,
    fmt::Debug,
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::debug;
use uniex_signing::{
    Clock, Credentials, Method, Request, SignConfig, SignedRequest, SystemClock, sign,
};
use uniex_spec::{Classification, Endpoint, ErrorVariant, Spec};
use uniex_symbol::MarketType;

/// Hook handing successful response maps to the external typed layer.
///
/// The default is identity; `CallOptions::raw` bypasses it entirely.
pub trait ResponseCoercer: Send + Sync + Debug {
    fn coerce(&self, exchange: &str, endpoint: &str, value: Value) -> Value;
}

/// [`ResponseCoercer`] driven by declarative instruction lists, keyed by
/// `(exchange, endpoint)`. Responses without an instruction list pass through
/// untouched; list responses are coerced element-wise.
#[derive(Debug, Default)]
pub struct InstructionCoercer {
    instructions: BTreeMap<(SmolStr, SmolStr), Vec<uniex_spec::CoercionInstruction>>,
}

impl InstructionCoercer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instructions<E, M>(
        mut self,
        exchange: E,
        endpoint: M,
        instructions: Vec<uniex_spec::CoercionInstruction>,
    ) -> Self
    where
        E: Into<SmolStr>,
        M: Into<SmolStr>,
    {
        self.instructions
            .insert((exchange.into(), endpoint.into()), instructions);
        self
    }
}

impl ResponseCoercer for InstructionCoercer {
    fn coerce(&self, exchange: &str, endpoint: &str, value: Value) -> Value {
        let key = (SmolStr::new(exchange), SmolStr::new(endpoint));
        let Some(instructions) = self.instructions.get(&key) else {
            return value;
        };
        match value {
            Value::Array(entries) => Value::Array(
                entries
                    .iter()
                    .map(|entry| uniex_spec::apply_coercion(instructions, entry))
                    .collect(),
            ),
            other => uniex_spec::apply_coercion(instructions, &other),
        }
    }
}

/// Runtime behind every generated exchange facade.
///
/// Owns the dispatch order for a unified call: emulation check, symbol conversion, url
/// resolution, param renames, rate-limit permit, signing, transport, error
/// classification, response transformation and the coercion hand-off.
#[derive(Debug)]
pub struct ExchangeClient {
    spec: Arc<Spec>,
    transport: Arc<dyn HttpTransport>,
    config: RuntimeConfig,
    clock: Arc<dyn Clock>,
    telemetry: Arc<dyn TelemetryHook>,
    coercer: Option<Arc<dyn ResponseCoercer>>,
    rate_limiter: RateLimiter,
    breaker: CircuitBreaker,
}

impl ExchangeClient {
    pub fn new(spec: Arc<Spec>, transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_config(spec, transport, RuntimeConfig::default())
    }

    pub fn with_config(
        spec: Arc<Spec>,
        transport: Arc<dyn HttpTransport>,
        config: RuntimeConfig,
    ) -> Self {
        let rate_limiter = RateLimiter::from_config(&config, spec.rate_limits.as_ref());
        let breaker = CircuitBreaker::new(config.circuit_breaker);
        Self {
            spec,
            transport,
            config,
            clock: Arc::new(SystemClock),
            telemetry: Arc::new(NoopTelemetry),
            coercer: None,
            rate_limiter,
            breaker,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetryHook>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn with_coercer(mut self, coercer: Arc<dyn ResponseCoercer>) -> Self {
        self.coercer = Some(coercer);
        self
    }

    // Introspection accessors exposed verbatim on every generated facade.

    pub fn spec(&self) -> &Spec {
        &self.spec
    }

    pub fn id(&self) -> &str {
        &self.spec.id
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.spec.endpoints
    }

    pub fn signing(&self) -> &SignConfig {
        &self.spec.signing
    }

    pub fn classification(&self) -> Classification {
        self.spec.classification
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// Invoke a unified method with named positional arguments.
    ///
    /// Positional arguments win over `options.params` on key collisions.
    pub async fn call(
        &self,
        name: &str,
        args: &[(&str, Value)],
        options: CallOptions,
        credentials: Option<&Credentials>,
    ) -> Result<Value, ExchangeError> {
        let mut params = Map::new();
        for (key, value) in args {
            if !value.is_null() {
                params.insert((*key).to_string(), value.clone());
            }
        }
        for (key, value) in &options.params {
            params
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        self.call_with_params(name, params, &options, credentials)
            .await
    }

    /// Full dispatch for a unified method with an already-merged param map.
    pub async fn call_with_params(
        &self,
        name: &str,
        params: Map<String, Value>,
        options: &CallOptions,
        credentials: Option<&Credentials>,
    ) -> Result<Value, ExchangeError> {
        // Emulated methods are synthesised from other endpoints instead of hitting a
        // dedicated wire call.
        if self.spec.is_emulated(name) {
            let context = EmulationContext {
                handle: Some(self),
                params: params.clone(),
                options: options.clone(),
                credentials,
            };
            match emulation::dispatch(&self.spec, name, Scope::Rest, &context).await {
                Dispatch::Passthrough => {}
                Dispatch::Handled(result) => return result,
            }
        }

        let endpoint = self
            .spec
            .endpoint(name)
            .ok_or_else(|| ExchangeError::not_supported(name).with_exchange(self.spec.id.clone()))?
            .clone();

        let mut params = params;
        self.convert_symbol_params(&endpoint, &mut params)?;
        self.inject_broker_id(name, &mut params);
        self.apply_param_mappings(&mut params);

        let request = self.build_request(&endpoint, params)?;
        let sandbox = options.sandbox || credentials.is_some_and(|creds| creds.sandbox);
        let base_url = self
            .spec
            .api_url(endpoint.api_section.as_deref(), sandbox)
            .ok_or_else(|| {
                ExchangeError::invalid_parameters(if sandbox {
                    "sandbox url is not configured for this exchange"
                } else {
                    "api url is not configured for this exchange"
                })
            })?
            .to_string();

        let outbound = self.prepare(&endpoint, request, credentials)?;
        let response = self
            .perform(&SmolStr::new(name), outbound, Some(&base_url), options)
            .await?;

        let response = match &endpoint.response_transformer {
            Some(transformer) => transformer::apply(transformer, response),
            None => response,
        };

        if options.raw {
            return Ok(response);
        }
        Ok(match &self.coercer {
            Some(coercer) => coercer.coerce(&self.spec.id, name, response),
            None => response,
        })
    }

    /// Signed passthrough using this exchange's signing config, for endpoints the spec
    /// does not model.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        options: CallOptions,
        credentials: Option<&Credentials>,
    ) -> Result<Value, ExchangeError> {
        let mut request = Request::new(method, path);
        request.params = stringify_params(&options.params);

        let sandbox = options.sandbox || credentials.is_some_and(|creds| creds.sandbox);
        let base_url = self
            .spec
            .api_url(None, sandbox)
            .ok_or_else(|| ExchangeError::invalid_parameters("api url is not configured"))?
            .to_string();

        let outbound = match credentials {
            Some(credentials) => {
                credentials.validate()?;
                Outbound::Private {
                    request,
                    credentials,
                }
            }
            None => Outbound::Public(request),
        };

        self.perform(&SmolStr::new("request"), outbound, Some(&base_url), &options)
            .await
    }

    /// Unsigned escape hatch: no signing, no url rewriting.
    pub async fn raw_request(
        &self,
        method: Method,
        url: &str,
        headers: Vec<(String, String)>,
        body: Option<String>,
        options: CallOptions,
    ) -> Result<Value, ExchangeError> {
        let signed = SignedRequest {
            method,
            url: url.to_string(),
            headers,
            body,
        };
        self.perform(&SmolStr::new("raw_request"), Outbound::Signed(signed), None, &options)
            .await
    }

    /// Convert unified `symbol` / `symbols` params into exchange identifiers.
    fn convert_symbol_params(
        &self,
        endpoint: &Endpoint,
        params: &mut Map<String, Value>,
    ) -> Result<(), ExchangeError> {
        if let Some(symbol) = params.get("symbol").and_then(Value::as_str) {
            let converted = self.to_exchange_symbol(symbol, endpoint.market_type)?;
            params.insert("symbol".into(), Value::String(converted.to_string()));
        }

        if let Some(symbols) = params.get("symbols").and_then(Value::as_array).cloned() {
            let converted = symbols
                .iter()
                .map(|symbol| match symbol.as_str() {
                    Some(symbol) => self
                        .to_exchange_symbol(symbol, endpoint.market_type)
                        .map(|id| Value::String(id.to_string())),
                    None => Ok(symbol.clone()),
                })
                .collect::<Result<Vec<_>, _>>()?;
            params.insert("symbols".into(), Value::Array(converted));
        }

        Ok(())
    }

    /// Unified -> exchange symbol via the market type's conversion recipe, falling back
    /// to the plain identifier format, then to passthrough for spec-less markets.
    pub fn to_exchange_symbol(
        &self,
        symbol: &str,
        market_hint: Option<MarketType>,
    ) -> Result<SmolStr, ExchangeError> {
        let parsed_market = uniex_symbol::parse(symbol)
            .map(|parsed| parsed.market_type())
            .ok();
        let market = market_hint.or(parsed_market).unwrap_or(MarketType::Spot);

        if let Some(pattern) = self.spec.symbol_pattern_for(market) {
            Ok(uniex_symbol::try_to_exchange_id(
                symbol,
                pattern,
                &self.spec.currency_aliases,
            )?)
        } else if let Some(format) = self.spec.symbol_format_for(market) {
            Ok(uniex_symbol::try_denormalize(
                symbol,
                format,
                &self.spec.currency_aliases,
            )?)
        } else {
            Ok(SmolStr::new(symbol))
        }
    }

    fn inject_broker_id(&self, name: &str, params: &mut Map<String, Value>) {
        if let Some(broker_id) = &self.config.broker_id {
            if name.starts_with("create_order") {
                params
                    .entry("broker_id".to_string())
                    .or_insert_with(|| Value::String(broker_id.clone()));
            }
        }
    }

    /// Rename unified param keys to the exchange's field names.
    fn apply_param_mappings(&self, params: &mut Map<String, Value>) {
        for (unified, exchange_name) in &self.spec.param_mappings {
            if let Some(value) = params.remove(unified.as_str()) {
                params.insert(exchange_name.to_string(), value);
            }
        }
    }

    /// Assemble the internal signing input: prefixed path, plus params carried as query
    /// or JSON body depending on the method and signing convention.
    fn build_request(
        &self,
        endpoint: &Endpoint,
        params: Map<String, Value>,
    ) -> Result<Request, ExchangeError> {
        let path = match &self.spec.path_prefix {
            Some(prefix) => format!("{}{}", prefix.trim_end_matches('/'), endpoint.path),
            None => endpoint.path.clone(),
        };

        let mut request = Request::new(endpoint.method, path);
        // Query-signing and nonce-body patterns consume `request.params` directly and
        // build their own wire encoding; JSON-body exchanges get a serialised body.
        let params_stay_params = matches!(
            self.spec.signing.pattern,
            uniex_signing::SigningPattern::HmacSha256Query
                | uniex_signing::SigningPattern::HmacSha512Nonce
        );
        match endpoint.method {
            Method::Get | Method::Delete => request.params = stringify_params(&params),
            _ if params_stay_params => request.params = stringify_params(&params),
            _ => {
                if !params.is_empty() {
                    request.body = Some(
                        serde_json::to_string(&Value::Object(params)).map_err(|error| {
                            ExchangeError::invalid_parameters(format!(
                                "request body serialisation: {error}"
                            ))
                        })?,
                    );
                }
            }
        }
        Ok(request)
    }

    /// Check credential requirements for private requests.
    ///
    /// Signing itself is deferred until a rate-limit permit is held, so a rejected
    /// call never consumes a permit and timestamps never pre-date the send.
    fn prepare<'a>(
        &self,
        endpoint: &Endpoint,
        request: Request,
        credentials: Option<&'a Credentials>,
    ) -> Result<Outbound<'a>, ExchangeError> {
        if !endpoint.auth {
            return Ok(Outbound::Public(request));
        }

        let credentials = credentials.ok_or_else(|| {
            ExchangeError::invalid_credentials(format!(
                "{} requires credentials",
                endpoint.name
            ))
        })?;
        if self.spec.required_credentials.password && credentials.password.is_none() {
            return Err(ExchangeError::invalid_credentials(
                "this exchange requires a password credential",
            ));
        }
        credentials.validate()?;

        Ok(Outbound::Private {
            request,
            credentials,
        })
    }

    /// Execute an outbound request: circuit fast path, then per attempt a rate-limit
    /// permit, a fresh signature, the transport round trip, error classification and
    /// telemetry.
    async fn perform(
        &self,
        method_label: &SmolStr,
        outbound: Outbound<'_>,
        base_url: Option<&str>,
        options: &CallOptions,
    ) -> Result<Value, ExchangeError> {
        // Fast rejection before any queueing or signing-adjacent work.
        if !self.breaker.try_acquire() {
            self.telemetry.emit(TelemetryEvent::CircuitBreakerRejected {
                system_time: Utc::now(),
                exchange: self.spec.id.clone(),
            });
            return Err(ExchangeError::circuit_open(&self.spec.id));
        }

        let timeout =
            Duration::from_millis(options.timeout_ms.unwrap_or(self.config.request_timeout_ms));
        let retry = options.retry.unwrap_or(self.config.retry_policy);
        let attempts = match retry {
            RetryPolicy::Never => 1,
            RetryPolicy::SafeTransient if !outbound.method().is_idempotent() => 1,
            _ => 2,
        };

        let mut last_error = None;
        for attempt in 0..attempts {
            // Never sign before holding a permit: timestamps and nonces are baked into
            // the signature and must stay fresh through rate-limit backpressure. A
            // retry takes its own permit and its own signature - nonce-based patterns
            // reject a replayed nonce.
            self.rate_limiter.acquire().await;
            let signed = match &outbound {
                Outbound::Signed(signed) => signed.clone(),
                Outbound::Public(request) => unsigned(request)?,
                Outbound::Private {
                    request,
                    credentials,
                } => sign(request, credentials, &self.spec.signing, self.clock.as_ref())?,
            };
            let url = match base_url {
                Some(base) => format!("{}{}", base.trim_end_matches('/'), signed.url),
                None => signed.url.clone(),
            };

            self.telemetry.emit(TelemetryEvent::RequestStart {
                system_time: Utc::now(),
                exchange: self.spec.id.clone(),
                method: method_label.clone(),
                path: signed.url.clone(),
            });

            let started = Instant::now();
            let outcome = tokio::time::timeout(
                timeout,
                self.transport.execute(TransportRequest {
                    method: signed.method,
                    url,
                    headers: signed.headers.clone(),
                    body: signed.body.clone(),
                    timeout,
                    forward: options.forward.clone(),
                }),
            )
            .await
            .unwrap_or(Err(TransportError::Timeout));
            let duration_ms = started.elapsed().as_millis() as u64;

            match outcome {
                Ok(response) => {
                    if response.status >= 500 {
                        self.record_breaker_failure();
                    } else {
                        self.record_breaker_success();
                    }

                    let body = serde_json::from_slice::<Value>(&response.body).ok();

                    if !response.is_success() {
                        let error = self.classify_failure(response.status, body);
                        self.emit_exception(method_label, &signed.url, duration_ms, &error);
                        if error.recoverable && attempt + 1 < attempts {
                            last_error = Some(error);
                            continue;
                        }
                        return Err(error);
                    }

                    let body = match body {
                        Some(body) => body,
                        None => {
                            let error = ExchangeError::exchange_error(
                                "response body is not valid JSON",
                            )
                            .with_exchange(self.spec.id.clone());
                            self.emit_exception(method_label, &signed.url, duration_ms, &error);
                            return Err(error);
                        }
                    };

                    if let Some(error) = classify_body(&self.spec, &body) {
                        self.emit_exception(method_label, &signed.url, duration_ms, &error);
                        return Err(error);
                    }

                    self.telemetry.emit(TelemetryEvent::RequestStop {
                        duration_ms,
                        exchange: self.spec.id.clone(),
                        method: method_label.clone(),
                        path: signed.url.clone(),
                        status: response.status,
                        rate_limit: None,
                    });
                    debug!(
                        exchange = %self.spec.id,
                        method = %method_label,
                        duration_ms,
                        "request complete"
                    );
                    return Ok(body);
                }
                Err(transport_error) => {
                    self.record_breaker_failure();
                    let error = ExchangeError::network_error(transport_error.to_string())
                        .with_exchange(self.spec.id.clone());
                    self.emit_exception(method_label, &signed.url, duration_ms, &error);
                    if attempt + 1 < attempts {
                        last_error = Some(error);
                        continue;
                    }
                    return Err(error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ExchangeError::network_error("request failed").with_exchange(self.spec.id.clone())
        }))
    }

    fn classify_failure(&self, status: u16, body: Option<Value>) -> ExchangeError {
        if let Some(body) = &body {
            if let Some(error) = classify_body(&self.spec, body) {
                return error;
            }
        }

        // Default pause when the exchange rate-limits without advertising a window.
        const DEFAULT_RETRY_AFTER_MS: u64 = 1_000;

        let kind = classify_status(status);
        let mut error = ExchangeError::new(kind, format!("HTTP {status}"))
            .with_exchange(self.spec.id.clone());
        if kind == ErrorVariant::RateLimited {
            error = error.with_retry_after(DEFAULT_RETRY_AFTER_MS);
        }
        if let Some(body) = body {
            error = error.with_raw(body);
        }
        error
    }

    fn record_breaker_failure(&self) {
        let before = self.breaker.state();
        self.breaker.record_failure();
        if before != CircuitState::Open && self.breaker.state() == CircuitState::Open {
            self.telemetry.emit(TelemetryEvent::CircuitBreakerOpen {
                system_time: Utc::now(),
                exchange: self.spec.id.clone(),
            });
        }
    }

    fn record_breaker_success(&self) {
        let before = self.breaker.state();
        self.breaker.record_success();
        if before != CircuitState::Closed && self.breaker.state() == CircuitState::Closed {
            self.telemetry.emit(TelemetryEvent::CircuitBreakerClosed {
                system_time: Utc::now(),
                exchange: self.spec.id.clone(),
            });
        }
    }

    fn emit_exception(
        &self,
        method_label: &SmolStr,
        path: &str,
        duration_ms: u64,
        error: &ExchangeError,
    ) {
        self.telemetry.emit(TelemetryEvent::RequestException {
            duration_ms,
            exchange: self.spec.id.clone(),
            method: method_label.clone(),
            path: path.to_string(),
            kind: SmolStr::new(error.kind.as_str()),
            reason: error.message.clone(),
        });
    }
}

/// A request on its way to the transport.
///
/// Private requests stay unsigned until [`ExchangeClient::perform`] holds a rate-limit
/// permit for the attempt; only `raw_request` hands over a pre-built wire request.
#[derive(Debug)]
enum Outbound<'a> {
    /// Pre-built wire request: no signing, no url rewriting.
    Signed(SignedRequest),
    /// Public request: the query is attached, nothing is signed.
    Public(Request),
    /// Private request, signed once per attempt.
    Private {
        request: Request,
        credentials: &'a Credentials,
    },
}

impl Outbound<'_> {
    fn method(&self) -> Method {
        match self {
            Outbound::Signed(signed) => signed.method,
            Outbound::Public(request) | Outbound::Private { request, .. } => request.method,
        }
    }
}

/// Attach the query to a public request without signing.
fn unsigned(request: &Request) -> Result<SignedRequest, ExchangeError> {
    Ok(SignedRequest {
        method: request.method,
        url: request
            .path_with_query()
            .map_err(|error| ExchangeError::invalid_parameters(error.to_string()))?,
        headers: Vec::new(),
        body: request.body.clone(),
    })
}

/// Render a JSON param map into the string map the signing layer works over.
fn stringify_params(params: &Map<String, Value>) -> BTreeMap<String, String> {
    params
        .iter()
        .map(|(key, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), rendered)
        })
        .collect()
}
