use crate::{
    circuit::CircuitState,
    client::ExchangeClient,
    config::CallOptions,
    error::ExchangeError,
    multi::{self, MultiOptions, MultiResults},
};
use serde::Serialize;
use std::{sync::Arc, time::Instant};

/// Point-in-time reachability of one exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthStatus {
    pub reachable: bool,
    pub latency_ms: Option<u64>,
    pub circuit_state: CircuitState,
    pub error: Option<String>,
}

/// Confirm the exchange answers its time endpoint.
pub async fn ping(client: &ExchangeClient) -> Result<(), ExchangeError> {
    client
        .call("fetch_time", &[], CallOptions::default(), None)
        .await
        .map(|_| ())
}

/// Monotonic round-trip latency of the time endpoint, in milliseconds.
pub async fn latency(client: &ExchangeClient) -> Result<u64, ExchangeError> {
    let started = Instant::now();
    ping(client).await?;
    Ok(started.elapsed().as_millis() as u64)
}

/// Reachability, latency and breaker state in one report. Never fails; failures are
/// folded into the report.
pub async fn status(client: &ExchangeClient) -> HealthStatus {
    match latency(client).await {
        Ok(latency_ms) => HealthStatus {
            reachable: true,
            latency_ms: Some(latency_ms),
            circuit_state: client.circuit_state(),
            error: None,
        },
        Err(error) => HealthStatus {
            reachable: false,
            latency_ms: None,
            circuit_state: client.circuit_state(),
            error: Some(error.to_string()),
        },
    }
}

/// Health of many exchanges, fan-out with partial-failure isolation.
pub async fn all(
    clients: &[Arc<ExchangeClient>],
    options: MultiOptions,
) -> MultiResults<HealthStatus> {
    multi::parallel_call(clients.iter().cloned(), options, |client| async move {
        Ok(status(&client).await)
    })
    .await
}
