use crate::{client::ExchangeClient, config::CallOptions, error::ExchangeError};
use futures::StreamExt;
use serde_json::Value;
use smol_str::SmolStr;
use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};
use thiserror::Error;

/// Why one exchange's slot of a fan-out failed. Peers are unaffected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MultiError {
    #[error("task timed out")]
    Timeout,

    #[error("task exited: {0}")]
    Exit(String),

    #[error(transparent)]
    Call(#[from] ExchangeError),
}

/// Fan-out tuning: per-task timeout and bound on in-flight tasks.
#[derive(Debug, Copy, Clone)]
pub struct MultiOptions {
    pub timeout: Duration,
    pub concurrency: usize,
}

impl Default for MultiOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            concurrency: 8,
        }
    }
}

/// Something addressable in a fan-out result map.
pub trait ExchangeKey {
    fn exchange_key(&self) -> SmolStr;
}

impl ExchangeKey for Arc<ExchangeClient> {
    fn exchange_key(&self) -> SmolStr {
        SmolStr::new(self.id())
    }
}

impl<T> ExchangeKey for (SmolStr, T) {
    fn exchange_key(&self) -> SmolStr {
        self.0.clone()
    }
}

/// Results of a many-exchange invocation, keyed by exchange id.
///
/// No input ordering is preserved; a single failure never aborts peers.
#[derive(Debug)]
pub struct MultiResults<T> {
    pub results: HashMap<SmolStr, Result<T, MultiError>>,
}

impl<T> MultiResults<T> {
    pub fn successes(&self) -> impl Iterator<Item = (&SmolStr, &T)> {
        self.results
            .iter()
            .filter_map(|(key, result)| result.as_ref().ok().map(|value| (key, value)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&SmolStr, &MultiError)> {
        self.results
            .iter()
            .filter_map(|(key, result)| result.as_ref().err().map(|error| (key, error)))
    }

    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failure_count() == 0
    }

    pub fn any_succeeded(&self) -> bool {
        self.success_count() > 0
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Result<T, MultiError>> {
        self.results.get(key)
    }
}

/// Invoke `call` once per exchange on a bounded concurrent stream.
///
/// Each task runs in its own spawn with a per-task timeout: a panic becomes
/// [`MultiError::Exit`], expiry becomes [`MultiError::Timeout`], and neither touches the
/// other tasks. No retries happen at this layer.
pub async fn parallel_call<C, F, Fut, T>(
    clients: impl IntoIterator<Item = C>,
    options: MultiOptions,
    call: F,
) -> MultiResults<T>
where
    C: ExchangeKey,
    F: Fn(C) -> Fut,
    Fut: Future<Output = Result<T, ExchangeError>> + Send + 'static,
    T: Send + 'static,
{
    let timeout = options.timeout;
    let tasks = clients.into_iter().map(|client| {
        let key = client.exchange_key();
        let future = call(client);
        async move {
            let joined =
                tokio::spawn(async move { tokio::time::timeout(timeout, future).await }).await;
            let result = match joined {
                Err(join_error) if join_error.is_panic() => {
                    Err(MultiError::Exit(join_error.to_string()))
                }
                Err(_cancelled) => Err(MultiError::Exit("task cancelled".into())),
                Ok(Err(_elapsed)) => Err(MultiError::Timeout),
                Ok(Ok(Ok(value))) => Ok(value),
                Ok(Ok(Err(error))) => Err(MultiError::Call(error)),
            };
            (key, result)
        }
    });

    let results = futures::stream::iter(tasks)
        .buffer_unordered(options.concurrency.max(1))
        .collect::<HashMap<_, _>>()
        .await;

    MultiResults { results }
}

/// `fetch_tickers` across many exchanges.
pub async fn fetch_tickers(
    clients: &[Arc<ExchangeClient>],
    options: MultiOptions,
) -> MultiResults<Value> {
    parallel_call(clients.iter().cloned(), options, |client| async move {
        client
            .call("fetch_tickers", &[], CallOptions::default(), None)
            .await
    })
    .await
}

/// `fetch_order_book` for one unified symbol across many exchanges.
pub async fn fetch_order_books(
    clients: &[Arc<ExchangeClient>],
    symbol: &str,
    options: MultiOptions,
) -> MultiResults<Value> {
    let symbol = symbol.to_string();
    parallel_call(clients.iter().cloned(), options, move |client| {
        let symbol = symbol.clone();
        async move {
            client
                .call(
                    "fetch_order_book",
                    &[("symbol", Value::from(symbol))],
                    CallOptions::default(),
                    None,
                )
                .await
        }
    })
    .await
}

/// `fetch_ohlcv` for one unified symbol and timeframe across many exchanges.
pub async fn fetch_ohlcv(
    clients: &[Arc<ExchangeClient>],
    symbol: &str,
    timeframe: &str,
    options: MultiOptions,
) -> MultiResults<Value> {
    let symbol = symbol.to_string();
    let timeframe = timeframe.to_string();
    parallel_call(clients.iter().cloned(), options, move |client| {
        let symbol = symbol.clone();
        let timeframe = timeframe.clone();
        async move {
            client
                .call(
                    "fetch_ohlcv",
                    &[
                        ("symbol", Value::from(symbol)),
                        ("timeframe", Value::from(timeframe)),
                    ],
                    CallOptions::default(),
                    None,
                )
                .await
        }
    })
    .await
}

/// `fetch_trades` for one unified symbol across many exchanges.
pub async fn fetch_trades(
    clients: &[Arc<ExchangeClient>],
    symbol: &str,
    options: MultiOptions,
) -> MultiResults<Value> {
    let symbol = symbol.to_string();
    parallel_call(clients.iter().cloned(), options, move |client| {
        let symbol = symbol.clone();
        async move {
            client
                .call(
                    "fetch_trades",
                    &[("symbol", Value::from(symbol))],
                    CallOptions::default(),
                    None,
                )
                .await
        }
    })
    .await
}
