use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{Map, Value};
use std::{fmt::Debug, time::Duration};
use thiserror::Error;
use uniex_signing::Method;

/// Fully resolved outbound request handed to the HTTP collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    /// Absolute url, base already joined.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub timeout: Duration,
    /// Unrecognised call option keys, forwarded verbatim.
    pub forward: Map<String, Value>,
}

/// Raw response from the HTTP collaborator, before error classification.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level failures; classified into the unified taxonomy by the facade.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("transport failure: {0}")]
    Other(String),
}

/// The facade's only suspension point: an HTTP round trip.
///
/// Production uses [`ReqwestTransport`]; tests script a [`mock::MockTransport`].
#[async_trait]
pub trait HttpTransport: Send + Sync + Debug {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// [`reqwest`]-backed production transport.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

fn into_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = self
            .client
            .request(into_reqwest_method(request.method), &request.url)
            .timeout(request.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder
                .header("content-type", "application/json")
                .body(body);
        }

        let response = builder.send().await.map_err(|error| {
            if error.is_timeout() {
                TransportError::Timeout
            } else if error.is_connect() {
                TransportError::Connect(error.to_string())
            } else {
                TransportError::Other(error.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|error| TransportError::Other(error.to_string()))?;

        Ok(TransportResponse { status, body })
    }
}

/// Scripted transport for exercising the facade without a network.
pub mod mock {
    use super::*;
    use std::{collections::VecDeque, sync::Mutex};

    #[derive(Debug, Default)]
    pub struct MockTransport {
        responses: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
        requests: Mutex<Vec<TransportRequest>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a JSON 200 response.
        pub fn push_json(&self, body: &Value) {
            self.push_response(200, body);
        }

        /// Queue a JSON response with an explicit status.
        pub fn push_response(&self, status: u16, body: &Value) {
            self.responses
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push_back(Ok(TransportResponse {
                    status,
                    body: Bytes::from(body.to_string()),
                }));
        }

        /// Queue a transport-level failure.
        pub fn push_error(&self, error: TransportError) {
            self.responses
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push_back(Err(error));
        }

        /// Requests the facade has executed so far, in order.
        pub fn requests(&self) -> Vec<TransportRequest> {
            self.requests
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone()
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn execute(
            &self,
            request: TransportRequest,
        ) -> Result<TransportResponse, TransportError> {
            self.requests
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(request);
            self.responses
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .pop_front()
                .unwrap_or_else(|| {
                    Err(TransportError::Other(
                        "mock transport has no scripted response".into(),
                    ))
                })
        }
    }
}
