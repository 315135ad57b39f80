//! # RPC Client
//!
//! This module implements the request lifecycle of a call:
//!
//! 1. Build a [`RequestEnvelope`] and encode it.
//! 2. `POST` it to the resolved endpoint with an exact `Content-Length`.
//! 3. Stream the response body into a buffer.
//! 4. Decode the buffer and classify it with the configured [`DispatchPolicy`].
//!
//! Every call resolves exactly once, either to the `result` value or to a [`CallError`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use jrpc_core::{Callbacks, RpcClient};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RpcClient::new("https://rpc.example.com/api")?;
//!
//! // Await the outcome directly...
//! let sum = client.call("sum", vec![json!(1), json!(2)]).await?;
//! println!("1 + 2 = {sum}");
//!
//! // ...or hand it to callbacks and carry on.
//! client.call_with(
//!     "notify",
//!     vec![json!("done")],
//!     Callbacks::new()
//!         .on_success(|value| println!("ok: {value}"))
//!         .on_error(|err| eprintln!("failed: {err}")),
//! );
//! # Ok(())
//! # }
//! ```
mod callbacks;
mod config;

pub use callbacks::Callbacks;
pub use config::ClientConfig;

use crate::{
    BoxError,
    endpoint::{MalformedUrlError, TransportParams},
    rpc::{
        codec::{DispatchPolicy, RequestEnvelope, ResponseEnvelope},
        transport::{self, RequestBody, Transport},
    },
};
use bytes::Bytes;
use http::{HeaderValue, Method, StatusCode, header};
use http_body::Body as HttpBody;
use http_body_util::Full;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{Client as HyperClient, connect::HttpConnector},
    rt::TokioExecutor,
};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::runtime::{Handle, TryCurrentError};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, warn};

/// The default transport: a `hyper` client speaking HTTP/1.1 over plain TCP or rustls.
pub type HttpsTransport = HyperClient<HttpsConnector<HttpConnector>, RequestBody>;

/// Errors that can end a call.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("Failed to encode request envelope: '{0}'")]
    Encode(#[source] serde_json::Error),
    #[error("Failed to build HTTP request: '{0}'")]
    InvalidRequest(#[from] http::Error),
    #[error("Transport failure: '{0}'")]
    Transport(#[source] BoxError),
    #[error("Remote error: {0}")]
    Remote(Value),
    #[error("Malformed response (HTTP {status}): '{source}'")]
    MalformedResponse {
        status: StatusCode,
        source: serde_json::Error,
    },
    #[error("No Tokio runtime to run the call on: '{0}'")]
    NoRuntime(#[source] TryCurrentError),
}

impl CallError {
    /// The error payload sent by the server, if this is a remote error.
    pub fn remote(&self) -> Option<&Value> {
        match self {
            CallError::Remote(value) => Some(value),
            _ => None,
        }
    }
}

/// A client bound to a single endpoint.
///
/// The generic parameter `S` is the HTTP transport. It defaults to [`HttpsTransport`];
/// any `tower::Service<http::Request<Full<Bytes>>>` returning an `http_body::Body` works.
///
/// Cloning is cheap when the transport is, and clones share nothing mutable.
#[derive(Debug, Clone)]
pub struct RpcClient<S = HttpsTransport> {
    params: TransportParams,
    config: ClientConfig,
    transport: S,
}

impl RpcClient<HttpsTransport> {
    /// Creates a client for `url` with the default configuration.
    ///
    /// No connection is opened until the first call.
    ///
    /// # Arguments
    ///
    /// * `url` - The server URL (e.g., `https://rpc.example.com:8443/api`).
    ///
    /// # Returns
    ///
    /// * `Ok(RpcClient)` - The client bound to the resolved endpoint.
    /// * `Err(MalformedUrlError)` - If the URL is not an absolute HTTP(S) URL.
    pub fn new(url: &str) -> Result<Self, MalformedUrlError> {
        Self::with_config(url, ClientConfig::default())
    }

    /// Creates a client for `url` with a custom configuration.
    pub fn with_config(url: &str, config: ClientConfig) -> Result<Self, MalformedUrlError> {
        let params = TransportParams::resolve(url)?;
        Ok(Self::with_transport(params, config, https_transport()))
    }
}

fn https_transport() -> HttpsTransport {
    let mut tcp = HttpConnector::new();
    tcp.enforce_http(false);

    let connector = HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .wrap_connector(tcp);

    HyperClient::builder(TokioExecutor::new()).build(connector)
}

impl<S> RpcClient<S> {
    /// Creates a client from already resolved parameters and an existing transport.
    pub fn with_transport(params: TransportParams, config: ClientConfig, transport: S) -> Self {
        Self {
            params,
            config,
            transport,
        }
    }

    pub fn params(&self) -> &TransportParams {
        &self.params
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn dispatch_policy(&self) -> DispatchPolicy {
        self.config.dispatch
    }

    fn build_request(&self, payload: Bytes) -> Result<http::Request<RequestBody>, CallError> {
        let mut builder = http::Request::builder()
            .method(Method::POST)
            .uri(self.params.to_string())
            .header(header::CONTENT_LENGTH, payload.len());

        if self.config.content_type {
            builder = builder.header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }

        Ok(builder.body(Full::new(payload))?)
    }
}

impl<S> RpcClient<S>
where
    S: Transport + Clone,
{
    /// Calls `method` with positional `params` and waits for its outcome.
    ///
    /// # Returns
    ///
    /// * `Ok(Value)` - The `result` sent by the server.
    /// * `Err(CallError::Remote(Value))` - The server answered with an error payload.
    /// * `Err(CallError)` - The request could not be sent, the connection failed, or the
    ///   response body was not a JSON object.
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, CallError> {
        let envelope = RequestEnvelope::new(method, params);
        let payload = envelope.encode().map_err(CallError::Encode)?;
        let payload_len = payload.len();
        let request = self.build_request(payload)?;

        debug!(
            id = envelope.id(),
            method,
            endpoint = %self.params,
            bytes = payload_len,
            "Dispatching RPC request"
        );

        let mut transport = self.transport.clone();

        let response = transport::send(&mut transport, request)
            .await
            .map_err(|err| {
                warn!(id = envelope.id(), method, error = %err, "RPC request failed");
                CallError::Transport(err)
            })?;

        let status = response.status();

        let body = transport::read_body(response.into_body())
            .await
            .map_err(|err| {
                warn!(id = envelope.id(), method, %status, error = %err, "RPC response stream failed");
                CallError::Transport(err)
            })?;

        let decoded = ResponseEnvelope::decode(&body).map_err(|source| {
            warn!(id = envelope.id(), method, %status, error = %source, "RPC response is not a JSON object");
            CallError::MalformedResponse { status, source }
        })?;

        let outcome = decoded.into_outcome(self.config.dispatch);

        debug!(
            id = envelope.id(),
            method,
            %status,
            bytes = body.len(),
            success = outcome.is_success(),
            "RPC response received"
        );

        outcome.into_result().map_err(CallError::Remote)
    }
}

impl<S> RpcClient<S>
where
    S: Transport + Clone + Send + Sync + 'static,
    S::Future: Send,
    S::ResponseBody: Send,
    <S::ResponseBody as HttpBody>::Data: Send,
{
    /// Starts a call in the background and returns immediately.
    ///
    /// The outcome is handed to exactly one of the `callbacks` (or dropped when the
    /// matching handler is absent). The call runs on the current Tokio runtime; outside
    /// of one, `on_error` receives [`CallError::NoRuntime`] before this returns.
    /// The returned handle can be awaited to know when the handler has run.
    pub fn call_with(
        &self,
        method: impl Into<String>,
        params: Vec<Value>,
        callbacks: Callbacks,
    ) -> CallHandle {
        let method = method.into();

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(err) => {
                warn!(method = method.as_str(), error = %err, "RPC call started outside of a Tokio runtime");
                callbacks.deliver(Err(CallError::NoRuntime(err)));
                return CallHandle { task: None };
            }
        };

        let client = self.clone();
        let task = runtime.spawn(async move {
            let result = client.call(&method, params).await;
            callbacks.deliver(result);
        });

        CallHandle { task: Some(task) }
    }
}

/// Completion handle of a call started with [`RpcClient::call_with`].
///
/// Resolves once the handler has run. Dropping it does not cancel the call.
#[derive(Debug)]
pub struct CallHandle {
    task: Option<JoinHandle<()>>,
}

impl CallHandle {
    /// Aborts the background call. Neither handler runs if it had not finished yet.
    pub fn abort(&self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

impl Future for CallHandle {
    type Output = Result<(), JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.task.as_mut() {
            Some(task) => Pin::new(task).poll(cx),
            // The handler already ran synchronously.
            None => Poll::Ready(Ok(())),
        }
    }
}
