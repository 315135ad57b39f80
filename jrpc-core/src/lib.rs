//! # jrpc core
//!
//! `jrpc-core` is a minimal client for JSON-RPC style services reachable over HTTP(S).
//! A call is a single `POST` whose body is `{"id", "method", "params"}`; the answer is a
//! JSON object carrying either a `result` or an `error`.
//!
//! ## Key Components
//!
//! * **[`TransportParams`]:** The endpoint resolver. Parses a server URL into the scheme,
//!   host, port and path calls are sent to.
//! * **[`RpcClient`]:** The call executor. Builds the envelope, sends it, streams the
//!   response back and resolves the call to a single outcome.
//! * **[`ClientConfig`] & [`DispatchPolicy`]:** Control how responses are classified,
//!   including a compatibility mode for servers relying on truthiness of `result`.
//!
//! ## Transport
//!
//! HTTP itself is delegated. By default the client uses `hyper-util`'s pooled client with
//! a `rustls` connector, but [`RpcClient::with_transport`] accepts any
//! `tower::Service<http::Request<Full<Bytes>>>` answering with an `http_body::Body`.
//! See [`rpc::transport::Transport`].
//!
//! ## Re-exports
//!
//! This crate re-exports `http` and `serde_json` so that callers build requests and
//! parameters with versions compatible with the client.
pub mod client;
pub mod endpoint;
pub mod rpc;

pub use client::{CallError, CallHandle, Callbacks, ClientConfig, HttpsTransport, RpcClient};
pub use endpoint::{
    DEFAULT_HTTP_PORT, DEFAULT_HTTPS_PORT, MalformedUrlError, Scheme, TransportParams,
};
pub use rpc::codec::{DispatchPolicy, Outcome};

// Re-exports
pub use http;
pub use serde_json;

/// Type alias for the standard boxed error used in generic bounds.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
