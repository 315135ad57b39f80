//! # JSON-RPC over HTTP
//!
//! Low-level building blocks used by [`crate::client::RpcClient`] to perform a call.
//!
//! * [`codec`]: the request and response envelopes and the rule that turns a decoded
//!   response into a success or a failure.
//! * [`transport`]: the seam to the HTTP collaborator. Anything implementing
//!   `tower::Service<http::Request<_>>` with an `http_body::Body` response can carry calls.
pub mod codec;
pub mod transport;
