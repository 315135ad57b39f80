//! # Mock RPC Service
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide a scriptable JSON-RPC server
//! for integration testing `jrpc-core`. It is not intended for production use.
//!
//! [`MockRpcService`] is a `tower::Service`, so it can be plugged directly into a client as
//! its transport. [`serve`] exposes the same service over a loopback TCP socket with a real
//! HTTP/1.1 server, for tests that need actual network I/O.
use bytes::Bytes;
use futures_util::stream;
use http::{HeaderMap, Request, Response, StatusCode, Uri};
use http_body_util::{BodyExt, Full, StreamBody, combinators::BoxBody};
use hyper::body::{Body, Frame, Incoming};
use hyper_util::rt::TokioIo;
use serde_json::Value;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::Service;
use tracing::debug;

/// Body type of every mock response.
pub type ResponseBody = BoxBody<Bytes, io::Error>;

/// What the mock does with a request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// `200 OK` with the value as body.
    Json(Value),
    /// A raw body with an explicit status.
    Raw { status: StatusCode, body: String },
    /// `200 OK` with the body delivered as separate chunks.
    Chunks(Vec<String>),
    /// Sends the chunks, then fails the body stream.
    BrokenStream(Vec<String>),
    /// Fails the request before any response, like a refused connection.
    Refuse(String),
    /// Waits before replying.
    Delayed(Duration, Box<Reply>),
}

/// A request as seen by the mock.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: http::Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    /// The body parsed as JSON, or `Value::Null` if it is not JSON.
    pub fn envelope(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    /// The `method` field of the envelope.
    pub fn rpc_method(&self) -> Option<String> {
        self.envelope()["method"].as_str().map(str::to_string)
    }
}

/// Transport errors produced by the mock.
#[derive(Debug, thiserror::Error)]
pub enum MockTransportError {
    #[error("Connection refused by mock service: '{0}'")]
    Refused(String),
    #[error("Failed to read request body: '{0}'")]
    Body(String),
}

type Handler = Arc<dyn Fn(&RecordedRequest) -> Reply + Send + Sync>;

/// A scriptable JSON-RPC server.
#[derive(Clone)]
pub struct MockRpcService {
    handler: Handler,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockRpcService {
    /// Creates a mock that computes its reply from each request.
    pub fn new(handler: impl Fn(&RecordedRequest) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
            requests: Arc::default(),
        }
    }

    /// Creates a mock that always gives the same reply.
    pub fn replying(reply: Reply) -> Self {
        Self::new(move |_| reply.clone())
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    async fn handle(&self, recorded: RecordedRequest) -> Result<Response<ResponseBody>, MockTransportError> {
        let mut reply = (self.handler)(&recorded);

        self.requests.lock().unwrap().push(recorded);

        while let Reply::Delayed(delay, next) = reply {
            tokio::time::sleep(delay).await;
            reply = *next;
        }

        let (status, body) = match reply {
            Reply::Json(value) => (StatusCode::OK, full(value.to_string())),
            Reply::Raw { status, body } => (status, full(body)),
            Reply::Chunks(chunks) => (StatusCode::OK, chunked(chunks, None)),
            Reply::BrokenStream(chunks) => {
                let broken = io::Error::new(io::ErrorKind::ConnectionReset, "mock stream broken");
                (StatusCode::OK, chunked(chunks, Some(broken)))
            }
            Reply::Refuse(reason) => return Err(MockTransportError::Refused(reason)),
            Reply::Delayed(..) => unreachable!("delays are unwrapped above"),
        };

        let mut response = Response::new(body);
        *response.status_mut() = status;
        Ok(response)
    }
}

impl<B> Service<Request<B>> for MockRpcService
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    type Response = Response<ResponseBody>;
    type Error = MockTransportError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        let service = self.clone();

        Box::pin(async move {
            let (parts, body) = request.into_parts();
            let body = body
                .collect()
                .await
                .map_err(|e| MockTransportError::Body(e.to_string()))?
                .to_bytes();

            let recorded = RecordedRequest {
                method: parts.method,
                uri: parts.uri,
                headers: parts.headers,
                body,
            };

            service.handle(recorded).await
        })
    }
}

fn full(body: String) -> ResponseBody {
    Full::new(Bytes::from(body))
        .map_err(|never| match never {})
        .boxed()
}

fn chunked(chunks: Vec<String>, error: Option<io::Error>) -> ResponseBody {
    let frames: Vec<Result<Frame<Bytes>, io::Error>> = chunks
        .into_iter()
        .map(|chunk| Ok(Frame::data(Bytes::from(chunk))))
        .chain(error.map(Err))
        .collect();

    StreamBody::new(stream::iter(frames)).boxed()
}

/// Serves `service` over HTTP/1.1 on a random loopback port.
///
/// Returns the bound address and the handle of the accept loop; aborting the handle
/// stops accepting new connections.
pub async fn serve(service: MockRpcService) -> io::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        while let Ok((stream, peer)) = listener.accept().await {
            let service = service.clone();

            tokio::spawn(async move {
                let connection_service =
                    hyper::service::service_fn(move |request: Request<Incoming>| {
                        let mut service = service.clone();
                        async move { Service::call(&mut service, request).await }
                    });

                if let Err(err) = hyper::server::conn::http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), connection_service)
                    .await
                {
                    debug!(%peer, error = %err, "Mock connection closed with error");
                }
            });
        }
    });

    Ok((addr, handle))
}
