//! # HTTP Transport Seam
//!
//! The client never talks to sockets directly. It hands a fully built
//! `http::Request` to a [`Transport`] and reads back a streamed `http::Response`.
//!
//! [`Transport`] is implemented for every `tower::Service` with the right request and
//! response types, which covers `hyper_util`'s pooled client as well as in-process
//! services used in tests.
use crate::BoxError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use http_body::Body as HttpBody;
use http_body_util::{BodyExt, Full};
use std::future::{Future, poll_fn};
use std::pin::pin;
use std::task::{Context, Poll};
use tower::Service;
use tracing::trace;

/// The body type of every outgoing request: the complete, already encoded envelope.
pub type RequestBody = Full<Bytes>;

/// Anything able to send an HTTP request and return a streamed response.
pub trait Transport {
    type ResponseBody: HttpBody<Error: Into<BoxError>>;
    type Error: Into<BoxError>;
    type Future: Future<Output = Result<http::Response<Self::ResponseBody>, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>>;

    fn call(&mut self, request: http::Request<RequestBody>) -> Self::Future;
}

impl<T, B> Transport for T
where
    T: Service<http::Request<RequestBody>, Response = http::Response<B>>,
    T::Error: Into<BoxError>,
    B: HttpBody,
    B::Error: Into<BoxError>,
{
    type ResponseBody = B;
    type Error = T::Error;
    type Future = T::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Service::poll_ready(self, cx)
    }

    fn call(&mut self, request: http::Request<RequestBody>) -> Self::Future {
        Service::call(self, request)
    }
}

/// Waits for the transport to be ready, then sends the request.
pub(crate) async fn send<T>(
    transport: &mut T,
    request: http::Request<RequestBody>,
) -> Result<http::Response<T::ResponseBody>, BoxError>
where
    T: Transport,
{
    poll_fn(|cx| transport.poll_ready(cx))
        .await
        .map_err(Into::<BoxError>::into)?;

    transport.call(request).await.map_err(Into::into)
}

/// Drains a response body into a single buffer.
///
/// Data frames are appended in arrival order; trailers are ignored. An error
/// reported by the body at any point aborts the read.
pub(crate) async fn read_body<B>(body: B) -> Result<Bytes, BoxError>
where
    B: HttpBody,
    B::Error: Into<BoxError>,
{
    let mut body = pin!(body);
    let mut buffer = BytesMut::new();

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(Into::<BoxError>::into)?;

        if let Ok(data) = frame.into_data() {
            trace!(bytes = data.remaining(), "Received response chunk");
            buffer.put(data);
        }
    }

    Ok(buffer.freeze())
}
