//! Transports for chain providers and the bundler.

use alloy::{
    providers::WsConnect,
    pubsub::PubSubConnect,
    rpc::{
        client::BuiltInConnectionString,
        json_rpc::{
            ErrorPayload, Id, RequestPacket, Response, ResponsePacket, ResponsePayload,
        },
    },
    transports::{
        BoxTransport, TransportConnect, TransportError, TransportFut, TransportResult,
        layers::RetryBackoffLayer,
    },
};
use serde::Serialize;
use std::{
    borrow::Cow,
    str::FromStr,
    task::{Context, Poll},
};
use tower::Service;
use url::Url;

/// [`RetryBackoffLayer`] used for chain providers.
///
/// Chain reads are idempotent and retried up to 10 times with an 800ms backoff. Bundler
/// clients are built without it: operations are submitted exactly once.
pub const RETRY_LAYER: RetryBackoffLayer = RetryBackoffLayer::new(10, 800, u64::MAX);

/// Creates a [`BoxTransport`] from a [`Url`].
///
/// Returns the transport and a boolean indicating if the transport is local.
pub async fn create_transport(url: &Url) -> TransportResult<(BoxTransport, bool)> {
    let url = BuiltInConnectionString::from_str(url.as_str())?;
    let is_local = url.is_local();

    let transport = match url {
        BuiltInConnectionString::Ws(url, auth) => BoxTransport::new(
            WsConnect::new(url.as_str())
                .with_auth_opt(auth)
                // Configure max number of retries to prevent provider from becoming useless
                .with_max_retries(u32::MAX)
                .into_service()
                .await?,
        ),
        _ => url.connect_boxed().await?,
    };

    Ok((transport, is_local))
}

/// Transforms a closure into a transport service.
///
/// Serves canned responses to clients under test.
pub fn request_fn<T>(f: T) -> RequestFn<T>
where
    T: FnMut(RequestPacket) -> TransportFut<'static>,
{
    RequestFn { f }
}

/// A transport service backed by a closure. See [`request_fn`].
#[derive(Copy, Clone)]
pub struct RequestFn<T> {
    f: T,
}

impl<T> std::fmt::Debug for RequestFn<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestFn").finish_non_exhaustive()
    }
}

impl<T> Service<RequestPacket> for RequestFn<T>
where
    T: FnMut(RequestPacket) -> TransportFut<'static>,
{
    type Response = ResponsePacket;
    type Error = TransportError;
    type Future = TransportFut<'static>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), TransportError>> {
        Ok(()).into()
    }

    fn call(&mut self, req: RequestPacket) -> Self::Future {
        (self.f)(req)
    }
}

/// Id of the first request of a single request packet, `0` otherwise.
pub fn request_id(req: &RequestPacket) -> Id {
    req.as_single().map(|req| req.id().clone()).unwrap_or(Id::Number(0))
}

/// A successful JSON-RPC response carrying `result`.
pub fn success_response(id: Id, result: &impl Serialize) -> TransportResult<ResponsePacket> {
    let raw = serde_json::value::to_raw_value(result).map_err(TransportError::ser_err)?;
    Ok(ResponsePacket::Single(Response { id, payload: ResponsePayload::Success(raw) }))
}

/// A JSON-RPC error response.
pub fn error_response(
    id: Id,
    code: i64,
    message: impl Into<Cow<'static, str>>,
) -> TransportResult<ResponsePacket> {
    let payload = ErrorPayload { code, message: message.into(), data: None };
    Ok(ResponsePacket::Single(Response { id, payload: ResponsePayload::Failure(payload) }))
}
