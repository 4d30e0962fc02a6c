//! Transport port.

use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::TransportResult;

/// Sends a single request to the origin.
///
/// Implementations must stop work and return
/// [`TransportError::Cancelled`](crate::TransportError::Cancelled) once
/// `cancel` fires. Redirects, retries and pooling are the transport's own
/// business.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(
        &self,
        request: Request<Bytes>,
        cancel: CancellationToken,
    ) -> TransportResult<Response<Bytes>>;
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn send(
        &self,
        request: Request<Bytes>,
        cancel: CancellationToken,
    ) -> TransportResult<Response<Bytes>> {
        (**self).send(request, cancel).await
    }
}
