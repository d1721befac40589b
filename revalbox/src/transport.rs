use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};
use http_body::Body as HttpBody;

/// Sends requests to the origin.
///
/// The caching client treats the transport as opaque: it does not retry,
/// follow redirects or decompress, and passes transport errors to the caller
/// unchanged. Timeouts and cancellation are the transport's business.
///
/// The response body is read lazily, so the client only buffers it once it
/// decides what to do with the response.
///
/// # Examples
///
/// ```rust,ignore
/// use revalbox::Transport;
///
/// struct Fixed;
///
/// #[async_trait::async_trait]
/// impl Transport for Fixed {
///     type Body = http_body_util::Full<bytes::Bytes>;
///     type Error = std::convert::Infallible;
///
///     async fn send(&self, _req: http::Request<bytes::Bytes>)
///         -> Result<http::Response<Self::Body>, Self::Error>
///     {
///         Ok(http::Response::new("hello".into()))
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Response body type.
    type Body: HttpBody<Data = Bytes> + Send;

    /// Transport failure: network, DNS, TLS and the like. A non-2xx status
    /// is a response, not an error.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sends the request and waits for the response head.
    async fn send(&self, request: Request<Bytes>) -> Result<Response<Self::Body>, Self::Error>;
}

#[async_trait]
impl<T> Transport for std::sync::Arc<T>
where
    T: Transport + ?Sized,
{
    type Body = T::Body;
    type Error = T::Error;

    async fn send(&self, request: Request<Bytes>) -> Result<Response<Self::Body>, Self::Error> {
        (**self).send(request).await
    }
}
