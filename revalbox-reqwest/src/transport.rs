//! Transports backed by reqwest.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest_middleware::ClientWithMiddleware;
use revalbox::Transport;
use tracing::trace;

/// [`Transport`] over a plain [`reqwest::Client`].
///
/// Redirects, timeouts and proxies are whatever the wrapped client is
/// configured with.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Wraps a reqwest client.
    pub fn new(client: reqwest::Client) -> Self {
        ReqwestTransport { client }
    }

    /// Returns the wrapped client.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl From<reqwest::Client> for ReqwestTransport {
    fn from(client: reqwest::Client) -> Self {
        ReqwestTransport::new(client)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    type Body = reqwest::Body;
    type Error = reqwest::Error;

    async fn send(
        &self,
        request: http::Request<Bytes>,
    ) -> Result<http::Response<reqwest::Body>, reqwest::Error> {
        let request: reqwest::Request = request.map(reqwest::Body::from).try_into()?;
        trace!(method = %request.method(), url = %request.url(), "Sending request");
        let response = self.client.execute(request).await?;
        Ok(response.into())
    }
}

/// [`Transport`] over a `reqwest_middleware` client.
///
/// The cache sits above the middleware stack: a fresh hit never reaches it,
/// everything else goes through it.
#[derive(Debug, Clone)]
pub struct MiddlewareTransport {
    client: ClientWithMiddleware,
}

impl MiddlewareTransport {
    /// Wraps a middleware client.
    pub fn new(client: ClientWithMiddleware) -> Self {
        MiddlewareTransport { client }
    }
}

impl From<ClientWithMiddleware> for MiddlewareTransport {
    fn from(client: ClientWithMiddleware) -> Self {
        MiddlewareTransport::new(client)
    }
}

#[async_trait]
impl Transport for MiddlewareTransport {
    type Body = reqwest::Body;
    type Error = reqwest_middleware::Error;

    async fn send(
        &self,
        request: http::Request<Bytes>,
    ) -> Result<http::Response<reqwest::Body>, reqwest_middleware::Error> {
        let request: reqwest::Request = request
            .map(reqwest::Body::from)
            .try_into()
            .map_err(|e: reqwest::Error| reqwest_middleware::Error::Reqwest(e))?;
        let response = self.client.execute(request).await?;
        Ok(response.into())
    }
}
