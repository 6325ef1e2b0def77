//! [`reqwest`]-backed implementation of [`HttpClient`].

use std::sync::Arc;

use futures::{FutureExt, future::BoxFuture};
use reqwest::cookie::Jar;

use super::{HttpClient, HttpResponse, Method};
use crate::channel::ChannelOptions;

/// Error type for the reqwest-based HTTP client.
#[derive(Debug, thiserror::Error)]
#[error("HTTP request failed: {0}")]
pub struct ReqwestHttpError(#[from] reqwest::Error);

/// A [`reqwest`]-backed implementation of [`HttpClient`].
///
/// Keeps the cookie set by the login endpoint; pair it with an
/// [`ReqwestEventSource`](crate::event_source::ReqwestEventSource) built from
/// [`cookie_jar`](Self::cookie_jar) so the stream is authorized too.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    inner: reqwest::Client,
    jar: Arc<Jar>,
}

impl ReqwestHttpClient {
    /// Create a new reqwest-backed HTTP client with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(&ChannelOptions::default())
    }

    /// Create a new reqwest-backed HTTP client from channel options.
    #[must_use]
    pub fn with_options(options: &ChannelOptions) -> Self {
        let jar = Arc::new(Jar::default());
        let inner = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .timeout(options.request_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("falling back to default reqwest client: {e}");
                reqwest::Client::new()
            });
        Self { inner, jar }
    }

    /// The cookie jar shared by every request this client makes.
    #[must_use]
    pub fn cookie_jar(&self) -> Arc<Jar> {
        self.jar.clone()
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestHttpClient {
    type Error = ReqwestHttpError;

    fn send(
        &self,
        method: Method,
        url: &str,
        headers: &[(&str, &str)],
        body: Vec<u8>,
    ) -> BoxFuture<'_, Result<HttpResponse, Self::Error>> {
        let mut builder = match method {
            Method::Post => self.inner.post(url),
            Method::Put => self.inner.put(url),
        };
        for &(name, value) in headers {
            builder = builder.header(name, value);
        }
        builder = builder.body(body);

        async move {
            let resp = builder.send().await?;
            let status = resp.status().as_u16();

            let body = resp.bytes().await?.to_vec();

            Ok(HttpResponse { status, body })
        }
        .boxed()
    }
}
