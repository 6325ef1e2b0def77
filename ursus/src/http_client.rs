//! Generic HTTP client trait for sending channel actions.
//!
//! This abstracts over the HTTP client implementation so the channel can be
//! driven by [`reqwest`] in production and by an in-memory client in tests.

#[cfg(feature = "reqwest")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest")))]
pub mod reqwest_client;

use core::fmt;

use futures::future::BoxFuture;

#[cfg(feature = "reqwest")]
pub use reqwest_client::{ReqwestHttpClient, ReqwestHttpError};

/// The HTTP methods the channel protocol uses for actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `POST`, used for login.
    Post,

    /// `PUT`, used for every channel action.
    Put,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Post => f.write_str("POST"),
            Self::Put => f.write_str("PUT"),
        }
    }
}

/// A minimal async HTTP client.
///
/// Implementations handle the mechanics of making HTTP requests (TLS,
/// connection pooling, cookies) while this trait exposes only what the
/// channel needs.
pub trait HttpClient: Clone {
    /// The error type for HTTP operations.
    type Error: core::error::Error + Send + 'static;

    /// Send an HTTP request and return the response.
    fn send(
        &self,
        method: Method,
        url: &str,
        headers: &[(&str, &str)],
        body: Vec<u8>,
    ) -> BoxFuture<'_, Result<HttpResponse, Self::Error>>;
}

/// A minimal HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub status: u16,

    /// The response body bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}
