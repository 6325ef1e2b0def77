//! [`reqwest`]-backed implementation of [`EventSource`].

use std::sync::Arc;

use eventsource_stream::{Event, Eventsource};
use futures::{FutureExt, Stream, StreamExt, future::BoxFuture, stream::BoxStream};
use reqwest::cookie::Jar;
use thiserror::Error;

use super::{EventSource, EventStream, StreamEvent};

/// Errors while opening or reading a reqwest event stream.
#[derive(Debug, Error)]
pub enum ReqwestStreamError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server refused to open the stream.
    #[error("unexpected status {0}")]
    UnexpectedStatus(u16),

    /// The body broke off or was not a valid event stream.
    #[error("event stream error: {0}")]
    Stream(String),
}

/// Opens server-sent event streams with [`reqwest`].
///
/// Unlike [`ReqwestHttpClient`](crate::http_client::ReqwestHttpClient) this
/// client has no overall request timeout, since the stream stays open
/// indefinitely.
#[derive(Debug, Clone)]
pub struct ReqwestEventSource {
    inner: reqwest::Client,
}

impl ReqwestEventSource {
    /// Create an event source that sends the cookies stored in `jar`.
    #[must_use]
    pub fn new(jar: Arc<Jar>) -> Self {
        let inner = reqwest::Client::builder()
            .cookie_provider(jar)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("falling back to default reqwest client: {e}");
                reqwest::Client::new()
            });
        Self { inner }
    }
}

impl EventSource for ReqwestEventSource {
    type Error = ReqwestStreamError;
    type Stream = ReqwestEventStream;

    fn open(
        &self,
        url: &str,
        last_event_id: Option<&str>,
    ) -> BoxFuture<'_, Result<Self::Stream, Self::Error>> {
        let mut builder = self
            .inner
            .get(url)
            .header("accept", "text/event-stream")
            .header("cache-control", "no-cache");
        if let Some(id) = last_event_id {
            builder = builder.header("last-event-id", id);
        }

        async move {
            let resp = builder.send().await?;
            let status = resp.status().as_u16();
            if !resp.status().is_success() {
                return Err(ReqwestStreamError::UnexpectedStatus(status));
            }

            Ok(ReqwestEventStream {
                events: decode(resp.bytes_stream()),
            })
        }
        .boxed()
    }
}

/// Frame a raw `text/event-stream` body into [`StreamEvent`]s.
fn decode<S, B, E>(body: S) -> BoxStream<'static, Result<StreamEvent, ReqwestStreamError>>
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]>,
    E: core::fmt::Display,
{
    body.eventsource()
        .map(|item| {
            item.map(StreamEvent::from)
                .map_err(|e| ReqwestStreamError::Stream(e.to_string()))
        })
        .boxed()
}

impl From<Event> for StreamEvent {
    fn from(event: Event) -> Self {
        Self {
            id: Some(event.id).filter(|id| !id.is_empty()),
            data: event.data,
        }
    }
}

/// An open reqwest event stream.
pub struct ReqwestEventStream {
    events: BoxStream<'static, Result<StreamEvent, ReqwestStreamError>>,
}

impl core::fmt::Debug for ReqwestEventStream {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ReqwestEventStream").finish_non_exhaustive()
    }
}

impl EventStream for ReqwestEventStream {
    type Error = ReqwestStreamError;

    fn next_event(&mut self) -> BoxFuture<'_, Option<Result<StreamEvent, Self::Error>>> {
        self.events.next().boxed()
    }
}
