//! Generic server-sent event stream traits.
//!
//! The channel opens exactly one stream per channel id and reads events from
//! it in order until it ends. [`EventSource`] opens streams; [`EventStream`]
//! yields their events.

#[cfg(feature = "reqwest")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest")))]
pub mod reqwest_source;

use futures::future::BoxFuture;

#[cfg(feature = "reqwest")]
pub use reqwest_source::{ReqwestEventSource, ReqwestEventStream, ReqwestStreamError};

/// One event read off the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEvent {
    /// The stream's last event id as of this event, if one has been set.
    pub id: Option<String>,

    /// The event's `data:` lines, joined with `\n`.
    pub data: String,
}

/// Opens event streams.
pub trait EventSource: Clone {
    /// The error type for opening and reading streams.
    type Error: core::error::Error + Send + 'static;

    /// The stream type returned by [`open`](Self::open).
    type Stream: EventStream<Error = Self::Error> + Send + 'static;

    /// Open a stream at `url`, asking the server to resume after
    /// `last_event_id` if given.
    fn open(
        &self,
        url: &str,
        last_event_id: Option<&str>,
    ) -> BoxFuture<'_, Result<Self::Stream, Self::Error>>;
}

/// An open event stream.
pub trait EventStream {
    /// The error type for reading events.
    type Error: core::error::Error + Send + 'static;

    /// Read the next event.
    ///
    /// Returns `None` once the stream has ended. After an error or `None`
    /// the stream is not read again.
    fn next_event(&mut self) -> BoxFuture<'_, Option<Result<StreamEvent, Self::Error>>>;
}
