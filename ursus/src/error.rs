//! Error types for the channel client.

use thiserror::Error;

/// Errors returned to the caller of an action operation.
///
/// These describe the HTTP send itself. Protocol-level outcomes (a rejected
/// poke, a failed subscription) are delivered to handlers as [`ActionError`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP request error: {0}")]
    Request(String),

    /// Server returned an unexpected status code.
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus {
        /// The HTTP status code.
        status: u16,
        /// The response body as a string.
        body: String,
    },

    /// Failed to encode the action.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A failure outcome delivered to a poke or subscribe handler.
///
/// Cloned to every pending handler when the stream dies, hence `String`
/// payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// The remote side rejected the action.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The HTTP send carrying the action failed.
    #[error("send failed: {0}")]
    Send(String),

    /// The event stream terminated before the action completed.
    #[error("event stream closed: {0}")]
    StreamClosed(String),

    /// The channel was reset before the action completed.
    #[error("channel reset")]
    Reset,

    /// The action payload could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),
}

impl From<&ClientError> for ActionError {
    fn from(err: &ClientError) -> Self {
        match err {
            ClientError::Encode(e) => Self::Encode(e.to_string()),
            other @ (ClientError::Request(_) | ClientError::UnexpectedStatus { .. }) => {
                Self::Send(other.to_string())
            }
        }
    }
}

/// Failed to decode a stream event into a [`Response`](crate::response::Response).
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload is not valid JSON, or has an unknown `response` tag or
    /// missing fields.
    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),

    /// A `poke` or `subscribe` response carried neither `ok` nor `err`.
    #[error("response {id} has neither ok nor err")]
    MissingOutcome {
        /// The action id the response referred to.
        id: u64,
    },
}
