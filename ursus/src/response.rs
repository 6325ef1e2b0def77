//! Decoding of channel stream events.
//!
//! Each `data:` payload on the channel stream is a JSON object tagged by a
//! `response` field:
//!
//! ```text
//! {"id": 1, "response": "poke", "ok": "ok"}
//! {"id": 1, "response": "poke", "err": "..."}
//! {"id": 2, "response": "subscribe", "ok": "ok"}
//! {"id": 2, "response": "diff", "json": {...}}
//! {"id": 2, "response": "quit"}
//! ```

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::{error::DecodeError, id::ActionId};

/// The outcome carried by a `poke` or `subscribe` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The action succeeded.
    Ok,

    /// The action failed; carries the remote error rendered as text.
    Err(String),
}

/// A decoded channel stream event.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Terminal result of a poke.
    Poke {
        /// The poke's action id.
        id: ActionId,
        /// Success or failure.
        outcome: Outcome,
    },

    /// Acknowledgement or rejection of a subscribe.
    Subscribe {
        /// The subscribe's action id.
        id: ActionId,
        /// Success or failure.
        outcome: Outcome,
    },

    /// One data message for a live subscription.
    Diff {
        /// The subscription id.
        id: ActionId,
        /// The message payload.
        json: Value,
    },

    /// The remote side ended the subscription.
    Quit {
        /// The subscription id.
        id: ActionId,
    },
}

impl Response {
    /// Decode a raw event payload.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the payload is not JSON, the `response`
    /// tag is unknown, or a result carries neither `ok` nor `err`.
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        let wire: WireResponse = serde_json::from_slice(raw)?;
        Ok(match wire {
            WireResponse::Poke(result) => Self::Poke {
                id: result.id,
                outcome: result.outcome()?,
            },
            WireResponse::Subscribe(result) => Self::Subscribe {
                id: result.id,
                outcome: result.outcome()?,
            },
            WireResponse::Diff { id, json } => Self::Diff { id, json },
            WireResponse::Quit { id } => Self::Quit { id },
        })
    }

    /// The action id this response correlates with.
    #[must_use]
    pub const fn id(&self) -> ActionId {
        match self {
            Self::Poke { id, .. }
            | Self::Subscribe { id, .. }
            | Self::Diff { id, .. }
            | Self::Quit { id } => *id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "response", rename_all = "lowercase")]
enum WireResponse {
    Poke(WireResult),
    Subscribe(WireResult),
    Diff {
        id: ActionId,
        #[serde(default)]
        json: Value,
    },
    Quit {
        id: ActionId,
    },
}

#[derive(Debug, Deserialize)]
struct WireResult {
    id: ActionId,

    // `"ok": null` still means success, so presence is what matters.
    #[serde(default, deserialize_with = "present")]
    ok: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    err: Option<Value>,
}

impl WireResult {
    fn outcome(self) -> Result<Outcome, DecodeError> {
        match (self.ok, self.err) {
            (_, Some(Value::String(err))) => Ok(Outcome::Err(err)),
            (_, Some(err)) => Ok(Outcome::Err(err.to_string())),
            (Some(_), None) => Ok(Outcome::Ok),
            (None, None) => Err(DecodeError::MissingOutcome { id: self.id.get() }),
        }
    }
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn poke_ok_null_is_success() {
        let resp = Response::decode(br#"{"id":1,"response":"poke","ok":null}"#).expect("decode");
        assert_eq!(
            resp,
            Response::Poke {
                id: ActionId::new(1),
                outcome: Outcome::Ok
            }
        );
    }

    #[test]
    fn poke_err_string_is_failure() {
        let resp =
            Response::decode(br#"{"id":4,"response":"poke","err":"bad mark"}"#).expect("decode");
        assert_eq!(
            resp,
            Response::Poke {
                id: ActionId::new(4),
                outcome: Outcome::Err("bad mark".into())
            }
        );
    }

    #[test]
    fn subscribe_err_tang_is_rendered() {
        let resp = Response::decode(br#"{"id":2,"response":"subscribe","err":["no","path"]}"#)
            .expect("decode");
        assert_eq!(
            resp,
            Response::Subscribe {
                id: ActionId::new(2),
                outcome: Outcome::Err(r#"["no","path"]"#.into())
            }
        );
    }

    #[test]
    fn diff_carries_payload() {
        let resp = Response::decode(br#"{"id":2,"response":"diff","json":{"n":3}}"#)
            .expect("decode");
        assert_eq!(
            resp,
            Response::Diff {
                id: ActionId::new(2),
                json: json!({"n": 3})
            }
        );
    }

    #[test]
    fn diff_without_json_is_null() {
        let resp = Response::decode(br#"{"id":2,"response":"diff"}"#).expect("decode");
        assert_eq!(
            resp,
            Response::Diff {
                id: ActionId::new(2),
                json: Value::Null
            }
        );
    }

    #[test]
    fn quit() {
        let resp = Response::decode(br#"{"id":9,"response":"quit"}"#).expect("decode");
        assert_eq!(resp.id(), ActionId::new(9));
        assert!(matches!(resp, Response::Quit { .. }));
    }

    #[test]
    fn rejects_unknown_tag() {
        let err = Response::decode(br#"{"id":1,"response":"bogus"}"#).expect_err("unknown tag");
        assert!(matches!(err, DecodeError::Json(_)));
    }

    #[test]
    fn rejects_garbage_and_missing_id() {
        assert!(Response::decode(b"not json").is_err());
        assert!(Response::decode(br#"{"response":"quit"}"#).is_err());
    }

    #[test]
    fn rejects_result_without_outcome() {
        let err = Response::decode(br#"{"id":5,"response":"poke"}"#).expect_err("no outcome");
        assert!(matches!(err, DecodeError::MissingOutcome { id: 5 }));
    }
}
