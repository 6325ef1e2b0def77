//! Outbound channel actions and their JSON wire shape.
//!
//! Every PUT to a channel carries a JSON list of actions. This client always
//! sends exactly one:
//!
//! ```text
//! [{"id": 1, "action": "poke", "ship": "zod", "app": "chat", "mark": "chat-action", "json": {...}}]
//! [{"id": 2, "action": "subscribe", "ship": "zod", "app": "chat", "path": "/updates"}]
//! [{"id": 3, "action": "unsubscribe", "subscription": 2}]
//! [{"action": "ack", "event-id": 12}]
//! [{"action": "delete"}]
//! ```

use serde::Serialize;
use serde_json::Value;

use crate::id::ActionId;

/// A single action addressed to a channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Action {
    /// Deliver a marked payload to an app on a ship.
    Poke {
        /// Correlates the `poke` response.
        id: ActionId,
        /// Target ship, without the leading `~`.
        ship: String,
        /// Target app.
        app: String,
        /// Mark the payload is interpreted as.
        mark: String,
        /// The payload.
        json: Value,
    },

    /// Open a subscription on an app path.
    Subscribe {
        /// Correlates the ack, diffs and quit; also the subscription id.
        id: ActionId,
        /// Target ship, without the leading `~`.
        ship: String,
        /// Target app.
        app: String,
        /// Subscription path.
        path: String,
    },

    /// Close a subscription opened by an earlier subscribe.
    Unsubscribe {
        /// Id of this action.
        id: ActionId,
        /// Id of the subscribe action being cancelled.
        subscription: ActionId,
    },

    /// Acknowledge receipt of stream events up to and including `event_id`.
    Ack {
        /// The stream event id.
        #[serde(rename = "event-id")]
        event_id: u64,
    },

    /// Delete the channel on the remote side.
    Delete,
}

impl Action {
    /// Encode as a one-element JSON list, the body of a channel PUT.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized.
    pub fn encode_envelope(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&[self])
    }
}
