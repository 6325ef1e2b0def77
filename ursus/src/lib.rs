//! # Ursus
//!
//! A client for Urbit-style channels: one long-lived server-sent event
//! stream multiplexed with discrete actions (poke, subscribe, unsubscribe,
//! ack, delete) whose results arrive asynchronously over that stream.
//!
//! # Protocol
//!
//! ```text
//! ┌──────────┐                                  ┌──────────┐
//! │  Client   │                                  │  Ship     │
//! └────┬─────┘                                  └────┬─────┘
//!      │                                             │
//!      │  POST /~/login   password=<code>            │
//!      │ ──────────────────────────────────────────►  │
//!      │  204 + Set-Cookie                           │
//!      │ ◄──────────────────────────────────────────  │
//!      │                                             │
//!      │  PUT /~/channel/<channel-id>                │
//!      │  Body: [{"id":1,"action":"poke",...}]       │
//!      │ ──────────────────────────────────────────►  │
//!      │  204 No Content                             │
//!      │ ◄──────────────────────────────────────────  │
//!      │                                             │
//!      │  GET /~/channel/<channel-id>                │
//!      │  Accept: text/event-stream                  │
//!      │ ──────────────────────────────────────────►  │
//!      │  id: 0                                      │
//!      │  data: {"id":1,"response":"poke","ok":"ok"} │
//!      │ ◄─ ─ ─ ─ ─ ─ ─ ─ ─ (stream) ─ ─ ─ ─ ─ ─ ─ ─  │
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                       Channel                         │
//! │                                                      │
//! │  poke/subscribe ──► registry.register ──► PUT        │
//! │                                  └──► ensure_connected│
//! │                                                      │
//! │  stream task ──► Response::decode ──► registry       │
//! │       └── on end: drain both registries, reset       │
//! └──────────────────────────────────────────────────────┘
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod action;
pub mod channel;
pub mod error;
pub mod event_source;
pub mod http_client;
pub mod id;
pub mod registry;
pub mod response;
pub mod spawn;

pub use channel::{Channel, ChannelOptions, PokeEvent, SubscribeEvent};
pub use id::{ActionId, ChannelId};

/// Path (relative to the ship's base URL) of the login endpoint.
pub const LOGIN_PATH: &str = "/~/login";

/// Path prefix (relative to the ship's base URL) of channel resources.
pub const CHANNEL_PATH: &str = "/~/channel";

/// Default timeout for individual action requests (30 seconds).
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
