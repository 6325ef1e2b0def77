//! The channel session.
//!
//! A [`Channel`] owns one remote channel resource, named by a generated
//! [`ChannelId`]. Actions are PUT to the channel URL; their results come
//! back later over a single event stream, which is opened after the first
//! send and torn down (with a full reset) when it ends.
//!
//! ```text
//!   poke/subscribe ──► register handler ──► PUT /~/channel/<id>
//!                                                │
//!                                   on response: ensure_connected
//!                                                │
//!   stream task ◄── GET /~/channel/<id> ◄────────┘
//!       │
//!       ├── event ──► decode ──► take/peek handler ──► invoke
//!       └── end   ──► drain both registries ──► fail all ──► reset
//! ```
//!
//! All session state lives behind one [`Mutex`]. Handlers are invoked while
//! it is held, which keeps dispatch in stream order and makes resets atomic
//! with respect to new actions. Handlers must therefore return promptly and
//! must not block on the channel.

use core::time::Duration;
use std::sync::Arc;

use async_lock::Mutex;
use futures::{FutureExt, future::AbortHandle};
use serde::Serialize;
use serde_json::Value;

use crate::{
    CHANNEL_PATH, DEFAULT_REQUEST_TIMEOUT_SECS, LOGIN_PATH,
    action::Action,
    error::{ActionError, ClientError},
    event_source::{EventSource, EventStream, StreamEvent},
    http_client::{HttpClient, Method},
    id::{ActionId, ActionIds, ChannelId},
    registry::HandlerRegistry,
    response::{Outcome, Response},
    spawn::Spawn,
};

/// Reason given to pending handlers when the stream ends without an error.
const STREAM_ENDED: &str = "stream ended";

/// The single terminal outcome of a poke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PokeEvent {
    /// The remote app accepted the poke.
    Success,

    /// The poke failed, was rejected, or was flushed by a reset.
    Failure(ActionError),
}

/// Events delivered to a subscription handler.
///
/// A handler sees at most one [`Success`](Self::Success), any number of
/// [`Message`](Self::Message)s, and exactly one of [`Quit`](Self::Quit) or
/// [`Failure`](Self::Failure), after which it is dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum SubscribeEvent {
    /// The subscription was accepted.
    Success,

    /// A message on the subscription.
    Message(Value),

    /// The remote side closed the subscription.
    Quit,

    /// The subscription failed, was rejected, or was flushed by a reset.
    Failure(ActionError),
}

/// One-shot handler for a poke.
pub type PokeHandler = Box<dyn FnOnce(PokeEvent) + Send>;

/// Multi-shot handler for a subscription.
pub type SubscribeHandler = Box<dyn FnMut(SubscribeEvent) + Send>;

/// Options for the bundled reqwest transports.
#[derive(Debug, Clone, Copy)]
pub struct ChannelOptions {
    /// Timeout for individual action and login requests.
    pub request_timeout: Duration,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Number of handlers waiting on each registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pending {
    /// Pokes waiting for their result.
    pub pokes: usize,

    /// Live subscriptions.
    pub subscriptions: usize,
}

/// A client session on one remote channel.
///
/// # Type Parameters
///
/// - `H`: The HTTP client used to send actions
/// - `E`: The event source used to open the channel stream
/// - `S`: The task spawner for the stream task and background deletes
pub struct Channel<H, E, S>
where
    H: HttpClient + Send + Sync + 'static,
    E: EventSource + Send + Sync + 'static,
    S: Spawn + Send + Sync + 'static,
{
    shared: Arc<Shared<H, E, S>>,
}

struct Shared<H, E, S> {
    base_url: String,
    code: String,
    http: H,
    events: E,
    spawner: S,
    state: Mutex<State>,
}

struct State {
    channel_id: ChannelId,
    action_ids: ActionIds,
    last_event_id: Option<u64>,
    stream: Option<AbortHandle>,

    /// Bumped on every reset. Sends and stream tasks remember the epoch
    /// they started in and stand down once it has moved on.
    epoch: u64,

    /// Whether anything has been sent to the current channel id.
    used: bool,

    pokes: HandlerRegistry<PokeHandler>,
    subscriptions: HandlerRegistry<SubscribeHandler>,
}

/// What a reset left behind.
struct Reset {
    previous: ChannelId,
    used: bool,
    stream: Option<AbortHandle>,
}

/// An encoded action, ready to PUT.
struct Envelope {
    url: String,
    body: Vec<u8>,
    epoch: u64,
}

fn channel_url(base_url: &str, channel_id: &ChannelId) -> String {
    format!("{base_url}{CHANNEL_PATH}/{channel_id}")
}

impl State {
    fn new() -> Self {
        Self {
            channel_id: ChannelId::generate(),
            action_ids: ActionIds::default(),
            last_event_id: None,
            stream: None,
            epoch: 0,
            used: false,
            pokes: HandlerRegistry::new(),
            subscriptions: HandlerRegistry::new(),
        }
    }

    fn envelope(&mut self, base_url: &str, action: &Action) -> Result<Envelope, ClientError> {
        let body = action.encode_envelope()?;
        self.used = true;
        Ok(Envelope {
            url: channel_url(base_url, &self.channel_id),
            body,
            epoch: self.epoch,
        })
    }

    fn dispatch(&mut self, response: Response) {
        let id = response.id();
        let delivered = match response {
            Response::Poke { id, outcome } => self.pokes.take(id).map(|handler| {
                handler(match outcome {
                    Outcome::Ok => PokeEvent::Success,
                    Outcome::Err(err) => PokeEvent::Failure(ActionError::Rejected(err)),
                });
            }),
            Response::Subscribe {
                id,
                outcome: Outcome::Ok,
            } => self
                .subscriptions
                .peek(id)
                .map(|handler| handler(SubscribeEvent::Success)),
            Response::Subscribe {
                id,
                outcome: Outcome::Err(err),
            } => self.subscriptions.take(id).map(|mut handler| {
                handler(SubscribeEvent::Failure(ActionError::Rejected(err)));
            }),
            Response::Diff { id, json } => self
                .subscriptions
                .peek(id)
                .map(|handler| handler(SubscribeEvent::Message(json))),
            Response::Quit { id } => self
                .subscriptions
                .take(id)
                .map(|mut handler| handler(SubscribeEvent::Quit)),
        };

        if delivered.is_none() {
            tracing::debug!(
                channel = %self.channel_id,
                action_id = %id,
                "dropping response with no pending handler"
            );
        }
    }

    /// Fail every pending handler with `err`.
    fn flush(&mut self, err: &ActionError) {
        let pokes = self.pokes.drain_all();
        let subscriptions = self.subscriptions.drain_all();
        if !pokes.is_empty() || !subscriptions.is_empty() {
            tracing::info!(
                channel = %self.channel_id,
                pokes = pokes.len(),
                subscriptions = subscriptions.len(),
                "failing pending handlers: {err}"
            );
        }

        for handler in pokes {
            handler(PokeEvent::Failure(err.clone()));
        }
        for mut handler in subscriptions {
            handler(SubscribeEvent::Failure(err.clone()));
        }
    }

    /// Return to the just-constructed shape under a fresh channel id.
    fn reset(&mut self) -> Reset {
        let previous = core::mem::replace(&mut self.channel_id, ChannelId::generate());
        self.action_ids.reset();
        self.last_event_id = None;
        self.epoch += 1;

        tracing::info!(previous = %previous, channel = %self.channel_id, "channel reset");

        Reset {
            previous,
            used: core::mem::take(&mut self.used),
            stream: self.stream.take(),
        }
    }
}

impl<H, E, S> Shared<H, E, S>
where
    H: HttpClient + Send + Sync + 'static,
    E: EventSource + Send + Sync + 'static,
    S: Spawn + Send + Sync + 'static,
{
    async fn put(&self, url: &str, body: Vec<u8>) -> Result<(), ClientError> {
        let resp = self
            .http
            .send(
                Method::Put,
                url,
                &[("content-type", "application/json")],
                body,
            )
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;

        if resp.is_success() {
            Ok(())
        } else {
            Err(ClientError::UnexpectedStatus {
                status: resp.status,
                body: String::from_utf8_lossy(&resp.body).into_owned(),
            })
        }
    }

    /// PUT the envelope, then open the stream unless the channel was reset
    /// while the send was in flight.
    async fn transmit(self: &Arc<Self>, envelope: Envelope) -> Result<(), ClientError> {
        let result = self.put(&envelope.url, envelope.body).await;

        let mut state = self.state.lock().await;
        if state.epoch == envelope.epoch {
            self.ensure_connected(&mut state);
        } else {
            tracing::debug!(url = %envelope.url, "channel reset during send, not connecting");
        }

        result
    }

    fn ensure_connected(self: &Arc<Self>, state: &mut State) {
        if state.stream.is_some() {
            return;
        }

        let url = channel_url(&self.base_url, &state.channel_id);
        let last_event_id = state.last_event_id.map(|id| id.to_string());
        let epoch = state.epoch;

        tracing::debug!(url = %url, last_event_id = ?last_event_id, "opening event stream");

        let shared = Arc::clone(self);
        let handle = self.spawner.spawn(
            async move {
                shared.run_stream(epoch, url, last_event_id).await;
            }
            .boxed(),
        );
        state.stream = Some(handle);
    }

    async fn run_stream(self: Arc<Self>, epoch: u64, url: String, last_event_id: Option<String>) {
        let reason = match self.events.open(&url, last_event_id.as_deref()).await {
            Ok(mut stream) => loop {
                match stream.next_event().await {
                    Some(Ok(event)) => {
                        if !self.handle_event(epoch, event).await {
                            return;
                        }
                    }
                    Some(Err(e)) => break e.to_string(),
                    None => break STREAM_ENDED.to_string(),
                }
            },
            Err(e) => e.to_string(),
        };

        self.complete(epoch, reason).await;
    }

    /// Returns `false` once the stream belongs to a past epoch.
    async fn handle_event(&self, epoch: u64, event: StreamEvent) -> bool {
        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            return false;
        }

        if let Some(id) = event.id {
            match id.parse() {
                Ok(id) => state.last_event_id = Some(id),
                Err(_) => tracing::debug!(
                    channel = %state.channel_id,
                    event_id = %id,
                    "ignoring non-numeric event id"
                ),
            }
        }

        match Response::decode(event.data.as_bytes()) {
            Ok(response) => state.dispatch(response),
            Err(e) => {
                tracing::warn!(
                    channel = %state.channel_id,
                    last_event_id = ?state.last_event_id,
                    "failed to decode channel event: {e}"
                );
            }
        }

        true
    }

    async fn complete(&self, epoch: u64, reason: String) {
        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            return;
        }

        tracing::info!(channel = %state.channel_id, "event stream closed: {reason}");
        state.flush(&ActionError::StreamClosed(reason));
        let reset = state.reset();
        drop(state);

        self.delete_previous(reset);
    }

    async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.flush(&ActionError::Reset);
        let reset = state.reset();
        drop(state);

        if let Some(stream) = &reset.stream {
            stream.abort();
        }
        self.delete_previous(reset);
    }

    /// Best-effort delete of a channel abandoned by a reset.
    fn delete_previous(&self, reset: Reset) {
        if !reset.used {
            return;
        }

        let url = channel_url(&self.base_url, &reset.previous);
        let body = match Action::Delete.encode_envelope() {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("failed to encode delete: {e}");
                return;
            }
        };

        let http = self.http.clone();
        let _handle = self.spawner.spawn(
            async move {
                match http
                    .send(
                        Method::Put,
                        &url,
                        &[("content-type", "application/json")],
                        body,
                    )
                    .await
                {
                    Ok(resp) if resp.is_success() => {
                        tracing::debug!(url = %url, "deleted abandoned channel");
                    }
                    Ok(resp) => {
                        tracing::debug!(url = %url, status = resp.status, "ignoring failed delete");
                    }
                    Err(e) => {
                        tracing::debug!(url = %url, "ignoring failed delete: {e}");
                    }
                }
            }
            .boxed(),
        );
    }
}

impl<H, E, S> Channel<H, E, S>
where
    H: HttpClient + Send + Sync + 'static,
    E: EventSource + Send + Sync + 'static,
    S: Spawn + Send + Sync + 'static,
{
    /// Create a channel session. No network activity happens until the
    /// first action.
    ///
    /// - `base_url`: The ship's URL, e.g., `http://localhost:8080`.
    /// - `code`: The ship's `+code`, used by [`authenticate`](Self::authenticate).
    /// - `http`: The HTTP client for actions.
    /// - `events`: The event source for the channel stream.
    /// - `spawner`: The task spawner for the stream task.
    #[must_use]
    pub fn new(base_url: &str, code: &str, http: H, events: E, spawner: S) -> Self {
        Self {
            shared: Arc::new(Shared {
                base_url: base_url.trim_end_matches('/').to_string(),
                code: code.to_string(),
                http,
                events,
                spawner,
                state: Mutex::new(State::new()),
            }),
        }
    }

    /// The ship's base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.shared.base_url
    }

    /// The current channel id.
    pub async fn channel_id(&self) -> ChannelId {
        self.shared.state.lock().await.channel_id.clone()
    }

    /// The URL of the current channel resource.
    pub async fn channel_url(&self) -> String {
        let state = self.shared.state.lock().await;
        channel_url(&self.shared.base_url, &state.channel_id)
    }

    /// Whether the event stream is open or being opened.
    pub async fn is_connected(&self) -> bool {
        self.shared.state.lock().await.stream.is_some()
    }

    /// The id of the last stream event seen since the last reset, in the
    /// form [`ack`](Self::ack) takes.
    pub async fn last_event_id(&self) -> Option<u64> {
        self.shared.state.lock().await.last_event_id
    }

    /// How many handlers are waiting.
    pub async fn pending(&self) -> Pending {
        let state = self.shared.state.lock().await;
        Pending {
            pokes: state.pokes.len(),
            subscriptions: state.subscriptions.len(),
        }
    }

    /// Log in with the ship's code.
    ///
    /// The remote side rejects channel actions until this has succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request fails or is refused.
    pub async fn authenticate(&self) -> Result<(), ClientError> {
        let url = format!("{}{LOGIN_PATH}", self.shared.base_url);
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("password", &self.shared.code)
            .finish();

        tracing::debug!(url = %url, "authenticating");

        let resp = self
            .shared
            .http
            .send(
                Method::Post,
                &url,
                &[("content-type", "application/x-www-form-urlencoded")],
                body.into_bytes(),
            )
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;

        if resp.is_success() {
            Ok(())
        } else {
            Err(ClientError::UnexpectedStatus {
                status: resp.status,
                body: String::from_utf8_lossy(&resp.body).into_owned(),
            })
        }
    }

    /// Acknowledge stream events up to and including `event_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the send fails.
    pub async fn ack(&self, event_id: u64) -> Result<(), ClientError> {
        let envelope = {
            let mut state = self.shared.state.lock().await;
            state.envelope(&self.shared.base_url, &Action::Ack { event_id })?
        };
        self.shared.transmit(envelope).await
    }

    /// Poke `app` on `ship` with a `mark`ed JSON payload.
    ///
    /// `handler` is called exactly once: with the remote result, or with a
    /// failure if the send fails, the stream dies, or the channel is reset.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the payload cannot be encoded or the send
    /// fails. The handler has been called with a failure in either case.
    pub async fn poke<J, F>(
        &self,
        ship: &str,
        app: &str,
        mark: &str,
        json: &J,
        handler: F,
    ) -> Result<ActionId, ClientError>
    where
        J: Serialize + ?Sized,
        F: FnOnce(PokeEvent) + Send + 'static,
    {
        let json = match serde_json::to_value(json) {
            Ok(json) => json,
            Err(e) => {
                handler(PokeEvent::Failure(ActionError::Encode(e.to_string())));
                return Err(e.into());
            }
        };

        let shared = &self.shared;
        let (id, envelope) = {
            let mut state = shared.state.lock().await;
            let id = state.action_ids.allocate();
            let action = Action::Poke {
                id,
                ship: ship.to_string(),
                app: app.to_string(),
                mark: mark.to_string(),
                json,
            };
            let envelope = match state.envelope(&shared.base_url, &action) {
                Ok(envelope) => envelope,
                Err(e) => {
                    drop(state);
                    handler(PokeEvent::Failure(ActionError::from(&e)));
                    return Err(e);
                }
            };
            state.pokes.register(id, Box::new(handler));
            (id, envelope)
        };

        tracing::debug!(action_id = %id, ship, app, mark, "sending poke");

        let epoch = envelope.epoch;
        if let Err(e) = shared.transmit(envelope).await {
            let mut state = shared.state.lock().await;
            if state.epoch == epoch {
                if let Some(handler) = state.pokes.take(id) {
                    handler(PokeEvent::Failure(ActionError::from(&e)));
                }
            }
            return Err(e);
        }

        Ok(id)
    }

    /// Subscribe to `path` on `app` on `ship`.
    ///
    /// The returned id is the subscription id to pass to
    /// [`unsubscribe`](Self::unsubscribe).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the send fails. The handler has been
    /// called with a failure in that case.
    pub async fn subscribe<F>(
        &self,
        ship: &str,
        app: &str,
        path: &str,
        handler: F,
    ) -> Result<ActionId, ClientError>
    where
        F: FnMut(SubscribeEvent) + Send + 'static,
    {
        let mut handler = handler;
        let shared = &self.shared;
        let (id, envelope) = {
            let mut state = shared.state.lock().await;
            let id = state.action_ids.allocate();
            let action = Action::Subscribe {
                id,
                ship: ship.to_string(),
                app: app.to_string(),
                path: path.to_string(),
            };
            let envelope = match state.envelope(&shared.base_url, &action) {
                Ok(envelope) => envelope,
                Err(e) => {
                    drop(state);
                    handler(SubscribeEvent::Failure(ActionError::from(&e)));
                    return Err(e);
                }
            };
            state.subscriptions.register(id, Box::new(handler));
            (id, envelope)
        };

        tracing::debug!(action_id = %id, ship, app, path, "sending subscribe");

        let epoch = envelope.epoch;
        if let Err(e) = shared.transmit(envelope).await {
            let mut state = shared.state.lock().await;
            if state.epoch == epoch {
                if let Some(mut handler) = state.subscriptions.take(id) {
                    handler(SubscribeEvent::Failure(ActionError::from(&e)));
                }
            }
            return Err(e);
        }

        Ok(id)
    }

    /// Close the subscription opened by the subscribe with id `subscription`.
    ///
    /// The subscription's handler stays registered until the remote side
    /// answers with a quit.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the send fails.
    pub async fn unsubscribe(&self, subscription: ActionId) -> Result<ActionId, ClientError> {
        let (id, envelope) = {
            let mut state = self.shared.state.lock().await;
            let id = state.action_ids.allocate();
            let envelope = state.envelope(
                &self.shared.base_url,
                &Action::Unsubscribe { id, subscription },
            )?;
            (id, envelope)
        };

        tracing::debug!(action_id = %id, subscription = %subscription, "sending unsubscribe");

        self.shared.transmit(envelope).await?;
        Ok(id)
    }

    /// Delete the channel on the remote side.
    ///
    /// The stream is not opened for this action. The server ends any open
    /// stream for a deleted channel, which resets the session.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the send fails.
    pub async fn delete_channel(&self) -> Result<(), ClientError> {
        let envelope = {
            let mut state = self.shared.state.lock().await;
            state.envelope(&self.shared.base_url, &Action::Delete)?
        };

        tracing::debug!(url = %envelope.url, "deleting channel");

        self.shared.put(&envelope.url, envelope.body).await
    }

    /// Abandon the current channel and start over under a fresh id.
    ///
    /// Pending handlers fail with [`ActionError::Reset`], the stream is
    /// closed, the action counter restarts, and the old channel is deleted
    /// in the background if anything was sent on it. Safe to call at any
    /// time, including when idle.
    pub async fn reset(&self) {
        self.shared.reset().await;
    }
}

#[cfg(all(feature = "reqwest", feature = "tokio"))]
#[cfg_attr(docsrs, doc(cfg(all(feature = "reqwest", feature = "tokio"))))]
impl
    Channel<
        crate::http_client::ReqwestHttpClient,
        crate::event_source::ReqwestEventSource,
        crate::spawn::TokioSpawn,
    >
{
    /// Create a channel over the bundled reqwest transports, spawning on
    /// the ambient tokio runtime.
    ///
    /// The HTTP client and the event stream share one cookie jar, so the
    /// cookie from [`authenticate`](Self::authenticate) authorizes both.
    #[must_use]
    pub fn with_reqwest(base_url: &str, code: &str, options: &ChannelOptions) -> Self {
        let http = crate::http_client::ReqwestHttpClient::with_options(options);
        let events = crate::event_source::ReqwestEventSource::new(http.cookie_jar());
        Self::new(base_url, code, http, events, crate::spawn::TokioSpawn)
    }
}

impl<H, E, S> core::fmt::Debug for Channel<H, E, S>
where
    H: HttpClient + Send + Sync + 'static,
    E: EventSource + Send + Sync + 'static,
    S: Spawn + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Channel")
            .field("base_url", &self.shared.base_url)
            .finish_non_exhaustive()
    }
}

impl<H, E, S> Drop for Channel<H, E, S>
where
    H: HttpClient + Send + Sync + 'static,
    E: EventSource + Send + Sync + 'static,
    S: Spawn + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if let Some(mut state) = self.shared.state.try_lock() {
            if !state.used
                && state.stream.is_none()
                && state.pokes.is_empty()
                && state.subscriptions.is_empty()
            {
                return;
            }
            state.flush(&ActionError::Reset);
            let reset = state.reset();
            drop(state);

            if let Some(stream) = &reset.stream {
                stream.abort();
            }
            self.shared.delete_previous(reset);
        } else {
            let shared = Arc::clone(&self.shared);
            let _handle = self.shared.spawner.spawn(
                async move {
                    shared.reset().await;
                }
                .boxed(),
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn channel_url_shape() {
        let id = ChannelId::generate();
        assert_eq!(
            channel_url("http://localhost:8080", &id),
            format!("http://localhost:8080/~/channel/{id}")
        );
    }

    #[test]
    fn state_reset_restores_fresh_shape() {
        let mut state = State::new();
        let before = state.channel_id.clone();
        state.action_ids.allocate();
        state.last_event_id = Some(7);
        state.used = true;

        let reset = state.reset();

        assert_eq!(reset.previous, before);
        assert!(reset.used);
        assert!(reset.stream.is_none());
        assert_ne!(state.channel_id, before);
        assert_eq!(state.action_ids.allocate(), ActionId::new(1));
        assert!(state.last_event_id.is_none());
        assert_eq!(state.epoch, 1);
        assert!(!state.used);
    }

    #[test]
    fn dispatch_keeps_subscription_on_success_and_diff() {
        use std::sync::Mutex as StdMutex;

        let seen = Arc::new(StdMutex::new(Vec::new()));
        let mut state = State::new();
        let sink = seen.clone();
        state.subscriptions.register(
            ActionId::new(2),
            Box::new(move |event| sink.lock().expect("lock").push(event)),
        );

        state.dispatch(Response::Subscribe {
            id: ActionId::new(2),
            outcome: Outcome::Ok,
        });
        state.dispatch(Response::Diff {
            id: ActionId::new(2),
            json: Value::from(1),
        });
        assert!(state.subscriptions.contains(ActionId::new(2)));

        state.dispatch(Response::Quit {
            id: ActionId::new(2),
        });
        assert!(state.subscriptions.is_empty());

        assert_eq!(
            *seen.lock().expect("lock"),
            vec![
                SubscribeEvent::Success,
                SubscribeEvent::Message(Value::from(1)),
                SubscribeEvent::Quit,
            ]
        );
    }

    #[test]
    fn dispatch_evicts_poke_on_either_outcome() {
        let mut state = State::new();
        state
            .pokes
            .register(ActionId::new(1), Box::new(|event| assert_eq!(event, PokeEvent::Success)));
        state.pokes.register(
            ActionId::new(2),
            Box::new(|event| {
                assert_eq!(
                    event,
                    PokeEvent::Failure(ActionError::Rejected("nope".into()))
                );
            }),
        );

        state.dispatch(Response::Poke {
            id: ActionId::new(1),
            outcome: Outcome::Ok,
        });
        state.dispatch(Response::Poke {
            id: ActionId::new(2),
            outcome: Outcome::Err("nope".into()),
        });

        assert!(state.pokes.is_empty());
    }

    #[test]
    fn flush_fails_everything() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let failures = Arc::new(AtomicUsize::new(0));
        let mut state = State::new();

        let count = failures.clone();
        state.pokes.register(
            ActionId::new(1),
            Box::new(move |event| {
                assert!(matches!(event, PokeEvent::Failure(ActionError::Reset)));
                count.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let count = failures.clone();
        state.subscriptions.register(
            ActionId::new(2),
            Box::new(move |event| {
                assert!(matches!(event, SubscribeEvent::Failure(ActionError::Reset)));
                count.fetch_add(1, Ordering::SeqCst);
            }),
        );

        state.flush(&ActionError::Reset);
        state.flush(&ActionError::Reset);

        assert_eq!(failures.load(Ordering::SeqCst), 2);
        assert!(state.pokes.is_empty());
        assert!(state.subscriptions.is_empty());
    }
}
