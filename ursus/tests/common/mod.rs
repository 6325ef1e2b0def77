//! In-memory transports for driving a [`Channel`] in tests.

#![allow(dead_code, unreachable_pub)]

use std::{
    sync::{
        Arc, Mutex, OnceLock,
        atomic::{AtomicBool, AtomicU16, Ordering},
    },
    time::Duration,
};

use futures::{FutureExt, future::BoxFuture};
use serde_json::Value;
use ursus::{
    Channel,
    event_source::{EventSource, EventStream, StreamEvent},
    http_client::{HttpClient, HttpResponse, Method},
    spawn::TokioSpawn,
};

pub const BASE_URL: &str = "http://ship.test";
pub const CODE: &str = "lidlut-tabwed-pillex-ridrup";
pub const TIMEOUT: Duration = Duration::from_secs(5);

pub type TestChannel = Channel<RecordingHttp, MockEvents, TokioSpawn>;

pub fn init_tracing() {
    static ONCE: OnceLock<()> = OnceLock::new();
    ONCE.get_or_init(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

// ─── HTTP ────────────────────────────────────────────────────────────────────

/// A request seen by [`RecordingHttp`].
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub url: String,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }
}

#[derive(Debug, thiserror::Error)]
#[error("connection refused")]
pub struct Refused;

/// Records every request and answers with the configured status (`204`
/// unless told otherwise), or refuses while failing.
#[derive(Debug, Clone)]
pub struct RecordingHttp {
    requests: Arc<Mutex<Vec<Recorded>>>,
    failing: Arc<AtomicBool>,
    status: Arc<AtomicU16>,
    gate: Arc<Mutex<Option<async_channel::Receiver<()>>>>,
}

impl Default for RecordingHttp {
    fn default() -> Self {
        Self {
            requests: Arc::default(),
            failing: Arc::default(),
            status: Arc::new(AtomicU16::new(204)),
            gate: Arc::default(),
        }
    }
}

impl RecordingHttp {
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().expect("lock").clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_status(&self, status: u16) {
        self.status.store(status, Ordering::SeqCst);
    }

    /// Hold every PUT open until the returned sender is dropped.
    ///
    /// Requests are still recorded as soon as they are sent.
    pub fn hold_puts(&self) -> async_channel::Sender<()> {
        let (release, gate) = async_channel::bounded(1);
        *self.gate.lock().expect("lock") = Some(gate);
        release
    }

    /// Wait until a request matching `pred` has been recorded.
    pub async fn wait_for(&self, pred: impl Fn(&Recorded) -> bool) -> Recorded {
        tokio::time::timeout(TIMEOUT, async {
            loop {
                if let Some(found) = self.requests().into_iter().find(|r| pred(r)) {
                    return found;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("request was not sent in time")
    }
}

impl HttpClient for RecordingHttp {
    type Error = Refused;

    fn send(
        &self,
        method: Method,
        url: &str,
        _headers: &[(&str, &str)],
        body: Vec<u8>,
    ) -> BoxFuture<'_, Result<HttpResponse, Self::Error>> {
        let failing = self.failing.load(Ordering::SeqCst);
        let status = self.status.load(Ordering::SeqCst);
        let gate = match method {
            Method::Put => self.gate.lock().expect("lock").clone(),
            Method::Post => None,
        };
        self.requests.lock().expect("lock").push(Recorded {
            method,
            url: url.to_owned(),
            body,
        });

        async move {
            if let Some(gate) = gate {
                let _ = gate.recv().await;
            }
            if failing {
                return Err(Refused);
            }
            Ok(HttpResponse {
                status,
                body: Vec::new(),
            })
        }
        .boxed()
    }
}

// ─── Event stream ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct StreamFailure(pub String);

/// A stream the channel opened; push events into it through `feed`.
#[derive(Debug)]
pub struct Opened {
    pub url: String,
    pub last_event_id: Option<String>,
    pub feed: async_channel::Sender<Result<StreamEvent, StreamFailure>>,
}

impl Opened {
    pub async fn push(&self, id: u64, data: Value) {
        self.push_with_id(&id.to_string(), data).await;
    }

    pub async fn push_with_id(&self, id: &str, data: Value) {
        self.feed
            .send(Ok(StreamEvent {
                id: Some(id.to_owned()),
                data: data.to_string(),
            }))
            .await
            .expect("stream reader alive");
    }

    pub async fn push_raw(&self, data: &str) {
        self.feed
            .send(Ok(StreamEvent {
                id: None,
                data: data.to_owned(),
            }))
            .await
            .expect("stream reader alive");
    }

    pub async fn fail(&self, reason: &str) {
        self.feed
            .send(Err(StreamFailure(reason.to_owned())))
            .await
            .expect("stream reader alive");
    }
}

/// Hands each opened stream to the test through `opened`.
#[derive(Debug, Clone)]
pub struct MockEvents {
    opened: async_channel::Sender<Opened>,
}

impl MockEvents {
    pub fn new() -> (Self, async_channel::Receiver<Opened>) {
        let (tx, rx) = async_channel::unbounded();
        (Self { opened: tx }, rx)
    }
}

pub struct MockStream {
    rx: async_channel::Receiver<Result<StreamEvent, StreamFailure>>,
}

impl EventStream for MockStream {
    type Error = StreamFailure;

    fn next_event(&mut self) -> BoxFuture<'_, Option<Result<StreamEvent, Self::Error>>> {
        async move { self.rx.recv().await.ok() }.boxed()
    }
}

impl EventSource for MockEvents {
    type Error = StreamFailure;
    type Stream = MockStream;

    fn open(
        &self,
        url: &str,
        last_event_id: Option<&str>,
    ) -> BoxFuture<'_, Result<Self::Stream, Self::Error>> {
        let (feed, rx) = async_channel::unbounded();
        let opened = Opened {
            url: url.to_owned(),
            last_event_id: last_event_id.map(str::to_owned),
            feed,
        };

        async move {
            self.opened
                .send(opened)
                .await
                .map_err(|_| StreamFailure("test gone".into()))?;
            Ok(MockStream { rx })
        }
        .boxed()
    }
}

// ─── Harness ─────────────────────────────────────────────────────────────────

pub struct Harness {
    pub channel: TestChannel,
    pub http: RecordingHttp,
    pub opened: async_channel::Receiver<Opened>,
}

impl Harness {
    pub fn new() -> Self {
        init_tracing();
        let http = RecordingHttp::default();
        let (events, opened) = MockEvents::new();
        let channel = Channel::new(BASE_URL, CODE, http.clone(), events, TokioSpawn);
        Self {
            channel,
            http,
            opened,
        }
    }

    pub async fn next_stream(&self) -> Opened {
        recv(&self.opened).await
    }
}

/// Receive from `rx`, failing the test after [`TIMEOUT`].
pub async fn recv<T>(rx: &async_channel::Receiver<T>) -> T {
    tokio::time::timeout(TIMEOUT, rx.recv())
        .await
        .expect("timed out")
        .expect("sender dropped")
}

/// A handler that forwards every event into a channel.
pub fn forward<T: Send + 'static>() -> (impl FnMut(T) + Send + 'static, async_channel::Receiver<T>)
{
    let (tx, rx) = async_channel::unbounded();
    (
        move |event| {
            let _ = tx.try_send(event);
        },
        rx,
    )
}
