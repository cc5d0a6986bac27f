//! Cancellable single-connection streaming transport.
//!
//! A `StreamTransport` owns at most one server-sent event connection at a
//! time. Opening a new connection supersedes the previous one, cancelling it
//! cleanly. Local cancellation always surfaces as a `Closed` signal, never
//! as an `Error`; errors are reserved for genuine failures.

use std::collections::VecDeque;

use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::stream::error::StreamError;
use crate::stream::frame::FrameStream;

/// Lifecycle states of the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// No connection has been opened yet
    Idle,
    /// Request sent, response headers not yet received
    Connecting,
    /// Response accepted, frames flowing
    Streaming,
    /// Cancellation requested, final Closed not yet delivered
    Cancelling,
    /// Connection torn down (ended, failed, or cancelled)
    Closed,
}

/// Signals surfaced by the transport while a stream is live.
#[derive(Debug, PartialEq)]
pub enum StreamSignal<T> {
    /// The server accepted the request; frames may follow
    Open,
    /// A decoded frame
    Message(T),
    /// The stream failed; terminal, no Closed follows
    Error(StreamError),
    /// The stream ended, remotely or by local cancellation; emitted once
    Closed,
}

/// A streaming request. Always a POST; a body makes it an initiating call
/// (chat), without one it is a bare subscription (execute, summarize).
#[derive(Debug, Clone)]
pub struct StreamRequest {
    pub url: Url,
    pub body: Option<serde_json::Value>,
}

impl StreamRequest {
    pub fn new(url: Url) -> Self {
        Self { url, body: None }
    }

    pub fn with_body(url: Url, body: serde_json::Value) -> Self {
        Self {
            url,
            body: Some(body),
        }
    }
}

type ByteStream = BoxStream<'static, reqwest::Result<bytes::Bytes>>;

/// An open connection: decoded frames plus its cancellation handle.
struct Connection<T> {
    frames: FrameStream<ByteStream, T>,
    cancel: CancellationToken,
}

impl<T> Connection<T> {
    fn from_response(response: reqwest::Response) -> Self {
        Self {
            frames: FrameStream::new(response.bytes_stream().boxed()),
            cancel: CancellationToken::new(),
        }
    }
}

impl<T> Drop for Connection<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// At-most-one cancellable streaming connection.
pub struct StreamTransport<T> {
    http: reqwest::Client,
    state: TransportState,
    conn: Option<Connection<T>>,
    pending: VecDeque<StreamSignal<T>>,
}

impl<T> StreamTransport<T>
where
    T: DeserializeOwned,
{
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            state: TransportState::Idle,
            conn: None,
            pending: VecDeque::new(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Whether a connection is open or being opened.
    pub fn is_open(&self) -> bool {
        matches!(
            self.state,
            TransportState::Connecting | TransportState::Streaming
        )
    }

    /// Opens a streaming connection, superseding any previous one.
    ///
    /// The superseded connection yields exactly one `Closed` signal before
    /// the new connection's `Open`. Failures (network or non-2xx before any
    /// frame) surface as an `Error` signal from `next_signal`, so this
    /// method never fails directly.
    pub async fn connect(&mut self, request: StreamRequest) {
        self.begin_connect();

        let builder = match &request.body {
            Some(body) => self.http.post(request.url.clone()).json(body),
            None => self.http.post(request.url.clone()),
        };

        let response = match builder.header("accept", "text/event-stream").send().await {
            Ok(response) => response,
            Err(err) => {
                self.fail_connect(StreamError::from_reqwest(&err));
                return;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            self.fail_connect(StreamError::http_status(status.as_u16(), &error_body));
            return;
        }

        self.complete_connect(Connection::from_response(response));
    }

    /// Requests cancellation of the active connection.
    ///
    /// Cleanup is deferred to the next `next_signal` call, which yields the
    /// final `Closed` signal.
    pub fn disconnect(&mut self) {
        if let Some(conn) = &self.conn {
            conn.cancel.cancel();
            self.state = TransportState::Cancelling;
        }
    }

    /// Returns the next signal, or None once the stream is fully drained.
    pub async fn next_signal(&mut self) -> Option<StreamSignal<T>> {
        if let Some(signal) = self.pending.pop_front() {
            return Some(signal);
        }

        let conn = self.conn.as_mut()?;
        let frames = &mut conn.frames;
        let cancel = &conn.cancel;

        let signal = tokio::select! {
            biased;
            () = cancel.cancelled() => StreamSignal::Closed,
            item = frames.next() => match item {
                Some(Ok(frame)) => StreamSignal::Message(frame),
                Some(Err(error)) => StreamSignal::Error(error),
                None => StreamSignal::Closed,
            },
        };

        if !matches!(signal, StreamSignal::Message(_)) {
            self.conn = None;
            self.state = TransportState::Closed;
        }

        Some(signal)
    }

    fn begin_connect(&mut self) {
        if self.conn.take().is_some() {
            // Dropping the superseded connection cancels it. A superseded
            // stream closes, it does not error.
            self.pending.push_back(StreamSignal::Closed);
        }
        self.state = TransportState::Connecting;
    }

    fn fail_connect(&mut self, error: StreamError) {
        self.pending.push_back(StreamSignal::Error(error));
        self.state = TransportState::Closed;
    }

    fn complete_connect(&mut self, conn: Connection<T>) {
        self.conn = Some(conn);
        self.pending.push_back(StreamSignal::Open);
        self.state = TransportState::Streaming;
    }
}
