use std::marker::PhantomData;
use std::pin::Pin;

use eventsource_stream::{EventStream, Eventsource};
use futures_util::Stream;
use serde::de::DeserializeOwned;

use crate::stream::error::{StreamError, StreamResult};

/// SSE decoder that converts a byte stream into typed frames.
///
/// Each SSE `data:` payload is decoded as JSON into `T`. The payload's
/// embedded `type` field drives enum dispatch; the SSE `event:` field is
/// ignored. Payloads that fail to decode are logged and skipped so a
/// single bad frame does not kill the stream.
pub struct FrameStream<S, T> {
    inner: EventStream<S>,
    _marker: PhantomData<fn() -> T>,
}

impl<S, T> FrameStream<S, T> {
    pub fn new(stream: S) -> Self
    where
        S: Eventsource,
    {
        Self {
            inner: stream.eventsource(),
            _marker: PhantomData,
        }
    }
}

impl<S, T, E> Stream for FrameStream<S, T>
where
    S: Stream<Item = std::result::Result<bytes::Bytes, E>> + Unpin,
    T: DeserializeOwned,
    E: std::error::Error + Send + Sync + 'static,
{
    type Item = StreamResult<T>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        use std::task::Poll;

        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => match serde_json::from_str::<T>(&event.data) {
                    Ok(frame) => return Poll::Ready(Some(Ok(frame))),
                    Err(err) => {
                        tracing::warn!(error = %err, data = %event.data, "Skipping undecodable frame");
                    }
                },
                Poll::Ready(Some(Err(eventsource_stream::EventStreamError::Transport(e)))) => {
                    return Poll::Ready(Some(Err(StreamError::transport(format!(
                        "SSE stream error: {e}"
                    )))));
                }
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(Some(Err(StreamError::decode(format!(
                        "SSE stream error: {e}"
                    )))));
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
