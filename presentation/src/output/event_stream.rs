//! Streams council events to a byte sink as SSE or NDJSON.
//!
//! Every event is the `{"type": ..., "payload": ...}` envelope. SSE frames
//! it as
//!
//! ```text
//! event: round1-response
//! data: {"type":"round1-response","payload":{...}}
//!
//! ```
//!
//! A failed write means the consumer is gone: the writer stops reading and
//! drops the receiver, which is how the council learns to stop emitting.

use council_application::CouncilEvent;
use council_domain::EventFormat;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::debug;

/// How a drained stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The producer finished after this many events
    Completed { events: usize },
    /// The sink stopped accepting writes after this many events
    Disconnected { events: usize },
}

pub struct EventStreamWriter<W> {
    sink: W,
    format: EventFormat,
}

impl<W: AsyncWrite + Unpin> EventStreamWriter<W> {
    pub fn new(sink: W, format: EventFormat) -> Self {
        Self { sink, format }
    }

    /// Encode one event in the configured framing.
    pub fn encode(format: EventFormat, event: &CouncilEvent) -> String {
        let json = serde_json::to_string(event).unwrap_or_else(|e| {
            serde_json::json!({
                "type": "error",
                "payload": {"message": format!("failed to encode '{}' event: {}", event.name(), e)},
            })
            .to_string()
        });
        match format {
            EventFormat::Sse => format!("event: {}\ndata: {}\n\n", event.name(), json),
            EventFormat::Ndjson => format!("{}\n", json),
        }
    }

    /// Write and flush one event.
    pub async fn write_event(&mut self, event: &CouncilEvent) -> std::io::Result<()> {
        let frame = Self::encode(self.format, event);
        self.sink.write_all(frame.as_bytes()).await?;
        self.sink.flush().await
    }

    /// Forward events until the producer is done or the sink breaks.
    pub async fn drain(mut self, mut receiver: mpsc::Receiver<CouncilEvent>) -> StreamEnd {
        let mut events = 0;
        while let Some(event) = receiver.recv().await {
            if let Err(e) = self.write_event(&event).await {
                debug!("Event sink closed after {} events: {}", events, e);
                return StreamEnd::Disconnected { events };
            }
            events += 1;
        }
        StreamEnd::Completed { events }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_application::{StageError, progress_channel};
    use council_domain::{Round, RoundResponse};
    use std::pin::Pin;
    use std::task::{Context, Poll};

    #[test]
    fn test_sse_framing() {
        let event = CouncilEvent::Round1Response(RoundResponse::new("alpha", "hi", 12));
        let frame = EventStreamWriter::<Vec<u8>>::encode(EventFormat::Sse, &event);
        let mut lines = frame.lines();
        assert_eq!(lines.next(), Some("event: round1-response"));
        let data = lines.next().unwrap().strip_prefix("data: ").unwrap();
        let envelope: serde_json::Value = serde_json::from_str(data).unwrap();
        assert_eq!(envelope["type"], "round1-response");
        assert_eq!(envelope["payload"]["worker"], "alpha");
        assert!(frame.ends_with("\n\n"));
    }

    #[test]
    fn test_ndjson_framing() {
        let event = CouncilEvent::Error(StageError {
            round: Some(Round::Responses),
            message: "no worker succeeded".to_string(),
        });
        let frame = EventStreamWriter::<Vec<u8>>::encode(EventFormat::Ndjson, &event);
        assert_eq!(frame.matches('\n').count(), 1);
        let envelope: serde_json::Value = serde_json::from_str(frame.trim_end()).unwrap();
        assert_eq!(envelope["type"], "error");
        assert_eq!(envelope["payload"]["round"], "responses");
    }

    #[tokio::test]
    async fn test_drain_writes_all_events() {
        let (emitter, receiver) = progress_channel(4);
        let mut buffer = Vec::new();
        let writer = EventStreamWriter::new(&mut buffer, EventFormat::Ndjson);

        let producer = async move {
            for worker in ["alpha", "beta"] {
                emitter
                    .emit(CouncilEvent::Round1Response(RoundResponse::new(worker, "x", 1)))
                    .await;
            }
        };
        let (_, end) = tokio::join!(producer, writer.drain(receiver));

        assert_eq!(end, StreamEnd::Completed { events: 2 });
        assert_eq!(String::from_utf8(buffer).unwrap().lines().count(), 2);
    }

    /// Accepts `budget` writes, then fails like a closed pipe.
    struct BrokenPipe {
        budget: usize,
    }

    impl AsyncWrite for BrokenPipe {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            if self.budget == 0 {
                return Poll::Ready(Err(std::io::ErrorKind::BrokenPipe.into()));
            }
            self.budget -= 1;
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_broken_sink_drops_receiver() {
        let (emitter, receiver) = progress_channel(1);
        let writer = EventStreamWriter::new(BrokenPipe { budget: 1 }, EventFormat::Sse);

        let producer = async move {
            let mut accepted = 0;
            for worker in ["alpha", "beta", "gamma", "delta"] {
                if emitter
                    .emit(CouncilEvent::Round1Response(RoundResponse::new(worker, "x", 1)))
                    .await
                {
                    accepted += 1;
                }
            }
            (accepted, emitter.is_closed())
        };
        let ((accepted, closed), end) = tokio::join!(producer, writer.drain(receiver));

        assert_eq!(end, StreamEnd::Disconnected { events: 1 });
        assert!(closed);
        assert!(accepted < 4);
    }
}
