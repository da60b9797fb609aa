//! Incremental transcription results.
//!
//! The pipeline reports each partial transcript through an [`EventSink`]
//! the moment it is available; what carries the event to a client (and
//! how it is framed on the wire) is the host's business.

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

/// One push event of a streaming transcription.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TranscribeEvent {
    Chunk { chunk: String },
    Done { done: bool, transcription: String },
    Error { error: String, done: bool },
}

impl TranscribeEvent {
    pub fn chunk(text: impl Into<String>) -> Self {
        TranscribeEvent::Chunk { chunk: text.into() }
    }

    pub fn done(transcription: impl Into<String>) -> Self {
        TranscribeEvent::Done {
            done: true,
            transcription: transcription.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        TranscribeEvent::Error {
            error: message.into(),
            done: true,
        }
    }
}

/// Receives each non-empty partial transcript as soon as it exists.
pub trait EventSink: Send {
    fn chunk(&mut self, text: &str);
}

/// Batch mode: partial results are not surfaced anywhere.
pub struct NullSink;

impl EventSink for NullSink {
    fn chunk(&mut self, _text: &str) {}
}

/// Streaming mode: forwards each partial result over a channel.
pub struct ChannelSink {
    tx: UnboundedSender<TranscribeEvent>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<TranscribeEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn chunk(&mut self, text: &str) {
        // A closed receiver means the client went away; the pipeline
        // still runs to completion for the batch result.
        let _ = self.tx.send(TranscribeEvent::chunk(text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_to_wire_shapes() {
        let chunk = serde_json::to_string(&TranscribeEvent::chunk("hello world")).unwrap();
        assert_eq!(chunk, r#"{"chunk":"hello world"}"#);

        let done = serde_json::to_string(&TranscribeEvent::done("a b")).unwrap();
        assert_eq!(done, r#"{"done":true,"transcription":"a b"}"#);

        let error = serde_json::to_string(&TranscribeEvent::error("quota exceeded")).unwrap();
        assert_eq!(error, r#"{"error":"quota exceeded","done":true}"#);
    }

    #[test]
    fn channel_sink_forwards_chunks() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut sink = ChannelSink::new(tx);
        sink.chunk("first");
        sink.chunk("second");

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push(serde_json::to_string(&event).unwrap());
        }
        assert_eq!(seen, vec![r#"{"chunk":"first"}"#, r#"{"chunk":"second"}"#]);
    }

    #[test]
    fn channel_sink_survives_a_dropped_receiver() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        let mut sink = ChannelSink::new(tx);
        sink.chunk("nobody listening");
    }
}
