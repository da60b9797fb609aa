//! Transcribes audio of arbitrary size through a speech-to-text service
//! with a hard per-request payload ceiling.
//!
//! Oversized inputs are cut into time-ordered segments with ffmpeg
//! (stream copy, no re-encoding), transcribed one segment at a time, and
//! stitched back together in original order. Partial results can be
//! streamed to the caller while the job runs.

pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod pipeline;
pub mod segmenter;
pub mod stt;

pub use config::Config;
pub use error::{Error, Result};
pub use events::{ChannelSink, EventSink, NullSink, TranscribeEvent};
pub use pipeline::{AudioInput, DEFAULT_SEGMENT_SECONDS, MAX_UPLOAD_BYTES, Transcriber};
pub use segmenter::{FfmpegSplitter, MediaSplitter};
pub use stt::{SpeechToText, SttClient, UploadEncoding};
