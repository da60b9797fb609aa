//! The transcription pipeline.
//!
//! Inputs under the service's payload ceiling go up in one request.
//! Anything larger is written into a scratch directory, cut into
//! time-ordered segments by the splitter, and transcribed one segment at
//! a time, strictly in order; each non-empty partial transcript reaches
//! the sink before the next segment is touched. The final transcript is
//! always assembled in segment order, never completion order.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::Result;
use crate::events::{ChannelSink, EventSink, NullSink, TranscribeEvent};
use crate::format;
use crate::segmenter::{FfmpegSplitter, MediaSplitter};
use crate::stt::SpeechToText;

/// Hard per-request payload ceiling of the transcription service.
pub const MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

/// Duration of one segment. Typical audio bitrates keep a stream-copied
/// slice of this length well under the upload ceiling.
pub const DEFAULT_SEGMENT_SECONDS: u32 = 120;

/// One audio payload handed in by the caller. The pipeline only reads
/// it; when splitting, the bytes are copied into scratch storage.
pub struct AudioInput {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
}

impl AudioInput {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            file_name: file_name.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

pub struct Transcriber {
    stt: Box<dyn SpeechToText>,
    splitter: Box<dyn MediaSplitter>,
    ceiling: u64,
    segment_seconds: u32,
}

impl Transcriber {
    pub fn new(stt: impl SpeechToText + 'static) -> Self {
        Self {
            stt: Box::new(stt),
            splitter: Box::new(FfmpegSplitter::default()),
            ceiling: MAX_UPLOAD_BYTES,
            segment_seconds: DEFAULT_SEGMENT_SECONDS,
        }
    }

    pub fn with_splitter(mut self, splitter: impl MediaSplitter + 'static) -> Self {
        self.splitter = Box::new(splitter);
        self
    }

    pub fn with_segment_seconds(mut self, seconds: u32) -> Self {
        self.segment_seconds = seconds;
        self
    }

    pub fn with_ceiling(mut self, bytes: u64) -> Self {
        self.ceiling = bytes;
        self
    }

    /// `true` when the payload exceeds the per-request ceiling and must
    /// be segmented before upload.
    pub fn needs_split(&self, input: &AudioInput) -> bool {
        input.size() > self.ceiling
    }

    /// Transcribes one input. Each non-empty partial transcript is
    /// pushed into `sink` as soon as it exists; the return value is the
    /// fully assembled transcript.
    pub async fn transcribe(&self, input: &AudioInput, sink: &mut dyn EventSink) -> Result<String> {
        if !self.needs_split(input) {
            debug!(
                "{} ({} bytes) fits in a single request",
                input.file_name,
                input.size()
            );
            let text = self
                .stt
                .transcribe(input.bytes.clone(), &input.file_name, &input.mime_type)
                .await?;
            let text = text.trim();
            if !text.is_empty() {
                sink.chunk(text);
            }
            return Ok(text.to_string());
        }

        self.transcribe_split(input, sink).await
    }

    /// Batch entry: no incremental events, just the final transcript.
    pub async fn transcribe_batch(&self, input: &AudioInput) -> Result<String> {
        self.transcribe(input, &mut NullSink).await
    }

    /// Streaming entry: pushes chunk events followed by exactly one
    /// terminal event, on success and failure alike.
    pub async fn transcribe_streaming(
        &self,
        input: &AudioInput,
        events: UnboundedSender<TranscribeEvent>,
    ) -> Result<()> {
        let mut sink = ChannelSink::new(events.clone());
        match self.transcribe(input, &mut sink).await {
            Ok(transcription) => {
                let _ = events.send(TranscribeEvent::done(transcription));
                Ok(())
            }
            Err(e) => {
                let _ = events.send(TranscribeEvent::error(e.to_string()));
                Err(e)
            }
        }
    }

    async fn transcribe_split(
        &self,
        input: &AudioInput,
        sink: &mut dyn EventSink,
    ) -> Result<String> {
        info!(
            "{} is {} bytes, splitting into {}s segments",
            input.file_name,
            input.size(),
            self.segment_seconds
        );

        let workspace = Workspace::create()?;
        let extension = format::extension_for(&input.mime_type, &input.file_name);

        let source = workspace.path().join(format!("input{extension}"));
        tokio::fs::write(&source, &input.bytes).await?;

        let segments = self
            .splitter
            .split(&source, workspace.path(), &extension, self.segment_seconds)
            .await?;
        info!("segmenter produced {} files", segments.len());

        let mut fragments: Vec<String> = Vec::with_capacity(segments.len());
        for (index, path) in segments.iter().enumerate() {
            let bytes = tokio::fs::read(path).await?;
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("segment");

            let text = self.stt.transcribe(bytes, name, &input.mime_type).await?;
            let text = text.trim();
            debug!("segment {index}: {} chars", text.len());
            if text.is_empty() {
                continue;
            }

            sink.chunk(text);
            fragments.push(text.to_string());
        }

        Ok(fragments.join(" "))
    }
}

/// Per-job scratch directory. Removal happens in `Drop` and therefore
/// runs on success, error propagation, and cancellation alike; removal
/// failures are logged and swallowed, never propagated.
struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    fn create() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("chunkscribe-").tempdir()?;
        let path = dir.path().to_path_buf();
        debug!("workspace at {}", path.display());
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(e) = dir.close() {
                warn!("failed to remove workspace {}: {e}", self.path.display());
            }
        }
    }
}
