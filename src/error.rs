use thiserror::Error;

/// Failures surfaced by the transcription pipeline.
///
/// Every variant carries a human-readable message; hosts collapse them
/// into one "processing failed" response and show the text.
#[derive(Error, Debug)]
pub enum Error {
    #[error("no API key configured; set OPENAI_API_KEY or put api_key in the config file")]
    MissingApiKey,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("unsupported media type: {0}")]
    UnsupportedMedia(String),

    #[error("segmentation failed: {0}")]
    Segmentation(String),

    /// The segmenter exited cleanly but wrote no output files. Never
    /// reported as an empty transcript.
    #[error("segmenter produced no output files")]
    NoSegments,

    #[error("transcription request failed: {0}")]
    Transcription(String),

    #[error("workspace I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
