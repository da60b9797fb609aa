use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;
use tokio::process::Command;

use crate::error::{Error, Result};

/// Largest slice of tool diagnostics carried into an error message.
const DIAGNOSTIC_LIMIT: usize = 2048;

/// Segment files are named `part000<ext>`, `part001<ext>`, ... Fixed-width
/// numbering keeps lexicographic order equal to time order.
const SEGMENT_PREFIX: &str = "part";

/// Cuts one media file into consecutive sub-files of bounded duration.
#[async_trait]
pub trait MediaSplitter: Send + Sync {
    /// Returns the produced sub-file paths in time order.
    async fn split(
        &self,
        input: &Path,
        workspace: &Path,
        extension: &str,
        seconds: u32,
    ) -> Result<Vec<PathBuf>>;
}

/// Splits by invoking ffmpeg's segment muxer in stream-copy mode; the
/// codec passes through untouched.
pub struct FfmpegSplitter {
    binary: String,
}

impl FfmpegSplitter {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for FfmpegSplitter {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl MediaSplitter for FfmpegSplitter {
    async fn split(
        &self,
        input: &Path,
        workspace: &Path,
        extension: &str,
        seconds: u32,
    ) -> Result<Vec<PathBuf>> {
        let pattern = workspace.join(format!("{SEGMENT_PREFIX}%03d{extension}"));
        debug!("running {} on {:?} -> {:?}", self.binary, input, pattern);

        let output = Command::new(&self.binary)
            .args(split_args(input, &pattern, seconds))
            .output()
            .await
            .map_err(|e| Error::Segmentation(format!("failed to run {}: {e}", self.binary)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Segmentation(truncate_diagnostics(
                &stderr,
                DIAGNOSTIC_LIMIT,
            )));
        }

        collect_segments(workspace, extension)
    }
}

fn split_args(input: &Path, pattern: &Path, seconds: u32) -> Vec<OsString> {
    vec![
        "-hide_banner".into(),
        "-nostdin".into(),
        "-y".into(),
        "-i".into(),
        input.into(),
        "-f".into(),
        "segment".into(),
        "-segment_time".into(),
        seconds.to_string().into(),
        "-c".into(),
        "copy".into(),
        "-reset_timestamps".into(),
        "1".into(),
        pattern.into(),
    ]
}

/// Lists the segment files the tool wrote, in time order. A clean tool
/// exit with nothing to show for it is reported as its own error.
fn collect_segments(workspace: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(workspace)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(SEGMENT_PREFIX) && name.ends_with(extension) {
            paths.push(entry.path());
        }
    }

    if paths.is_empty() {
        return Err(Error::NoSegments);
    }

    paths.sort();
    Ok(paths)
}

fn truncate_diagnostics(text: &str, limit: usize) -> String {
    let text = text.trim();
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{} [truncated]", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn split_args_request_stream_copy_segmentation() {
        let args = split_args(Path::new("/w/input.mp3"), Path::new("/w/part%03d.mp3"), 120);
        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        let joined = args.join(" ");
        assert!(joined.contains("-i /w/input.mp3"));
        assert!(joined.contains("-f segment"));
        assert!(joined.contains("-segment_time 120"));
        assert!(joined.contains("-c copy"));
        assert!(joined.contains("-y"));
        assert_eq!(args.last().unwrap(), "/w/part%03d.mp3");
    }

    #[test]
    fn segments_come_back_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        for name in ["part002.mp3", "part000.mp3", "part001.mp3", "input.mp3", "part000.wav"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let paths = collect_segments(dir.path(), ".mp3").unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["part000.mp3", "part001.mp3", "part002.mp3"]);
    }

    #[test]
    fn zero_produced_files_is_a_distinct_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("input.mp3"), b"x").unwrap();

        let err = collect_segments(dir.path(), ".mp3").unwrap_err();
        assert!(matches!(err, Error::NoSegments));
    }

    #[test]
    fn long_diagnostics_are_bounded() {
        let noise = "e".repeat(5000);
        let msg = truncate_diagnostics(&noise, DIAGNOSTIC_LIMIT);
        assert!(msg.len() <= DIAGNOSTIC_LIMIT + " [truncated]".len());
        assert!(msg.ends_with("[truncated]"));

        assert_eq!(truncate_diagnostics("  short\n", DIAGNOSTIC_LIMIT), "short");
    }
}
