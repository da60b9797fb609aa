//! Container format resolution.
//!
//! The segmenter stream-copies whatever codec it is handed, so the only
//! format knowledge the pipeline needs is which container extension to
//! put on temporary files. Unknown types fall back to the original
//! filename's extension, then to `.mp3`.

use std::path::Path;

const DEFAULT_EXTENSION: &str = ".mp3";

/// Container extension (with leading dot) for temp files and segment
/// output. Never empty.
pub fn extension_for(mime_type: &str, file_name: &str) -> String {
    if let Some(ext) = extension_from_mime(mime_type) {
        return ext.to_string();
    }

    if let Some(ext) = Path::new(file_name).extension().and_then(|e| e.to_str()) {
        if !ext.is_empty() {
            return format!(".{}", ext.to_lowercase());
        }
    }

    DEFAULT_EXTENSION.to_string()
}

fn extension_from_mime(mime_type: &str) -> Option<&'static str> {
    match mime_type {
        "audio/mpeg" | "audio/mp3" => Some(".mp3"),
        "audio/wav" | "audio/x-wav" => Some(".wav"),
        "audio/webm" | "video/webm" => Some(".webm"),
        "audio/ogg" => Some(".ogg"),
        "audio/m4a" | "audio/x-m4a" => Some(".m4a"),
        "audio/mp4" | "video/mp4" => Some(".mp4"),
        _ => None,
    }
}

/// Declared MIME type for a local file, by extension. `None` means the
/// file is not a type the service accepts.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension().and_then(|e| e.to_str())?.to_lowercase();
    match ext.as_str() {
        "mp3" => Some("audio/mpeg"),
        "wav" => Some("audio/wav"),
        "webm" => Some("audio/webm"),
        "ogg" => Some("audio/ogg"),
        "m4a" => Some("audio/m4a"),
        "mp4" => Some("audio/mp4"),
        _ => None,
    }
}

/// MIME types accepted at the boundary, before the pipeline runs.
pub fn is_allowed(mime_type: &str) -> bool {
    matches!(
        mime_type,
        "audio/mpeg"
            | "audio/mp3"
            | "audio/wav"
            | "audio/webm"
            | "video/webm"
            | "audio/ogg"
            | "audio/m4a"
            | "audio/x-m4a"
            | "audio/mp4"
            | "video/mp4"
    )
}
