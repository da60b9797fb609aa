use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::pipeline::DEFAULT_SEGMENT_SECONDS;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "whisper-1";
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

/// Settings for the transcription service and the segmenter.
///
/// Loaded from `~/.chunkscribe/config.yaml`; every field is optional
/// there. The credential may instead come from `OPENAI_API_KEY`, with an
/// explicit config entry taking precedence.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub segment_seconds: Option<u32>,
    pub ffmpeg: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = match config_path() {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(&path)?;
                serde_yaml::from_str(&content).map_err(|e| {
                    Error::Config(format!("invalid config file {}: {e}", path.display()))
                })?
            }
            _ => Config::default(),
        };

        if config.api_key.is_none() {
            config.api_key = std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty());
        }

        Ok(config)
    }

    /// The service credential. Checked once at startup, not per request.
    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(Error::MissingApiKey)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn segment_seconds(&self) -> u32 {
        self.segment_seconds.unwrap_or(DEFAULT_SEGMENT_SECONDS)
    }

    pub fn ffmpeg(&self) -> &str {
        self.ffmpeg.as_deref().unwrap_or(DEFAULT_FFMPEG)
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".chunkscribe").join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::default();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.segment_seconds(), DEFAULT_SEGMENT_SECONDS);
        assert_eq!(config.ffmpeg(), DEFAULT_FFMPEG);
    }

    #[test]
    fn missing_api_key_is_a_startup_error() {
        let config = Config::default();
        assert!(matches!(config.api_key(), Err(Error::MissingApiKey)));

        let config = Config {
            api_key: Some("   ".to_string()),
            ..Config::default()
        };
        assert!(matches!(config.api_key(), Err(Error::MissingApiKey)));
    }

    #[test]
    fn yaml_fields_override_defaults() {
        let config: Config = serde_yaml::from_str(
            "api_key: sk-test\nbase_url: http://localhost:8000/v1\nsegment_seconds: 60\n",
        )
        .unwrap();
        assert_eq!(config.api_key().unwrap(), "sk-test");
        assert_eq!(config.base_url(), "http://localhost:8000/v1");
        assert_eq!(config.segment_seconds(), 60);
        assert_eq!(config.model(), DEFAULT_MODEL);
    }
}
