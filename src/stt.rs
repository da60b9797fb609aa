use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};

use crate::config::Config;
use crate::error::{Error, Result};

/// One transcription request for one payload below the service ceiling.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mime_type: &str,
    ) -> Result<String>;
}

/// How the upload body is framed. Both encodings carry the same fields
/// and are indistinguishable to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadEncoding {
    /// reqwest's multipart builder.
    Multipart,
    /// Hand-framed `multipart/form-data` body.
    Manual,
}

pub struct SttClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    language: Option<String>,
    encoding: UploadEncoding,
}

impl SttClient {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.api_key()?.to_string();

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            api_key,
            model: config.model().to_string(),
            language: None,
            encoding: UploadEncoding::Multipart,
        })
    }

    /// Language hint forwarded to the service; `auto` and empty values
    /// mean detection is left to the model.
    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language.filter(|l| !l.is_empty() && l != "auto");
        self
    }

    pub fn with_encoding(mut self, encoding: UploadEncoding) -> Self {
        self.encoding = encoding;
        self
    }
}

#[async_trait]
impl SpeechToText for SttClient {
    async fn transcribe(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mime_type: &str,
    ) -> Result<String> {
        let url = format!("{}/audio/transcriptions", self.base_url);
        debug!("uploading {file_name} ({} bytes) to {url}", bytes.len());

        let request = self.client.post(&url).bearer_auth(&self.api_key);
        let request = match self.encoding {
            UploadEncoding::Multipart => {
                let audio = Part::bytes(bytes)
                    .file_name(file_name.to_string())
                    .mime_str(mime_type)
                    .map_err(|e| {
                        Error::Transcription(format!("invalid content type {mime_type}: {e}"))
                    })?;

                let mut form = Form::new()
                    .part("file", audio)
                    .text("model", self.model.clone())
                    .text("response_format", "text");
                if let Some(language) = &self.language {
                    form = form.text("language", language.clone());
                }
                request.multipart(form)
            }
            UploadEncoding::Manual => {
                let boundary = format!("chunkscribe-{}", uuid::Uuid::new_v4());
                let body = manual_form_body(
                    &boundary,
                    &bytes,
                    file_name,
                    mime_type,
                    &self.model,
                    self.language.as_deref(),
                );
                request
                    .header(
                        CONTENT_TYPE,
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(body)
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| Error::Transcription(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Transcription(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(Error::Transcription(format!(
                "service returned {status}: {text}"
            )));
        }

        Ok(text.trim().to_string())
    }
}

/// The same form `UploadEncoding::Multipart` produces, framed by hand.
fn manual_form_body(
    boundary: &str,
    bytes: &[u8],
    file_name: &str,
    mime_type: &str,
    model: &str,
    language: Option<&str>,
) -> Vec<u8> {
    let mut body = Vec::with_capacity(bytes.len() + 512);

    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{file_name}\"\r\nContent-Type: {mime_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");

    push_text_field(&mut body, boundary, "model", model);
    push_text_field(&mut body, boundary, "response_format", "text");
    if let Some(language) = language {
        push_text_field(&mut body, boundary, "language", language);
    }

    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

fn push_text_field(body: &mut Vec<u8>, boundary: &str, name: &str, value: &str) {
    body.extend_from_slice(
        format!("--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
            .as_bytes(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            api_key: Some("sk-test".to_string()),
            base_url: Some("http://localhost:8000/v1/".to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn client_requires_a_credential() {
        let err = SttClient::new(&Config::default()).err();
        assert!(matches!(err, Some(Error::MissingApiKey)));
    }

    #[test]
    fn base_url_is_normalized_and_encoding_selectable() {
        let client = SttClient::new(&test_config())
            .unwrap()
            .with_encoding(UploadEncoding::Manual);
        assert_eq!(client.base_url, "http://localhost:8000/v1");
        assert_eq!(client.encoding, UploadEncoding::Manual);
    }

    #[test]
    fn auto_language_is_not_forwarded() {
        let client = SttClient::new(&test_config())
            .unwrap()
            .with_language(Some("auto".to_string()));
        assert_eq!(client.language, None);

        let client = SttClient::new(&test_config())
            .unwrap()
            .with_language(Some("ko".to_string()));
        assert_eq!(client.language.as_deref(), Some("ko"));
    }

    #[test]
    fn manual_body_carries_the_same_fields_as_the_builder() {
        let body = manual_form_body(
            "chunkscribe-b0",
            b"AUDIO",
            "part000.mp3",
            "audio/mpeg",
            "whisper-1",
            Some("en"),
        );
        let text = String::from_utf8(body).unwrap();

        assert!(text.contains(
            "Content-Disposition: form-data; name=\"file\"; filename=\"part000.mp3\""
        ));
        assert!(text.contains("Content-Type: audio/mpeg"));
        assert!(text.contains("AUDIO"));
        assert!(text.contains("name=\"model\"\r\n\r\nwhisper-1"));
        assert!(text.contains("name=\"response_format\"\r\n\r\ntext"));
        assert!(text.contains("name=\"language\"\r\n\r\nen"));
        assert!(text.ends_with("--chunkscribe-b0--\r\n"));
    }

    #[test]
    fn manual_body_omits_language_when_unset() {
        let body = manual_form_body(
            "chunkscribe-b1",
            b"AUDIO",
            "a.wav",
            "audio/wav",
            "whisper-1",
            None,
        );
        let text = String::from_utf8(body).unwrap();
        assert!(!text.contains("name=\"language\""));
    }
}
