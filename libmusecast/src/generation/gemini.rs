//! Google Gemini provider
//!
//! Talks to the `generateContent` REST endpoint directly. The same endpoint
//! serves text (parts with `text`) and images (parts with base64
//! `inlineData`), so both clients share one transport.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{http_error, request_error, ImageGenerator, TextGenerator};
use crate::error::{GenerationError, MusecastError, Result};
use crate::types::ImageMimeType;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.0-flash-preview-image-generation";

const TEXT_TIMEOUT: Duration = Duration::from_secs(60);
const IMAGE_TIMEOUT: Duration = Duration::from_secs(120);

struct GeminiTransport {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl GeminiTransport {
    fn new(
        api_key: SecretString,
        model: String,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            MusecastError::Initialization(format!("Failed to create Gemini HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, self.model)
    }

    async fn send(&self, body: &GenerateContentRequest) -> Result<GenerateContentResponse> {
        debug!("Calling Gemini model {}", self.model);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| request_error("Gemini", e))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(http_error(status, &body_text).into());
        }

        let parsed = response.json().await.map_err(|e| {
            GenerationError::MalformedPayload(format!("Failed to parse Gemini response: {}", e))
        })?;
        Ok(parsed)
    }
}

/// Text generation through Gemini
pub struct GeminiTextClient {
    transport: GeminiTransport,
}

impl GeminiTextClient {
    /// Create a text client for `model`
    ///
    /// # Arguments
    ///
    /// * `api_key` - Google AI Studio key, sent in the `x-goog-api-key` header
    /// * `model` - Model id, e.g. `gemini-1.5-flash`
    /// * `base_url` - Models root; the public Generative Language API when `None`
    ///
    /// # Errors
    ///
    /// Returns `MusecastError::Initialization` if the HTTP client cannot be built.
    pub fn new(api_key: SecretString, model: String, base_url: Option<String>) -> Result<Self> {
        Ok(Self {
            transport: GeminiTransport::new(api_key, model, base_url, TEXT_TIMEOUT)?,
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiTextClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest::text(prompt, None);
        let response = self.transport.send(&request).await?;
        Ok(extract_text(response)?)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Image generation through a Gemini image-capable model
pub struct GeminiImageClient {
    transport: GeminiTransport,
}

impl GeminiImageClient {
    /// Like [`GeminiTextClient::new`], asking for an image part in the answer
    ///
    /// `model` defaults to [`DEFAULT_IMAGE_MODEL`].
    pub fn new(
        api_key: SecretString,
        model: Option<String>,
        base_url: Option<String>,
    ) -> Result<Self> {
        let model = model.unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string());
        Ok(Self {
            transport: GeminiTransport::new(api_key, model, base_url, IMAGE_TIMEOUT)?,
        })
    }
}

#[async_trait]
impl ImageGenerator for GeminiImageClient {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>> {
        let request = GenerateContentRequest::text(
            prompt,
            Some(GenerationConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
            }),
        );
        let response = self.transport.send(&request).await?;
        Ok(extract_image(response)?)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    fn text(prompt: &str, generation_config: Option<GenerationConfig>) -> Self {
        Self {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config,
        }
    }
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartResponse {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: Option<String>,
    data: String,
}

fn parts(response: GenerateContentResponse) -> Vec<PartResponse> {
    response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .collect()
}

/// Concatenate the text parts of the first answer, trimmed
fn extract_text(response: GenerateContentResponse) -> std::result::Result<String, GenerationError> {
    let text: String = parts(response)
        .into_iter()
        .filter_map(|part| part.text)
        .collect();
    let text = text.trim();

    if text.is_empty() {
        return Err(GenerationError::EmptyResponse(
            "Gemini returned no text in the response candidates".to_string(),
        ));
    }
    Ok(text.to_string())
}

/// Decode the first inline image part
///
/// The part must declare an `image/*` type (when it declares one at all) and
/// the decoded bytes must be a recognised image format.
fn extract_image(
    response: GenerateContentResponse,
) -> std::result::Result<Vec<u8>, GenerationError> {
    let inline = parts(response)
        .into_iter()
        .find_map(|part| part.inline_data)
        .ok_or_else(|| {
            GenerationError::EmptyResponse(
                "Gemini returned no image in the response candidates".to_string(),
            )
        })?;

    if let Some(mime_type) = inline.mime_type.as_deref() {
        if !mime_type.to_lowercase().starts_with("image/") {
            return Err(GenerationError::MalformedPayload(format!(
                "Gemini returned '{}' inline data instead of an image",
                mime_type
            )));
        }
    }

    let bytes = BASE64_STANDARD.decode(inline.data.trim()).map_err(|e| {
        GenerationError::MalformedPayload(format!("Gemini image data is not base64: {}", e))
    })?;

    if bytes.is_empty() {
        return Err(GenerationError::MalformedPayload(
            "Gemini image data is empty".to_string(),
        ));
    }

    let detected = ImageMimeType::detect(&bytes).ok_or_else(|| {
        GenerationError::MalformedPayload(
            "Gemini image data is not a recognised image format".to_string(),
        )
    })?;

    let declared = inline.mime_type.as_deref().and_then(ImageMimeType::from_mime_str);
    if declared.is_some_and(|declared| declared != detected) {
        debug!(
            "Gemini labelled the image {:?} but the data is {}",
            inline.mime_type, detected
        );
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).expect("valid response json")
    }

    fn key() -> SecretString {
        SecretString::from("test-key".to_string())
    }

    #[test]
    fn test_extract_text() {
        let response = parse(
            r#"{"candidates": [{"content": {"role": "model", "parts": [{"text": "  Green AI is here.  "}]}}]}"#,
        );
        assert_eq!(extract_text(response).unwrap(), "Green AI is here.");
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response = parse(
            r#"{"candidates": [{"content": {"parts": [{"text": "Hello, "}, {"text": "world"}]}}]}"#,
        );
        assert_eq!(extract_text(response).unwrap(), "Hello, world");
    }

    #[test]
    fn test_extract_text_no_candidates() {
        let response = parse(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#);
        assert!(matches!(
            extract_text(response),
            Err(GenerationError::EmptyResponse(_))
        ));
    }

    #[test]
    fn test_extract_text_whitespace_only() {
        let response = parse(r#"{"candidates": [{"content": {"parts": [{"text": "   "}]}}]}"#);
        assert!(extract_text(response).is_err());
    }

    #[test]
    fn test_extract_image() {
        let response = parse(
            r#"{"candidates": [{"content": {"parts": [
                {"text": "Here is your illustration"},
                {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}}
            ]}}]}"#,
        );
        let bytes = extract_image(response).unwrap();
        assert_eq!(bytes, vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn test_extract_image_missing() {
        let response = parse(r#"{"candidates": [{"content": {"parts": [{"text": "no image"}]}}]}"#);
        assert!(matches!(
            extract_image(response),
            Err(GenerationError::EmptyResponse(_))
        ));
    }

    #[test]
    fn test_extract_image_bad_base64() {
        let response = parse(
            r#"{"candidates": [{"content": {"parts": [{"inlineData": {"mimeType": "image/png", "data": "%%%"}}]}}]}"#,
        );
        assert!(matches!(
            extract_image(response),
            Err(GenerationError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_extract_image_rejects_non_image_mime_type() {
        let response = parse(
            r#"{"candidates": [{"content": {"parts": [{"inlineData": {"mimeType": "text/plain", "data": "aGVsbG8="}}]}}]}"#,
        );
        assert!(matches!(
            extract_image(response),
            Err(GenerationError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_extract_image_rejects_unrecognised_bytes() {
        // "hello world" is valid base64 but not an image
        let response = parse(
            r#"{"candidates": [{"content": {"parts": [{"inlineData": {"mimeType": "image/png", "data": "aGVsbG8gd29ybGQ="}}]}}]}"#,
        );
        assert!(matches!(
            extract_image(response),
            Err(GenerationError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_extract_image_trusts_bytes_over_label() {
        // JPEG bytes labelled as PNG, or with no label at all
        let labelled = parse(
            r#"{"candidates": [{"content": {"parts": [{"inlineData": {"mimeType": "image/png", "data": "/9j/4AAQ"}}]}}]}"#,
        );
        let bytes = extract_image(labelled).unwrap();
        assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF]);

        let unlabelled = parse(
            r#"{"candidates": [{"content": {"parts": [{"inlineData": {"data": "/9j/4AAQ"}}]}}]}"#,
        );
        assert!(extract_image(unlabelled).is_ok());
    }

    #[test]
    fn test_request_serialization() {
        let request = GenerateContentRequest::text(
            "draw",
            Some(GenerationConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
            }),
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "draw");
        assert_eq!(json["generationConfig"]["responseModalities"][1], "IMAGE");

        let plain = serde_json::to_value(GenerateContentRequest::text("hi", None)).unwrap();
        assert!(plain.get("generationConfig").is_none());
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiTextClient::new(key(), "gemini-1.5-flash".to_string(), None).unwrap();
        assert_eq!(
            client.transport.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert_eq!(client.name(), "gemini");
    }

    #[test]
    fn test_custom_base_url_and_default_image_model() {
        let client =
            GeminiImageClient::new(key(), None, Some("http://localhost:8080/models/".to_string()))
                .unwrap();
        assert_eq!(
            client.transport.endpoint(),
            format!(
                "http://localhost:8080/models/{}:generateContent",
                DEFAULT_IMAGE_MODEL
            )
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_generation_error() {
        let client = GeminiTextClient::new(
            key(),
            "gemini-1.5-flash".to_string(),
            Some("http://127.0.0.1:9".to_string()),
        )
        .unwrap();

        let result = client.generate("hello").await;
        assert!(matches!(
            result,
            Err(MusecastError::Generation(GenerationError::Network(_)))
        ));
    }
}
