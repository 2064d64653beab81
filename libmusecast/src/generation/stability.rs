//! Stability AI text-to-image provider
//!
//! Requests a single PNG sample and receives it as a raw binary body.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::{http_error, request_error, ImageGenerator};
use crate::error::{GenerationError, MusecastError, Result};
use crate::types::ImageMimeType;

pub const DEFAULT_BASE_URL: &str = "https://api.stability.ai";
pub const DEFAULT_ENGINE: &str = "stable-diffusion-xl-1024-v1-0";

const IMAGE_TIMEOUT: Duration = Duration::from_secs(120);
const IMAGE_SIDE: u32 = 1024;

pub struct StabilityImageClient {
    client: Client,
    api_key: SecretString,
    engine: String,
    base_url: String,
    guidance: f32,
    steps: u32,
}

impl StabilityImageClient {
    /// Create a client for the Stability v1 text-to-image endpoint
    ///
    /// # Arguments
    ///
    /// * `api_key` - Stability API key, sent as a bearer token
    /// * `engine` - Engine id; `stable-diffusion-xl-1024-v1-0` when `None`
    /// * `base_url` - API root; `https://api.stability.ai` when `None`
    /// * `guidance` - Sent as `cfg_scale`: how strictly the image follows the prompt
    /// * `steps` - Diffusion steps per image
    ///
    /// # Errors
    ///
    /// Returns `MusecastError::Initialization` if the HTTP client cannot be built.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use libmusecast::generation::stability::StabilityImageClient;
    /// use secrecy::SecretString;
    ///
    /// let client = StabilityImageClient::new(
    ///     SecretString::from("sk-...".to_string()),
    ///     None,
    ///     None,
    ///     7.0,
    ///     30,
    /// )?;
    /// # Ok::<(), libmusecast::MusecastError>(())
    /// ```
    pub fn new(
        api_key: SecretString,
        engine: Option<String>,
        base_url: Option<String>,
        guidance: f32,
        steps: u32,
    ) -> Result<Self> {
        let client = Client::builder().timeout(IMAGE_TIMEOUT).build().map_err(|e| {
            MusecastError::Initialization(format!(
                "Failed to create Stability HTTP client: {}",
                e
            ))
        })?;

        Ok(Self {
            client,
            api_key,
            engine: engine.unwrap_or_else(|| DEFAULT_ENGINE.to_string()),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            guidance,
            steps,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/generation/{}/text-to-image",
            self.base_url, self.engine
        )
    }

    fn request_body(&self, prompt: &str) -> TextToImageRequest {
        TextToImageRequest {
            text_prompts: vec![TextPrompt {
                text: prompt.to_string(),
                weight: 1.0,
            }],
            cfg_scale: self.guidance,
            steps: self.steps,
            samples: 1,
            height: IMAGE_SIDE,
            width: IMAGE_SIDE,
        }
    }
}

#[async_trait]
impl ImageGenerator for StabilityImageClient {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>> {
        debug!(
            "Calling Stability engine {} (cfg_scale {}, {} steps)",
            self.engine, self.guidance, self.steps
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose_secret())
            .header(ACCEPT, "image/png")
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| request_error("Stability", e))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Stability error body".to_string());
            return Err(http_error(status, &body_text).into());
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| request_error("Stability", e))?;

        Ok(validate_image_payload(content_type.as_deref(), &bytes)?)
    }

    fn name(&self) -> &str {
        "stability"
    }
}

/// Accept the body only if it is declared and shaped like an image
fn validate_image_payload(
    content_type: Option<&str>,
    bytes: &[u8],
) -> std::result::Result<Vec<u8>, GenerationError> {
    if let Some(content_type) = content_type {
        if !content_type.to_lowercase().starts_with("image/") {
            return Err(GenerationError::MalformedPayload(format!(
                "Stability returned '{}' instead of an image",
                content_type
            )));
        }
    }

    if bytes.is_empty() {
        return Err(GenerationError::EmptyResponse(
            "Stability returned an empty body".to_string(),
        ));
    }

    if ImageMimeType::detect(bytes).is_none() {
        return Err(GenerationError::MalformedPayload(
            "Stability response is not a recognised image format".to_string(),
        ));
    }

    Ok(bytes.to_vec())
}

#[derive(Serialize)]
struct TextToImageRequest {
    text_prompts: Vec<TextPrompt>,
    cfg_scale: f32,
    steps: u32,
    samples: u32,
    height: u32,
    width: u32,
}

#[derive(Serialize)]
struct TextPrompt {
    text: String,
    weight: f32,
}
