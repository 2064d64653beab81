//! Text and image generation providers
//!
//! Each provider wraps exactly one remote call per invocation. Nothing here
//! retries: a failed call returns a [`GenerationError`] and the caller
//! decides what to do with it (the pipeline logs and moves on).
//!
//! # Examples
//!
//! ```no_run
//! use libmusecast::generation::{gemini::GeminiTextClient, TextGenerator};
//! use secrecy::SecretString;
//!
//! # async fn example() -> libmusecast::Result<()> {
//! let client = GeminiTextClient::new(
//!     SecretString::from("api-key".to_string()),
//!     "gemini-1.5-flash".to_string(),
//!     None,
//! )?;
//! let text = client.generate("Write a haiku about ferris the crab").await?;
//! println!("{}", text);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::error::{GenerationError, Result};

pub mod gemini;
pub mod stability;

// Mock generators are available for all builds to support integration tests
pub mod mock;

/// A provider turning a prompt into text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for `prompt`
    ///
    /// # Errors
    ///
    /// Returns `MusecastError::Generation` when the request fails, the
    /// provider answers with a non-success status, or the answer holds no text.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Provider name used in logs
    fn name(&self) -> &str;
}

/// A provider turning a prompt into raw image bytes
///
/// Implementations do not touch the filesystem; staging the bytes is up to
/// the caller.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>>;

    fn name(&self) -> &str;
}

/// Longest provider error body kept in an error message
const MAX_ERROR_BODY: usize = 300;

/// Build a [`GenerationError`] from a non-success HTTP response
///
/// Understands the `{"error": {"status", "message"}}` shape used by Google
/// and the `{"name", "message"}` shape used by Stability, and falls back to
/// the raw body otherwise.
pub(crate) fn http_error(status: StatusCode, body: &str) -> GenerationError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            let error = value.get("error").unwrap_or(&value);
            let message = error.get("message")?.as_str()?.to_string();
            let label = error
                .get("status")
                .or_else(|| error.get("name"))
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            Some(if label.is_empty() {
                message
            } else {
                format!("{}: {}", label, message)
            })
        })
        .unwrap_or_else(|| body.trim().to_string());

    GenerationError::Http {
        status: status.as_u16(),
        message: crate::types::truncate_chars(&message, MAX_ERROR_BODY),
    }
}

pub(crate) fn request_error(provider: &str, error: reqwest::Error) -> GenerationError {
    if error.is_timeout() {
        GenerationError::Network(format!("{} request timed out: {}", provider, error))
    } else {
        GenerationError::Network(format!("{} request failed: {}", provider, error))
    }
}
