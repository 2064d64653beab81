//! Social network publishing
//!
//! A publisher performs two remote calls in sequence: an optional media
//! upload returning a [`MediaHandle`], then status creation referencing it.
//!
//! # Examples
//!
//! ```no_run
//! use libmusecast::platforms::{mastodon::MastodonClient, SocialPublisher};
//! use secrecy::SecretString;
//!
//! # async fn example() -> libmusecast::Result<()> {
//! let mut client = MastodonClient::new(
//!     "https://mastodon.social".to_string(),
//!     SecretString::from("access-token".to_string()),
//!     None,
//! )?;
//! client.authenticate().await?;
//!
//! let result = client.publish("Hello, fediverse!", None).await?;
//! println!("Posted: {}", result.post_reference);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::error::{MusecastError, PlatformError, Result};
use crate::staging::TransientImageFile;
use crate::types::{ImageMimeType, MediaHandle, PublishResult};

pub mod dry_run;
pub mod mastodon;

// Mock publisher is available for all builds (not just tests) to support integration tests
pub mod mock;

#[async_trait]
pub trait SocialPublisher: Send + Sync {
    /// Verify credentials with the remote service
    ///
    /// Called once during setup, before any topic is processed.
    ///
    /// # Errors
    ///
    /// Returns `MusecastError::Initialization` when the credentials are rejected
    /// or the service is unreachable.
    async fn authenticate(&mut self) -> Result<()>;

    /// Upload a staged image and return the handle to attach to a status
    ///
    /// # Errors
    ///
    /// Returns `MusecastError::Upload` when the service rejects the file
    /// (size, format) or the request fails.
    async fn upload(&self, image: &TransientImageFile) -> Result<MediaHandle>;

    /// Create a status with `text`, attaching `media` when given
    ///
    /// # Errors
    ///
    /// Returns `MusecastError::Publish` on authentication, rate limit,
    /// validation or network failures. Callers must not retry blindly: the
    /// status may have been created even when the response was lost.
    async fn publish(&self, text: &str, media: Option<&MediaHandle>) -> Result<PublishResult>;

    /// Lowercase identifier (e.g., "mastodon")
    fn name(&self) -> &str;

    /// Maximum characters per status, `None` for no hard limit
    fn character_limit(&self) -> Option<usize>;

    /// Check content against the service's rules before publishing
    fn validate_content(&self, content: &str) -> Result<()> {
        validate_text(content, self.character_limit(), self.name())
    }

    /// Maximum size in bytes for one uploaded file. Default is 40MB (Mastodon limit).
    fn max_attachment_size(&self) -> u64 {
        40 * 1024 * 1024
    }

    fn supported_mime_types(&self) -> Vec<ImageMimeType> {
        vec![
            ImageMimeType::Jpeg,
            ImageMimeType::Png,
            ImageMimeType::Gif,
            ImageMimeType::WebP,
        ]
    }

    /// Local checks run before an upload is attempted
    fn check_attachment(&self, image: &TransientImageFile) -> Result<()> {
        if image.size() > self.max_attachment_size() {
            return Err(MusecastError::Upload(PlatformError::Validation(format!(
                "Image of {} bytes exceeds the {} byte limit of {}",
                image.size(),
                self.max_attachment_size(),
                self.name()
            ))));
        }
        if !self.supported_mime_types().contains(&image.mime_type()) {
            return Err(MusecastError::Upload(PlatformError::Validation(format!(
                "{} does not accept {} images",
                self.name(),
                image.mime_type()
            ))));
        }
        Ok(())
    }
}

/// Shared content rules: non-blank, within the character limit
pub fn validate_text(content: &str, limit: Option<usize>, platform: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(MusecastError::Publish(PlatformError::Validation(
            "Content cannot be empty".to_string(),
        )));
    }

    if let Some(limit) = limit {
        let char_count = content.chars().count();
        if char_count > limit {
            return Err(MusecastError::Publish(PlatformError::Validation(format!(
                "Content exceeds {}'s {} character limit (current: {} characters)",
                platform, limit, char_count
            ))));
        }
    }

    Ok(())
}
