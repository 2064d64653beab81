//! Publisher that logs instead of posting
//!
//! Backs `muse-run --dry-run`: the whole pipeline runs, including image
//! staging, but nothing reaches the social network.

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::platforms::SocialPublisher;
use crate::staging::TransientImageFile;
use crate::types::{MediaHandle, PublishResult};

pub struct DryRunPublisher {
    character_limit: usize,
}

impl DryRunPublisher {
    /// Create a publisher that only logs
    ///
    /// # Arguments
    ///
    /// * `character_limit` - Limit enforced as if posting for real, so a dry
    ///   run shows the same truncation a live run would
    ///
    /// # Examples
    ///
    /// ```
    /// use libmusecast::platforms::dry_run::DryRunPublisher;
    /// use libmusecast::platforms::SocialPublisher;
    ///
    /// let publisher = DryRunPublisher::new(500);
    /// assert_eq!(publisher.character_limit(), Some(500));
    /// ```
    pub fn new(character_limit: usize) -> Self {
        Self { character_limit }
    }
}

#[async_trait]
impl SocialPublisher for DryRunPublisher {
    async fn authenticate(&mut self) -> Result<()> {
        Ok(())
    }

    async fn upload(&self, image: &TransientImageFile) -> Result<MediaHandle> {
        self.check_attachment(image)?;
        info!(
            "[dry-run] would upload {} byte {} image",
            image.size(),
            image.mime_type()
        );
        Ok(MediaHandle(format!("dry-run-media-{}", uuid::Uuid::new_v4())))
    }

    async fn publish(&self, text: &str, media: Option<&MediaHandle>) -> Result<PublishResult> {
        self.validate_content(text)?;
        info!(
            media = media.map(|m| m.as_str()).unwrap_or("none"),
            "[dry-run] would post: {}", text
        );
        Ok(PublishResult::published(
            format!("dry-run:{}", uuid::Uuid::new_v4()),
            media.is_some(),
        ))
    }

    fn name(&self) -> &str {
        "dry-run"
    }

    fn character_limit(&self) -> Option<usize> {
        Some(self.character_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_returns_synthetic_reference() {
        let publisher = DryRunPublisher::new(500);
        let result = publisher.publish("hello", None).await.unwrap();
        assert!(result.success);
        assert!(result.post_reference.starts_with("dry-run:"));
        assert!(!result.with_media);
    }

    #[tokio::test]
    async fn test_publish_still_validates() {
        let publisher = DryRunPublisher::new(10);
        assert!(publisher.publish(&"a".repeat(11), None).await.is_err());
    }

    #[tokio::test]
    async fn test_upload_returns_handle() {
        let dir = tempfile::TempDir::new().unwrap();
        let image = TransientImageFile::create_in(
            dir.path(),
            &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A],
        )
        .unwrap();

        let publisher = DryRunPublisher::new(500);
        let handle = publisher.upload(&image).await.unwrap();
        assert!(handle.as_str().starts_with("dry-run-media-"));

        let result = publisher.publish("with image", Some(&handle)).await.unwrap();
        assert!(result.with_media);
    }
}
