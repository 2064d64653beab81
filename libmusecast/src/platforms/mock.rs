//! Mock publisher for testing
//!
//! Records every upload and publish call so pipeline tests can assert on
//! call counts, arguments and timing without network access.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::clock::{Clock, ManualClock};
use crate::error::{MusecastError, PlatformError, Result};
use crate::platforms::SocialPublisher;
use crate::staging::TransientImageFile;
use crate::types::{MediaHandle, PublishResult};

/// One recorded upload call
#[derive(Debug, Clone)]
pub struct UploadCall {
    pub path: PathBuf,
    /// Whether the staged file existed when the upload started
    pub file_existed: bool,
    pub size: u64,
}

/// One recorded publish call
#[derive(Debug, Clone)]
pub struct PublishCall {
    pub text: String,
    pub media: Option<MediaHandle>,
    /// Virtual time of the call, when a clock is attached
    pub at: Option<Duration>,
}

#[derive(Clone)]
pub struct MockPublisher {
    auth_succeeds: bool,
    upload_error: Option<PlatformError>,
    publish_error: Option<PlatformError>,
    character_limit: Option<usize>,
    max_attachment_size: u64,
    clock: Option<ManualClock>,
    uploads: Arc<Mutex<Vec<UploadCall>>>,
    publishes: Arc<Mutex<Vec<PublishCall>>>,
}

impl Default for MockPublisher {
    fn default() -> Self {
        Self {
            auth_succeeds: true,
            upload_error: None,
            publish_error: None,
            character_limit: Some(500),
            max_attachment_size: 40 * 1024 * 1024,
            clock: None,
            uploads: Arc::new(Mutex::new(Vec::new())),
            publishes: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockPublisher {
    /// A publisher that accepts everything
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_auth() -> Self {
        Self {
            auth_succeeds: false,
            ..Self::default()
        }
    }

    pub fn with_upload_error(mut self, error: PlatformError) -> Self {
        self.upload_error = Some(error);
        self
    }

    pub fn with_publish_error(mut self, error: PlatformError) -> Self {
        self.publish_error = Some(error);
        self
    }

    pub fn with_character_limit(mut self, limit: Option<usize>) -> Self {
        self.character_limit = limit;
        self
    }

    pub fn with_max_attachment_size(mut self, size: u64) -> Self {
        self.max_attachment_size = size;
        self
    }

    /// Stamp publish calls with this clock's virtual time
    pub fn with_clock(mut self, clock: ManualClock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn uploads(&self) -> Vec<UploadCall> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn publishes(&self) -> Vec<PublishCall> {
        self.publishes.lock().unwrap().clone()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn publish_count(&self) -> usize {
        self.publishes.lock().unwrap().len()
    }
}

#[async_trait]
impl SocialPublisher for MockPublisher {
    async fn authenticate(&mut self) -> Result<()> {
        if self.auth_succeeds {
            Ok(())
        } else {
            Err(MusecastError::Initialization(
                "Mock authentication failed".to_string(),
            ))
        }
    }

    async fn upload(&self, image: &TransientImageFile) -> Result<MediaHandle> {
        let call = UploadCall {
            path: image.path().to_path_buf(),
            file_existed: image.path().exists(),
            size: image.size(),
        };
        let index = {
            let mut uploads = self.uploads.lock().unwrap();
            uploads.push(call);
            uploads.len()
        };

        self.check_attachment(image)?;
        match &self.upload_error {
            Some(error) => Err(MusecastError::Upload(error.clone())),
            None => Ok(MediaHandle(format!("media-{}", index))),
        }
    }

    async fn publish(&self, text: &str, media: Option<&MediaHandle>) -> Result<PublishResult> {
        let index = {
            let mut publishes = self.publishes.lock().unwrap();
            publishes.push(PublishCall {
                text: text.to_string(),
                media: media.cloned(),
                at: self.clock.as_ref().map(|c| c.elapsed()),
            });
            publishes.len()
        };

        if let Some(error) = &self.publish_error {
            return Err(MusecastError::Publish(error.clone()));
        }
        self.validate_content(text)?;

        Ok(PublishResult::published(
            format!("https://mock.social/statuses/{}", index),
            media.is_some(),
        ))
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn character_limit(&self) -> Option<usize> {
        self.character_limit
    }

    fn max_attachment_size(&self) -> u64 {
        self.max_attachment_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_publishes() {
        let publisher = MockPublisher::new();
        let handle = publisher.clone();

        let result = publisher.publish("hello", None).await.unwrap();
        assert_eq!(result.post_reference, "https://mock.social/statuses/1");
        assert_eq!(handle.publish_count(), 1);
        assert_eq!(handle.publishes()[0].text, "hello");
        assert!(handle.publishes()[0].media.is_none());
    }

    #[tokio::test]
    async fn test_publish_error_is_recorded_and_returned() {
        let publisher =
            MockPublisher::new().with_publish_error(PlatformError::RateLimit("429".to_string()));
        let result = publisher.publish("hello", None).await;

        assert!(matches!(
            result,
            Err(MusecastError::Publish(PlatformError::RateLimit(_)))
        ));
        assert_eq!(publisher.publish_count(), 1);
    }

    #[tokio::test]
    async fn test_clock_stamps_publishes() {
        let clock = ManualClock::new();
        let publisher = MockPublisher::new().with_clock(clock.clone());

        clock.advance(Duration::from_secs(7));
        publisher.publish("x", None).await.unwrap();

        assert_eq!(publisher.publishes()[0].at, Some(Duration::from_secs(7)));
    }

    #[tokio::test]
    async fn test_failing_auth() {
        let mut publisher = MockPublisher::failing_auth();
        assert!(matches!(
            publisher.authenticate().await,
            Err(MusecastError::Initialization(_))
        ));
    }
}
