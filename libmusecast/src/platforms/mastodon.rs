//! Mastodon publisher
//!
//! Uses the megalodon library, so any Fediverse server speaking the Mastodon
//! API (Pleroma, Akkoma, GoToSocial, ...) works as a target.

use async_trait::async_trait;
use megalodon::entities::{StatusVisibility, UploadMedia};
use megalodon::megalodon::{PostStatusInputOptions, PostStatusOutput};
use megalodon::{Megalodon, SNS};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::error::{MusecastError, PlatformError, Result};
use crate::platforms::SocialPublisher;
use crate::staging::TransientImageFile;
use crate::types::{MediaHandle, PublishResult};

pub const DEFAULT_CHARACTER_LIMIT: usize = 500;

pub struct MastodonClient {
    client: Box<dyn Megalodon + Send + Sync>,

    /// The instance URL (e.g., "https://mastodon.social")
    instance_url: String,

    /// Character limit for posts, refreshed from the instance on authenticate
    character_limit: usize,

    visibility: Option<StatusVisibility>,
}

impl MastodonClient {
    /// Create a client for `instance_url` authenticated with `access_token`
    ///
    /// Starts with the default 500 character limit; [`SocialPublisher::authenticate`]
    /// replaces it with the instance's own limit when the instance reports one.
    ///
    /// # Errors
    ///
    /// Returns `MusecastError::Initialization` if the visibility is unknown or
    /// megalodon cannot build a client for the URL.
    pub fn new(
        instance_url: String,
        access_token: SecretString,
        visibility: Option<&str>,
    ) -> Result<Self> {
        let visibility = visibility.map(parse_visibility).transpose()?;

        let client = megalodon::generator(
            SNS::Mastodon,
            instance_url.clone(),
            Some(access_token.expose_secret().to_string()),
            None,
        )
        .map_err(|e| {
            MusecastError::Initialization(format!("Failed to create Mastodon client: {:?}", e))
        })?;

        Ok(Self {
            client,
            instance_url,
            character_limit: DEFAULT_CHARACTER_LIMIT,
            visibility,
        })
    }

    pub fn with_character_limit(mut self, limit: usize) -> Self {
        self.character_limit = limit;
        self
    }

    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    /// Query the instance for its status character limit
    pub async fn fetch_instance_info(&mut self) -> Result<()> {
        let response = self.client.get_instance().await.map_err(|e| {
            MusecastError::Initialization(
                map_megalodon_error(e, "fetch instance info").to_string(),
            )
        })?;

        let limit = response.json.configuration.statuses.max_characters as usize;
        if limit > 0 {
            debug!("{} allows {} characters per status", self.instance_url, limit);
            self.character_limit = limit;
        }
        Ok(())
    }
}

#[async_trait]
impl SocialPublisher for MastodonClient {
    async fn authenticate(&mut self) -> Result<()> {
        self.client
            .verify_account_credentials()
            .await
            .map_err(|e| {
                MusecastError::Initialization(map_megalodon_error(e, "authenticate").to_string())
            })?;

        if let Err(e) = self.fetch_instance_info().await {
            warn!(
                "Could not read instance limits, keeping {} characters: {}",
                self.character_limit, e
            );
        }

        info!("Authenticated with {}", self.instance_url);
        Ok(())
    }

    async fn upload(&self, image: &TransientImageFile) -> Result<MediaHandle> {
        self.check_attachment(image)?;

        let path = image.path().to_string_lossy().to_string();
        let response = self
            .client
            .upload_media(path, None)
            .await
            .map_err(|e| MusecastError::Upload(map_megalodon_error(e, "upload media")))?;

        let media_id = match response.json {
            UploadMedia::Attachment(attachment) => attachment.id,
            UploadMedia::AsyncAttachment(attachment) => attachment.id,
        };

        debug!("Uploaded {} as media {}", image.mime_type(), media_id);
        Ok(MediaHandle(media_id))
    }

    async fn publish(&self, text: &str, media: Option<&MediaHandle>) -> Result<PublishResult> {
        self.validate_content(text)?;

        let options = PostStatusInputOptions {
            media_ids: media.map(|m| vec![m.0.clone()]),
            visibility: self.visibility.clone(),
            ..Default::default()
        };

        let response = self
            .client
            .post_status(text.to_string(), Some(&options))
            .await
            .map_err(|e| MusecastError::Publish(map_megalodon_error(e, "post status")))?;

        let reference = match response.json {
            PostStatusOutput::Status(status) => status.uri,
            PostStatusOutput::ScheduledStatus(scheduled) => scheduled.id,
        };

        Ok(PublishResult::published(reference, media.is_some()))
    }

    fn name(&self) -> &str {
        "mastodon"
    }

    fn character_limit(&self) -> Option<usize> {
        Some(self.character_limit)
    }
}

fn parse_visibility(value: &str) -> Result<StatusVisibility> {
    match value.trim().to_lowercase().as_str() {
        "public" => Ok(StatusVisibility::Public),
        "unlisted" => Ok(StatusVisibility::Unlisted),
        "private" => Ok(StatusVisibility::Private),
        "direct" => Ok(StatusVisibility::Direct),
        other => Err(MusecastError::Initialization(format!(
            "Unknown status visibility '{}'. Valid options: public, unlisted, private, direct",
            other
        ))),
    }
}

/// Map megalodon errors to PlatformError
///
/// - HTTP 401/403 → `Authentication`
/// - HTTP 413/415/422 → `Validation` (payload too large, wrong format, bad status)
/// - HTTP 429 → `RateLimit`
/// - HTTP 5xx and connection failures → `Network`
/// - Anything else the server refused → `Rejected`
fn map_megalodon_error(error: megalodon::error::Error, context: &str) -> PlatformError {
    classify_error(&error.to_string(), context)
}

fn classify_error(error_str: &str, context: &str) -> PlatformError {
    let error_lower = error_str.to_lowercase();

    match extract_http_status(error_str) {
        Some(401) | Some(403) => PlatformError::Authentication(format!(
            "Mastodon authentication failed ({}): {}. \
                    Suggestion: Verify SOCIAL_ACCESS_TOKEN is valid and has write scopes.",
            context, error_str
        )),
        Some(413) | Some(415) | Some(422) => PlatformError::Validation(format!(
            "Mastodon validation failed ({}): {}",
            context, error_str
        )),
        Some(429) => PlatformError::RateLimit(format!(
            "Mastodon rate limit exceeded ({}): {}. \
                    Suggestion: Increase the pacing interval.",
            context, error_str
        )),
        Some(500..=599) => {
            PlatformError::Network(format!("Mastodon server error ({}): {}", context, error_str))
        }
        Some(_) => {
            PlatformError::Rejected(format!("Mastodon HTTP error ({}): {}", context, error_str))
        }
        None => {
            if error_lower.contains("unauthorized")
                || error_lower.contains("forbidden")
                || error_lower.contains("token")
            {
                PlatformError::Authentication(format!(
                    "Mastodon authentication failed ({}): {}",
                    context, error_str
                ))
            } else if error_lower.contains("rate limit")
                || error_lower.contains("too many requests")
            {
                PlatformError::RateLimit(format!(
                    "Mastodon rate limit exceeded ({}): {}",
                    context, error_str
                ))
            } else if error_lower.contains("validation") || error_lower.contains("unprocessable")
            {
                PlatformError::Validation(format!(
                    "Mastodon validation failed ({}): {}",
                    context, error_str
                ))
            } else {
                PlatformError::Network(format!(
                    "Mastodon error ({}): {}. \
                        Suggestion: Check your network connection and SOCIAL_INSTANCE_URL.",
                    context, error_str
                ))
            }
        }
    }
}

/// Extract an HTTP status code from an error message
///
/// Looks for patterns like "HTTP 401", "status 403", "code: 429" or a bare
/// three digit code followed by ':' or ' '.
fn extract_http_status(error_str: &str) -> Option<u16> {
    let prefixes = ["HTTP ", "status ", "code: ", "status_code: "];

    for prefix in &prefixes {
        if let Some(pos) = error_str.find(prefix) {
            let after_prefix = &error_str[pos + prefix.len()..];
            if let Some(code) = after_prefix.get(0..3).and_then(|s| s.parse::<u16>().ok()) {
                if (100..=599).contains(&code) {
                    return Some(code);
                }
            }
        }
    }

    let bytes = error_str.as_bytes();
    for (i, window) in bytes.windows(4).enumerate() {
        if window[..3].iter().all(u8::is_ascii_digit)
            && (window[3] == b':' || window[3] == b' ')
            && (i == 0 || !bytes[i - 1].is_ascii_digit())
        {
            let code = std::str::from_utf8(&window[..3])
                .ok()
                .and_then(|s| s.parse::<u16>().ok());
            if let Some(code) = code.filter(|c| (100..=599).contains(c)) {
                return Some(code);
            }
        }
    }

    None
}
