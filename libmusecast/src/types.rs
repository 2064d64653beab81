//! Core data types for Musecast

use serde::{Deserialize, Serialize};

/// The identity and voice the generated content speaks in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub bio: String,
    #[serde(default)]
    pub interests: Vec<String>,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: "Nova Tech Insights".to_string(),
            bio: "AI-powered tech exploration and innovation commentary".to_string(),
            interests: vec![
                "Sustainable Technology".to_string(),
                "AI Ethics".to_string(),
                "Future of Work".to_string(),
                "Digital Wellness".to_string(),
            ],
        }
    }
}

/// Content produced for a single topic
///
/// Lives for one pipeline iteration and is dropped after the publish attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedContent {
    pub text: String,
    pub image_bytes: Option<Vec<u8>>,
}

impl GeneratedContent {
    pub fn new(text: String, image_bytes: Option<Vec<u8>>) -> Self {
        Self { text, image_bytes }
    }

    pub fn has_image(&self) -> bool {
        self.image_bytes.as_ref().is_some_and(|b| !b.is_empty())
    }
}

/// Opaque identifier for media accepted by the social network
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaHandle(pub String);

impl MediaHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MediaHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of creating a status on the social network
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishResult {
    /// Platform-specific post reference (the status URI for Mastodon)
    pub post_reference: String,
    pub success: bool,
    /// Whether a media attachment went out with the post
    pub with_media: bool,
    /// Unix timestamp of the publish call
    pub published_at: i64,
}

impl PublishResult {
    pub fn published(post_reference: String, with_media: bool) -> Self {
        Self {
            post_reference,
            success: true,
            with_media,
            published_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Image formats recognised when staging generated images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageMimeType {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl ImageMimeType {
    /// Sniff the format from the leading bytes of an image payload
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(Self::WebP)
        } else {
            None
        }
    }

    /// Parse MIME type from a MIME string (e.g., "image/jpeg")
    pub fn from_mime_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::WebP => "webp",
        }
    }
}

impl std::fmt::Display for ImageMimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Cut `text` down to at most `limit` characters, ending in an ellipsis when cut
///
/// Counts Unicode scalar values, matching how Mastodon counts characters.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    if limit == 0 {
        return String::new();
    }

    let mut truncated: String = text.chars().take(limit - 1).collect();
    truncated.truncate(truncated.trim_end().len());
    truncated.push('…');
    truncated
}
