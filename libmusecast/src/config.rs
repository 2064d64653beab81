//! Configuration management for Musecast
//!
//! Behaviour (persona, topics, pacing, provider models) lives in a TOML file.
//! Secrets never do: they are read from the environment into [`Credentials`].

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{ConfigError, Result};
use crate::types::Persona;

pub const TEXT_API_KEY: &str = "TEXT_API_KEY";
pub const IMAGE_API_KEY: &str = "IMAGE_API_KEY";
pub const SOCIAL_ACCESS_TOKEN: &str = "SOCIAL_ACCESS_TOKEN";
pub const SOCIAL_INSTANCE_URL: &str = "SOCIAL_INSTANCE_URL";

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_VAR: &str = "MUSECAST_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub persona: Persona,
    #[serde(default = "default_topics")]
    pub topics: Vec<String>,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub text: TextConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub social: SocialConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Delay between topics, as a humantime string ("30s", "2m")
    #[serde(default = "default_pacing_interval")]
    pub pacing_interval: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            pacing_interval: default_pacing_interval(),
        }
    }
}

impl ScheduleConfig {
    pub fn pacing_interval(&self) -> Result<Duration> {
        parse_interval("schedule.pacing_interval", &self.pacing_interval)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextConfig {
    #[serde(default = "default_text_model")]
    pub model: String,
    /// Override for the provider endpoint (tests, proxies)
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            model: default_text_model(),
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageBackend {
    Gemini,
    Stability,
    /// Images disabled; posts go out text-only
    #[serde(rename = "none")]
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_image_backend")]
    pub backend: ImageBackend,
    /// Model or engine id; the backend's default when absent
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_guidance")]
    pub guidance: f32,
    #[serde(default = "default_steps")]
    pub steps: u32,
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            backend: default_image_backend(),
            model: None,
            guidance: default_guidance(),
            steps: default_steps(),
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialConfig {
    /// Status visibility ("public", "unlisted", "private", "direct")
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default = "default_character_limit")]
    pub character_limit: usize,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            visibility: None,
            character_limit: default_character_limit(),
        }
    }
}

fn default_topics() -> Vec<String> {
    vec![
        "AI in Sustainable Development".to_string(),
        "Ethical Considerations of Machine Learning".to_string(),
        "Future of Remote Work Technologies".to_string(),
        "Digital Wellness in the AI Era".to_string(),
    ]
}

fn default_pacing_interval() -> String {
    "30s".to_string()
}

fn default_text_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_image_backend() -> ImageBackend {
    ImageBackend::Gemini
}

fn default_guidance() -> f32 {
    7.0
}

fn default_steps() -> u32 {
    30
}

fn default_character_limit() -> usize {
    500
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// A missing file at the default location is not an error: the built-in
    /// persona and topic list are used instead. A file named through
    /// `MUSECAST_CONFIG` must exist.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
            let path = PathBuf::from(shellexpand::tilde(&path).to_string());
            return Self::load_from_path(&path);
        }

        let config_path = resolve_config_path()?;
        if !config_path.exists() {
            info!(
                "No config file at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default_config());
        }
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            persona: Persona::default(),
            topics: default_topics(),
            schedule: ScheduleConfig::default(),
            text: TextConfig::default(),
            image: ImageConfig::default(),
            social: SocialConfig::default(),
        }
    }

    /// Check values that deserialize fine but make no sense
    pub fn validate(&self) -> Result<()> {
        self.schedule.pacing_interval()?;

        if self.persona.name.trim().is_empty() {
            return Err(ConfigError::MissingField("persona.name".to_string()).into());
        }
        if self.topics.iter().any(|t| t.trim().is_empty()) {
            return Err(invalid("topics", "topics must not be blank"));
        }
        if self.image.steps == 0 {
            return Err(invalid("image.steps", "must be at least 1"));
        }
        if !(self.image.guidance.is_finite() && self.image.guidance > 0.0) {
            return Err(invalid("image.guidance", "must be a positive number"));
        }
        if self.social.character_limit == 0 {
            return Err(invalid("social.character_limit", "must be at least 1"));
        }
        Ok(())
    }
}

/// Secrets and endpoints taken from the environment
///
/// Every field is optional at load time; each entry point asks for the ones
/// it needs, so replying to a message does not require social credentials.
pub struct Credentials {
    text_api_key: Option<SecretString>,
    image_api_key: Option<SecretString>,
    social_access_token: Option<SecretString>,
    social_instance_url: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("text_api_key", &self.text_api_key.is_some())
            .field("image_api_key", &self.image_api_key.is_some())
            .field("social_access_token", &self.social_access_token.is_some())
            .field("social_instance_url", &self.social_instance_url)
            .finish()
    }
}

impl Credentials {
    /// Read credentials from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through an arbitrary lookup function
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            text_api_key: get(TEXT_API_KEY).map(SecretString::from),
            image_api_key: get(IMAGE_API_KEY).map(SecretString::from),
            social_access_token: get(SOCIAL_ACCESS_TOKEN).map(SecretString::from),
            social_instance_url: get(SOCIAL_INSTANCE_URL),
        }
    }

    pub fn text_api_key(&self) -> Result<&SecretString> {
        self.text_api_key
            .as_ref()
            .ok_or_else(|| ConfigError::MissingField(TEXT_API_KEY.to_string()).into())
    }

    /// Image key, falling back to the text key when `fallback_to_text` is set
    pub fn image_api_key(&self, fallback_to_text: bool) -> Result<&SecretString> {
        match (&self.image_api_key, fallback_to_text) {
            (Some(key), _) => Ok(key),
            (None, true) => self.text_api_key(),
            (None, false) => Err(ConfigError::MissingField(IMAGE_API_KEY.to_string()).into()),
        }
    }

    pub fn social_access_token(&self) -> Result<&SecretString> {
        self.social_access_token
            .as_ref()
            .ok_or_else(|| ConfigError::MissingField(SOCIAL_ACCESS_TOKEN.to_string()).into())
    }

    /// Instance URL with a scheme, defaulting to https
    pub fn social_instance_url(&self) -> Result<String> {
        let url = self
            .social_instance_url
            .as_ref()
            .ok_or_else(|| ConfigError::MissingField(SOCIAL_INSTANCE_URL.to_string()))?;
        Ok(normalize_instance_url(url))
    }
}

/// Ensure an instance URL carries a scheme and no trailing slash
pub fn normalize_instance_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Parse a humantime duration, naming the field on failure
pub fn parse_interval(field: &str, value: &str) -> Result<Duration> {
    humantime::parse_duration(value.trim()).map_err(|e| invalid(field, &e.to_string()))
}

fn invalid(field: &str, reason: &str) -> crate::error::MusecastError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("musecast").join("config.toml"))
}
