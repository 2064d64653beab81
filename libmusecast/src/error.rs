//! Error types for Musecast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MusecastError>;

#[derive(Error, Debug)]
pub enum MusecastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Credential or client setup failure. Fatal: the run stops before any topic.
    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Media upload failed: {0}")]
    Upload(PlatformError),

    #[error("Publishing failed: {0}")]
    Publish(PlatformError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MusecastError {
    /// Returns the process exit code for this error
    ///
    /// Only errors that escape the pipeline reach this point; per-topic
    /// failures are logged and never change the exit status.
    pub fn exit_code(&self) -> i32 {
        match self {
            MusecastError::Config(_) | MusecastError::Initialization(_) => 2,
            _ => 1,
        }
    }

    /// Whether this error happened before any topic was processed
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MusecastError::Config(_) | MusecastError::Initialization(_)
        )
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Failure of a text or image generation provider
#[derive(Error, Debug, Clone)]
pub enum GenerationError {
    #[error("Request failed: {0}")]
    Network(String),

    #[error("Provider returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Provider returned no content: {0}")]
    EmptyResponse(String),
}

/// Classification of social network failures
#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Content validation failed: {0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Rejected by server: {0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_initialization() {
        let error = MusecastError::Initialization("bad token".to_string());
        assert_eq!(error.exit_code(), 2);
        assert!(error.is_fatal());
    }

    #[test]
    fn test_exit_code_config() {
        let error: MusecastError = ConfigError::MissingField("TEXT_API_KEY".to_string()).into();
        assert_eq!(error.exit_code(), 2);
        assert!(error.is_fatal());
    }

    #[test]
    fn test_exit_code_per_topic_errors() {
        let generation: MusecastError = GenerationError::EmptyResponse("gemini".to_string()).into();
        assert_eq!(generation.exit_code(), 1);
        assert!(!generation.is_fatal());

        let upload = MusecastError::Upload(PlatformError::Rejected("too large".to_string()));
        assert_eq!(upload.exit_code(), 1);

        let publish = MusecastError::Publish(PlatformError::RateLimit("429".to_string()));
        assert_eq!(publish.exit_code(), 1);
        assert!(!publish.is_fatal());
    }

    #[test]
    fn test_error_message_formatting_publish() {
        let error = MusecastError::Publish(PlatformError::Authentication(
            "Invalid token".to_string(),
        ));
        assert_eq!(
            error.to_string(),
            "Publishing failed: Authentication failed: Invalid token"
        );
    }

    #[test]
    fn test_error_message_formatting_upload() {
        let error = MusecastError::Upload(PlatformError::Validation(
            "unsupported format".to_string(),
        ));
        assert_eq!(
            error.to_string(),
            "Media upload failed: Content validation failed: unsupported format"
        );
    }

    #[test]
    fn test_generation_http_formatting() {
        let error = GenerationError::Http {
            status: 503,
            message: "UNAVAILABLE: overloaded".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Provider returned HTTP 503: UNAVAILABLE: overloaded"
        );
    }

    #[test]
    fn test_config_invalid_value_formatting() {
        let error = ConfigError::InvalidValue {
            field: "schedule.pacing_interval".to_string(),
            reason: "expected a duration".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("schedule.pacing_interval"));
        assert!(message.contains("expected a duration"));
    }

    #[test]
    fn test_config_read_error_formatting() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let config_error = ConfigError::ReadError(io_error);
        assert!(config_error.to_string().contains("Failed to read config file"));
    }
}
