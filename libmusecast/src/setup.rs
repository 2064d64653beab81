//! Construction of clients and pipelines from configuration
//!
//! Everything that can fail before the first topic happens here, and every
//! failure is reported as `MusecastError::Initialization` so the caller can
//! abort the run.

use std::time::Duration;

use tracing::info;

use crate::config::{Config, Credentials, ImageBackend};
use crate::error::{MusecastError, Result};
use crate::generation::gemini::{GeminiImageClient, GeminiTextClient};
use crate::generation::stability::StabilityImageClient;
use crate::generation::{ImageGenerator, TextGenerator};
use crate::pipeline::ContentPipeline;
use crate::platforms::dry_run::DryRunPublisher;
use crate::platforms::mastodon::MastodonClient;
use crate::platforms::SocialPublisher;
use crate::responder::InteractiveResponder;

/// Run-time choices layered over the configuration file
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Log posts instead of sending them
    pub dry_run: bool,
    /// Replaces `schedule.pacing_interval`
    pub pacing_interval: Option<Duration>,
}

fn initialization(error: MusecastError) -> MusecastError {
    match error {
        MusecastError::Initialization(_) => error,
        other => MusecastError::Initialization(other.to_string()),
    }
}

pub fn create_text_generator(
    config: &Config,
    credentials: &Credentials,
) -> Result<Box<dyn TextGenerator>> {
    let key = credentials.text_api_key().map_err(initialization)?;
    let client = GeminiTextClient::new(
        key.clone(),
        config.text.model.clone(),
        config.text.base_url.clone(),
    )?;
    Ok(Box::new(client))
}

/// The configured image backend, or `None` when images are disabled
pub fn create_image_generator(
    config: &Config,
    credentials: &Credentials,
) -> Result<Option<Box<dyn ImageGenerator>>> {
    let image = &config.image;
    let generator: Box<dyn ImageGenerator> = match image.backend {
        ImageBackend::Disabled => return Ok(None),
        ImageBackend::Gemini => {
            let key = credentials.image_api_key(true).map_err(initialization)?;
            Box::new(GeminiImageClient::new(
                key.clone(),
                image.model.clone(),
                image.base_url.clone(),
            )?)
        }
        ImageBackend::Stability => {
            let key = credentials.image_api_key(false).map_err(initialization)?;
            Box::new(StabilityImageClient::new(
                key.clone(),
                image.model.clone(),
                image.base_url.clone(),
                image.guidance,
                image.steps,
            )?)
        }
    };
    Ok(Some(generator))
}

/// The social publisher, authenticated and ready to post
pub async fn create_publisher(
    config: &Config,
    credentials: &Credentials,
    dry_run: bool,
) -> Result<Box<dyn SocialPublisher>> {
    let mut publisher: Box<dyn SocialPublisher> = if dry_run {
        info!("Dry run: nothing will be posted");
        Box::new(DryRunPublisher::new(config.social.character_limit))
    } else {
        let instance_url = credentials.social_instance_url().map_err(initialization)?;
        let token = credentials.social_access_token().map_err(initialization)?;
        Box::new(
            MastodonClient::new(
                instance_url,
                token.clone(),
                config.social.visibility.as_deref(),
            )?
            .with_character_limit(config.social.character_limit),
        )
    };

    publisher.authenticate().await.map_err(initialization)?;
    Ok(publisher)
}

/// Build the full pipeline; any failure aborts before the first topic
pub async fn create_pipeline(
    config: &Config,
    credentials: &Credentials,
    options: &PipelineOptions,
) -> Result<ContentPipeline> {
    let pacing_interval = match options.pacing_interval {
        Some(interval) => interval,
        None => config.schedule.pacing_interval().map_err(initialization)?,
    };

    let text = create_text_generator(config, credentials)?;
    let image = create_image_generator(config, credentials)?;
    let publisher = create_publisher(config, credentials, options.dry_run).await?;

    let mut pipeline = ContentPipeline::new(config.persona.clone(), text, publisher)
        .with_pacing_interval(pacing_interval);
    if let Some(image) = image {
        pipeline = pipeline.with_image_generator(image);
    }
    Ok(pipeline)
}

/// Responder for replies; needs only the text provider key
pub fn create_responder(config: &Config, credentials: &Credentials) -> Result<InteractiveResponder> {
    let text = create_text_generator(config, credentials)?;
    Ok(InteractiveResponder::new(config.persona.clone(), text))
}
