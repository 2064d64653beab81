//! Sequential content publishing
//!
//! For each topic the pipeline walks a fixed sequence of stages:
//!
//! ```text
//! BuildingPrompts -> GeneratingText -> GeneratingImage -> Publishing -> Cleanup -> Done
//!                         |                                               ^
//!                         +------------- text failed: skip --------------+
//! ```
//!
//! Text is mandatory; the image is decoration and its absence (generation,
//! staging or upload failure) never stops the text from going out. A failed
//! topic never aborts the remaining ones. Topics run strictly one after the
//! other with the pacing interval between them.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, info_span, warn, Instrument};

use crate::clock::{Clock, TokioClock};
use crate::generation::{ImageGenerator, TextGenerator};
use crate::platforms::SocialPublisher;
use crate::prompt::PromptBuilder;
use crate::staging::TransientImageFile;
use crate::types::{truncate_chars, GeneratedContent, MediaHandle, Persona, PublishResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    BuildingPrompts,
    GeneratingText,
    GeneratingImage,
    Publishing,
    Cleanup,
    Done,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStage::BuildingPrompts => "building_prompts",
            PipelineStage::GeneratingText => "generating_text",
            PipelineStage::GeneratingImage => "generating_image",
            PipelineStage::Publishing => "publishing",
            PipelineStage::Cleanup => "cleanup",
            PipelineStage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicOutcome {
    Published(PublishResult),
    /// Text generation failed, nothing was sent
    Skipped(String),
    /// The publish call failed
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct TopicReport {
    pub topic: String,
    pub outcome: TopicOutcome,
    /// Stages visited, in order
    pub stages: Vec<PipelineStage>,
}

impl TopicReport {
    pub fn is_published(&self) -> bool {
        matches!(self.outcome, TopicOutcome::Published(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub reports: Vec<TopicReport>,
}

impl RunSummary {
    pub fn published(&self) -> usize {
        self.count(|o| matches!(o, TopicOutcome::Published(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, TopicOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, TopicOutcome::Failed(_)))
    }

    fn count(&self, predicate: impl Fn(&TopicOutcome) -> bool) -> usize {
        self.reports.iter().filter(|r| predicate(&r.outcome)).count()
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} topic(s): {} published, {} skipped, {} failed",
            self.reports.len(),
            self.published(),
            self.skipped(),
            self.failed()
        )
    }
}

pub struct ContentPipeline {
    persona: Persona,
    text: Box<dyn TextGenerator>,
    image: Option<Box<dyn ImageGenerator>>,
    publisher: Box<dyn SocialPublisher>,
    clock: Box<dyn Clock>,
    pacing_interval: Duration,
    /// `None` stages in the system temp directory
    staging_dir: Option<PathBuf>,
}

impl ContentPipeline {
    /// Create a pipeline speaking as `persona`
    ///
    /// Starts without an image generator (posts go out text-only), with a 30
    /// second pacing interval, the tokio clock and staging in the system temp
    /// directory. The `with_*` methods replace each of these.
    ///
    /// # Arguments
    ///
    /// * `persona` - Identity and voice used for every prompt
    /// * `text` - Provider for the post text; its failure skips a topic
    /// * `publisher` - Destination for posts, already authenticated
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use libmusecast::generation::mock::{MockImageGenerator, MockTextGenerator};
    /// use libmusecast::platforms::mock::MockPublisher;
    /// use libmusecast::{ContentPipeline, Persona};
    /// use std::time::Duration;
    ///
    /// # async fn example() {
    /// let pipeline = ContentPipeline::new(
    ///     Persona::default(),
    ///     Box::new(MockTextGenerator::always("Edge AI is here.")),
    ///     Box::new(MockPublisher::new()),
    /// )
    /// .with_image_generator(Box::new(MockImageGenerator::png()))
    /// .with_pacing_interval(Duration::from_secs(60));
    ///
    /// let summary = pipeline.run(&["Edge AI".to_string()]).await;
    /// println!("{}", summary);
    /// # }
    /// ```
    pub fn new(
        persona: Persona,
        text: Box<dyn TextGenerator>,
        publisher: Box<dyn SocialPublisher>,
    ) -> Self {
        Self {
            persona,
            text,
            image: None,
            publisher,
            clock: Box::new(TokioClock::new()),
            pacing_interval: Duration::from_secs(30),
            staging_dir: None,
        }
    }

    pub fn with_image_generator(mut self, image: Box<dyn ImageGenerator>) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_pacing_interval(mut self, interval: Duration) -> Self {
        self.pacing_interval = interval;
        self
    }

    /// Directory for transient image files (system temp dir by default)
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn pacing_interval(&self) -> Duration {
        self.pacing_interval
    }

    /// Process `topics` in order, pacing between consecutive topics
    pub async fn run(&self, topics: &[String]) -> RunSummary {
        info!(
            "Starting run over {} topic(s) as {}",
            topics.len(),
            self.persona.name
        );

        let mut summary = RunSummary::default();
        for (index, topic) in topics.iter().enumerate() {
            if index > 0 {
                self.pace().await;
            }

            let span = info_span!("topic", index = index + 1, topic = %topic);
            let report = self.process_topic(topic).instrument(span).await;
            summary.reports.push(report);
        }

        info!("Run finished: {}", summary);
        summary
    }

    async fn pace(&self) {
        if self.pacing_interval.is_zero() {
            return;
        }
        debug!(
            "Waiting {} before the next topic",
            humantime::format_duration(self.pacing_interval)
        );
        self.clock.sleep(self.pacing_interval).await;
    }

    /// Run one topic through every stage
    pub async fn process_topic(&self, topic: &str) -> TopicReport {
        let mut stages = vec![PipelineStage::BuildingPrompts];
        debug!("Stage: {}", PipelineStage::BuildingPrompts);
        let text_prompt = PromptBuilder::build_text_prompt(&self.persona, topic);
        let image_prompt = PromptBuilder::build_image_prompt(topic);

        enter(&mut stages, PipelineStage::GeneratingText);
        let text = match self.generate_text(&text_prompt).await {
            Ok(text) => text,
            Err(reason) => {
                warn!("Skipping topic '{}': {}", topic, reason);
                enter(&mut stages, PipelineStage::Cleanup);
                enter(&mut stages, PipelineStage::Done);
                return TopicReport {
                    topic: topic.to_string(),
                    outcome: TopicOutcome::Skipped(reason),
                    stages,
                };
            }
        };

        enter(&mut stages, PipelineStage::GeneratingImage);
        let content = GeneratedContent::new(text, self.generate_image(&image_prompt).await);

        enter(&mut stages, PipelineStage::Publishing);
        let staged = self.stage_image(&content);
        let media = match &staged {
            Some(file) => self.upload(file).await,
            None => None,
        };
        let outcome = match self.publisher.publish(&content.text, media.as_ref()).await {
            Ok(result) => {
                info!("Posted successfully: {}", result.post_reference);
                TopicOutcome::Published(result)
            }
            Err(e) => {
                warn!("Publishing '{}' failed: {}", topic, e);
                TopicOutcome::Failed(e.to_string())
            }
        };

        enter(&mut stages, PipelineStage::Cleanup);
        if let Some(file) = staged {
            if let Err(e) = file.remove() {
                warn!("Failed to remove staged image: {}", e);
            }
        }

        enter(&mut stages, PipelineStage::Done);
        TopicReport {
            topic: topic.to_string(),
            outcome,
            stages,
        }
    }

    /// Generated text, bounded to the publisher's limit, or the failure reason
    async fn generate_text(&self, prompt: &str) -> Result<String, String> {
        let text = self
            .text
            .generate(prompt)
            .await
            .map_err(|e| format!("text generation via {} failed: {}", self.text.name(), e))?;

        let text = text.trim();
        if text.is_empty() {
            return Err(format!("{} returned empty text", self.text.name()));
        }

        match self.publisher.character_limit() {
            Some(limit) if text.chars().count() > limit => {
                warn!(
                    "Generated text has {} characters, truncating to {}",
                    text.chars().count(),
                    limit
                );
                Ok(truncate_chars(text, limit))
            }
            _ => Ok(text.to_string()),
        }
    }

    async fn generate_image(&self, prompt: &str) -> Option<Vec<u8>> {
        let generator = self.image.as_ref()?;
        match generator.generate(prompt).await {
            Ok(bytes) if !bytes.is_empty() => Some(bytes),
            Ok(_) => {
                warn!("{} returned an empty image, posting text only", generator.name());
                None
            }
            Err(e) => {
                warn!(
                    "Image generation via {} failed, posting text only: {}",
                    generator.name(),
                    e
                );
                None
            }
        }
    }

    fn stage_image(&self, content: &GeneratedContent) -> Option<TransientImageFile> {
        if !content.has_image() {
            return None;
        }
        let bytes = content.image_bytes.as_deref()?;
        let staged = match &self.staging_dir {
            Some(dir) => TransientImageFile::create_in(dir, bytes),
            None => TransientImageFile::create(bytes),
        };
        match staged {
            Ok(file) => Some(file),
            Err(e) => {
                warn!("Could not stage image, posting text only: {}", e);
                None
            }
        }
    }

    /// Upload failures fall back to a text-only post
    async fn upload(&self, file: &TransientImageFile) -> Option<MediaHandle> {
        match self.publisher.upload(file).await {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("{}; posting text only", e);
                None
            }
        }
    }
}

fn enter(stages: &mut Vec<PipelineStage>, stage: PipelineStage) {
    debug!("Stage: {}", stage);
    stages.push(stage);
}
