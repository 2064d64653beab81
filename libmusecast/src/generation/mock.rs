//! Mock generators for testing
//!
//! Scripted providers that answer from a queue and record every prompt they
//! receive. Clones share state, so a test can keep a handle for assertions
//! after moving a generator into the pipeline.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::{ImageGenerator, TextGenerator};
use crate::error::{GenerationError, Result};

type Script<T> = Arc<Mutex<VecDeque<std::result::Result<T, GenerationError>>>>;

#[derive(Clone)]
pub struct MockTextGenerator {
    script: Script<String>,
    /// Answer once the script runs out; `None` means fail
    fallback: Option<String>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockTextGenerator {
    /// Answer calls in order from `responses`, then fail
    pub fn scripted(responses: Vec<std::result::Result<String, GenerationError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(responses.into())),
            fallback: None,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always answer with `text`
    pub fn always(text: &str) -> Self {
        Self {
            fallback: Some(text.to_string()),
            ..Self::scripted(Vec::new())
        }
    }

    /// Always fail with a network error
    pub fn failing() -> Self {
        Self::scripted(Vec::new())
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(answer) => Ok(answer?),
            None => self.fallback.clone().ok_or_else(|| {
                GenerationError::Network("Mock text generation failed".to_string()).into()
            }),
        }
    }

    fn name(&self) -> &str {
        "mock-text"
    }
}

#[derive(Clone)]
pub struct MockImageGenerator {
    script: Script<Vec<u8>>,
    fallback: Option<Vec<u8>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockImageGenerator {
    pub fn scripted(responses: Vec<std::result::Result<Vec<u8>, GenerationError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(responses.into())),
            fallback: None,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn always(bytes: Vec<u8>) -> Self {
        Self {
            fallback: Some(bytes),
            ..Self::scripted(Vec::new())
        }
    }

    /// Always answer with a minimal PNG header
    pub fn png() -> Self {
        Self::always(vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
    }

    pub fn failing() -> Self {
        Self::scripted(Vec::new())
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(answer) => Ok(answer?),
            None => self.fallback.clone().ok_or_else(|| {
                GenerationError::Http {
                    status: 500,
                    message: "Mock image generation failed".to_string(),
                }
                .into()
            }),
        }
    }

    fn name(&self) -> &str {
        "mock-image"
    }
}
