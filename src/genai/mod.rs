//! Generative-AI collaborators that consume scraped records.
//!
//! Nothing here feeds back into the scrape: pages and restyled images are
//! produced from finished [`NewsRecord`](crate::models::NewsRecord)s and
//! every failure is logged and skipped.
//!
//! # Architecture
//!
//! - [`GenerateAsync`]: core trait for one model call
//! - [`RetryGenerate`]: decorator that retries any [`GenerateAsync`] with a fixed delay
//! - [`gemini::GeminiClient`]: REST implementation for the Gemini API
//! - [`pages`]: one styled HTML page per article
//! - [`restyle`]: colour/logo clean-up of downloaded images
//!
//! # Retry Strategy
//!
//! - At most 3 attempts per call
//! - Fixed 3 second delay between attempts

pub mod gemini;
pub mod pages;
pub mod restyle;

use std::error::Error;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, instrument, warn};

/// Attempts made by [`RetryGenerate::with_default_policy`].
pub const DEFAULT_ATTEMPTS: usize = 3;

/// Delay between attempts used by [`RetryGenerate::with_default_policy`].
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// One piece of a prompt or a model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    Image { mime_type: String, data: Vec<u8> },
}

/// A single-turn request to a generative model.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerateRequest {
    pub parts: Vec<Part>,
    /// Ask the model to answer with image parts as well as text.
    pub want_images: bool,
}

impl GenerateRequest {
    /// A text-only prompt.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::Text(prompt.into())],
            want_images: false,
        }
    }
}

/// The parts of a model response, in order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Generated {
    pub parts: Vec<Part>,
}

impl Generated {
    /// All text parts concatenated.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Text(text) => Some(text.as_str()),
                Part::Image { .. } => None,
            })
            .collect()
    }

    /// The first inline image part, if any.
    pub fn first_image(&self) -> Option<(&str, &[u8])> {
        self.parts.iter().find_map(|part| match part {
            Part::Image { mime_type, data } => Some((mime_type.as_str(), data.as_slice())),
            Part::Text(_) => None,
        })
    }
}

/// Trait for async model interaction.
///
/// Implementors send a [`GenerateRequest`] to a model and return its parts.
/// This abstraction allows for different backends or decorators (like retry logic).
pub trait GenerateAsync {
    async fn generate(&self, request: &GenerateRequest) -> Result<Generated, Box<dyn Error>>;
}

/// Wrapper that retries any [`GenerateAsync`] implementation with a fixed delay.
pub struct RetryGenerate<T> {
    inner: T,
    max_attempts: usize,
    delay: Duration,
}

impl<T: GenerateAsync> RetryGenerate<T> {
    /// Wrap `inner`, making at most `max_attempts` calls (at least one).
    pub fn new(inner: T, max_attempts: usize, delay: Duration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Wrap `inner` with [`DEFAULT_ATTEMPTS`] and [`DEFAULT_RETRY_DELAY`].
    pub fn with_default_policy(inner: T) -> Self {
        Self::new(inner, DEFAULT_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}

impl<T> fmt::Debug for RetryGenerate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryGenerate")
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .finish()
    }
}

impl<T: GenerateAsync> GenerateAsync for RetryGenerate<T> {
    #[instrument(level = "info", skip_all)]
    async fn generate(&self, request: &GenerateRequest) -> Result<Generated, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            attempt += 1;
            match self.inner.generate(request).await {
                Ok(resp) => return Ok(resp),
                Err(e) if attempt >= self.max_attempts => {
                    error!(
                        attempt,
                        max = self.max_attempts,
                        elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                        error = %e,
                        "generate() exhausted retries"
                    );
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        attempt,
                        max = self.max_attempts,
                        delay = ?self.delay,
                        error = %e,
                        "generate() attempt failed; retrying"
                    );
                    sleep(self.delay).await;
                }
            }
        }
    }
}

/// Scripted model for tests: pops one canned result per call.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedModel {
    pub responses: std::cell::RefCell<std::collections::VecDeque<Result<Generated, String>>>,
    pub requests: std::cell::RefCell<Vec<GenerateRequest>>,
}

#[cfg(test)]
impl ScriptedModel {
    pub fn new(responses: Vec<Result<Generated, String>>) -> Self {
        Self {
            responses: std::cell::RefCell::new(responses.into()),
            requests: Default::default(),
        }
    }

    pub fn text_reply(text: &str) -> Result<Generated, String> {
        Ok(Generated {
            parts: vec![Part::Text(text.to_string())],
        })
    }
}

#[cfg(test)]
impl GenerateAsync for ScriptedModel {
    async fn generate(&self, request: &GenerateRequest) -> Result<Generated, Box<dyn Error>> {
        self.requests.borrow_mut().push(request.clone());
        match self.responses.borrow_mut().pop_front() {
            Some(Ok(generated)) => Ok(generated),
            Some(Err(e)) => Err(e.into()),
            None => Err("no scripted response left".into()),
        }
    }
}
