use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::{BackendError, SamplingParams, TextBackend};
use crate::core::store::{ArticleDraft, FALLBACK_AUTHOR, GENERATOR_AUTHOR};

pub const DEFAULT_TOPICS: &[&str] = &[
    "The Future of Artificial Intelligence",
    "Sustainable Technology and Green Computing",
    "Cybersecurity Best Practices",
    "Cloud Computing Trends",
    "Web Development Modern Practices",
    "Machine Learning in Healthcare",
    "Blockchain Technology Applications",
    "Internet of Things (IoT) Revolution",
    "Quantum Computing Explained",
    "DevOps and CI/CD Pipelines",
    "Mobile App Development Trends",
    "Data Science and Analytics",
    "Virtual Reality and Augmented Reality",
    "Software Architecture Patterns",
    "API Design Best Practices",
];

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts per generation, including the first.
    pub max_attempts: u32,
    /// Pause before retrying after the backend reports it is still loading.
    pub warmup_cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            warmup_cooldown: Duration::from_secs(20),
        }
    }
}

/// Produces article drafts. Backend failures never escape `generate`; they turn
/// into a fallback draft instead.
pub struct ArticleGenerator {
    backend: Option<Arc<dyn TextBackend>>,
    topics: Vec<String>,
    params: SamplingParams,
    retry: RetryPolicy,
}

impl ArticleGenerator {
    pub fn new(backend: Arc<dyn TextBackend>) -> Self {
        info!("Article generator using backend: {}", backend.name());
        Self {
            backend: Some(backend),
            topics: default_topics(),
            params: SamplingParams::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// A generator with no credentials. Every draft it produces is a fallback.
    pub fn without_backend() -> Self {
        warn!("No text-generation credential configured; articles will use fallback content");
        Self {
            backend: None,
            topics: default_topics(),
            params: SamplingParams::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_topics(mut self, topics: Vec<String>) -> Self {
        let topics: Vec<String> = topics
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if !topics.is_empty() {
            self.topics = topics;
        }
        self
    }

    pub fn with_params(mut self, params: SamplingParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn generate(&self) -> ArticleDraft {
        let topic = self.pick_topic();
        info!("Generating article about: \"{}\"", topic);

        let Some(backend) = self.backend.as_deref() else {
            return fallback_draft(&topic);
        };

        let prompt = build_prompt(&topic);
        match self.complete_with_retry(backend, &prompt).await {
            Ok(content) => ArticleDraft {
                title: topic,
                content,
                author: GENERATOR_AUTHOR.to_string(),
            },
            Err(e) => {
                warn!("Article generation failed, using fallback content: {}", e);
                fallback_draft(&topic)
            }
        }
    }

    fn pick_topic(&self) -> String {
        self.topics
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| DEFAULT_TOPICS[0].to_string())
    }

    async fn complete_with_retry(
        &self,
        backend: &dyn TextBackend,
        prompt: &str,
    ) -> Result<String, BackendError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let result = backend
                .complete(prompt, &self.params)
                .await
                .and_then(|text| {
                    let trimmed = text.trim();
                    if trimmed.is_empty() {
                        Err(BackendError::EmptyCompletion)
                    } else {
                        Ok(trimmed.to_string())
                    }
                });

            match result {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!(
                        "Attempt {}/{} against {} failed: {}",
                        attempt,
                        max_attempts,
                        backend.name(),
                        e
                    );
                    if attempt >= max_attempts {
                        return Err(e);
                    }
                    if e.is_warming_up() {
                        info!(
                            "Model is loading, waiting {}s before retry...",
                            self.retry.warmup_cooldown.as_secs()
                        );
                        tokio::time::sleep(self.retry.warmup_cooldown).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}

fn default_topics() -> Vec<String> {
    DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect()
}

pub(crate) fn build_prompt(topic: &str) -> String {
    format!(
        "Write a detailed, informative blog article about \"{topic}\".\n\n\
         The article should be well-structured with an introduction, main body with key points, \
         and a conclusion. Make it engaging and educational for tech enthusiasts.\n\n\
         Article:"
    )
}

pub(crate) fn fallback_draft(topic: &str) -> ArticleDraft {
    ArticleDraft {
        title: topic.to_string(),
        content: format!(
            "This is an automatically generated article about {topic}.\n\n\
             The text-generation service could not be reached, so this placeholder stands in \
             for the real piece. A generated article would cover why {topic} matters, where it \
             stands today and where it is heading.\n\n\
             Key points would include:\n\
             - Overview and background\n\
             - Current state and trends\n\
             - Challenges and opportunities\n\
             - Future outlook\n\
             - Practical applications"
        ),
        author: FALLBACK_AUTHOR.to_string(),
    }
}
