//! Question answering: embed, retrieve, prompt, generate.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::embedding::{Embedder, embed_checked};
use super::generation::{GenerationParams, Generator};
use super::prompt::{PromptTemplate, build_context};
use super::vector_store::VectorIndex;
use crate::error::QueryError;
use crate::models::{Answer, Config, DEFAULT_FALLBACK_ANSWER, RetrievedChunk};
use crate::utils::{CallGuard, RetryConfig, with_retry};

/// Answers questions from the indexed documents.
///
/// The question is embedded with the same embedder used for ingestion, the
/// nearest chunks become the context of a grounded prompt, and the
/// generator's text is returned verbatim.
pub struct QueryPipeline {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    generator: Arc<dyn Generator>,
    template: PromptTemplate,
    params: GenerationParams,
    top_k: usize,
    retry: RetryConfig,
    embed_timeout: Duration,
    store_timeout: Duration,
    generate_timeout: Duration,
}

impl QueryPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            embedder,
            index,
            generator,
            template: PromptTemplate::new(DEFAULT_FALLBACK_ANSWER),
            params: GenerationParams {
                temperature: 0.1,
                max_tokens: 1024,
            },
            top_k: 3,
            retry: RetryConfig::default(),
            embed_timeout: Duration::from_secs(60),
            store_timeout: Duration::from_secs(30),
            generate_timeout: Duration::from_secs(120),
        }
    }

    pub fn from_config(
        config: &Config,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        let mut pipeline = Self::new(embedder, index, generator)
            .with_top_k(config.retrieval.top_k)
            .with_template(PromptTemplate::new(&config.retrieval.fallback_answer))
            .with_params(GenerationParams::from(&config.generation))
            .with_retry(RetryConfig::from_settings(&config.retry));
        pipeline.embed_timeout = Duration::from_secs(config.embedding.timeout_secs);
        pipeline.store_timeout = Duration::from_secs(config.vector_store.timeout_secs);
        pipeline.generate_timeout = Duration::from_secs(config.generation.timeout_secs);
        pipeline
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    #[must_use]
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Nearest chunks for `question`, highest score first.
    pub async fn retrieve(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<RetrievedChunk>, QueryError> {
        let question = validate_question(question)?;

        let embed_guard = CallGuard::new(self.embed_timeout, cancel.clone());
        let vector = embed_checked(
            self.embedder.as_ref(),
            question,
            self.embedder.dimension(),
            &embed_guard,
            &self.retry,
        )
        .await?;

        let store_guard = CallGuard::new(self.store_timeout, cancel.clone());
        let mut results = with_retry(&self.retry, cancel, "query index", || {
            store_guard.run(self.index.query(&vector, self.top_k))
        })
        .await?;

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(self.top_k);

        debug!(retrieved = results.len(), top_k = self.top_k, "retrieved context");
        Ok(results)
    }

    /// Answer `question` from the indexed documents.
    ///
    /// An empty index still produces a generator call: the prompt then has
    /// an empty context and the model is told to reply with the fallback
    /// phrase.
    pub async fn answer(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<Answer, QueryError> {
        let start = Instant::now();
        let question = validate_question(question)?;

        let sources = self.retrieve(question, cancel).await?;
        let context = build_context(&sources);
        let prompt = self.template.render(&context, question);

        let guard = CallGuard::new(self.generate_timeout, cancel.clone());
        let answer = with_retry(&self.retry, cancel, "generate", || {
            guard.run(self.generator.generate(&prompt, self.params))
        })
        .await?;

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            retrieved = sources.len(),
            answer_len = answer.len(),
            duration_ms,
            "answered question"
        );

        Ok(Answer {
            question: question.to_string(),
            answer,
            sources,
            context,
            duration_ms,
        })
    }
}

fn validate_question(question: &str) -> Result<&str, QueryError> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Err(QueryError::InvalidQuestion(
            "question must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}
