//! Post-submission explanation pipeline.
//!
//! After a session is submitted, every answered question gets a structured
//! explanation from the text-generation collaborator. Requests go out
//! sequentially (one in flight) to bound load; each question fails
//! independently — a transport error or malformed reply is logged and
//! replaced with fallback content, never aborting the batch. The pipeline
//! runs strictly after scoring and cannot affect the phase or the score.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::answers::AnswerSheet;
use crate::error::ProviderError;
use crate::model::TestCatalog;
use crate::scoring::is_correct;
use crate::traits::{strip_code_fences, ExplainRequest, ExplanationProvider};

/// A key word from the question or passage, with its translation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyword {
    pub word: String,
    pub translation: String,
    /// Where the word came from ("question" or "passage").
    #[serde(rename = "source")]
    pub source_label: String,
}

/// One generated explanation, in the shape the generation service is
/// asked to produce. Field names mirror the wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    #[serde(default)]
    pub keywords: Vec<Keyword>,
    #[serde(rename = "explanation")]
    pub explanation_text: String,
    #[serde(rename = "keysentence")]
    pub key_sentence: String,
    #[serde(rename = "reasoning", default)]
    pub reasoning_points: Vec<String>,
}

impl Explanation {
    /// Generic placeholder used when generation fails for a question, so
    /// the results view never shows an unexplained answer.
    pub fn fallback(question_id: u32, correct_answer: &str) -> Self {
        Self {
            keywords: vec![Keyword {
                word: "evidence".into(),
                translation: "bằng chứng".into(),
                source_label: "question".into(),
            }],
            explanation_text: format!(
                "For Question {question_id} — the answer is {correct_answer}."
            ),
            key_sentence: "Key information from the passage supports this answer.".into(),
            reasoning_points: vec![
                "The passage provides clear evidence".into(),
                "The question matches the text".into(),
                "This is the most logical answer".into(),
            ],
        }
    }
}

/// Parse a generation reply into an [`Explanation`], tolerating markdown
/// code fences around the JSON. Replies that parse but carry no
/// explanation text are treated as malformed.
pub fn parse_explanation(raw: &str) -> anyhow::Result<Explanation> {
    let parsed: Explanation = serde_json::from_str(strip_code_fences(raw))?;
    anyhow::ensure!(
        !parsed.explanation_text.trim().is_empty(),
        "reply parsed but explanation text is empty"
    );
    Ok(parsed)
}

/// Build the generation prompt for one question.
pub fn build_prompt(request: &ExplainRequest) -> String {
    let verdict = if request.is_correct { "CORRECT" } else { "INCORRECT" };
    format!(
        r#"You are an IELTS expert. Analyze this question and provide a detailed explanation in the exact format requested.

PASSAGE EXCERPT: "{excerpt}"

QUESTION: "{question}"
CORRECT ANSWER: {correct}
USER ANSWER: {user}
RESULT: {verdict}

Please provide:
1. Keywords with {language} translations (identify 2-3 key words from the question and passage)
2. A detailed explanation of why the answer is {correct}, quoting the key sentence and listing the reasoning.

Format your response as JSON:
{{
  "keywords": [
    {{"word": "word1", "translation": "{language} translation", "source": "question/passage"}}
  ],
  "explanation": "For Question {id} explanation...",
  "keysentence": "exact quote from passage",
  "reasoning": ["Point 1", "Point 2", "Point 3"]
}}
"#,
        excerpt = request.passage_excerpt,
        question = request.question,
        correct = request.correct_answer,
        user = request.user_answer,
        verdict = verdict,
        language = request.target_language,
        id = request.question_id,
    )
}

/// Progress reporting for the pipeline.
pub trait Progress: Send + Sync {
    fn on_question_start(&self, question_id: u32);
    fn on_question_done(&self, question_id: u32, used_fallback: bool);
    fn on_complete(&self, total: usize, fallbacks: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopProgress;

impl Progress for NoopProgress {
    fn on_question_start(&self, _: u32) {}
    fn on_question_done(&self, _: u32, _: bool) {}
    fn on_complete(&self, _: usize, _: usize, _: Duration) {}
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Language for keyword translations.
    pub target_language: String,
    /// How much of the passage to quote in the prompt, in characters.
    pub passage_excerpt_chars: usize,
    /// Delay before the single retry of a retryable failure, when the
    /// provider gave no retry-after hint.
    pub retry_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_language: "Vietnamese".into(),
            passage_excerpt_chars: 1000,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// The outcome of one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct ExplanationBatch {
    /// Explanation per answered question id.
    pub explanations: HashMap<u32, Explanation>,
    /// Questions whose explanation is fallback content.
    pub fallbacks: Vec<u32>,
}

pub struct ExplanationPipeline {
    provider: Arc<dyn ExplanationProvider>,
    config: PipelineConfig,
}

impl ExplanationPipeline {
    pub fn new(provider: Arc<dyn ExplanationProvider>, config: PipelineConfig) -> Self {
        Self { provider, config }
    }

    /// Generate explanations for every answered question, in catalog
    /// order. Infallible by design: failures degrade to fallback entries.
    pub async fn generate(
        &self,
        catalog: &TestCatalog,
        answers: &AnswerSheet,
        progress: &dyn Progress,
    ) -> ExplanationBatch {
        let start = Instant::now();
        let mut batch = ExplanationBatch::default();

        for question in &catalog.questions {
            let user_answer = answers.get(question.id);
            if user_answer.is_empty() {
                continue;
            }

            progress.on_question_start(question.id);

            let excerpt = catalog
                .passage_for(question)
                .map(|p| p.content.chars().take(self.config.passage_excerpt_chars).collect())
                .unwrap_or_default();

            let request = ExplainRequest {
                question_id: question.id,
                question: question.prompt.clone(),
                passage_excerpt: excerpt,
                correct_answer: question.answer.clone(),
                user_answer: user_answer.to_owned(),
                is_correct: is_correct(user_answer, &question.answer),
                target_language: self.config.target_language.clone(),
            };

            let explanation = match self.explain_one(&request).await {
                Ok(explanation) => {
                    progress.on_question_done(question.id, false);
                    explanation
                }
                Err(e) => {
                    tracing::warn!(
                        question = question.id,
                        provider = self.provider.name(),
                        "explanation failed, using fallback: {e:#}"
                    );
                    progress.on_question_done(question.id, true);
                    batch.fallbacks.push(question.id);
                    Explanation::fallback(question.id, &question.answer)
                }
            };

            batch.explanations.insert(question.id, explanation);
        }

        progress.on_complete(batch.explanations.len(), batch.fallbacks.len(), start.elapsed());
        batch
    }

    /// One question: request, parse, and a single retry for transient
    /// provider errors. Permanent errors fail straight through to the
    /// fallback path.
    async fn explain_one(&self, request: &ExplainRequest) -> anyhow::Result<Explanation> {
        match self.provider.explain(request).await {
            Ok(response) => parse_explanation(&response.raw_text),
            Err(e) => {
                let retryable = match e.downcast_ref::<ProviderError>() {
                    Some(pe) => !pe.is_permanent(),
                    None => false,
                };
                if !retryable {
                    return Err(e);
                }
                let delay = e
                    .downcast_ref::<ProviderError>()
                    .and_then(ProviderError::retry_after_ms)
                    .map(Duration::from_millis)
                    .unwrap_or(self.config.retry_delay)
                    .min(Duration::from_secs(5));
                tracing::debug!(
                    question = request.question_id,
                    "retrying explanation in {delay:?} after: {e}"
                );
                tokio::time::sleep(delay).await;
                let response = self.provider.explain(request).await?;
                parse_explanation(&response.raw_text)
            }
        }
    }
}
