//! Mock explanation provider for testing and offline practice.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use bandprep_core::error::ProviderError;
use bandprep_core::traits::{ExplainRequest, ExplainResponse, ExplanationProvider};

/// What the mock serves for a given question.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// A specific raw reply body.
    Raw(String),
    /// Text that will not parse as explanation JSON.
    Garbage,
    /// A simulated transport failure.
    Fail,
}

/// A mock explanation provider: deterministic, offline, and inspectable.
///
/// Unscripted questions get a canned but well-formed explanation, which
/// also makes this the provider behind `--offline` practice runs.
pub struct MockExplainer {
    replies: HashMap<u32, MockReply>,
    call_count: AtomicU32,
    last_request: Mutex<Option<ExplainRequest>>,
}

impl MockExplainer {
    /// A mock that answers every question with canned valid JSON.
    pub fn canned() -> Self {
        Self::with_replies(HashMap::new())
    }

    /// A mock with per-question scripted replies.
    pub fn with_replies(replies: HashMap<u32, MockReply>) -> Self {
        Self {
            replies,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Number of calls made to this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// The last request received.
    pub fn last_request(&self) -> Option<ExplainRequest> {
        self.last_request.lock().unwrap().clone()
    }

    fn canned_json(request: &ExplainRequest) -> String {
        let verdict = if request.is_correct {
            "matches the key information"
        } else {
            "contradicts the key information"
        };
        serde_json::json!({
            "keywords": [
                {"word": "key", "translation": "chìa khóa", "source": "question"}
            ],
            "explanation": format!(
                "For Question {} — the answer is {} because the recording or passage states it directly; your answer {}.",
                request.question_id, request.correct_answer, verdict
            ),
            "keysentence": "The relevant sentence states the answer directly.",
            "reasoning": [
                "The key phrase appears near the answer",
                "Other options are not supported",
            ],
        })
        .to_string()
    }
}

#[async_trait]
impl ExplanationProvider for MockExplainer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn explain(&self, request: &ExplainRequest) -> anyhow::Result<ExplainResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap() = Some(request.clone());

        let raw_text = match self.replies.get(&request.question_id) {
            Some(MockReply::Raw(text)) => text.clone(),
            Some(MockReply::Garbage) => "Sorry, I can only answer in prose.".to_string(),
            Some(MockReply::Fail) => {
                return Err(ProviderError::NetworkError("mock failure".into()).into())
            }
            None => Self::canned_json(request),
        };

        Ok(ExplainResponse { raw_text, latency_ms: 1 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bandprep_core::explain::parse_explanation;

    fn request(question_id: u32) -> ExplainRequest {
        ExplainRequest {
            question_id,
            question: "q".into(),
            passage_excerpt: String::new(),
            correct_answer: "round".into(),
            user_answer: "round".into(),
            is_correct: true,
            target_language: "Vietnamese".into(),
        }
    }

    #[tokio::test]
    async fn canned_reply_parses_as_explanation() {
        let mock = MockExplainer::canned();
        let response = mock.explain(&request(3)).await.unwrap();
        let explanation = parse_explanation(&response.raw_text).unwrap();
        assert!(explanation.explanation_text.contains("Question 3"));
        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.last_request().unwrap().question_id, 3);
    }

    #[tokio::test]
    async fn scripted_replies_are_served() {
        let mut replies = HashMap::new();
        replies.insert(1, MockReply::Garbage);
        replies.insert(2, MockReply::Fail);
        let mock = MockExplainer::with_replies(replies);

        let garbage = mock.explain(&request(1)).await.unwrap();
        assert!(parse_explanation(&garbage.raw_text).is_err());

        assert!(mock.explain(&request(2)).await.is_err());
        assert_eq!(mock.call_count(), 2);
    }
}
