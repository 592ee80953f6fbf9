//! Collaborator trait definitions.
//!
//! These async traits are implemented by the `bandprep-providers` crate:
//! the text-generation service that produces answer explanations, the
//! identity service, and the profile/stats row store.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::ScoreResult;

// ---------------------------------------------------------------------------
// Explanation generation
// ---------------------------------------------------------------------------

/// A text-generation backend that explains one question at a time.
#[async_trait]
pub trait ExplanationProvider: Send + Sync {
    /// Human-readable provider name (e.g. "gemini").
    fn name(&self) -> &str;

    /// Generate the raw explanation text for one question. The reply is
    /// expected to be JSON (possibly wrapped in markdown fences); parsing
    /// and fallback handling happen in the pipeline, not here.
    async fn explain(&self, request: &ExplainRequest) -> anyhow::Result<ExplainResponse>;
}

/// Everything the generation service needs to explain one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainRequest {
    pub question_id: u32,
    /// The question text.
    pub question: String,
    /// Excerpt of the passage the question refers to (may be empty for
    /// listening questions).
    pub passage_excerpt: String,
    pub correct_answer: String,
    pub user_answer: String,
    pub is_correct: bool,
    /// Language for keyword translations (e.g. "Vietnamese").
    pub target_language: String,
}

/// Raw response from the generation service.
#[derive(Debug, Clone)]
pub struct ExplainResponse {
    /// The reply text, expected to parse as explanation JSON.
    pub raw_text: String,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

/// Strip markdown code fences from a generation reply.
///
/// Models frequently wrap JSON payloads in ```` ```json ... ``` ````
/// blocks even when asked not to. Returns the fenced body when exactly
/// such a wrapper is present, the trimmed input otherwise.
pub fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "JSON", ...) on the opening fence.
    match body.split_once('\n') {
        Some((first, tail)) if first.trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
            tail.trim()
        }
        _ => body.trim(),
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A signed-in identity as returned by the identity service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user_id: String,
    pub email: String,
    /// Display name, when the profile carries one.
    #[serde(default)]
    pub name: Option<String>,
    /// Bearer token for owner-scoped data access.
    pub access_token: String,
}

/// Auth state change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
}

/// Listener invoked on auth state changes. The session argument is the
/// new state: present after sign-in, absent after sign-out.
pub type AuthListener = Box<dyn Fn(AuthEvent, Option<&AuthSession>) + Send + Sync>;

/// Opaque handle returned by [`IdentityProvider::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// The external identity service (registration, login, session cache).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> anyhow::Result<AuthSession>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> anyhow::Result<AuthSession>;

    async fn sign_out(&self) -> anyhow::Result<()>;

    /// The current session, if any (served from the local cache).
    fn session(&self) -> Option<AuthSession>;

    /// Register a listener for sign-in/sign-out events.
    fn subscribe(&self, listener: AuthListener) -> SubscriptionId;

    /// Remove a previously registered listener. Unknown ids are a no-op,
    /// so teardown paths can unsubscribe unconditionally.
    fn unsubscribe(&self, id: SubscriptionId);
}

// ---------------------------------------------------------------------------
// Profile / stats rows
// ---------------------------------------------------------------------------

/// A `users` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A `user_stats` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    pub user_id: String,
    pub quizzes_taken: u32,
    /// Fraction of questions answered, averaged over tests, 0..=100.
    pub completion_rate: f64,
    /// Rolling mean accuracy percent over all tests taken.
    pub average_score: f64,
    pub last_quiz_date: Option<NaiveDate>,
}

impl UserStats {
    /// A fresh stats row for a newly registered user.
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            quizzes_taken: 0,
            completion_rate: 0.0,
            average_score: 0.0,
            last_quiz_date: None,
        }
    }

    /// Fold one finished test into the row: bump the count, fold the
    /// accuracy and completion into the running means, stamp the date.
    pub fn absorb(&mut self, score: &ScoreResult, completion_percent: f64, date: NaiveDate) {
        let n = f64::from(self.quizzes_taken);
        self.average_score = (self.average_score * n + score.accuracy_percent) / (n + 1.0);
        self.completion_rate = (self.completion_rate * n + completion_percent) / (n + 1.0);
        self.quizzes_taken += 1;
        self.last_quiz_date = Some(date);
    }
}

/// Row-based storage for user profiles and practice statistics. Access is
/// scoped to the authenticated owner by the backing service.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn fetch_user(&self, auth: &AuthSession) -> anyhow::Result<Option<User>>;

    async fn fetch_stats(&self, auth: &AuthSession) -> anyhow::Result<Option<UserStats>>;

    async fn insert_stats(&self, auth: &AuthSession, stats: &UserStats) -> anyhow::Result<()>;

    async fn update_stats(&self, auth: &AuthSession, stats: &UserStats) -> anyhow::Result<()>;
}
