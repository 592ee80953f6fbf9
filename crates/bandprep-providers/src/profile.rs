//! Profile and practice-statistics store.
//!
//! Row-based access to the `users` and `user_stats` tables behind a
//! PostgREST-style API. Every request carries the anon key plus the
//! caller's bearer token, so row-level security scopes reads and writes
//! to the authenticated owner.

use async_trait::async_trait;
use chrono::NaiveDate;

use bandprep_core::error::ProviderError;
use bandprep_core::scoring::ScoreResult;
use bandprep_core::traits::{AuthSession, ProfileStore, User, UserStats};

const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub struct SupabaseProfile {
    base_url: String,
    anon_key: String,
    client: reqwest::Client,
}

impl SupabaseProfile {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            client,
        }
    }

    fn check_status(status: u16, body: String) -> anyhow::Result<String> {
        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(body).into());
        }
        if status >= 400 {
            return Err(ProviderError::ApiError { status, message: body }.into());
        }
        Ok(body)
    }

    async fn get_rows<T: serde::de::DeserializeOwned>(
        &self,
        auth: &AuthSession,
        table: &str,
        filter: &str,
    ) -> anyhow::Result<Vec<T>> {
        let response = self
            .client
            .get(format!("{}/rest/v1/{table}", self.base_url))
            .query(&[(filter, format!("eq.{}", auth.user_id)), ("select", "*".into())])
            .header("apikey", &self.anon_key)
            .bearer_auth(&auth.access_token)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let status = response.status().as_u16();
        let body = Self::check_status(status, response.text().await.unwrap_or_default())?;
        let rows = serde_json::from_str(&body).map_err(|e| ProviderError::ApiError {
            status: 0,
            message: format!("failed to parse {table} rows: {e}"),
        })?;
        Ok(rows)
    }

    async fn write_row(
        &self,
        auth: &AuthSession,
        method: reqwest::Method,
        url: String,
        body: &impl serde::Serialize,
    ) -> anyhow::Result<()> {
        let response = self
            .client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header("Prefer", "return=minimal")
            .bearer_auth(&auth.access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let status = response.status().as_u16();
        Self::check_status(status, response.text().await.unwrap_or_default())?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for SupabaseProfile {
    async fn fetch_user(&self, auth: &AuthSession) -> anyhow::Result<Option<User>> {
        let rows: Vec<User> = self.get_rows(auth, "users", "id").await?;
        Ok(rows.into_iter().next())
    }

    async fn fetch_stats(&self, auth: &AuthSession) -> anyhow::Result<Option<UserStats>> {
        let rows: Vec<UserStats> = self.get_rows(auth, "user_stats", "user_id").await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_stats(&self, auth: &AuthSession, stats: &UserStats) -> anyhow::Result<()> {
        self.write_row(
            auth,
            reqwest::Method::POST,
            format!("{}/rest/v1/user_stats", self.base_url),
            stats,
        )
        .await
    }

    async fn update_stats(&self, auth: &AuthSession, stats: &UserStats) -> anyhow::Result<()> {
        self.write_row(
            auth,
            reqwest::Method::PATCH,
            format!(
                "{}/rest/v1/user_stats?user_id=eq.{}",
                self.base_url, auth.user_id
            ),
            stats,
        )
        .await
    }
}

/// Fold a finished test into the candidate's stats row: insert a fresh row
/// on their first test, update the running means otherwise. This is the
/// integration point the CLI calls after scoring; callers treat failures
/// as non-fatal.
pub async fn record_result(
    store: &dyn ProfileStore,
    auth: &AuthSession,
    score: &ScoreResult,
    completion_percent: f64,
    date: NaiveDate,
) -> anyhow::Result<UserStats> {
    let existing = store.fetch_stats(auth).await?;
    let is_new = existing.is_none();
    let mut stats = existing.unwrap_or_else(|| UserStats::empty(auth.user_id.clone()));
    stats.absorb(score, completion_percent, date);

    if is_new {
        store.insert_stats(auth, &stats).await?;
    } else {
        store.update_stats(auth, &stats).await?;
    }
    tracing::info!(
        user = %auth.user_id,
        tests = stats.quizzes_taken,
        average = stats.average_score,
        "recorded practice result"
    );
    Ok(stats)
}
