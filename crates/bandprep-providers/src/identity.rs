//! Identity provider: registration, login, and session continuity.
//!
//! Talks to a Supabase-style auth REST API. The current session is held
//! in memory, mirrored to a small cache file so a returning user stays
//! signed in across program runs, and broadcast to subscribed listeners
//! on every sign-in/sign-out.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Deserialize;

use bandprep_core::error::ProviderError;
use bandprep_core::traits::{
    AuthEvent, AuthListener, AuthSession, IdentityProvider, SubscriptionId,
};

/// Namespaced key under which the identity blob is cached.
pub const IDENTITY_CACHE_KEY: &str = "bandprep/identity";

const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub struct SupabaseIdentity {
    base_url: String,
    anon_key: String,
    client: reqwest::Client,
    state: Mutex<Option<AuthSession>>,
    listeners: Mutex<HashMap<u64, AuthListener>>,
    next_subscription: AtomicU64,
    cache_path: Option<PathBuf>,
}

impl SupabaseIdentity {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self::with_cache(base_url, anon_key, None)
    }

    /// Like [`SupabaseIdentity::new`], reloading any cached identity from
    /// `cache_path` and mirroring future changes to it.
    pub fn with_cache(base_url: &str, anon_key: &str, cache_path: Option<PathBuf>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        let cached = cache_path.as_deref().and_then(load_cached_identity);

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            client,
            state: Mutex::new(cached),
            listeners: Mutex::new(HashMap::new()),
            next_subscription: AtomicU64::new(1),
            cache_path,
        }
    }

    fn notify(&self, event: AuthEvent, session: Option<&AuthSession>) {
        for listener in self.listeners.lock().unwrap().values() {
            listener(event, session);
        }
    }

    fn store_session(&self, session: AuthSession) {
        if let Some(path) = &self.cache_path {
            if let Err(e) = save_cached_identity(path, &session) {
                tracing::warn!("failed to cache identity: {e:#}");
            }
        }
        *self.state.lock().unwrap() = Some(session.clone());
        self.notify(AuthEvent::SignedIn, Some(&session));
    }

    async fn token_request(
        &self,
        url: String,
        body: serde_json::Value,
    ) -> anyhow::Result<AuthSession> {
        let response = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(DEFAULT_TIMEOUT_SECS)
                } else {
                    ProviderError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 400 || status == 401 || status == 422 {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<SupabaseError>(&text)
                .map(SupabaseError::into_message)
                .unwrap_or(text);
            return Err(ProviderError::AuthenticationFailed(message).into());
        }
        if status >= 400 {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError { status, message }.into());
        }

        let token: TokenResponse = response.json().await.map_err(|e| ProviderError::ApiError {
            status: 0,
            message: format!("failed to parse auth response: {e}"),
        })?;

        let name = token
            .user
            .user_metadata
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::to_owned);

        Ok(AuthSession {
            user_id: token.user.id,
            email: token.user.email,
            name,
            access_token: token.access_token,
        })
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: SupabaseUser,
}

#[derive(Deserialize)]
struct SupabaseUser {
    id: String,
    email: String,
    #[serde(default)]
    user_metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct SupabaseError {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl SupabaseError {
    fn into_message(self) -> String {
        self.msg
            .or(self.error_description)
            .unwrap_or_else(|| "authentication rejected".into())
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> anyhow::Result<AuthSession> {
        let session = self
            .token_request(
                format!("{}/auth/v1/signup", self.base_url),
                serde_json::json!({
                    "email": email,
                    "password": password,
                    "data": {"name": name},
                }),
            )
            .await?;
        tracing::info!(user = %session.user_id, "registered");
        self.store_session(session.clone());
        Ok(session)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> anyhow::Result<AuthSession> {
        let session = self
            .token_request(
                format!("{}/auth/v1/token?grant_type=password", self.base_url),
                serde_json::json!({"email": email, "password": password}),
            )
            .await?;
        tracing::info!(user = %session.user_id, "signed in");
        self.store_session(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> anyhow::Result<()> {
        let previous = self.state.lock().unwrap().take();

        if let Some(session) = &previous {
            // Best effort: revoke the token remotely, but a dead network
            // must not keep the user signed in locally.
            let result = self
                .client
                .post(format!("{}/auth/v1/logout", self.base_url))
                .header("apikey", &self.anon_key)
                .bearer_auth(&session.access_token)
                .send()
                .await;
            if let Err(e) = result {
                tracing::warn!("remote sign-out failed: {e}");
            }
        }

        if let Some(path) = &self.cache_path {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    tracing::warn!("failed to remove identity cache: {e}");
                }
            }
        }

        if previous.is_some() {
            self.notify(AuthEvent::SignedOut, None);
        }
        Ok(())
    }

    fn session(&self) -> Option<AuthSession> {
        self.state.lock().unwrap().clone()
    }

    fn subscribe(&self, listener: AuthListener) -> SubscriptionId {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().unwrap().insert(id, listener);
        SubscriptionId(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.lock().unwrap().remove(&id.0);
    }
}

/// Read the cached identity blob. A corrupt cache is deleted and ignored,
/// never fatal.
fn load_cached_identity(path: &std::path::Path) -> Option<AuthSession> {
    let content = std::fs::read_to_string(path).ok()?;
    let mut blob: HashMap<String, AuthSession> = match serde_json::from_str(&content) {
        Ok(blob) => blob,
        Err(e) => {
            tracing::warn!("discarding corrupt identity cache: {e}");
            let _ = std::fs::remove_file(path);
            return None;
        }
    };
    blob.remove(IDENTITY_CACHE_KEY)
}

fn save_cached_identity(path: &std::path::Path, session: &AuthSession) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let blob = HashMap::from([(IDENTITY_CACHE_KEY.to_string(), session.clone())]);
    std::fs::write(path, serde_json::to_string_pretty(&blob)?)?;
    Ok(())
}
