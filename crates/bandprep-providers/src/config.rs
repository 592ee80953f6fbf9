//! Configuration loading and the provider factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use bandprep_core::traits::ExplanationProvider;

use crate::gemini::GeminiProvider;
use crate::mock::MockExplainer;

/// Configuration of the explanation-generation backend.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure
/// in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GenerationConfig {
    Gemini {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        model: Option<String>,
    },
    /// Canned offline explanations; no network access.
    Mock,
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationConfig::Gemini { api_key: _, base_url, model } => f
                .debug_struct("Gemini")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("model", model)
                .finish(),
            GenerationConfig::Mock => f.debug_struct("Mock").finish(),
        }
    }
}

/// Identity/profile collaborator endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub base_url: String,
    pub anon_key: String,
    /// Where the cached identity blob lives. Defaults next to the config.
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
}

/// Top-level bandprep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandprepConfig {
    /// Explanation backend.
    #[serde(default = "default_generation")]
    pub generation: GenerationConfig,
    /// Identity service; account commands need it, practice runs don't.
    #[serde(default)]
    pub identity: Option<IdentityConfig>,
    /// Language for explanation keyword translations.
    #[serde(default = "default_target_language")]
    pub target_language: String,
    /// Where test catalogs live.
    #[serde(default = "default_catalog_dir")]
    pub catalog_dir: PathBuf,
    /// Output directory for session reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Per-request timeout for generation calls.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_generation() -> GenerationConfig {
    GenerationConfig::Mock
}
fn default_target_language() -> String {
    "Vietnamese".to_string()
}
fn default_catalog_dir() -> PathBuf {
    PathBuf::from("./catalogs")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./bandprep-results")
}
fn default_request_timeout() -> u64 {
    10
}

impl Default for BandprepConfig {
    fn default() -> Self {
        Self {
            generation: default_generation(),
            identity: None,
            target_language: default_target_language(),
            catalog_dir: default_catalog_dir(),
            output_dir: default_output_dir(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `bandprep.toml` in the current directory
/// 2. `~/.config/bandprep/config.toml`
///
/// Environment variable overrides: `BANDPREP_GEMINI_KEY`,
/// `BANDPREP_SUPABASE_ANON_KEY`.
pub fn load_config() -> Result<BandprepConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<BandprepConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("bandprep.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<BandprepConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => BandprepConfig::default(),
    };

    // Apply env var overrides
    if let Ok(key) = std::env::var("BANDPREP_GEMINI_KEY") {
        match &mut config.generation {
            GenerationConfig::Gemini { api_key, .. } => *api_key = key,
            GenerationConfig::Mock => {
                config.generation = GenerationConfig::Gemini {
                    api_key: key,
                    base_url: None,
                    model: None,
                };
            }
        }
    }
    if let Ok(key) = std::env::var("BANDPREP_SUPABASE_ANON_KEY") {
        if let Some(identity) = &mut config.identity {
            identity.anon_key = key;
        }
    }

    // Resolve env vars in credentials and endpoints
    if let GenerationConfig::Gemini { api_key, base_url, .. } = &mut config.generation {
        *api_key = resolve_env_vars(api_key);
        if let Some(url) = base_url {
            *url = resolve_env_vars(url);
        }
    }
    if let Some(identity) = &mut config.identity {
        identity.anon_key = resolve_env_vars(&identity.anon_key);
        identity.base_url = resolve_env_vars(&identity.base_url);
    }

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("bandprep"))
}

/// Where the cached identity blob lives when the config does not say.
pub fn default_identity_cache_path() -> Option<PathBuf> {
    dirs_path().map(|dir| dir.join("identity.json"))
}

/// Create the explanation provider this configuration asks for.
pub fn create_explainer(config: &BandprepConfig) -> Arc<dyn ExplanationProvider> {
    match &config.generation {
        GenerationConfig::Gemini { api_key, base_url, model } => {
            Arc::new(GeminiProvider::with_timeout(
                api_key,
                base_url.clone(),
                model.clone(),
                config.request_timeout_secs,
            ))
        }
        GenerationConfig::Mock => Arc::new(MockExplainer::canned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_BANDPREP_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_BANDPREP_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_BANDPREP_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        std::env::remove_var("_BANDPREP_TEST_VAR");
    }

    #[test]
    fn default_config_is_offline() {
        let config = BandprepConfig::default();
        assert!(matches!(config.generation, GenerationConfig::Mock));
        assert!(config.identity.is_none());
        assert_eq!(config.target_language, "Vietnamese");
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
target_language = "Spanish"
catalog_dir = "./tests-data"

[generation]
type = "gemini"
api_key = "sk-test"
model = "gemini-2.0-flash"

[identity]
base_url = "https://project.supabase.co"
anon_key = "anon-key"
"#;
        let config: BandprepConfig = toml::from_str(toml_str).unwrap();
        assert!(matches!(config.generation, GenerationConfig::Gemini { .. }));
        assert_eq!(config.target_language, "Spanish");
        assert_eq!(
            config.identity.unwrap().base_url,
            "https://project.supabase.co"
        );
    }

    #[test]
    fn debug_masks_api_key() {
        let config = GenerationConfig::Gemini {
            api_key: "sk-very-secret".into(),
            base_url: None,
            model: None,
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn mock_factory_produces_mock() {
        let provider = create_explainer(&BandprepConfig::default());
        assert_eq!(provider.name(), "mock");
    }
}
