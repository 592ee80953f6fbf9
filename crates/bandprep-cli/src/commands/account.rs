//! The `bandprep account` commands: register, login, logout, whoami.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;

use bandprep_core::traits::{IdentityProvider, ProfileStore};
use bandprep_providers::config::{default_identity_cache_path, load_config_from};
use bandprep_providers::identity::SupabaseIdentity;
use bandprep_providers::profile::SupabaseProfile;

#[derive(Subcommand)]
pub enum AccountAction {
    /// Create a new account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in with an existing account
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out and clear the cached identity
    Logout,
    /// Show the signed-in account and practice stats
    Whoami,
}

pub async fn execute(action: AccountAction, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let identity_config = config
        .identity
        .as_ref()
        .context("no [identity] section in the config; run `bandprep init` and fill it in")?;

    let cache = identity_config
        .cache_path
        .clone()
        .or_else(default_identity_cache_path);
    let identity =
        SupabaseIdentity::with_cache(&identity_config.base_url, &identity_config.anon_key, cache);

    match action {
        AccountAction::Register { name, email, password } => {
            let name = sanitize_name(&name);
            let email = sanitize_email(&email);

            let mut field_errors = Vec::new();
            if name.len() < 2 {
                field_errors.push(("name", "must be at least 2 characters".to_string()));
            }
            if !is_valid_email(&email) {
                field_errors.push(("email", "is not a valid email address".to_string()));
            }
            if let Err(message) = validate_password(&password) {
                field_errors.push(("password", message));
            }
            if !field_errors.is_empty() {
                for (field, message) in &field_errors {
                    eprintln!("  {field}: {message}");
                }
                anyhow::bail!("registration blocked: {} invalid field(s)", field_errors.len());
            }

            let session = identity
                .sign_up(&name, &email, &password)
                .await
                .context("could not create the account")?;
            println!(
                "Account created. Welcome, {}!",
                session.name.as_deref().unwrap_or(&session.email)
            );
        }
        AccountAction::Login { email, password } => {
            let email = sanitize_email(&email);
            if !is_valid_email(&email) {
                anyhow::bail!("email: is not a valid email address");
            }
            let session = identity
                .sign_in_with_password(&email, &password)
                .await
                .context("sign-in failed; check your email and password")?;
            println!(
                "Welcome back, {}!",
                session.name.as_deref().unwrap_or(&session.email)
            );
        }
        AccountAction::Logout => {
            identity.sign_out().await?;
            println!("Signed out.");
        }
        AccountAction::Whoami => match identity.session() {
            Some(session) => {
                println!(
                    "Signed in as {} <{}>",
                    session.name.as_deref().unwrap_or("(no name)"),
                    session.email
                );
                let store =
                    SupabaseProfile::new(&identity_config.base_url, &identity_config.anon_key);
                match store.fetch_stats(&session).await {
                    Ok(Some(stats)) => {
                        println!(
                            "Tests taken: {} | average score: {:.1}% | completion: {:.1}%{}",
                            stats.quizzes_taken,
                            stats.average_score,
                            stats.completion_rate,
                            stats
                                .last_quiz_date
                                .map(|d| format!(" | last test: {d}"))
                                .unwrap_or_default()
                        );
                    }
                    Ok(None) => println!("No practice tests recorded yet."),
                    Err(e) => tracing::warn!("could not fetch stats: {e:#}"),
                }
            }
            None => println!("Not signed in."),
        },
    }

    Ok(())
}

/// Trim and strip HTML-significant characters from a display name.
fn sanitize_name(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|c| *c != '<' && *c != '>')
        .take(255)
        .collect()
}

/// Lowercase, trim, and strip quote/HTML characters from an email.
fn sanitize_email(input: &str) -> String {
    input
        .to_lowercase()
        .trim()
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '\'' | '"'))
        .take(254)
        .collect()
}

/// Structural email check: one `@`, non-empty local part, dotted domain,
/// no whitespace.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
        && !domain.contains('@')
}

fn validate_password(password: &str) -> std::result::Result<(), String> {
    if password.len() < 6 {
        return Err("must be at least 6 characters".to_string());
    }
    if password.len() > 128 {
        return Err("must be fewer than 128 characters".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_sanitization() {
        assert_eq!(sanitize_name("  Lan  "), "Lan");
        assert_eq!(sanitize_name("<b>Lan</b>"), "bLan/b");
    }

    #[test]
    fn email_sanitization() {
        assert_eq!(sanitize_email("  Lan@Example.COM "), "lan@example.com");
        assert_eq!(sanitize_email("a\"b'c@x.co"), "abc@x.co");
    }

    #[test]
    fn email_structure() {
        assert!(is_valid_email("lan@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.co"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("lan@"));
        assert!(!is_valid_email("lan@nodot"));
        assert!(!is_valid_email("lan@.com"));
        assert!(!is_valid_email("two words@example.com"));
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("secret").is_ok());
        assert!(validate_password("12345").is_err());
        assert!(validate_password(&"x".repeat(129)).is_err());
        assert!(validate_password(&"x".repeat(128)).is_ok());
    }
}
