//! Process configuration sourced from the environment.
//!
//! The receiver needs two secrets at startup: an API token for outbound calls
//! to GitHub (handed to handlers, unused by the core pipeline) and the shared
//! webhook secret used for signature verification. Both are read exactly once
//! and the environment variables are cleared immediately afterwards so the
//! values cannot leak to child processes or environment introspection.
//!
//! Missing secrets are fatal: the process must refuse to start rather than
//! serve unverifiable deliveries.

use thiserror::Error;

/// Environment variable holding the GitHub API token.
pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";

/// Environment variable holding the webhook shared secret.
pub const WEBHOOK_SECRET_VAR: &str = "GITHUB_APP_SECRET_TOKEN";

/// Errors raised while loading configuration at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required secret was not present in the environment.
    #[error("required secret is not available via ${0}")]
    MissingSecret(&'static str),
}

/// Process-wide secrets, initialized once at startup and read-only thereafter.
///
/// The verifier borrows `webhook_secret` for the duration of one call; nothing
/// mutates these values after construction and they live for the process
/// lifetime (no in-process rotation).
#[derive(Clone)]
pub struct Secrets {
    /// API token for outbound GitHub calls.
    pub api_token: String,

    /// Shared secret for webhook signature verification.
    pub webhook_secret: String,
}

impl Secrets {
    /// Builds `Secrets` from explicit values. Intended for tests and embedders
    /// that manage their own secret storage.
    pub fn new(api_token: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Secrets {
            api_token: api_token.into(),
            webhook_secret: webhook_secret.into(),
        }
    }

    /// Reads both secrets from the environment, clearing each variable after
    /// a successful read.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingSecret` naming the first absent variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_token = take_env_var(GITHUB_TOKEN_VAR)?;
        let webhook_secret = take_env_var(WEBHOOK_SECRET_VAR)?;
        Ok(Secrets {
            api_token,
            webhook_secret,
        })
    }
}

// Secrets must not end up in debug output or logs.
impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("api_token", &"<redacted>")
            .field("webhook_secret", &"<redacted>")
            .finish()
    }
}

/// Reads an environment variable and removes it from the environment.
fn take_env_var(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) => {
            std::env::remove_var(name);
            Ok(value)
        }
        Err(_) => Err(ConfigError::MissingSecret(name)),
    }
}
