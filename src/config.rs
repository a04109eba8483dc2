//! Run configuration.
//!
//! Defaults are overridden by `GLR_*` environment variables, which the CLI
//! in turn overrides with flags. The service credential is deliberately not
//! part of [`Config`]; it is passed explicitly to the model client.

use std::time::Duration;

use crate::placeholder::PlaceholderStyle;
use crate::prompt::Strategy;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Environment variable holding the service credential.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Model identifier, e.g. `gemini-2.5-flash`.
    pub model: String,
    /// Base URL of the `generateContent` API.
    pub api_base: String,
    /// Upper bound on the model call.
    pub timeout: Duration,
    pub placeholder_style: PlaceholderStyle,
    pub strategy: Strategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            placeholder_style: PlaceholderStyle::default(),
            strategy: Strategy::default(),
        }
    }
}

impl Config {
    /// Defaults overridden by `GLR_MODEL`, `GLR_API_BASE`,
    /// `GLR_TIMEOUT_SECS`, `GLR_PLACEHOLDERS`, and `GLR_STRATEGY`.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an injectable variable source.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, String> {
        let mut config = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(model) = var("GLR_MODEL") {
            config.model = model.trim().to_string();
        }
        if let Some(base) = var("GLR_API_BASE") {
            config.api_base = base.trim().trim_end_matches('/').to_string();
        }
        if let Some(secs) = var("GLR_TIMEOUT_SECS") {
            config.timeout = parse_timeout(&secs).map_err(|e| format!("GLR_TIMEOUT_SECS: {e}"))?;
        }
        if let Some(style) = var("GLR_PLACEHOLDERS") {
            config.placeholder_style = style.parse().map_err(|e| format!("GLR_PLACEHOLDERS: {e}"))?;
        }
        if let Some(strategy) = var("GLR_STRATEGY") {
            config.strategy = strategy.parse().map_err(|e| format!("GLR_STRATEGY: {e}"))?;
        }

        Ok(config)
    }
}

/// Parse a positive whole number of seconds.
pub fn parse_timeout(s: &str) -> Result<Duration, String> {
    match s.trim().parse::<u64>() {
        Ok(0) => Err("timeout must be at least 1 second".into()),
        Ok(n) => Ok(Duration::from_secs(n)),
        Err(_) => Err(format!("invalid number of seconds: {s}")),
    }
}
