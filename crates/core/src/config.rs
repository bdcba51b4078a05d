//! Process-scoped configuration read from the environment.

use crate::error::GenerateError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_ANTIGRAVITY_KEY";
/// Optional override for the Gemini models endpoint.
pub const API_BASE_ENV: &str = "GEMINI_API_BASE";
/// Default Gemini models endpoint.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Hard limit handed to the HTTP client for the whole request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);
/// How long we wait for the client process before killing it.
pub const PROCESS_TIMEOUT: Duration = Duration::from_secs(200);

/// Environment variable naming the subtitle downloader command.
pub const DOWNLOADER_ENV: &str = "YT_DLP_COMMAND";
/// Downloader used when `YT_DLP_COMMAND` is unset.
pub const DEFAULT_DOWNLOADER: &str = "yt-dlp";
/// How long the downloader may run before it is killed.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Credentials and endpoint for the generation API.
#[derive(Clone)]
pub struct ApiConfig {
    pub api_key: String,
    pub api_base: String,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl ApiConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, GenerateError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GenerateError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let api_key = non_empty(API_KEY_ENV).ok_or(GenerateError::MissingApiKey(API_KEY_ENV))?;
        let api_base = non_empty(API_BASE_ENV)
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Ok(Self { api_key, api_base })
    }
}

/// Short model names accepted on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModelAlias {
    #[default]
    Flash,
    Pro,
    Flash25,
}

impl ModelAlias {
    pub const ALL: [ModelAlias; 3] = [ModelAlias::Flash, ModelAlias::Pro, ModelAlias::Flash25];

    /// The alias as typed on the command line.
    pub fn name(self) -> &'static str {
        match self {
            ModelAlias::Flash => "flash",
            ModelAlias::Pro => "pro",
            ModelAlias::Flash25 => "2.5-flash",
        }
    }

    /// Concrete model identifier sent to the API.
    pub fn model_id(self) -> &'static str {
        match self {
            ModelAlias::Flash => "gemini-3.1-flash-image-preview",
            ModelAlias::Pro => "gemini-3-pro-image-preview",
            ModelAlias::Flash25 => "gemini-2.5-flash-image",
        }
    }
}

impl fmt::Display for ModelAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelAlias {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| invalid_choice("model", s, Self::ALL.map(|m| m.name())))
    }
}

/// Error text used by every choice-style `FromStr` impl in the crate.
pub(crate) fn invalid_choice<const N: usize>(what: &str, got: &str, names: [&str; N]) -> String {
    format!("invalid {what} '{got}', choose from: {}", names.join(", "))
}
