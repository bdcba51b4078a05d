//! Error types shared by the image and subtitle pipelines.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the image generation pipeline.
/// Every variant is terminal for the run; nothing is retried.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Environment variable {0} is not set.")]
    MissingApiKey(&'static str),

    #[error("Prompt must not be empty.")]
    EmptyPrompt,

    #[error("Input image not found: {}", .0.display())]
    InputImageNotFound(PathBuf),

    #[error("{0} is not installed or not in PATH.")]
    ClientMissing(String),

    #[error("{client} failed ({status}){}{}", section(.stderr), pretty_body(.body))]
    ClientFailed {
        client: &'static str,
        status: String,
        stderr: String,
        body: String,
    },

    #[error("Request timed out ({0}s)")]
    Timeout(u64),

    #[error("Malformed API response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    #[error("Failed to decode inline image data: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("No candidates in API response.\n{0}")]
    NoCandidates(String),

    #[error("No image was generated in the response.\n{0}")]
    NoImages(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the subtitle extraction pipeline.
#[derive(Debug, Error)]
pub enum SubtitleError {
    #[error("{0} is not installed or not in PATH.")]
    DownloaderMissing(String),

    #[error("Subtitle download timed out ({0}s)")]
    DownloadTimeout(u64),

    #[error("Downloader command is empty or cannot be parsed: {0}")]
    BadDownloaderCommand(String),

    #[error("Failed to download subtitles. The video might not have subtitles, or it requires login (e.g., Bilibili). Output from yt-dlp:\n{0}")]
    NoSubtitles(String),

    #[error("Failed to parse {format} file: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    #[error("Could not convert downloaded subtitle file: {}", .0.display())]
    Unconverted(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SubtitleError {
    /// Parse failure for `format`, keeping only the message of `err`.
    pub fn parse(format: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Parse {
            format,
            message: err.to_string(),
        }
    }
}

/// Put non-empty `text` on its own line after the message.
fn section(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        String::new()
    } else {
        format!("\n{text}")
    }
}

/// Pretty-print a JSON error body when it parses, otherwise echo it verbatim.
pub(crate) fn pretty_body(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => section(&serde_json::to_string_pretty(&value).unwrap_or_default()),
        Err(_) => section(body),
    }
}
