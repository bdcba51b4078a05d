//! Core library for the `gemini-image-gen` and `extract-subtitles` tools.
//!
//! [`image`] posts a prompt to the Gemini image API and saves what comes
//! back. [`subtitles`] fetches subtitle tracks with yt-dlp and flattens them
//! to plain text.

pub mod config;
pub mod error;
pub mod image;
pub mod logging;
pub mod subtitles;
