//! Subtitle pipeline: download tracks, pick the best file, write plain text.

pub mod fetch;
pub mod json;
pub mod srt;
pub mod text;
pub mod vtt;
pub mod xml;

use crate::error::SubtitleError;
use fetch::Downloader;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Subtitle formats we can turn into text, in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    Vtt,
    Srt,
    Json,
    Xml,
}

impl SubtitleFormat {
    pub const PREFERENCE: [SubtitleFormat; 4] = [
        SubtitleFormat::Vtt,
        SubtitleFormat::Srt,
        SubtitleFormat::Json,
        SubtitleFormat::Xml,
    ];

    /// File extension yt-dlp gives tracks of this format.
    pub fn extension(self) -> &'static str {
        match self {
            SubtitleFormat::Vtt => "vtt",
            SubtitleFormat::Srt => "srt",
            SubtitleFormat::Json => "json",
            SubtitleFormat::Xml => "xml",
        }
    }

    /// Format of `path` judged by its extension, if we handle it.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        Self::PREFERENCE.into_iter().find(|f| f.extension() == ext)
    }

    /// Name used in parse error messages.
    fn label(self) -> &'static str {
        match self {
            SubtitleFormat::Vtt => "VTT",
            SubtitleFormat::Srt => "SRT",
            SubtitleFormat::Json => "JSON",
            SubtitleFormat::Xml => "XML",
        }
    }

    /// Turn a whole document of this format into dialogue lines.
    pub fn extract(self, content: &str) -> Result<Vec<String>, SubtitleError> {
        match self {
            SubtitleFormat::Vtt => vtt::extract(content).map_err(|e| SubtitleError::parse(self.label(), e)),
            SubtitleFormat::Srt => Ok(srt::extract(content)),
            SubtitleFormat::Json => json::extract(content).map_err(|e| SubtitleError::parse(self.label(), e)),
            SubtitleFormat::Xml => Ok(xml::extract(content)),
        }
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A downloaded subtitle file and its detected format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleFile {
    pub path: PathBuf,
    pub format: SubtitleFormat,
}

impl SubtitleFile {
    /// Recognise a local file by extension.
    pub fn detect(path: impl Into<PathBuf>) -> Result<Self, SubtitleError> {
        let path = path.into();
        match SubtitleFormat::from_path(&path) {
            Some(format) => Ok(Self { path, format }),
            None => Err(SubtitleError::Unconverted(path)),
        }
    }
}

/// List subtitle files in `dir`: all vtt first, then srt, json and xml.
/// Files of one format are ordered by name.
pub fn candidates(dir: &Path) -> Result<Vec<SubtitleFile>, SubtitleError> {
    let mut found: Vec<SubtitleFile> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(format) = SubtitleFormat::from_path(&path) {
            found.push(SubtitleFile { path, format });
        }
    }
    found.sort_by_key(|f| {
        let rank = SubtitleFormat::PREFERENCE.iter().position(|p| *p == f.format);
        (rank, f.path.clone())
    });
    Ok(found)
}

/// Where the text for `file` is written: `<stem>_subtitles.txt` beside it.
pub fn output_path(file: &SubtitleFile) -> PathBuf {
    let stem = file.path.file_stem().unwrap_or_default().to_string_lossy();
    file.path.with_file_name(format!("{stem}_subtitles.txt"))
}

/// Convert `file` to plain text and return the path written.
pub fn convert(file: &SubtitleFile) -> Result<PathBuf, SubtitleError> {
    let bytes = fs::read(&file.path)?;
    let content = String::from_utf8_lossy(&bytes);
    let lines = file.format.extract(&content)?;
    let out = output_path(file);
    let mut text = lines.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    fs::write(&out, text)?;
    debug!("wrote {} line(s) to {}", lines.len(), out.display());
    Ok(out)
}

/// Download the subtitles of `url` into a fresh scratch directory and convert
/// the best one to text. The directory is kept since it holds the result and
/// the downloaded tracks; it is only removed when a failed run left it empty.
pub async fn extract_from_url(url: &str, downloader: &Downloader) -> Result<PathBuf, SubtitleError> {
    let scratch = tempfile::Builder::new().prefix("yt_sub_").tempdir()?.keep();
    info!("Fetching subtitles for URL: {url} ...");
    let result = match downloader.fetch(url, &scratch).await {
        Ok(stderr) => convert_first(&scratch, stderr),
        Err(err) => Err(err),
    };
    if result.is_err() && fs::remove_dir(&scratch).is_ok() {
        debug!("removed empty scratch directory {}", scratch.display());
    }
    result
}

/// Convert the preferred subtitle file in `dir`. `stderr` is the downloader
/// output reported when nothing was downloaded.
pub fn convert_first(dir: &Path, stderr: String) -> Result<PathBuf, SubtitleError> {
    let found = candidates(dir)?;
    let Some(first) = found.first() else {
        return Err(SubtitleError::NoSubtitles(stderr));
    };
    if found.len() > 1 {
        debug!("{} subtitle files downloaded, using {}", found.len(), first.path.display());
    }
    info!("converting {} ({})", first.path.display(), first.format);
    convert(first)
}
