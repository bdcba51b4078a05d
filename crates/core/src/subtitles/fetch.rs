//! Subtitle download through an external `yt-dlp` style tool.

use crate::config::{DEFAULT_DOWNLOADER, DOWNLOADER_ENV, DOWNLOAD_TIMEOUT};
use crate::error::SubtitleError;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, trace};

/// Runs the downloader. The command may carry leading arguments, as in
/// `python3 -m yt_dlp`.
#[derive(Debug, Clone)]
pub struct Downloader {
    program: String,
    base_args: Vec<String>,
    timeout: Duration,
}

impl Default for Downloader {
    /// Plain `yt-dlp` with the default timeout.
    fn default() -> Self {
        Self {
            program: DEFAULT_DOWNLOADER.to_string(),
            base_args: Vec::new(),
            timeout: DOWNLOAD_TIMEOUT,
        }
    }
}

impl Downloader {
    /// Read the command from `YT_DLP_COMMAND`, falling back to `yt-dlp`.
    pub fn from_env() -> Result<Self, SubtitleError> {
        match std::env::var(DOWNLOADER_ENV) {
            Ok(cmd) if !cmd.trim().is_empty() => Self::from_command_line(&cmd),
            _ => Ok(Self::default()),
        }
    }

    /// Split a shell-style command line into program and leading arguments.
    pub fn from_command_line(cmd: &str) -> Result<Self, SubtitleError> {
        let mut words = shell_words::split(cmd)
            .map_err(|_| SubtitleError::BadDownloaderCommand(cmd.to_string()))?
            .into_iter();
        let program = words
            .next()
            .ok_or_else(|| SubtitleError::BadDownloaderCommand(cmd.to_string()))?;
        Ok(Self {
            program,
            base_args: words.collect(),
            timeout: DOWNLOAD_TIMEOUT,
        })
    }

    /// Kill the downloader if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The executable that will be spawned.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Build the downloader arguments: every manual and automatic track in
    /// the first available of vtt, srt, json, written to `dir`, no media.
    pub fn download_args(url: &str, dir: &Path) -> Vec<String> {
        let template = dir.join("%(id)s.%(ext)s");
        vec![
            "--write-auto-subs".to_string(),
            "--write-subs".to_string(),
            "--sub-format".to_string(),
            "vtt/srt/json/best".to_string(),
            "--extractor-args".to_string(),
            "youtube:player_client=default,ios".to_string(),
            "--skip-download".to_string(),
            "-o".to_string(),
            template.display().to_string(),
            url.to_string(),
        ]
    }

    /// Run the downloader for `url` into `dir` and return its stderr.
    /// The exit status is not checked; the caller looks for files instead.
    pub async fn fetch(&self, url: &str, dir: &Path) -> Result<String, SubtitleError> {
        trace!("fetch(url={url}, dir={}): invoking {}", dir.display(), self.program);
        let mut command = Command::new(&self.program);
        command
            .args(&self.base_args)
            .args(Self::download_args(url, dir))
            .stdin(Stdio::null())
            .kill_on_drop(true);
        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
                return Err(SubtitleError::DownloaderMissing(self.program.clone()))
            }
            Ok(Err(e)) => return Err(SubtitleError::Io(e)),
            Err(_) => return Err(SubtitleError::DownloadTimeout(self.timeout.as_secs())),
        };
        debug!("{} exited with {}", self.program, output.status);
        Ok(String::from_utf8_lossy(&output.stderr).to_string())
    }
}
