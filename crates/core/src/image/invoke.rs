//! Delivery of request bodies to the generation endpoint.
//!
//! [`GeminiClient`] owns the endpoint and key and hands the serialized body to
//! a [`Transport`]. The default [`CurlTransport`] shells out to `curl` with the
//! body in a scratch file; [`NativeTransport`] speaks HTTP through `reqwest`.

use crate::config::{ApiConfig, PROCESS_TIMEOUT, REQUEST_TIMEOUT};
use crate::error::GenerateError;
use crate::image::request::GenerationRequest;
use async_trait::async_trait;
use serde_json::Value;
use std::ffi::OsString;
use std::io::{ErrorKind, Write};
use std::process::Stdio;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info, trace};

/// Header carrying the API key, so it never shows up in a URL or argv.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Sends a JSON body to a URL and returns the raw response body.
/// Implementations report any non-success outcome as an error.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` to `url` with the key header and return the reply body.
    async fn post_json(&self, url: &str, api_key: &str, body: &[u8]) -> Result<String, GenerateError>;
}

/// Transport that runs `curl` as a child process.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    program: OsString,
    base_args: Vec<OsString>,
    request_timeout: Duration,
    process_timeout: Duration,
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self::with_command("curl", Vec::<OsString>::new())
    }
}

impl CurlTransport {
    /// Plain `curl` from `PATH` with the default timeouts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `program` with leading `base_args` in place of plain `curl`.
    pub fn with_command<I, S>(program: impl Into<OsString>, base_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            base_args: base_args.into_iter().map(Into::into).collect(),
            request_timeout: REQUEST_TIMEOUT,
            process_timeout: PROCESS_TIMEOUT,
        }
    }

    /// Override the request timeout given to curl and the process wait limit.
    pub fn with_timeouts(mut self, request: Duration, process: Duration) -> Self {
        self.request_timeout = request;
        self.process_timeout = process;
        self
    }

    /// Arguments passed to curl after `base_args`. The key header and the
    /// body are both read from files so neither shows up in argv.
    pub fn curl_args(&self, url: &str, header_path: &str, body_path: &str) -> Vec<String> {
        vec![
            "-s".to_string(),
            "-S".to_string(),
            "--fail-with-body".to_string(),
            "-X".to_string(),
            "POST".to_string(),
            url.to_string(),
            "-H".to_string(),
            "Content-Type: application/json".to_string(),
            "-H".to_string(),
            format!("@{header_path}"),
            "-d".to_string(),
            format!("@{body_path}"),
            "--max-time".to_string(),
            self.request_timeout.as_secs().to_string(),
        ]
    }
}

/// Write `contents` to a fresh temporary file that is deleted when dropped.
fn scratch_file(suffix: &str, contents: &[u8]) -> Result<NamedTempFile, GenerateError> {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile()?;
    file.write_all(contents)?;
    file.flush()?;
    Ok(file)
}

#[async_trait]
impl Transport for CurlTransport {
    async fn post_json(&self, url: &str, api_key: &str, body: &[u8]) -> Result<String, GenerateError> {
        // Both files are dropped on every return path, which removes them.
        let headers = scratch_file(".headers", format!("{API_KEY_HEADER}: {api_key}\n").as_bytes())?;
        let scratch = scratch_file(".json", body)?;
        let header_path = headers.path().to_string_lossy().to_string();
        let body_path = scratch.path().to_string_lossy().to_string();
        trace!("post_json(url={url}): request body in {body_path}");

        let mut command = Command::new(&self.program);
        command
            .args(&self.base_args)
            .args(self.curl_args(url, &header_path, &body_path))
            .stdin(Stdio::null())
            .kill_on_drop(true);
        let output = match tokio::time::timeout(self.process_timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
                return Err(GenerateError::ClientMissing(
                    self.program.to_string_lossy().to_string(),
                ))
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(GenerateError::Timeout(self.request_timeout.as_secs())),
        };
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if !output.status.success() {
            let status = match output.status.code() {
                Some(code) => format!("exit code {code}"),
                None => "terminated by signal".to_string(),
            };
            return Err(GenerateError::ClientFailed {
                client: "curl",
                status,
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                body: stdout,
            });
        }
        debug!("curl returned {} bytes", stdout.len());
        Ok(stdout)
    }
}

/// Transport that performs the request in-process.
#[derive(Debug, Clone)]
pub struct NativeTransport {
    client: reqwest::Client,
    request_timeout: Duration,
}

impl NativeTransport {
    /// reqwest client with the default request timeout.
    pub fn new() -> Result<Self, GenerateError> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    /// reqwest client that gives up after `request_timeout`.
    pub fn with_timeout(request_timeout: Duration) -> Result<Self, GenerateError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| http_failure("client setup", e))?;
        Ok(Self {
            client,
            request_timeout,
        })
    }
}

/// Wrap a reqwest error that happened before any HTTP status was seen.
fn http_failure(status: &str, err: reqwest::Error) -> GenerateError {
    GenerateError::ClientFailed {
        client: "http",
        status: status.to_string(),
        stderr: err.to_string(),
        body: String::new(),
    }
}

#[async_trait]
impl Transport for NativeTransport {
    async fn post_json(&self, url: &str, api_key: &str, body: &[u8]) -> Result<String, GenerateError> {
        trace!("post_json(url={url}): native request");
        let resp = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, api_key)
            .body(body.to_vec())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerateError::Timeout(self.request_timeout.as_secs())
                } else {
                    http_failure("request error", e)
                }
            })?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| http_failure("body read error", e))?;
        if !status.is_success() {
            return Err(GenerateError::ClientFailed {
                client: "http",
                status: format!("HTTP {}", status.as_u16()),
                stderr: String::new(),
                body: text,
            });
        }
        Ok(text)
    }
}

/// Invokes `generateContent` for a model through a transport.
pub struct GeminiClient<T> {
    config: ApiConfig,
    transport: T,
}

impl<T: Transport> GeminiClient<T> {
    /// Client for the endpoint in `config`, sending through `transport`.
    pub fn new(config: ApiConfig, transport: T) -> Self {
        Self { config, transport }
    }

    /// `generateContent` URL for `model_id`.
    pub fn endpoint(&self, model_id: &str) -> String {
        format!("{}/{}:generateContent", self.config.api_base, model_id)
    }

    /// Send `request` to `model_id` and parse the JSON reply.
    pub async fn generate(&self, model_id: &str, request: &GenerationRequest) -> Result<Value, GenerateError> {
        let body = serde_json::to_vec(&request.to_body())?;
        info!("Calling Gemini API ({model_id})...");
        let text = self
            .transport
            .post_json(&self.endpoint(model_id), &self.config.api_key, &body)
            .await?;
        Ok(serde_json::from_str(&text)?)
    }
}
