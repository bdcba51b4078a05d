//! Image generation pipeline: build a request, invoke the API, write the images.

pub mod invoke;
pub mod request;
pub mod response;

use crate::error::GenerateError;
use invoke::{GeminiClient, Transport};
use request::GenerationRequest;
use response::{write_outputs, GenerationResult, SaveReport};
use std::path::Path;
use tracing::info;

/// Default output path for the first image.
pub const DEFAULT_OUTPUT: &str = "./generated_image.png";

const PREVIEW_CHARS: usize = 80;

/// Shorten a prompt for log output.
pub fn preview_prompt(prompt: &str) -> String {
    let mut chars = prompt.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Run the whole pipeline and return what was written.
/// A reply without candidates fails here. A reply without images is left to
/// [`SaveReport::require_images`] so callers can show the text parts first.
pub async fn generate<T: Transport>(
    client: &GeminiClient<T>,
    model_id: &str,
    request: &GenerationRequest,
    output: &Path,
) -> Result<(SaveReport, GenerationResult), GenerateError> {
    info!("  Prompt: {}", preview_prompt(&request.prompt));
    info!("  Aspect Ratio: {}", request.aspect_ratio);
    if let Some(size) = request.image_size {
        info!("  Image Size: {size}");
    }
    let raw = client.generate(model_id, request).await?;
    let result = GenerationResult::from_response(raw)?;
    let report = write_outputs(&result, output)?;
    Ok((report, result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::image::invoke::NativeTransport;
    use crate::image::request::{ImageSize, RequestBuilder};
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn preview_truncates_long_prompts() {
        assert_eq!(preview_prompt("short"), "short");
        let long = "é".repeat(81);
        assert_eq!(preview_prompt(&long), format!("{}...", "é".repeat(80)));
        assert_eq!(preview_prompt(&"a".repeat(80)), "a".repeat(80));
    }

    #[tokio::test]
    async fn end_to_end_writes_every_image() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/models/gemini-3-pro-image-preview:generateContent")
                    .json_body_partial(r#"{"generationConfig": {"imageConfig": {"imageSize": "2K"}}}"#);
                then.status(200).json_body(json!({
                    "candidates": [{"content": {"parts": [
                        {"inlineData": {"mimeType": "image/png", "data": BASE64.encode(b"first")}},
                        {"inlineData": {"mimeType": "image/png", "data": BASE64.encode(b"second")}}
                    ]}}]
                }));
            })
            .await;
        let client = GeminiClient::new(
            ApiConfig {
                api_key: "k".into(),
                api_base: server.url("/models"),
            },
            NativeTransport::new().unwrap(),
        );
        let dir = tempdir().unwrap();
        let output = dir.path().join("art.png");
        let request = RequestBuilder::new("a city")
            .image_size(Some(ImageSize::TwoK))
            .build()
            .unwrap();
        let (report, result) = generate(&client, "gemini-3-pro-image-preview", &request, &output)
            .await
            .unwrap();
        assert_eq!(report.images.len(), 2);
        assert!(report.require_images(&result).is_ok());
        assert_eq!(fs::read(&output).unwrap(), b"first");
        assert_eq!(fs::read(dir.path().join("art_1.png")).unwrap(), b"second");
    }
}
