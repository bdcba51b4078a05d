//! Turning a `generateContent` reply into files on disk.

use crate::error::GenerateError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
struct Reply {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
    #[serde(rename = "inlineData", alias = "inline_data")]
    inline_data: Option<InlinePart>,
}

#[derive(Debug, Deserialize)]
struct InlinePart {
    #[serde(rename = "mimeType", alias = "mime_type")]
    mime_type: Option<String>,
    #[serde(default)]
    data: String,
}

/// One output of the model, in response order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    Text(String),
    Image { bytes: Vec<u8>, mime_type: String },
}

/// The decoded artifacts of the first candidate, plus the raw reply for diagnostics.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub artifacts: Vec<Artifact>,
    raw: Value,
}

impl GenerationResult {
    /// Decode the first candidate of `raw`. A reply without candidates is fatal.
    pub fn from_response(raw: Value) -> Result<Self, GenerateError> {
        let reply: Reply = serde_json::from_value(raw.clone())?;
        let Some(first) = reply.candidates.into_iter().next() else {
            return Err(GenerateError::NoCandidates(dump(&raw)));
        };
        let mut artifacts = Vec::new();
        for part in first.content.parts {
            if let Some(text) = part.text {
                artifacts.push(Artifact::Text(text));
            } else if let Some(inline) = part.inline_data {
                let bytes = BASE64.decode(inline.data.as_bytes())?;
                let mime_type = inline.mime_type.unwrap_or_else(|| "image/png".to_string());
                artifacts.push(Artifact::Image { bytes, mime_type });
            }
        }
        Ok(Self { artifacts, raw })
    }

    /// Pretty-printed raw reply.
    pub fn dump(&self) -> String {
        dump(&self.raw)
    }
}

/// Pretty JSON, or the compact form if pretty printing fails.
fn dump(raw: &Value) -> String {
    serde_json::to_string_pretty(raw).unwrap_or_else(|_| raw.to_string())
}

/// What `write_outputs` produced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SaveReport {
    /// Absolute paths of the written images, in response order.
    pub images: Vec<PathBuf>,
    /// Text parts joined in order.
    pub text: String,
}

/// File extension for an output MIME type, defaulting to `png`.
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "png",
    }
}

/// Path for the `index`-th image. The first image uses `requested` as is;
/// later ones get `_N` before the extension. The requested extension wins
/// over the one derived from `mime`.
pub fn output_path(requested: &Path, index: usize, mime: &str) -> PathBuf {
    if index == 0 {
        return requested.to_path_buf();
    }
    let stem = requested
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let ext = requested
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| extension_for_mime(mime).to_string());
    requested.with_file_name(format!("{stem}_{index}.{ext}"))
}

/// Write every image artifact of `result` next to `requested` and gather text.
/// Zero images is not an error here; see [`SaveReport::require_images`].
pub fn write_outputs(result: &GenerationResult, requested: &Path) -> Result<SaveReport, GenerateError> {
    let mut report = SaveReport::default();
    for artifact in &result.artifacts {
        match artifact {
            Artifact::Text(text) => report.text.push_str(text),
            Artifact::Image { bytes, mime_type } => {
                let path = output_path(requested, report.images.len(), mime_type);
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&path, bytes)?;
                let saved = fs::canonicalize(&path)?;
                debug!("saved {}", saved.display());
                report.images.push(saved);
            }
        }
    }
    debug!("wrote {} image(s), {} text byte(s)", report.images.len(), report.text.len());
    Ok(report)
}

impl SaveReport {
    /// Fail when the reply carried no image at all.
    pub fn require_images(&self, result: &GenerationResult) -> Result<(), GenerateError> {
        if self.images.is_empty() {
            return Err(GenerateError::NoImages(result.dump()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn reply(parts: Value) -> Value {
        json!({"candidates": [{"content": {"parts": parts}}]})
    }

    #[test]
    fn numbered_paths_keep_requested_extension() {
        let requested = Path::new("out/cat.png");
        assert_eq!(output_path(requested, 0, "image/jpeg"), PathBuf::from("out/cat.png"));
        assert_eq!(output_path(requested, 1, "image/jpeg"), PathBuf::from("out/cat_1.png"));
        assert_eq!(output_path(requested, 2, "image/jpeg"), PathBuf::from("out/cat_2.png"));
    }

    #[test]
    fn numbered_paths_fall_back_to_mime_extension() {
        let requested = Path::new("cat");
        assert_eq!(output_path(requested, 0, "image/jpeg"), PathBuf::from("cat"));
        assert_eq!(output_path(requested, 1, "image/jpeg"), PathBuf::from("cat_1.jpg"));
        assert_eq!(output_path(requested, 2, "image/bmp"), PathBuf::from("cat_2.png"));
    }

    #[test]
    fn writes_one_file_per_image_and_collects_text() {
        let dir = tempdir().unwrap();
        let requested = dir.path().join("nested/output.png");
        let raw = reply(json!([
            {"text": "Here "},
            {"inlineData": {"mimeType": "image/png", "data": BASE64.encode(b"one")}},
            {"text": "you go"},
            {"inlineData": {"mimeType": "image/jpeg", "data": BASE64.encode(b"two")}},
            {"inline_data": {"mime_type": "image/webp", "data": BASE64.encode(b"three")}}
        ]));
        let result = GenerationResult::from_response(raw).unwrap();
        let report = write_outputs(&result, &requested).unwrap();
        assert_eq!(report.text, "Here you go");
        let names: Vec<_> = report
            .images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, ["output.png", "output_1.png", "output_2.png"]);
        assert_eq!(fs::read(dir.path().join("nested/output_1.png")).unwrap(), b"two");
        assert!(report.require_images(&result).is_ok());
    }

    #[test]
    fn no_candidates_dumps_the_reply() {
        let err = GenerationResult::from_response(json!({"promptFeedback": {"blockReason": "SAFETY"}}))
            .unwrap_err();
        match err {
            GenerateError::NoCandidates(dump) => assert!(dump.contains("\"blockReason\": \"SAFETY\"")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn text_only_reply_writes_nothing_and_fails() {
        let dir = tempdir().unwrap();
        let requested = dir.path().join("output.png");
        let result = GenerationResult::from_response(reply(json!([{"text": "I cannot draw that"}]))).unwrap();
        let report = write_outputs(&result, &requested).unwrap();
        assert_eq!(report.text, "I cannot draw that");
        assert!(!requested.exists());
        let err = report.require_images(&result).unwrap_err();
        assert!(matches!(err, GenerateError::NoImages(dump) if dump.contains("I cannot draw that")));
    }

    #[test]
    fn missing_mime_type_defaults_to_png() {
        let result = GenerationResult::from_response(reply(json!([
            {"inlineData": {"data": BASE64.encode(b"x")}}
        ])))
        .unwrap();
        assert_eq!(
            result.artifacts,
            vec![Artifact::Image {
                bytes: b"x".to_vec(),
                mime_type: "image/png".into()
            }]
        );
    }

    #[test]
    fn invalid_base64_is_an_error() {
        let err = GenerationResult::from_response(reply(json!([
            {"inlineData": {"mimeType": "image/png", "data": "***"}}
        ])))
        .unwrap_err();
        assert!(matches!(err, GenerateError::Decode(_)));
    }
}
