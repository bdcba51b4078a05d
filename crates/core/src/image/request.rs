//! Request assembly for the image generation API.
//! Builds the `generateContent` body from a prompt and an optional input image.

use crate::config::invalid_choice;
use crate::error::GenerateError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Aspect ratios accepted by the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AspectRatio {
    #[default]
    Square,
    Landscape,
    Portrait,
    Wide,
    Tall,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Landscape,
        AspectRatio::Portrait,
        AspectRatio::Wide,
        AspectRatio::Tall,
    ];

    /// The `W:H` spelling used on the command line and in the request body.
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape => "4:3",
            AspectRatio::Portrait => "3:4",
            AspectRatio::Wide => "16:9",
            AspectRatio::Tall => "9:16",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| invalid_choice("aspect ratio", s, Self::ALL.map(AspectRatio::as_str)))
    }
}

/// Output resolution tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageSize {
    #[serde(rename = "1K")]
    OneK,
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
}

impl ImageSize {
    pub const ALL: [ImageSize; 3] = [ImageSize::OneK, ImageSize::TwoK, ImageSize::FourK];

    /// The tier name the API expects.
    pub fn as_str(self) -> &'static str {
        match self {
            ImageSize::OneK => "1K",
            ImageSize::TwoK => "2K",
            ImageSize::FourK => "4K",
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| invalid_choice("image size", s, Self::ALL.map(ImageSize::as_str)))
    }
}

/// What the model is asked to return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ResponseModality {
    #[default]
    Image,
    Text,
}

impl FromStr for ResponseModality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Image" => Ok(ResponseModality::Image),
            "Text" => Ok(ResponseModality::Text),
            other => Err(invalid_choice("response modality", other, ["Image", "Text"])),
        }
    }
}

/// An image read from disk, ready to be sent inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputImage {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

/// Map an input file extension to a MIME type, defaulting to PNG.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "image/png",
    }
}

/// A fully validated generation request. Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub image_size: Option<ImageSize>,
    pub input_image: Option<InputImage>,
    pub modality: ResponseModality,
}

/// Collects request options and reads the input image on `build`.
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    prompt: String,
    aspect_ratio: AspectRatio,
    image_size: Option<ImageSize>,
    input_image: Option<PathBuf>,
    modality: ResponseModality,
}

impl RequestBuilder {
    /// Start a request for `prompt` with every other option at its default.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Set the aspect ratio. `1:1` is the default.
    pub fn aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = ratio;
        self
    }

    /// Set the resolution tier. `None` lets the API choose.
    pub fn image_size(mut self, size: Option<ImageSize>) -> Self {
        self.image_size = size;
        self
    }

    /// Attach an image from disk. It is read in `build`.
    pub fn input_image(mut self, path: Option<PathBuf>) -> Self {
        self.input_image = path;
        self
    }

    /// Choose whether the model answers with an image or text.
    pub fn modality(mut self, modality: ResponseModality) -> Self {
        self.modality = modality;
        self
    }

    /// Validate the options and read the input image, if any.
    /// This performs no network access.
    pub fn build(self) -> Result<GenerationRequest, GenerateError> {
        if self.prompt.trim().is_empty() {
            return Err(GenerateError::EmptyPrompt);
        }
        let input_image = match self.input_image {
            Some(path) => {
                if !path.is_file() {
                    return Err(GenerateError::InputImageNotFound(path));
                }
                let bytes = fs::read(&path)?;
                let mime_type = mime_for_path(&path);
                debug!("read input image {} ({} bytes, {mime_type})", path.display(), bytes.len());
                Some(InputImage { bytes, mime_type })
            }
            None => None,
        };
        Ok(GenerationRequest {
            prompt: self.prompt,
            aspect_ratio: self.aspect_ratio,
            image_size: self.image_size,
            input_image,
            modality: self.modality,
        })
    }
}

/// Wire shape of the `generateContent` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
    pub contents: Vec<RequestContent>,
    pub generation_config: GenerationConfig,
}

/// One content turn; the request always sends exactly one.
#[derive(Debug, Serialize)]
pub struct RequestContent {
    pub parts: Vec<RequestPart>,
}

/// A prompt part, either text or an inline image.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

/// Base64 image data with its MIME type.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// Requested modalities plus the optional image settings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<ResponseModality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
}

/// Only present when a non-square ratio or a size was asked for.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size: Option<ImageSize>,
}

impl GenerationRequest {
    /// Convert to the wire body. `1:1` is the API default and is left out.
    pub fn to_body(&self) -> RequestBody {
        let mut parts = vec![RequestPart::Text {
            text: self.prompt.clone(),
        }];
        if let Some(image) = &self.input_image {
            parts.push(RequestPart::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type.to_string(),
                    data: BASE64.encode(&image.bytes),
                },
            });
        }
        let aspect_ratio = (self.aspect_ratio != AspectRatio::Square).then(|| self.aspect_ratio.as_str());
        let image_config = (aspect_ratio.is_some() || self.image_size.is_some()).then_some(ImageConfig {
            aspect_ratio,
            image_size: self.image_size,
        });
        RequestBody {
            contents: vec![RequestContent { parts }],
            generation_config: GenerationConfig {
                response_modalities: vec![self.modality],
                image_config,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::tempdir;

    fn body(request: &GenerationRequest) -> Value {
        serde_json::to_value(request.to_body()).unwrap()
    }

    #[test]
    fn aspect_ratio_is_omitted_only_for_square() {
        let sizes = [None, Some(ImageSize::OneK), Some(ImageSize::TwoK), Some(ImageSize::FourK)];
        for ratio in AspectRatio::ALL {
            for size in sizes {
                let request = RequestBuilder::new("a cat")
                    .aspect_ratio(ratio)
                    .image_size(size)
                    .build()
                    .unwrap();
                let value = body(&request);
                let config = &value["generationConfig"]["imageConfig"];
                if ratio == AspectRatio::Square {
                    assert!(config.get("aspectRatio").is_none(), "{ratio} {size:?}");
                } else {
                    assert_eq!(config["aspectRatio"], json!(ratio.as_str()));
                }
                match size {
                    Some(size) => assert_eq!(config["imageSize"], json!(size.as_str())),
                    None => assert!(config.get("imageSize").is_none()),
                }
            }
        }
    }

    #[test]
    fn plain_prompt_has_no_image_config() {
        let request = RequestBuilder::new("a cat").build().unwrap();
        assert_eq!(
            body(&request),
            json!({
                "contents": [{"parts": [{"text": "a cat"}]}],
                "generationConfig": {"responseModalities": ["Image"]}
            })
        );
    }

    #[test]
    fn input_image_is_inlined_with_mime_type() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photo.JPG");
        fs::write(&path, b"\xff\xd8jpeg").unwrap();
        let request = RequestBuilder::new("add fireworks")
            .input_image(Some(path))
            .modality(ResponseModality::Text)
            .build()
            .unwrap();
        let value = body(&request);
        let parts = &value["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], json!("add fireworks"));
        assert_eq!(parts[1]["inlineData"]["mimeType"], json!("image/jpeg"));
        assert_eq!(parts[1]["inlineData"]["data"], json!(BASE64.encode(b"\xff\xd8jpeg")));
        assert_eq!(value["generationConfig"]["responseModalities"], json!(["Text"]));
    }

    #[test]
    fn unknown_extension_defaults_to_png() {
        assert_eq!(mime_for_path(Path::new("scan.tiff")), "image/png");
        assert_eq!(mime_for_path(Path::new("noext")), "image/png");
        assert_eq!(mime_for_path(Path::new("a.webp")), "image/webp");
    }

    #[test]
    fn missing_input_image_fails_before_anything_else() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.png");
        let err = RequestBuilder::new("x")
            .input_image(Some(missing.clone()))
            .build()
            .unwrap_err();
        assert!(matches!(err, GenerateError::InputImageNotFound(p) if p == missing));
    }

    #[test]
    fn empty_prompt_is_rejected() {
        let err = RequestBuilder::new("   ").build().unwrap_err();
        assert!(matches!(err, GenerateError::EmptyPrompt));
    }

    #[test]
    fn choices_parse_from_cli_spelling() {
        assert_eq!("16:9".parse::<AspectRatio>().unwrap(), AspectRatio::Wide);
        assert_eq!("4K".parse::<ImageSize>().unwrap(), ImageSize::FourK);
        assert_eq!("Text".parse::<ResponseModality>().unwrap(), ResponseModality::Text);
        assert!("5:4".parse::<AspectRatio>().is_err());
        assert!("8K".parse::<ImageSize>().is_err());
    }
}
