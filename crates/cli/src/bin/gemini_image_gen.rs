//! Binary entry point for Gemini image generation and editing.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use mediakit_core::config::{ApiConfig, ModelAlias};
use mediakit_core::image::invoke::{CurlTransport, GeminiClient, NativeTransport};
use mediakit_core::image::request::{AspectRatio, ImageSize, RequestBuilder, ResponseModality};
use mediakit_core::image::{generate, DEFAULT_OUTPUT};
use mediakit_core::logging;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::info;

/// How the request reaches the API.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum TransportKind {
    /// Run curl with the body in a scratch file.
    Curl,
    /// Send the request in-process.
    Native,
}

/// Generate or edit images using the Gemini API.
#[derive(Parser)]
#[command(
    after_help = "Examples:\n  gemini-image-gen --prompt \"A sunset over the ocean\" --aspect-ratio 16:9\n  gemini-image-gen --prompt \"A cyberpunk city\" --model pro --image-size 2K\n  gemini-image-gen --prompt \"Add fireworks in the sky\" --input-image photo.png\n  gemini-image-gen --prompt \"A cute cat\" -o /tmp/cat.png --ar 9:16"
)]
struct Cli {
    /// Text description of the image to generate.
    #[arg(long, short)]
    prompt: String,

    /// Output file path. Further images get `_1`, `_2`, ... suffixes.
    #[arg(long, short, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Aspect ratio of the output image: 1:1, 4:3, 3:4, 16:9 or 9:16.
    #[arg(long, short = 'a', visible_alias = "ar", default_value = "1:1")]
    aspect_ratio: AspectRatio,

    /// Model to use: flash, pro or 2.5-flash.
    #[arg(long, short, default_value = "flash")]
    model: ModelAlias,

    /// Image resolution (1K, 2K or 4K). Only for Gemini 3 models.
    #[arg(long, short = 's')]
    image_size: Option<ImageSize>,

    /// Path to an input image for editing mode.
    #[arg(long, short)]
    input_image: Option<PathBuf>,

    /// Response modality: Image or Text.
    #[arg(long, default_value = "Image")]
    response_modality: ResponseModality,

    /// How to reach the API.
    #[arg(long, value_enum, default_value_t = TransportKind::Curl)]
    transport: TransportKind,

    /// Enable verbose debug and trace logs.
    #[arg(long)]
    debug: bool,
}

/// Accept the two-letter `-ar` (and `-ar=16:9`) spelling, which clap would
/// otherwise read as `-a r`.
fn normalize_args<I: IntoIterator<Item = OsString>>(args: I) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some("-ar") => OsString::from("--ar"),
            Some(s) if s.starts_with("-ar=") => OsString::from(format!("--ar={}", &s[4..])),
            _ => arg,
        })
        .collect()
}

/// Application entry point. Every failure exits with status 1.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    logging::init(cli.debug);

    let config = ApiConfig::from_env()?;
    let request = RequestBuilder::new(cli.prompt)
        .aspect_ratio(cli.aspect_ratio)
        .image_size(cli.image_size)
        .input_image(cli.input_image.clone())
        .modality(cli.response_modality)
        .build()?;
    if let Some(path) = &cli.input_image {
        info!("  Input Image: {}", path.display());
    }

    let model_id = cli.model.model_id();
    let (report, result) = match cli.transport {
        TransportKind::Curl => {
            let client = GeminiClient::new(config, CurlTransport::new());
            generate(&client, model_id, &request, &cli.output).await?
        }
        TransportKind::Native => {
            let client = GeminiClient::new(config, NativeTransport::new()?);
            generate(&client, model_id, &request, &cli.output).await?
        }
    };

    for path in &report.images {
        println!("Image saved: {}", path.display());
    }
    if !report.text.is_empty() {
        println!("\nModel text response:\n{}", report.text);
    }
    report.require_images(&result)?;
    println!("\nDone! Generated {} image(s).", report.images.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(normalize_args(args.iter().map(OsString::from)))
    }

    #[test]
    fn two_letter_aspect_ratio_flag_is_accepted() {
        assert_eq!(parse(&["gen", "-p", "x", "-ar", "16:9"]).aspect_ratio, AspectRatio::Wide);
        assert_eq!(parse(&["gen", "-p", "x", "-ar=9:16"]).aspect_ratio, AspectRatio::Tall);
        assert_eq!(parse(&["gen", "-p", "x", "-a", "4:3"]).aspect_ratio, AspectRatio::Landscape);
        assert_eq!(parse(&["gen", "-p", "x"]).aspect_ratio, AspectRatio::Square);
    }
}
