//! Logging setup shared by the binaries.

use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

const WORKSPACE_TARGETS: [&str; 3] = ["mediakit_core", "gemini_image_gen", "extract_subtitles"];

/// Install the global `tracing` subscriber.
/// `RUST_LOG` wins when set; otherwise `debug` raises our crates to trace.
/// Logs go to stderr so stdout stays free for the lines callers parse.
pub fn init(debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(debug));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Filter used when `RUST_LOG` is unset.
fn default_filter(debug: bool) -> EnvFilter {
    let (ours, rest) = if debug { ("trace", "info") } else { ("info", "warn") };
    let directives = std::iter::once(rest.to_string())
        .chain(WORKSPACE_TARGETS.iter().map(|t| format!("{t}={ours}")));
    directives.fold(EnvFilter::default(), |filter, d| match d.parse::<Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    })
}
