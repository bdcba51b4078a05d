//! WebVTT cue parsing.
//!
//! Auto-generated tracks repeat the previous caption line at the top of each
//! new cue and sprinkle karaoke timestamps and `<c>` spans through the text.
//! Tags are removed before lines reach the [`LineCollector`], so the rolling
//! repeats collapse into a single line.

use super::text::{decode_entities, LineCollector};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// One caption cue with its text lines.
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: Vec<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum VttError {
    #[error("missing WEBVTT header")]
    MissingHeader,
    #[error("bad timestamp '{0}'")]
    BadTime(String),
}

/// Cue span tags such as `<c.color>` or `<v Bob>`, plus `<00:00:01.000>` karaoke timestamps.
fn cue_tags() -> &'static Regex {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    TAGS.get_or_init(|| {
        Regex::new(r"</?(?:c|i|b|u|v|lang|ruby|rt)(?:[.\s][^>]*)?>|<\d{1,2}:\d{2}(?::\d{2})?\.\d{3}>")
            .expect("cue tag pattern")
    })
}

/// Remove inline cue markup and decode entities.
pub fn strip_tags(line: &str) -> String {
    decode_entities(&cue_tags().replace_all(line, "")).into_owned()
}

/// Parse a WebVTT document into cues. Header, `NOTE`, `STYLE` and `REGION`
/// blocks are skipped, as are blocks without a timing line.
pub fn parse(input: &str) -> Result<Vec<Cue>, VttError> {
    let input = input.trim_start_matches('\u{feff}');
    let mut lines = input.lines();
    match lines.next() {
        Some(first) if first.starts_with("WEBVTT") => {}
        _ => return Err(VttError::MissingHeader),
    }

    let mut cues = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    for line in lines.chain(std::iter::once("")) {
        if !line.trim().is_empty() {
            block.push(line);
            continue;
        }
        if let Some(cue) = parse_block(&block)? {
            cues.push(cue);
        }
        block.clear();
    }
    Ok(cues)
}

/// Parse one blank-line separated block. `None` for blocks that are not cues.
fn parse_block(block: &[&str]) -> Result<Option<Cue>, VttError> {
    let Some(first) = block.first() else {
        return Ok(None);
    };
    if ["NOTE", "STYLE", "REGION"].iter().any(|kw| first.starts_with(*kw)) {
        return Ok(None);
    }
    // An optional identifier line may precede the timing line.
    let Some(timing_at) = block.iter().take(2).position(|l| l.contains("-->")) else {
        return Ok(None);
    };
    let (start_ms, end_ms) = parse_timing(block[timing_at])?;
    let text = block[timing_at + 1..].iter().map(|l| l.to_string()).collect();
    Ok(Some(Cue {
        start_ms,
        end_ms,
        text,
    }))
}

/// Parse `start --> end`, ignoring cue settings after the end time.
fn parse_timing(line: &str) -> Result<(u64, u64), VttError> {
    let bad = || VttError::BadTime(line.trim().to_string());
    let (start, rest) = line.split_once("-->").ok_or_else(bad)?;
    let end = rest.split_whitespace().next().ok_or_else(bad)?;
    Ok((parse_time(start.trim())?, parse_time(end)?))
}

/// Parse `hh:mm:ss.ttt` or `mm:ss.ttt` into milliseconds.
fn parse_time(t: &str) -> Result<u64, VttError> {
    let bad = || VttError::BadTime(t.to_string());
    let (clock, millis) = t.split_once('.').ok_or_else(bad)?;
    let ms: u64 = millis.parse().map_err(|_| bad())?;
    let mut secs = 0u64;
    let fields: Vec<&str> = clock.split(':').collect();
    if !(2..=3).contains(&fields.len()) {
        return Err(bad());
    }
    for field in fields {
        let value = field.parse::<u64>().map_err(|_| bad())?;
        secs = secs
            .checked_mul(60)
            .and_then(|s| s.checked_add(value))
            .ok_or_else(bad)?;
    }
    secs.checked_mul(1000)
        .and_then(|s| s.checked_add(ms))
        .ok_or_else(bad)
}

/// Extract dialogue lines from a WebVTT document.
pub fn extract(input: &str) -> Result<Vec<String>, VttError> {
    let mut out = LineCollector::new();
    for cue in parse(input)? {
        for line in &cue.text {
            out.push(&strip_tags(line));
        }
    }
    Ok(out.into_lines())
}
