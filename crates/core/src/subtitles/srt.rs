//! SRT parsing into numbered blocks and plain-text extraction.

use super::text::LineCollector;
use thiserror::Error;
use tracing::debug;

/// Represents a single SRT block (index, time range, text lines).
#[derive(Debug, Clone, PartialEq)]
pub struct SrtBlock {
    pub index: u32,
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: Vec<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum SrtError {
    #[error("bad cue index '{0}'")]
    BadIndex(String),
    #[error("cue {0} has no timing line")]
    MissingTime(u32),
    #[error("bad timestamp '{0}'")]
    BadTime(String),
}

/// Parse SRT text into a list of blocks.
/// This function should read indices, times and text lines preserving order.
pub fn parse(input: &str) -> Result<Vec<SrtBlock>, SrtError> {
    let mut blocks = Vec::new();
    let mut lines = input.trim_start_matches('\u{feff}').lines();
    loop {
        let index_line = match lines.next() {
            Some(l) if !l.trim().is_empty() => l.trim(),
            Some(_) => continue,
            None => break,
        };
        let index: u32 = index_line
            .parse()
            .map_err(|_| SrtError::BadIndex(index_line.to_string()))?;
        let time_line = lines.next().ok_or(SrtError::MissingTime(index))?;
        let (start_ms, end_ms) = parse_times(time_line)?;
        let mut text = Vec::new();
        for line in lines.by_ref() {
            if line.trim().is_empty() {
                break;
            }
            text.push(line.to_string());
        }
        blocks.push(SrtBlock {
            index,
            start_ms,
            end_ms,
            text,
        });
    }
    Ok(blocks)
}

/// Parse a time range like `00:00:01,000 --> 00:00:02,000` to milliseconds.
/// Anything after the end time, such as position hints, is ignored.
fn parse_times(line: &str) -> Result<(u64, u64), SrtError> {
    let bad = || SrtError::BadTime(line.trim().to_string());
    let (start, rest) = line.split_once("-->").ok_or_else(bad)?;
    let end = rest.split_whitespace().next().ok_or_else(bad)?;
    Ok((parse_time(start.trim())?, parse_time(end)?))
}

/// Parse `HH:MM:SS,mmm` into milliseconds. A `.` before the milliseconds is accepted too.
fn parse_time(t: &str) -> Result<u64, SrtError> {
    let bad = || SrtError::BadTime(t.to_string());
    let parts: Vec<&str> = t.split([':', ',', '.']).collect();
    if parts.len() != 4 {
        return Err(bad());
    }
    let mut nums = [0u64; 4];
    for (slot, part) in nums.iter_mut().zip(&parts) {
        *slot = part.parse().map_err(|_| bad())?;
    }
    let [h, m, s, ms] = nums;
    h.checked_mul(60)
        .and_then(|v| v.checked_add(m))
        .and_then(|v| v.checked_mul(60))
        .and_then(|v| v.checked_add(s))
        .and_then(|v| v.checked_mul(1000))
        .and_then(|v| v.checked_add(ms))
        .ok_or_else(bad)
}

/// Extract dialogue lines. When the file does not parse as numbered blocks we
/// fall back to dropping index and timing lines and keeping everything else.
pub fn extract(input: &str) -> Vec<String> {
    let mut out = LineCollector::new();
    match parse(input) {
        Ok(blocks) => {
            for block in &blocks {
                for line in &block.text {
                    out.push(line);
                }
            }
        }
        Err(err) => {
            debug!("structured SRT parse failed ({err}), using line filter");
            for line in input.trim_start_matches('\u{feff}').lines() {
                let trimmed = line.trim();
                let is_index = !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit());
                if !is_index && !line.contains("-->") {
                    out.push(line);
                }
            }
        }
    }
    out.into_lines()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_blocks_with_timing() {
        let input = "1\n00:00:00,000 --> 00:00:01,500\nHello\nthere\n\n2\n01:02:03.004 --> 01:02:04,000 X1:10\nBye\n";
        let blocks = parse(input).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].end_ms, 1500);
        assert_eq!(blocks[0].text, vec!["Hello".to_string(), "there".to_string()]);
        assert_eq!(blocks[1].start_ms, 3_723_004);
    }

    #[test]
    fn extract_dedups_across_blocks() {
        let input = "1\n00:00:00,000 --> 00:00:01,000\nhello world\n\n2\n00:00:01,000 --> 00:00:02,000\nhello world\nhow are you\n\n3\n00:00:02,000 --> 00:00:03,000\nhello world\n";
        assert_eq!(extract(input), ["hello world", "how are you", "hello world"]);
    }

    #[test]
    fn malformed_file_uses_line_filter() {
        let input = "1\n00:00:00,000 --> 00:00:01,000\nfirst\n\nnot-an-index\n00:00:01,000 --> 00:00:02,000\nsecond\n";
        assert!(matches!(parse(input), Err(SrtError::BadIndex(_))));
        assert_eq!(extract(input), ["first", "not-an-index", "second"]);
    }

    #[test]
    fn oversized_hours_are_bad_times_not_overflow() {
        let input = "1\n99999999999999999:00:00,000 --> 00:00:01,000\nhi\n";
        assert_eq!(
            parse(input),
            Err(SrtError::BadTime("99999999999999999:00:00,000".into()))
        );
        assert_eq!(extract(input), ["hi"]);
    }

    #[test]
    fn bad_timestamp_is_reported() {
        let err = parse("1\n00:00 --> 00:01\nx\n").unwrap_err();
        assert_eq!(err, SrtError::BadTime("00:00".into()));
    }
}
