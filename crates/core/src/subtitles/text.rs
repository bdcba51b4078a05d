//! Line normalisation shared by every subtitle format.

use std::borrow::Cow;

/// Collects output lines, trimming them and dropping blanks and any line equal
/// to the one emitted just before it. Non-adjacent repeats are kept.
#[derive(Debug, Default)]
pub struct LineCollector {
    lines: Vec<String>,
}

impl LineCollector {
    /// Empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a line. Returns whether it was emitted.
    pub fn push(&mut self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() || self.lines.last().is_some_and(|last| last == line) {
            return false;
        }
        self.lines.push(line.to_string());
        true
    }

    /// Offer every line of a possibly multi-line block.
    pub fn push_block(&mut self, block: &str) {
        for line in block.lines() {
            self.push(line);
        }
    }

    /// The emitted lines, in order.
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

/// Decode the handful of character references that show up in caption files.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    // `&amp;` last so `&amp;lt;` stays `&lt;`.
    Cow::Owned(
        text.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&#39;", "'")
            .replace("&nbsp;", " ")
            .replace("&amp;", "&"),
    )
}
