//! Danmaku and generic XML caption text.

use super::text::{decode_entities, LineCollector};
use regex::Regex;
use std::sync::OnceLock;

/// Text of `<d p="...">` comment elements.
fn danmaku() -> &'static Regex {
    static DANMAKU: OnceLock<Regex> = OnceLock::new();
    DANMAKU.get_or_init(|| Regex::new(r#"(?s)<d p=".*?">(.*?)</d>"#).expect("danmaku pattern"))
}

/// Text between any opening and closing tag.
fn element_text() -> &'static Regex {
    static TEXT: OnceLock<Regex> = OnceLock::new();
    TEXT.get_or_init(|| Regex::new(r">([^<]+)</").expect("element text pattern"))
}

/// Extract comment text from `<d p="...">` elements, or, when there are none,
/// the text of every element. Purely numeric lines are dropped.
pub fn extract(input: &str) -> Vec<String> {
    let mut matches: Vec<&str> = danmaku()
        .captures_iter(input)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    if matches.is_empty() {
        matches = element_text()
            .captures_iter(input)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();
    }
    let mut out = LineCollector::new();
    for text in matches {
        let text = decode_entities(text.trim());
        if text.chars().all(char::is_numeric) {
            continue;
        }
        out.push(&text);
    }
    out.into_lines()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_comments_and_drops_numbers() {
        let input = r#"<d p="0,1">Hello</d><d p="1,1">42</d>"#;
        assert_eq!(extract(input), ["Hello"]);
    }

    #[test]
    fn drops_full_width_numbers_too() {
        let input = r#"<d p="0,1">２３３</d><d p="1,1">233</d><d p="2,1">草</d><d p="3,1">lol 233</d>"#;
        assert_eq!(extract(input), ["草", "lol 233"]);
    }

    #[test]
    fn danmaku_document() {
        let input = r#"<?xml version="1.0" encoding="UTF-8"?><i><chatserver>chat.bilibili.com</chatserver><chatid>123</chatid>
<d p="1.2,1,25,16777215,0,0,0,0">first &amp; best</d>
<d p="2.0,1,25,16777215,0,0,0,0">first &amp; best</d>
<d p="3.1,1,25,16777215,0,0,0,0">again</d></i>"#;
        assert_eq!(extract(input), ["first & best", "again"]);
    }

    #[test]
    fn falls_back_to_element_text() {
        let input = "<body><p begin=\"0\">one</p><p begin=\"1\">2024</p><p>two</p></body>";
        assert_eq!(extract(input), ["one", "two"]);
    }
}
