//! JSON caption formats: timed-text `events` objects and `content` lists.

use super::text::LineCollector;
use serde_json::Value;
use tracing::debug;

/// Extract lines from a JSON caption document.
///
/// An object with `events` yields one line per event, joining its
/// `segs[].utf8` pieces. A list yields the `content` of each object that has
/// one. Any other shape yields nothing.
pub fn extract(input: &str) -> Result<Vec<String>, String> {
    let data: Value = serde_json::from_str(input.trim_start_matches('\u{feff}')).map_err(|e| e.to_string())?;
    let mut out = LineCollector::new();
    match &data {
        Value::Object(map) if map.contains_key("events") => {
            let events = map["events"].as_array().map(Vec::as_slice).unwrap_or_default();
            for event in events {
                let Some(segs) = event.get("segs").and_then(Value::as_array) else {
                    continue;
                };
                let text: String = segs
                    .iter()
                    .filter_map(|seg| seg.get("utf8").and_then(Value::as_str))
                    .collect();
                out.push_block(&text);
            }
        }
        Value::Array(items) => {
            for item in items {
                match item.get("content") {
                    Some(Value::String(content)) => out.push_block(content),
                    Some(other) => return Err(format!("content is not a string: {other}")),
                    None => {}
                }
            }
        }
        _ => debug!("unrecognised JSON caption shape, producing no lines"),
    }
    Ok(out.into_lines())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_event_segments() {
        let input = r#"{"events":[{"segs":[{"utf8":"Hi "},{"utf8":"there"}]}]}"#;
        assert_eq!(extract(input).unwrap(), ["Hi there"]);
    }

    #[test]
    fn skips_events_without_segments_and_splits_newlines() {
        let input = r#"{"wireMagic":"pb3","events":[
            {"tStartMs":0,"id":1},
            {"tStartMs":10,"segs":[{"utf8":"one"},{"utf8":"\n"},{"utf8":"two"}]},
            {"tStartMs":20,"segs":[{"utf8":"\n"}]},
            {"tStartMs":30,"segs":[{"utf8":"two"}]}
        ]}"#;
        assert_eq!(extract(input).unwrap(), ["one", "two"]);
    }

    #[test]
    fn reads_content_lists() {
        let input = r#"[{"from":0,"content":"first"},{"note":"skip"},{"content":"second"}]"#;
        assert_eq!(extract(input).unwrap(), ["first", "second"]);
    }

    #[test]
    fn unknown_shapes_produce_nothing() {
        assert!(extract(r#"{"body":[]}"#).unwrap().is_empty());
        assert!(extract("42").unwrap().is_empty());
    }

    #[test]
    fn invalid_json_and_bad_content_are_errors() {
        assert!(extract("{not json").is_err());
        assert!(extract(r#"[{"content": 5}]"#).is_err());
    }
}
