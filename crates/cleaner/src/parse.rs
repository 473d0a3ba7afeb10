//! Extraction and validation of the structured payload inside a completion.
//!
//! Total: every input maps to a record. Anything that cannot be coerced
//! into at least one valid (name, chips) pair becomes a `parse_failed`
//! record instead of an error, so the failure stays visible in the output
//! data and the run keeps going.

use serde::Deserialize;
use tracing::debug;

use stackscan_core::{CleanedFrame, FrameStatus, PlayerStack};

/// Candidate pair as the model emits it; `chips` arrives either as a JSON
/// number or a formatted string like `"8,200"`.
#[derive(Deserialize)]
struct CandidatePair {
    name: String,
    chips: serde_json::Value,
}

/// Parse one completion into a cleaned record.
pub fn parse_completion(filepath: &str, completion: &str) -> CleanedFrame {
    let Some(payload) = extract_json_array(completion) else {
        debug!(filepath, "No JSON array found in completion");
        return CleanedFrame::failed(filepath, FrameStatus::ParseFailed);
    };

    let candidates: Vec<CandidatePair> = match serde_json::from_str(payload) {
        Ok(candidates) => candidates,
        Err(err) => {
            debug!(filepath, error = %err, "Completion payload did not decode");
            return CleanedFrame::failed(filepath, FrameStatus::ParseFailed);
        }
    };

    // One bad pair rejects the whole frame: a half-trusted frame is worse
    // downstream than an explicit failure.
    let mut players = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let name = candidate.name.trim();
        if name.is_empty() {
            debug!(filepath, "Rejecting frame: empty player name");
            return CleanedFrame::failed(filepath, FrameStatus::ParseFailed);
        }
        let Some(chips) = coerce_chips(&candidate.chips) else {
            debug!(filepath, chips = %candidate.chips, "Rejecting frame: invalid chip value");
            return CleanedFrame::failed(filepath, FrameStatus::ParseFailed);
        };
        // Duplicate names are preserved; deduplication is a downstream concern.
        players.push(PlayerStack { name: name.to_string(), chips });
    }

    if players.is_empty() {
        return CleanedFrame::failed(filepath, FrameStatus::ParseFailed);
    }
    CleanedFrame::ok(filepath, players)
}

/// Locate the outermost `[...]` span in free-form completion text. The
/// service sometimes wraps the payload in explanatory prose despite the
/// system prompt.
fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

/// Coerce a chip value to a non-negative integer.
///
/// Accepts JSON integers and numeric strings with thousands separators
/// (`"8,200"`). Ambiguous forms (fractions, abbreviations like `"1.2M"`,
/// negatives) are rejected rather than guessed at.
fn coerce_chips(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => {
            let digits: String = s
                .trim()
                .chars()
                .filter(|c| !matches!(c, ',' | ' '))
                .collect();
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            digits.parse().ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_payload_with_string_chips() {
        let record = parse_completion(
            "a.png",
            r#"[{"name":"Alice","chips":15000},{"name":"Bob","chips":"8,200"}]"#,
        );
        assert_eq!(record.status, FrameStatus::Ok);
        assert_eq!(
            record.players,
            vec![
                PlayerStack { name: "Alice".into(), chips: 15000 },
                PlayerStack { name: "Bob".into(), chips: 8200 },
            ]
        );
        assert_eq!(record.total_chips, 23200);
    }

    #[test]
    fn payload_wrapped_in_prose_is_located() {
        let completion = r#"Here is the extracted data:
[{"name": "VU", "chips": 50000}]
Let me know if you need anything else."#;
        let record = parse_completion("a.png", completion);
        assert_eq!(record.status, FrameStatus::Ok);
        assert_eq!(record.players[0].name, "VU");
    }

    #[test]
    fn free_form_text_without_payload_fails() {
        let record = parse_completion("a.png", "I could not find any players in this frame.");
        assert_eq!(record.status, FrameStatus::ParseFailed);
        assert!(record.players.is_empty());
    }

    #[test]
    fn negative_chips_reject_the_whole_record() {
        let record = parse_completion("a.png", r#"[{"name":"Carl","chips":-5}]"#);
        assert_eq!(record.status, FrameStatus::ParseFailed);
        assert!(record.players.is_empty());
    }

    #[test]
    fn one_bad_pair_rejects_valid_siblings() {
        let record = parse_completion(
            "a.png",
            r#"[{"name":"Alice","chips":1000},{"name":"  ","chips":2000}]"#,
        );
        assert_eq!(record.status, FrameStatus::ParseFailed);
    }

    #[test]
    fn empty_array_is_a_failure_not_an_empty_success() {
        let record = parse_completion("a.png", "[]");
        assert_eq!(record.status, FrameStatus::ParseFailed);
    }

    #[test]
    fn abbreviated_chip_strings_are_too_ambiguous() {
        let record = parse_completion("a.png", r#"[{"name":"Dana","chips":"1.2M"}]"#);
        assert_eq!(record.status, FrameStatus::ParseFailed);
    }

    #[test]
    fn duplicate_names_are_preserved() {
        let record = parse_completion(
            "a.png",
            r#"[{"name":"SMITH","chips":100},{"name":"SMITH","chips":200}]"#,
        );
        assert_eq!(record.status, FrameStatus::Ok);
        assert_eq!(record.players.len(), 2);
    }

    #[test]
    fn missing_fields_fail_cleanly() {
        let record = parse_completion("a.png", r#"[{"player":"Alice"}]"#);
        assert_eq!(record.status, FrameStatus::ParseFailed);
    }

    #[test]
    fn zero_chips_are_a_valid_non_negative_value() {
        let record = parse_completion("a.png", r#"[{"name":"Eve","chips":0}]"#);
        assert_eq!(record.status, FrameStatus::Ok);
        assert_eq!(record.players[0].chips, 0);
    }
}
