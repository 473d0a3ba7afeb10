use std::fmt;

use serde::{Deserialize, Serialize};

/// One recognized text span from the upstream OCR extractor, with its
/// position on the frame (center of the bounding box).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrFragment {
    pub text: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// One raw frame observation as read from the input JSONL file.
///
/// Produced entirely by the OCR pipeline; immutable once read. Extra keys
/// emitted by the extractor (e.g. `bbox`) are ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameObservation {
    pub filepath: String,
    #[serde(default)]
    pub raw_text: Vec<OcrFragment>,
    #[serde(default = "default_true")]
    pub success: bool,
}

fn default_true() -> bool {
    true
}

/// One (player, stack) pair extracted from a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStack {
    pub name: String,
    pub chips: u64,
}

/// Terminal outcome of cleaning one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameStatus {
    /// At least one valid (name, chips) pair was extracted.
    Ok,
    /// The completion (or heuristic pass) yielded no usable player data.
    ParseFailed,
    /// The completion service failed after retries were exhausted.
    ServiceFailed,
}

impl fmt::Display for FrameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameStatus::Ok => write!(f, "ok"),
            FrameStatus::ParseFailed => write!(f, "parse_failed"),
            FrameStatus::ServiceFailed => write!(f, "service_failed"),
        }
    }
}

/// One cleaned frame record as written to the output JSONL file.
///
/// Invariant: `status == Ok` implies a non-empty player list and
/// `total_chips == sum(players.chips)`; any failed status implies an empty
/// player list. Records are append-only and never mutated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanedFrame {
    pub filepath: String,
    pub status: FrameStatus,
    pub players: Vec<PlayerStack>,
    pub total_chips: u64,
}

impl CleanedFrame {
    /// Build a success record from a non-empty set of validated pairs.
    pub fn ok(filepath: impl Into<String>, players: Vec<PlayerStack>) -> Self {
        let total_chips = players.iter().map(|p| p.chips).sum();
        Self {
            filepath: filepath.into(),
            status: FrameStatus::Ok,
            players,
            total_chips,
        }
    }

    /// Build a failure marker carrying no player data.
    pub fn failed(filepath: impl Into<String>, status: FrameStatus) -> Self {
        Self {
            filepath: filepath.into(),
            status,
            players: Vec::new(),
            total_chips: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_record_sums_total_chips() {
        let frame = CleanedFrame::ok(
            "f.png",
            vec![
                PlayerStack { name: "SMITH".into(), chips: 100 },
                PlayerStack { name: "VU".into(), chips: 250 },
            ],
        );
        assert_eq!(frame.status, FrameStatus::Ok);
        assert_eq!(frame.total_chips, 350);
    }

    #[test]
    fn failed_record_carries_no_players() {
        let frame = CleanedFrame::failed("f.png", FrameStatus::ServiceFailed);
        assert!(frame.players.is_empty());
        assert_eq!(frame.total_chips, 0);
    }

    #[test]
    fn observation_tolerates_extra_keys_and_defaults() {
        let raw = r#"{"filepath":"frames/a.png",
            "raw_text":[{"text":"NEGREANU","confidence":0.97,"x":412.0,"y":655.5,
                         "bbox":[[0,0],[1,0],[1,1],[0,1]]}]}"#;
        let obs: FrameObservation = serde_json::from_str(raw).unwrap();
        assert!(obs.success);
        assert_eq!(obs.raw_text[0].text, "NEGREANU");
    }

    #[test]
    fn status_roundtrips_as_snake_case() {
        let json = serde_json::to_string(&FrameStatus::ParseFailed).unwrap();
        assert_eq!(json, "\"parse_failed\"");
        let back: FrameStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, FrameStatus::ParseFailed);
    }
}
