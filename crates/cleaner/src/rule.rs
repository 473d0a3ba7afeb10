//! Offline heuristic cleaner: pairs name-like and chip-like OCR tokens by
//! proximity, no network involved. Kept alongside the LLM backend so the
//! two can be run over the same input and compared.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use stackscan_core::{
    CleanedFrame, FrameCleaner, FrameObservation, FrameStatus, OcrFragment, PlayerStack,
    ServiceError,
};

/// OCR tokens below this confidence are ignored outright.
const MIN_CONFIDENCE: f64 = 0.5;

/// Maximum horizontal distance between a name and its chip count, px.
const MAX_X_DISTANCE: f64 = 100.0;
/// Maximum vertical distance between a name and its chip count, px.
const MAX_Y_DISTANCE: f64 = 80.0;

/// Common broadcast UI elements that OCR picks up but are never players.
const UI_KEYWORDS: &[&str] = &[
    "blinds", "ante", "bb ante", "total pot", "main pot", "side pot",
    "dealer", "fold", "check", "call", "raise", "all in",
    "pokergo", "bb", "sb", "play",
];

/// Broadcast names are ALL CAPS, but OCR sometimes yields proper case.
static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z\s\-'.]{2,}$").unwrap());

/// Comma-grouped digits, e.g. "1,234,000".
static NUMBER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\d,]+$").unwrap());

/// Abbreviated stacks, e.g. "2M", "1.5K".
static ABBREV_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+(?:\.\d+)?)\s*([KMBkmb])$").unwrap());

struct NameToken {
    text: String,
    x: f64,
    y: f64,
}

struct ChipToken {
    chips: u64,
    x: f64,
    y: f64,
}

fn parse_chip_token(text: &str) -> Option<u64> {
    if let Some(caps) = ABBREV_PATTERN.captures(text) {
        let value: f64 = caps[1].parse().ok()?;
        let scale = match caps[2].to_ascii_uppercase().as_str() {
            "K" => 1_000.0,
            "M" => 1_000_000.0,
            "B" => 1_000_000_000.0,
            _ => return None,
        };
        return Some((value * scale) as u64);
    }
    if NUMBER_PATTERN.is_match(text) {
        let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
        return digits.parse().ok();
    }
    None
}

fn classify(fragments: &[OcrFragment]) -> (Vec<NameToken>, Vec<ChipToken>) {
    let mut names = Vec::new();
    let mut chips = Vec::new();

    for fragment in fragments {
        if fragment.confidence <= MIN_CONFIDENCE {
            continue;
        }
        let text = fragment.text.trim();
        if text.is_empty() || UI_KEYWORDS.contains(&text.to_lowercase().as_str()) {
            continue;
        }
        if let Some(value) = parse_chip_token(text) {
            chips.push(ChipToken { chips: value, x: fragment.x, y: fragment.y });
        } else if NAME_PATTERN.is_match(text) {
            names.push(NameToken { text: text.to_string(), x: fragment.x, y: fragment.y });
        }
    }
    (names, chips)
}

/// Pair each name with its closest chip count.
///
/// Names are processed left to right; vertical distance is weighted double
/// since names sit directly above their stacks in the broadcast layout.
/// Any chip count left unmatched means the pairing cannot be trusted, so
/// the whole frame is dropped.
fn extract_players(fragments: &[OcrFragment]) -> Vec<PlayerStack> {
    let (mut names, chips) = classify(fragments);
    names.sort_by(|a, b| a.x.total_cmp(&b.x));

    let mut used = vec![false; chips.len()];
    let mut players = Vec::new();

    for name in &names {
        let mut best: Option<(usize, f64)> = None;
        for (i, chip) in chips.iter().enumerate() {
            if used[i] {
                continue;
            }
            let x_distance = (chip.x - name.x).abs();
            let y_distance = (chip.y - name.y).abs();
            if x_distance > MAX_X_DISTANCE || y_distance > MAX_Y_DISTANCE {
                continue;
            }
            let score = x_distance + 2.0 * y_distance;
            if best.map_or(true, |(_, s)| score < s) {
                best = Some((i, score));
            }
        }
        if let Some((i, _)) = best {
            if chips[i].chips > 0 {
                players.push(PlayerStack { name: name.text.clone(), chips: chips[i].chips });
                used[i] = true;
            }
        }
    }

    // An unmatched chip count means some stack belongs to a name we failed
    // to read. The partial pairing cannot be trusted.
    if used.iter().filter(|u| **u).count() < chips.len() {
        return Vec::new();
    }
    players
}

/// Rule-based frame cleaner.
#[derive(Default)]
pub struct RuleCleaner;

impl RuleCleaner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FrameCleaner for RuleCleaner {
    fn name(&self) -> &str {
        "rule"
    }

    async fn clean(&self, frame: &FrameObservation) -> Result<CleanedFrame, ServiceError> {
        let players = extract_players(&frame.raw_text);
        if players.is_empty() {
            debug!(filepath = %frame.filepath, "No trustworthy pairs found");
            return Ok(CleanedFrame::failed(&frame.filepath, FrameStatus::ParseFailed));
        }
        Ok(CleanedFrame::ok(&frame.filepath, players))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(text: &str, confidence: f64, x: f64, y: f64) -> OcrFragment {
        OcrFragment { text: text.into(), confidence, x, y }
    }

    fn frame(fragments: Vec<OcrFragment>) -> FrameObservation {
        FrameObservation {
            filepath: "frames/a.png".into(),
            raw_text: fragments,
            success: true,
        }
    }

    #[tokio::test]
    async fn pairs_names_with_aligned_chip_counts() {
        let record = RuleCleaner::new()
            .clean(&frame(vec![
                fragment("NEGREANU", 0.95, 400.0, 600.0),
                fragment("1,234,000", 0.90, 405.0, 660.0),
                fragment("SMITH", 0.92, 800.0, 600.0),
                fragment("2M", 0.88, 795.0, 655.0),
            ]))
            .await
            .unwrap();

        assert_eq!(record.status, FrameStatus::Ok);
        assert_eq!(
            record.players,
            vec![
                PlayerStack { name: "NEGREANU".into(), chips: 1_234_000 },
                PlayerStack { name: "SMITH".into(), chips: 2_000_000 },
            ]
        );
        assert_eq!(record.total_chips, 3_234_000);
    }

    #[tokio::test]
    async fn abbreviated_counts_scale() {
        assert_eq!(parse_chip_token("1.5K"), Some(1_500));
        assert_eq!(parse_chip_token("2M"), Some(2_000_000));
        assert_eq!(parse_chip_token("1b"), Some(1_000_000_000));
        assert_eq!(parse_chip_token("850,000"), Some(850_000));
        assert_eq!(parse_chip_token("NEGREANU"), None);
    }

    #[tokio::test]
    async fn unmatched_chip_count_rejects_the_frame() {
        // Second stack has no name within range.
        let record = RuleCleaner::new()
            .clean(&frame(vec![
                fragment("SMITH", 0.95, 100.0, 100.0),
                fragment("50,000", 0.90, 102.0, 150.0),
                fragment("75,000", 0.90, 900.0, 150.0),
            ]))
            .await
            .unwrap();
        assert_eq!(record.status, FrameStatus::ParseFailed);
        assert!(record.players.is_empty());
    }

    #[tokio::test]
    async fn low_confidence_and_ui_tokens_are_ignored() {
        let record = RuleCleaner::new()
            .clean(&frame(vec![
                fragment("BLINDS", 0.99, 50.0, 50.0),
                fragment("HELLMUTH", 0.45, 400.0, 600.0), // below confidence floor
                fragment("1,000", 0.90, 405.0, 660.0),
            ]))
            .await
            .unwrap();
        // The chip count is left unmatched, so the frame is rejected.
        assert_eq!(record.status, FrameStatus::ParseFailed);
    }

    #[tokio::test]
    async fn empty_fragments_fail_without_a_network_call() {
        let record = RuleCleaner::new().clean(&frame(vec![])).await.unwrap();
        assert_eq!(record.status, FrameStatus::ParseFailed);
    }
}
