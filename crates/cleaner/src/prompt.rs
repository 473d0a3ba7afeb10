//! Deterministic prompt construction for the completion service.

use serde::Serialize;

use stackscan_core::{CompletionRequest, FrameObservation};

/// Generation settings for the LLM backend.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub model: String,
    /// Kept low: the model is extracting structure, not writing prose, and
    /// repeated runs over the same input should produce the same output.
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.1,
            max_tokens: 500,
        }
    }
}

pub const SYSTEM_PROMPT: &str = "You are a specialized poker broadcast data extractor. \
You only output valid JSON arrays containing player data.";

/// Fragment shape embedded in the prompt. Mirrors the extractor's fields
/// minus the bounding box, which only adds noise for the model.
#[derive(Serialize)]
struct PromptFragment<'a> {
    text: &'a str,
    confidence: f64,
    x: f64,
    y: f64,
}

/// Build the request for one frame.
///
/// Pure function: the same observation and settings always yield the same
/// request, so reruns are reproducible end to end.
pub fn build_request(frame: &FrameObservation, settings: &LlmSettings) -> CompletionRequest {
    let fragments: Vec<PromptFragment<'_>> = frame
        .raw_text
        .iter()
        .map(|f| PromptFragment {
            text: f.text.trim(),
            confidence: f.confidence,
            x: f.x,
            y: f.y,
        })
        .collect();
    let ocr_data = serde_json::to_string_pretty(&fragments)
        .unwrap_or_else(|_| "[]".to_string());

    let user_prompt = format!(
        r#"You are analyzing OCR data from a poker broadcast screenshot. Your task is to extract player names and their chip counts.

Rules for identifying valid data:
1. Player names:
   - Usually in ALL CAPS
   - Can be 2 or more letters (e.g. "VU" is valid)
   - Common examples: "SMITH", "NEGREANU", "VU"
   - Ignore UI elements like "BLINDS", "ANTE", "BB", "SB"
   - Sometimes letters are lower case due to OCR; correct the name as you see fit

2. Chip counts:
   - Must be numbers with commas (e.g. "1,234,000")
   - Or abbreviated (e.g. "1.2M" = 1,200,000)
   - Must be close to their player name
   - Must be non-zero
   - Sometimes zeroes are read as "o"; adjust as you see fit

3. Layout:
   - Player names and their chip counts are typically vertically aligned
   - Names usually appear above their chip counts
   - Chip counts are usually within 80 pixels vertically of their name

OCR data (format: text, confidence, x-pos, y-pos):
{ocr_data}

Return ONLY a JSON array of valid players and their chip counts:
[
    {{"name": "PLAYER_NAME", "chips": CHIP_COUNT}},
    ...
]

If you can't confidently match a name with its chip count, exclude it entirely.
If there are any unmatched chip counts, return an empty array.
"#
    );

    CompletionRequest {
        model: settings.model.clone(),
        system_prompt: SYSTEM_PROMPT.to_string(),
        user_prompt,
        max_tokens: settings.max_tokens,
        temperature: settings.temperature,
    }
}
