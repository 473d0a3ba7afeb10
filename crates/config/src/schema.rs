use serde::{Deserialize, Serialize};

/// Which cleaning backend the pipeline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanerBackend {
    /// Send frames to an LLM completion service.
    Llm,
    /// Offline heuristic pairing of names and chip counts.
    Rule,
}

/// Root configuration for a cleaning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cleaner: CleanerBackend,
    pub log_level: String,
    pub llm: LlmConfig,
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cleaner: CleanerBackend::Llm,
            log_level: "info".to_string(),
            llm: LlmConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// Completion service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model identifier sent to the service.
    pub model: String,
    /// Chat-completions base URL. The same wire protocol serves both
    /// OpenAI and DeepSeek; only the base URL and model differ.
    pub api_base: String,
    /// Credential, normally written as `${OPENAI_API_KEY}` in the file
    /// and resolved from the environment at load time.
    pub api_key: Option<String>,
    /// Kept low so repeated runs over the same input stay stable.
    pub temperature: f32,
    pub max_tokens: u32,
    /// Minimum spacing between consecutive request starts, to stay under
    /// the provider's request-rate ceiling.
    pub min_interval_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: None,
            temperature: 0.1,
            max_tokens: 500,
            min_interval_ms: 500,
        }
    }
}

/// Retry policy for transient service failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per frame, including the first.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub backoff_factor: f64,
    pub max_delay_ms: u64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            backoff_factor: 2.0,
            max_delay_ms: 30_000,
            jitter: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_llm_backend() {
        let config = Config::default();
        assert_eq!(config.cleaner, CleanerBackend::Llm);
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn backend_parses_from_snake_case() {
        let backend: CleanerBackend = serde_json::from_str("\"rule\"").unwrap();
        assert_eq!(backend, CleanerBackend::Rule);
    }
}
