//! Frame cleaning backends.
//!
//! The LLM backend builds a deterministic prompt per frame, sends it
//! through a rate-limited retrying completion client, and validates the
//! structured reply. The rule backend pairs tokens heuristically with no
//! network dependency. Both implement [`stackscan_core::FrameCleaner`].

pub mod client;
pub mod parse;
pub mod prompt;
pub mod providers;
pub mod retry;

mod llm;
mod rule;

pub use client::CompletionClient;
pub use llm::LlmCleaner;
pub use prompt::LlmSettings;
pub use retry::RetryPolicy;
pub use rule::RuleCleaner;
