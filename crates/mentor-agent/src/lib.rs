//! `mentor-agent` — the LLM layer.
//!
//! Providers implement [`provider::LlmProvider`] (non-streaming completion);
//! [`llm::Llm`] wraps whichever provider is configured with a hard deadline
//! and a deterministic-fallback policy, so handlers never block on or fail
//! because of the model. The perfect-day planner lives here too: it is the
//! one consumer that parses model output back into structured rows.

pub mod anthropic;
pub mod llm;
pub mod openai;
pub mod planner;
pub mod provider;

pub use llm::Llm;
pub use provider::{CompletionRequest, LlmProvider, ProviderError};
