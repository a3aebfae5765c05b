//! Deadline-and-fallback wrapper around whichever provider is configured.
//!
//! Scheduler handlers only ever talk to [`Llm`]: every call carries a hard
//! deadline, and the `*_or` variants turn any provider failure into a
//! deterministic fallback so a dead or slow model can never stall a tick or
//! suppress a reminder.

use std::time::Duration;

use tracing::warn;

use mentor_core::config::LLM_TIMEOUT_SECS;

use crate::provider::{CompletionRequest, LlmProvider, ProviderError};

/// Minimum plausible length for a usable model response; anything shorter is
/// treated as a quality failure.
const MIN_RESPONSE_LEN: usize = 20;

pub struct Llm {
    provider: Box<dyn LlmProvider>,
    model: String,
    deadline: Duration,
}

impl Llm {
    pub fn new(provider: Box<dyn LlmProvider>, model: String) -> Self {
        Self {
            provider,
            model,
            deadline: Duration::from_secs(LLM_TIMEOUT_SECS),
        }
    }

    /// Override the deadline — tests use short ones.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// One completion with the deadline applied.
    pub async fn complete(
        &self,
        system: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, ProviderError> {
        let req = CompletionRequest {
            model: self.model.clone(),
            system: system.to_string(),
            prompt: prompt.to_string(),
            max_tokens,
        };
        match tokio::time::timeout(self.deadline, self.provider.complete(&req)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::DeadlineElapsed {
                secs: self.deadline.as_secs(),
            }),
        }
    }

    /// Completion with the fallback policy: timeout, rate limit, or any other
    /// provider failure yields `fallback` instead of an error.
    pub async fn complete_or(
        &self,
        system: &str,
        prompt: &str,
        max_tokens: u32,
        fallback: &str,
    ) -> String {
        match self.complete(system, prompt, max_tokens).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!(provider = %self.provider.name(), "empty LLM response — using fallback");
                fallback.to_string()
            }
            Err(e) => {
                warn!(provider = %self.provider.name(), error = %e, "LLM unavailable — using fallback");
                fallback.to_string()
            }
        }
    }

    /// Scored completion: the response must carry every `marker` and clear
    /// the minimum length, otherwise `fallback` is used.
    pub async fn complete_scored(
        &self,
        system: &str,
        prompt: &str,
        max_tokens: u32,
        markers: &[&str],
        fallback: &str,
    ) -> String {
        let text = self.complete_or(system, prompt, max_tokens, fallback).await;
        if meets_quality(&text, markers) {
            text
        } else {
            warn!(
                provider = %self.provider.name(),
                score = score_response(&text, markers),
                required = markers.len(),
                "LLM response below quality threshold — using fallback"
            );
            fallback.to_string()
        }
    }
}

/// Number of required section markers present in `text`.
pub fn score_response(text: &str, markers: &[&str]) -> usize {
    markers.iter().filter(|m| text.contains(*m)).count()
}

/// Quality gate: all markers present and the response is not degenerate.
pub fn meets_quality(text: &str, markers: &[&str]) -> bool {
    score_response(text, markers) == markers.len() && text.trim().len() >= MIN_RESPONSE_LEN
}
