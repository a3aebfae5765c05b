//! Dependency bundle handed to every job handler.
//!
//! The engine owns one [`JobContext`]; all collaborators are injected so the
//! test suite can substitute a fixed-step clock, a recording sink, a scripted
//! LLM, and an in-memory store.

use std::str::FromStr;
use std::sync::Arc;

use tracing::warn;

use mentor_agent::Llm;
use mentor_core::types::ClockTime;
use mentor_core::{Clock, EffectiveTz, Sink};
use mentor_store::types::User;
use mentor_store::Store;

pub struct JobContext {
    pub store: Arc<Store>,
    pub sink: Arc<dyn Sink>,
    pub llm: Arc<Llm>,
    pub clock: Arc<dyn Clock>,
    /// Applied when a user's timezone column is null.
    pub default_tz: EffectiveTz,
    /// Applied when a per-record `HH:MM` column fails to parse.
    pub default_reminder_hour: u8,
}

impl JobContext {
    /// Resolve a user's effective timezone. Null falls back to the configured
    /// default; unrecognised values collapse to UTC and never error.
    pub fn user_tz(&self, user: &User) -> EffectiveTz {
        match user.timezone.as_deref() {
            Some(raw) => mentor_core::tz::resolve(Some(raw)),
            None => self.default_tz,
        }
    }

    /// Parse a per-record reminder time, substituting the configured default
    /// hour when the column is corrupt. One bad row must not drop a record
    /// from the schedule entirely.
    pub fn parse_record_time(&self, raw: &str) -> ClockTime {
        ClockTime::from_str(raw).unwrap_or_else(|reason| {
            warn!(%reason, "unparseable reminder time — using default hour");
            ClockTime::new(self.default_reminder_hour, 0)
        })
    }
}
