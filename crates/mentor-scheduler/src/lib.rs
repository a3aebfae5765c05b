//! `mentor-scheduler` — the per-user, timezone-aware recurring reminder
//! engine.
//!
//! # Overview
//!
//! A single cooperative loop ticks once a minute. Each tick walks the static
//! job registry in order; each job walks its candidate set (all active users,
//! or artifact-joined rows), resolves the candidate's local wall-clock time,
//! and fires the handler when the job's target minute matches within ±1.
//! A process-local dedup cache keyed by `(user, kind[, artifact][, date])`
//! enforces at-most-once-per-local-day delivery; the cache is volatile, so a
//! restart inside the minute window may re-fire once — an accepted bound.
//!
//! Handlers receive their collaborators (store, sink, LLM, clock) through
//! [`context::JobContext`], so the whole engine runs against deterministic
//! fakes in tests.

pub mod context;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod jobs;
pub mod materialize;
pub mod registry;
pub mod types;

pub use context::JobContext;
pub use dedup::{DedupCache, DedupKey};
pub use engine::Scheduler;
pub use error::{Result, SchedulerError};
pub use types::{JobKind, Outcome};
