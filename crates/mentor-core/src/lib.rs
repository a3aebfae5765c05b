//! `mentor-core` — shared foundation for the Mentor bot workspace.
//!
//! Holds everything more than one crate needs: configuration loading, the
//! top-level error type, the clock/timezone layer, the outbound delivery
//! contract, and the wire conventions (`HH:MM` times, `Mon..Sun` day masks,
//! todo priorities) used by the store and the scheduler.

pub mod clock;
pub mod config;
pub mod error;
pub mod outbound;
pub mod types;
pub mod tz;

pub use clock::{Clock, SystemClock};
pub use error::{MentorError, Result};
pub use outbound::{OutboundMessage, Sink, SinkError};
pub use tz::EffectiveTz;
