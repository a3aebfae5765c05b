use chrono::{DateTime, Utc};

/// Source of the current UTC instant.
///
/// The scheduler never calls `Utc::now()` directly — everything goes through
/// this trait so the test suite can drive a fake clock in discrete minute
/// steps while production uses [`SystemClock`].
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
