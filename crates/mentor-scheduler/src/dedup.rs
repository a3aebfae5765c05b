//! Process-local at-most-once-per-day cache.
//!
//! Replaces the source pattern of mutable global dictionaries with one owned
//! cache the engine passes to itself by reference. Keys for distinct
//! `(user, job)` pairs are disjoint, so a plain mutex is enough — there is
//! never writer contention on the same key.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::types::JobKind;

/// Composite identifier for one deliverable: user, job kind, and for
/// per-artifact jobs the artifact id (plus the due date for date-bound
/// artifacts, so the same todo due on two dates counts as two reminders).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    user_id: String,
    kind: JobKind,
    artifact: Option<String>,
}

impl DedupKey {
    pub fn per_user(user_id: &str, kind: JobKind) -> Self {
        Self {
            user_id: user_id.to_string(),
            kind,
            artifact: None,
        }
    }

    pub fn per_artifact(user_id: &str, kind: JobKind, artifact_id: i64) -> Self {
        Self {
            user_id: user_id.to_string(),
            kind,
            artifact: Some(artifact_id.to_string()),
        }
    }

    pub fn per_artifact_on(
        user_id: &str,
        kind: JobKind,
        artifact_id: i64,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            kind,
            artifact: Some(format!("{artifact_id}@{due_date}")),
        }
    }
}

/// Map of dedup key → local calendar date of the last successful send.
///
/// Authoritative only within the process lifetime; on restart it starts
/// empty and the ±1-minute window bounds duplicates to one per restart.
#[derive(Debug, Default)]
pub struct DedupCache {
    inner: Mutex<HashMap<DedupKey, NaiveDate>>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff the key was already marked for `local_today` — "today" as the
    /// owning user's timezone sees it.
    pub fn is_sent(&self, key: &DedupKey, local_today: NaiveDate) -> bool {
        self.inner.lock().unwrap().get(key) == Some(&local_today)
    }

    pub fn mark_sent(&self, key: DedupKey, local_today: NaiveDate) {
        self.inner.lock().unwrap().insert(key, local_today);
    }

    /// Drop entries that can no longer be "today" anywhere. Local dates lag
    /// the UTC date by at most one day (UTC-12), so anything older than
    /// `utc_date - 1` is stale. Called once per tick to cap memory at
    /// O(active users × active reminders).
    pub fn sweep(&self, now_utc: DateTime<Utc>) {
        let horizon = now_utc.date_naive() - Duration::days(1);
        self.inner.lock().unwrap().retain(|_, date| *date >= horizon);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn unmarked_key_is_unsent() {
        let cache = DedupCache::new();
        let key = DedupKey::per_user("u1", JobKind::DailyPrinciple);
        assert!(!cache.is_sent(&key, date(2025, 1, 15)));
    }

    #[test]
    fn yesterdays_mark_does_not_count_for_today() {
        let cache = DedupCache::new();
        let key = DedupKey::per_user("u1", JobKind::DailyPrinciple);
        cache.mark_sent(key.clone(), date(2025, 1, 14));
        assert!(cache.is_sent(&key, date(2025, 1, 14)));
        assert!(!cache.is_sent(&key, date(2025, 1, 15)));
    }

    #[test]
    fn artifact_keys_are_disjoint() {
        let cache = DedupCache::new();
        let today = date(2025, 1, 15);
        cache.mark_sent(
            DedupKey::per_artifact("u1", JobKind::GoalReminder, 7),
            today,
        );
        assert!(!cache.is_sent(&DedupKey::per_artifact("u1", JobKind::GoalReminder, 8), today));
        assert!(!cache.is_sent(&DedupKey::per_user("u1", JobKind::GoalReminder), today));
    }

    #[test]
    fn date_bound_keys_distinguish_due_dates() {
        let cache = DedupCache::new();
        let today = date(2025, 1, 15);
        cache.mark_sent(
            DedupKey::per_artifact_on("u1", JobKind::TodoReminder, 3, date(2025, 1, 15)),
            today,
        );
        assert!(!cache.is_sent(
            &DedupKey::per_artifact_on("u1", JobKind::TodoReminder, 3, date(2025, 1, 16)),
            today,
        ));
    }

    #[test]
    fn sweep_prunes_stale_entries_only() {
        let cache = DedupCache::new();
        let now = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
        cache.mark_sent(DedupKey::per_user("old", JobKind::DailyPrinciple), date(2025, 1, 13));
        cache.mark_sent(DedupKey::per_user("near", JobKind::DailyPrinciple), date(2025, 1, 14));
        cache.mark_sent(DedupKey::per_user("cur", JobKind::DailyPrinciple), date(2025, 1, 15));
        cache.sweep(now);
        assert_eq!(cache.len(), 2);
        assert!(cache.is_sent(&DedupKey::per_user("near", JobKind::DailyPrinciple), date(2025, 1, 14)));
    }
}
