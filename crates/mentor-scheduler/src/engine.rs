//! The minute-granularity tick loop.
//!
//! Single cooperative driver: each tick sweeps the dedup cache, then walks
//! the registry in order; within a job, candidates are processed in stable
//! (user id, artifact id) order. Every candidate's failure is isolated — it
//! is logged, its dedup key stays unset, and the next minute tick retries.

use std::time::Duration as StdDuration;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::context::JobContext;
use crate::dedup::{DedupCache, DedupKey};
use crate::jobs;
use crate::materialize;
use crate::registry::{registry, JobSpec, Target};
use crate::types::{JobKind, Outcome};

#[derive(Debug, Default, Clone, Copy)]
struct JobStats {
    sent: u32,
    skipped: u32,
    failed: u32,
}

pub struct Scheduler {
    ctx: JobContext,
    jobs: Vec<JobSpec>,
    dedup: DedupCache,
}

impl Scheduler {
    pub fn new(ctx: JobContext) -> Self {
        Self {
            ctx,
            jobs: registry(),
            dedup: DedupCache::new(),
        }
    }

    /// Main loop. Ticks on minute boundaries until `shutdown` broadcasts
    /// `true`; the in-flight tick completes before the task exits, so
    /// handlers get their bounded grace window.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("scheduler started");

        // Align the first tick to the next minute boundary.
        let now = self.ctx.clock.now_utc();
        let into_minute =
            now.second() as u64 * 1000 + u64::from(now.timestamp_subsec_millis() % 1000);
        let first = tokio::time::Instant::now()
            + StdDuration::from_millis(60_000u64.saturating_sub(into_minute));

        let mut interval = tokio::time::interval_at(first, StdDuration::from_secs(60));
        // A tick that overruns its minute must not queue a catch-up burst —
        // the skipped minute's work is simply not retried.
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let now = self.ctx.clock.now_utc();
                    self.tick(now).await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("scheduler shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// One full pass over the registry. Public so tests can drive simulated
    /// days through a fake clock without the real interval.
    pub async fn tick(&self, now: DateTime<Utc>) {
        self.dedup.sweep(now);

        for &spec in &self.jobs {
            let stats = match spec.kind {
                JobKind::NutritionShopping | JobKind::NutritionCooking => {
                    self.run_nutrition(spec, now).await
                }
                JobKind::GoalReminder => self.run_goal_reminders(spec, now).await,
                JobKind::TodoReminder => self.run_todo_reminders(spec, now).await,
                _ => self.run_per_user(spec, now).await,
            };
            if stats.sent > 0 || stats.failed > 0 {
                info!(
                    kind = %spec.kind,
                    sent = stats.sent,
                    skipped = stats.skipped,
                    failed = stats.failed,
                    "job tick complete"
                );
            }
        }
    }

    // --- per-job candidate walks -------------------------------------------

    async fn run_per_user(&self, spec: JobSpec, now: DateTime<Utc>) -> JobStats {
        let mut stats = JobStats::default();
        let Target::Fixed(target) = spec.target else {
            return stats;
        };

        let users = match { self.ctx.store.session().active_users() } {
            Ok(users) => users,
            Err(e) => {
                warn!(kind = %spec.kind, error = %e, "candidate load failed — skipping job this tick");
                stats.failed += 1;
                return stats;
            }
        };

        for user in users {
            let local = self.ctx.user_tz(&user).local(now);
            if !target.matches(local.time()) {
                continue;
            }
            if let Some(flag) = spec.opt_in {
                if !user.pref_enabled(flag) {
                    continue;
                }
            }
            let key = DedupKey::per_user(&user.id, spec.kind);
            if self.dedup.is_sent(&key, local.date()) {
                continue;
            }
            let result = jobs::dispatch_per_user(&self.ctx, spec.kind, &user, local).await;
            self.settle(spec.kind, &user.id, key, local.date(), result, &mut stats);
        }
        stats
    }

    async fn run_nutrition(&self, spec: JobSpec, now: DateTime<Utc>) -> JobStats {
        let mut stats = JobStats::default();
        let rows = match { self.ctx.store.session().nutrition_rows() } {
            Ok(rows) => rows,
            Err(e) => {
                warn!(kind = %spec.kind, error = %e, "candidate load failed — skipping job this tick");
                stats.failed += 1;
                return stats;
            }
        };

        for row in rows {
            let local = self.ctx.user_tz(&row.user).local(now);
            let target = match spec.kind {
                JobKind::NutritionShopping => materialize::shopping_time(&row.settings),
                _ => materialize::cooking_time(&row.settings),
            };
            if !target.matches(local.time()) {
                continue;
            }
            if let Some(flag) = spec.opt_in {
                if !row.user.pref_enabled(flag) {
                    continue;
                }
            }
            // Shopping looks at tomorrow's cooking day; cooking at today's.
            let guard_day = match spec.kind {
                JobKind::NutritionShopping => local.date() + Duration::days(1),
                _ => local.date(),
            };
            if !row.settings.cooking_days.contains(guard_day.weekday()) {
                continue;
            }
            let key = DedupKey::per_user(&row.user.id, spec.kind);
            if self.dedup.is_sent(&key, local.date()) {
                continue;
            }
            let result = match spec.kind {
                JobKind::NutritionShopping => {
                    jobs::nutrition::run_shopping(&self.ctx, &row, local.date()).await
                }
                _ => jobs::nutrition::run_cooking(&self.ctx, &row, local.date()).await,
            };
            self.settle(spec.kind, &row.user.id, key, local.date(), result, &mut stats);
        }
        stats
    }

    async fn run_goal_reminders(&self, spec: JobSpec, now: DateTime<Utc>) -> JobStats {
        let mut stats = JobStats::default();
        let rows = match { self.ctx.store.session().goal_reminder_rows() } {
            Ok(rows) => rows,
            Err(e) => {
                warn!(kind = %spec.kind, error = %e, "candidate load failed — skipping job this tick");
                stats.failed += 1;
                return stats;
            }
        };

        for row in rows {
            let local = self.ctx.user_tz(&row.user).local(now);
            let target = self.ctx.parse_record_time(&row.reminder_time);
            if !target.matches(local.time()) {
                continue;
            }
            let key = DedupKey::per_artifact(&row.user.id, spec.kind, row.goal_id);
            if self.dedup.is_sent(&key, local.date()) {
                continue;
            }
            let result = jobs::goals::run(&self.ctx, &row).await;
            self.settle(spec.kind, &row.user.id, key, local.date(), result, &mut stats);
        }
        stats
    }

    async fn run_todo_reminders(&self, spec: JobSpec, now: DateTime<Utc>) -> JobStats {
        let mut stats = JobStats::default();
        let rows = match { self.ctx.store.session().todo_reminder_rows() } {
            Ok(rows) => rows,
            Err(e) => {
                warn!(kind = %spec.kind, error = %e, "candidate load failed — skipping job this tick");
                stats.failed += 1;
                return stats;
            }
        };

        for row in rows {
            let todo = &row.todo;
            let Some(raw_time) = todo.reminder_time.as_deref() else {
                continue;
            };
            let local = self.ctx.user_tz(&row.user).local(now);
            let target = self.ctx.parse_record_time(raw_time);
            if !target.matches(local.time()) {
                continue;
            }
            // Non-daily todos only fire on their due date; their dedup key
            // carries the date so the same todo re-dated later counts anew.
            let key = if todo.is_daily {
                DedupKey::per_artifact(&row.user.id, spec.kind, todo.id)
            } else {
                if todo.due_date != local.date() {
                    continue;
                }
                DedupKey::per_artifact_on(&row.user.id, spec.kind, todo.id, todo.due_date)
            };
            if self.dedup.is_sent(&key, local.date()) {
                continue;
            }
            let result = jobs::todos::run_reminder(&self.ctx, &row).await;
            self.settle(spec.kind, &row.user.id, key, local.date(), result, &mut stats);
        }
        stats
    }

    /// Uniform outcome accounting: mark the key on success, leave it unset on
    /// failure so the minute window retries, count everything.
    fn settle(
        &self,
        kind: JobKind,
        user_id: &str,
        key: DedupKey,
        today: NaiveDate,
        result: crate::error::Result<Outcome>,
        stats: &mut JobStats,
    ) {
        match result {
            Ok(Outcome::Sent) => {
                self.dedup.mark_sent(key, today);
                stats.sent += 1;
            }
            Ok(Outcome::Skipped) => stats.skipped += 1,
            Err(e) => {
                warn!(
                    kind = %kind,
                    user_id = %user_id,
                    error = %e,
                    "handler failed — will retry next tick"
                );
                stats.failed += 1;
            }
        }
    }
}
