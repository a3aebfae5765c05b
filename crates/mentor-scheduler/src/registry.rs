//! The static job registry.
//!
//! Order is load-bearing: jobs firing in the same minute for the same user
//! dispatch in this order, and the 06:00 pair (finance todo creation before
//! the daily reset) relies on it.

use mentor_core::types::ClockTime;

use crate::types::JobKind;

/// When a job fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Same local wall-clock minute for every user.
    Fixed(ClockTime),
    /// Each candidate row carries its own `HH:MM` column.
    PerRecord,
}

/// How dedup keys are scoped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// One key per user per local day.
    PerUser,
    /// One key per artifact per local day; the candidate set is the
    /// artifact-joined row set.
    PerArtifact,
}

#[derive(Debug, Clone, Copy)]
pub struct JobSpec {
    pub kind: JobKind,
    pub target: Target,
    /// Preference flag consulted before dispatch; `None` means always on.
    /// Missing flags read as true — every opt-in here is opt-out style.
    pub opt_in: Option<&'static str>,
    pub granularity: Granularity,
}

/// The full catalog, in frozen dispatch order.
pub fn registry() -> Vec<JobSpec> {
    use Granularity::*;
    use JobKind::*;
    vec![
        JobSpec {
            kind: DailyPrinciple,
            target: Target::Fixed(ClockTime::new(7, 0)),
            opt_in: Some("daily_principle"),
            granularity: PerUser,
        },
        JobSpec {
            kind: DailyMotivation,
            target: Target::Fixed(ClockTime::new(8, 0)),
            opt_in: Some("daily_motivation"),
            granularity: PerUser,
        },
        JobSpec {
            kind: NutritionShopping,
            target: Target::PerRecord,
            opt_in: Some("nutrition_shopping"),
            granularity: PerUser,
        },
        JobSpec {
            kind: NutritionCooking,
            target: Target::PerRecord,
            opt_in: Some("nutrition_cooking"),
            granularity: PerUser,
        },
        JobSpec {
            kind: HealthDaily,
            target: Target::Fixed(ClockTime::new(9, 0)),
            opt_in: Some("health_daily"),
            granularity: PerUser,
        },
        JobSpec {
            kind: FinanceTodoCreation,
            target: Target::Fixed(ClockTime::new(6, 0)),
            opt_in: Some("finance_todo_creation"),
            granularity: PerUser,
        },
        JobSpec {
            kind: DailyTasksReset,
            target: Target::Fixed(ClockTime::new(6, 0)),
            opt_in: None,
            granularity: PerUser,
        },
        JobSpec {
            kind: TodoEvening,
            target: Target::Fixed(ClockTime::new(20, 0)),
            opt_in: Some("todo_evening"),
            granularity: PerUser,
        },
        JobSpec {
            kind: GoalReminder,
            target: Target::PerRecord,
            opt_in: None,
            granularity: PerArtifact,
        },
        JobSpec {
            kind: TodoReminder,
            target: Target::PerRecord,
            opt_in: None,
            granularity: PerArtifact,
        },
        JobSpec {
            kind: FinanceReminders,
            target: Target::Fixed(ClockTime::new(9, 0)),
            opt_in: Some("finance_reminders"),
            granularity: PerUser,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_is_frozen() {
        let kinds: Vec<JobKind> = registry().iter().map(|j| j.kind).collect();
        assert_eq!(
            kinds,
            vec![
                JobKind::DailyPrinciple,
                JobKind::DailyMotivation,
                JobKind::NutritionShopping,
                JobKind::NutritionCooking,
                JobKind::HealthDaily,
                JobKind::FinanceTodoCreation,
                JobKind::DailyTasksReset,
                JobKind::TodoEvening,
                JobKind::GoalReminder,
                JobKind::TodoReminder,
                JobKind::FinanceReminders,
            ]
        );
    }

    #[test]
    fn reset_is_always_on() {
        let reset = registry()
            .into_iter()
            .find(|j| j.kind == JobKind::DailyTasksReset)
            .unwrap();
        assert!(reset.opt_in.is_none());
    }

    #[test]
    fn artifact_jobs_carry_per_record_targets() {
        for job in registry() {
            if job.granularity == Granularity::PerArtifact {
                assert_eq!(job.target, Target::PerRecord, "{} target", job.kind);
                assert!(job.opt_in.is_none(), "{} gating is per record", job.kind);
            }
        }
    }

    #[test]
    fn finance_todos_precede_reset() {
        let kinds: Vec<JobKind> = registry().iter().map(|j| j.kind).collect();
        let finance = kinds.iter().position(|k| *k == JobKind::FinanceTodoCreation);
        let reset = kinds.iter().position(|k| *k == JobKind::DailyTasksReset);
        assert!(finance < reset);
    }
}
