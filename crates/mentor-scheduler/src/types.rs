use std::fmt;

/// Symbolic tag for a class of scheduled job — part of every dedup key and
/// of the per-tick log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    DailyPrinciple,
    DailyMotivation,
    NutritionShopping,
    NutritionCooking,
    HealthDaily,
    FinanceTodoCreation,
    DailyTasksReset,
    TodoEvening,
    GoalReminder,
    TodoReminder,
    FinanceReminders,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::DailyPrinciple => "daily_principle",
            JobKind::DailyMotivation => "daily_motivation",
            JobKind::NutritionShopping => "nutrition_shopping",
            JobKind::NutritionCooking => "nutrition_cooking",
            JobKind::HealthDaily => "health_daily",
            JobKind::FinanceTodoCreation => "finance_todo_creation",
            JobKind::DailyTasksReset => "daily_tasks_reset",
            JobKind::TodoEvening => "todo_evening",
            JobKind::GoalReminder => "goal_reminder",
            JobKind::TodoReminder => "todo_reminder",
            JobKind::FinanceReminders => "finance_reminders",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a handler did for one candidate.
///
/// `Sent` means the observable side effect landed (message delivered, or a
/// materializer's derived writes committed) — the engine then marks the dedup
/// key. `Skipped` means a guard inside the handler declined (empty motivation
/// row, no nutrition settings); nothing is marked and the candidate is
/// reconsidered while the minute window lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Sent,
    Skipped,
}
