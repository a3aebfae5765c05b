use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use mentor_core::types::{DayMask, Priority};

/// A bot user. Created on first interaction; never destroyed by the
/// scheduler. `timezone` may change at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// UUIDv4 string — primary key.
    pub id: String,
    /// External transport address (Telegram chat).
    pub chat_id: i64,
    /// IANA name or `UTC±H[:MM]` literal; null means UTC.
    pub timezone: Option<String>,
    /// Per-feature reminder flags, stored as a JSON object column.
    pub preferences: HashMap<String, bool>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    /// Missing keys default to true — every reminder flag is opt-out.
    pub fn pref_enabled(&self, key: &str) -> bool {
        self.preferences.get(key).copied().unwrap_or(true)
    }
}

/// The user's long-horizon motivation row. All fields optional; the
/// daily-motivation job skips users whose row is entirely empty.
#[derive(Debug, Clone, Default)]
pub struct Motivation {
    pub user_id: String,
    pub main_year_goal: Option<String>,
    pub vision: Option<String>,
    pub mission: Option<String>,
    pub values: Option<String>,
}

impl Motivation {
    /// Non-null fields as (label, text) pairs, in a stable order.
    pub fn filled_fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = Vec::new();
        if let Some(ref v) = self.main_year_goal {
            fields.push(("main year goal", v.as_str()));
        }
        if let Some(ref v) = self.vision {
            fields.push(("vision", v.as_str()));
        }
        if let Some(ref v) = self.mission {
            fields.push(("mission", v.as_str()));
        }
        if let Some(ref v) = self.values {
            fields.push(("values", v.as_str()));
        }
        fields
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
    Archived,
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GoalStatus::Active => "active",
            GoalStatus::Completed => "completed",
            GoalStatus::Archived => "archived",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for GoalStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "active" => Ok(GoalStatus::Active),
            "completed" => Ok(GoalStatus::Completed),
            "archived" => Ok(GoalStatus::Archived),
            other => Err(format!("unknown goal status: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Goal {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    pub status: GoalStatus,
}

/// Joined row feeding the per-artifact goal-reminder job: the reminder, its
/// parent goal, and the owning user in one fetch.
#[derive(Debug, Clone)]
pub struct GoalReminderRow {
    pub user: User,
    pub reminder_id: i64,
    pub goal_id: i64,
    pub goal_title: String,
    /// Raw `HH:MM` column value; the engine parses it with a configured
    /// fallback so one bad row can't drop the record.
    pub reminder_time: String,
}

#[derive(Debug, Clone)]
pub struct Todo {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDate,
    pub priority: Priority,
    pub is_daily: bool,
    pub reminder_time: Option<String>,
    pub is_reminder_active: bool,
    pub is_completed: bool,
}

/// Insert payload for derived and user-created todos.
#[derive(Debug, Clone)]
pub struct NewTodo {
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDate,
    pub priority: Priority,
    pub is_daily: bool,
    pub reminder_time: Option<String>,
    pub is_reminder_active: bool,
}

/// Joined row feeding the per-artifact todo-reminder job.
#[derive(Debug, Clone)]
pub struct TodoReminderRow {
    pub user: User,
    pub todo: Todo,
}

/// Per-user nutrition settings driving the cooking/shopping reminders and
/// their derived todos.
#[derive(Debug, Clone)]
pub struct NutritionReminder {
    pub id: i64,
    pub user_id: String,
    /// Cooking days as a Mon..Sun mask.
    pub cooking_days: DayMask,
    pub cooking_time: Option<String>,
    pub reminder_time: Option<String>,
    pub shopping_reminder_time: Option<String>,
    pub is_active: bool,
    pub target_calories: Option<u32>,
    pub body_goal: Option<String>,
}

/// Joined row for the nutrition jobs.
#[derive(Debug, Clone)]
pub struct NutritionRow {
    pub user: User,
    pub settings: NutritionReminder,
}

/// Which way the money moves. Replaces the source's creditor/debtor
/// duck typing with one tagged variant consumed uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Someone owes the user (creditor side).
    Receive,
    /// The user owes someone (debtor side).
    Pay,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Receive => "receive",
            Direction::Pay => "pay",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "receive" => Ok(Direction::Receive),
            "pay" => Ok(Direction::Pay),
            other => Err(format!("unknown obligation direction: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Obligation {
    pub id: i64,
    pub user_id: String,
    pub direction: Direction,
    /// Counterparty name.
    pub party: String,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub is_active: bool,
}

impl Obligation {
    /// Stable identifier embedded in derived todo descriptions for
    /// idempotency checks.
    pub fn marker(&self) -> String {
        format!("{{{}:{}}}", self.direction, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_preference_defaults_to_enabled() {
        let mut user = User {
            id: "u1".into(),
            chat_id: 1,
            timezone: None,
            preferences: HashMap::new(),
            is_active: true,
            created_at: String::new(),
            updated_at: String::new(),
        };
        assert!(user.pref_enabled("daily_principle"));
        user.preferences.insert("daily_principle".into(), false);
        assert!(!user.pref_enabled("daily_principle"));
        assert!(user.pref_enabled("daily_motivation"));
    }

    #[test]
    fn motivation_fields_skip_nulls() {
        let motivation = Motivation {
            user_id: "u1".into(),
            main_year_goal: Some("foo".into()),
            vision: None,
            mission: Some("bar".into()),
            values: None,
        };
        let fields = motivation.filled_fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0], ("main year goal", "foo"));
    }

    #[test]
    fn obligation_marker_is_stable() {
        let obligation = Obligation {
            id: 7,
            user_id: "u1".into(),
            direction: Direction::Receive,
            party: "Alice".into(),
            amount: 100.0,
            due_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            is_active: true,
        };
        assert_eq!(obligation.marker(), "{receive:7}");
    }
}
