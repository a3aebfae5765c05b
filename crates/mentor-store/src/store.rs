//! Scoped-session store.
//!
//! [`Store`] wraps a single SQLite connection behind a mutex. Callers acquire
//! a [`Session`] (the lock guard), run their queries, and drop it before any
//! outbound I/O — a session must never be held across an `.await` on the sink
//! or the LLM. The scheduler opens one session per user per job.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::warn;
use uuid::Uuid;

use mentor_core::types::{DayMask, Priority};

use crate::db::init_db;
use crate::error::{Result, StoreError};
use crate::types::*;

const DATE_FMT: &str = "%Y-%m-%d";

/// Column list shared by every query that materialises a [`User`], so the
/// row mapper stays consistent across plain selects and joins.
const USER_COLS: &str = "u.id, u.chat_id, u.timezone, u.preferences, u.is_active, \
                         u.created_at, u.updated_at";

pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Wrap an existing connection, running the idempotent migrations first.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open (or create) the database at `path` with WAL journaling.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Self::new(conn)
    }

    /// In-memory store for tests.
    pub fn in_memory() -> Result<Self> {
        Self::new(Connection::open_in_memory()?)
    }

    /// Acquire a scoped session. Released when the guard drops.
    pub fn session(&self) -> Session<'_> {
        Session {
            conn: self.conn.lock().unwrap(),
        }
    }
}

pub struct Session<'a> {
    conn: MutexGuard<'a, Connection>,
}

/// Map a SELECT row (column order from USER_COLS, starting at `base`) to a
/// User. Centralised so plain selects and joins stay consistent.
fn row_to_user(row: &rusqlite::Row<'_>, base: usize) -> rusqlite::Result<User> {
    let preferences: HashMap<String, bool> =
        serde_json::from_str(&row.get::<_, String>(base + 3)?).unwrap_or_default();
    Ok(User {
        id: row.get(base)?,
        chat_id: row.get(base + 1)?,
        timezone: row.get(base + 2)?,
        preferences,
        is_active: row.get::<_, i32>(base + 4)? != 0,
        created_at: row.get(base + 5)?,
        updated_at: row.get(base + 6)?,
    })
}

fn row_to_todo(row: &rusqlite::Row<'_>, base: usize) -> rusqlite::Result<Option<Todo>> {
    let due_raw: String = row.get(base + 4)?;
    let Ok(due_date) = NaiveDate::parse_from_str(&due_raw, DATE_FMT) else {
        warn!(due_date = %due_raw, "todo row with unparseable due_date — skipping");
        return Ok(None);
    };
    let priority = Priority::from_str(&row.get::<_, String>(base + 5)?).unwrap_or_default();
    Ok(Some(Todo {
        id: row.get(base)?,
        user_id: row.get(base + 1)?,
        title: row.get(base + 2)?,
        description: row.get(base + 3)?,
        due_date,
        priority,
        is_daily: row.get::<_, i32>(base + 6)? != 0,
        reminder_time: row.get(base + 7)?,
        is_reminder_active: row.get::<_, i32>(base + 8)? != 0,
        is_completed: row.get::<_, i32>(base + 9)? != 0,
    }))
}

const TODO_COLS: &str = "t.id, t.user_id, t.title, t.description, t.due_date, t.priority, \
                         t.is_daily, t.reminder_time, t.is_reminder_active, t.is_completed";

impl Session<'_> {
    // --- users --------------------------------------------------------------

    /// All active users, id ascending — the candidate set for per-user jobs.
    pub fn active_users(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT {USER_COLS} FROM users u WHERE u.is_active = 1 ORDER BY u.id"
        ))?;
        let users = stmt
            .query_map([], |row| row_to_user(row, 0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(users)
    }

    pub fn user(&self, id: &str) -> Result<User> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("SELECT {USER_COLS} FROM users u WHERE u.id = ?1"))?;
        stmt.query_row([id], |row| row_to_user(row, 0))
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::UserNotFound(id.to_string()),
                other => StoreError::Database(other),
            })
    }

    pub fn create_user(&self, chat_id: i64, timezone: Option<&str>) -> Result<User> {
        let now = chrono::Utc::now().to_rfc3339();
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO users (id, chat_id, timezone, preferences, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, '{}', 1, ?4, ?4)",
            rusqlite::params![id, chat_id, timezone, now],
        )?;
        self.user(&id)
    }

    pub fn set_timezone(&self, user_id: &str, timezone: Option<&str>) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE users SET timezone = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![timezone, now, user_id],
        )?;
        Ok(())
    }

    pub fn set_preference(&self, user_id: &str, key: &str, enabled: bool) -> Result<()> {
        let user = self.user(user_id)?;
        let mut preferences = user.preferences;
        preferences.insert(key.to_string(), enabled);
        let json = serde_json::to_string(&preferences)
            .map_err(|e| StoreError::CorruptRow {
                table: "users".into(),
                reason: e.to_string(),
            })?;
        let now = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE users SET preferences = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![json, now, user_id],
        )?;
        Ok(())
    }

    // --- motivation ---------------------------------------------------------

    pub fn motivation(&self, user_id: &str) -> Result<Option<Motivation>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT user_id, main_year_goal, vision, mission, life_values
             FROM motivation WHERE user_id = ?1",
        )?;
        let row = stmt
            .query_row([user_id], |row| {
                Ok(Motivation {
                    user_id: row.get(0)?,
                    main_year_goal: row.get(1)?,
                    vision: row.get(2)?,
                    mission: row.get(3)?,
                    values: row.get(4)?,
                })
            })
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        Ok(row)
    }

    pub fn upsert_motivation(&self, motivation: &Motivation) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO motivation (user_id, main_year_goal, vision, mission, life_values, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(user_id) DO UPDATE SET
               main_year_goal = excluded.main_year_goal,
               vision = excluded.vision,
               mission = excluded.mission,
               life_values = excluded.life_values,
               updated_at = excluded.updated_at",
            rusqlite::params![
                motivation.user_id,
                motivation.main_year_goal,
                motivation.vision,
                motivation.mission,
                motivation.values,
                now
            ],
        )?;
        Ok(())
    }

    // --- goals --------------------------------------------------------------

    pub fn create_goal(&self, user_id: &str, title: &str) -> Result<i64> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO goals (user_id, title, status, created_at) VALUES (?1, ?2, 'active', ?3)",
            rusqlite::params![user_id, title, now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn set_goal_status(&self, goal_id: i64, status: GoalStatus) -> Result<()> {
        self.conn.execute(
            "UPDATE goals SET status = ?1 WHERE id = ?2",
            rusqlite::params![status.to_string(), goal_id],
        )?;
        Ok(())
    }

    /// Active goals for one user, id ascending.
    pub fn active_goals(&self, user_id: &str) -> Result<Vec<Goal>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, user_id, title, status FROM goals
             WHERE user_id = ?1 AND status = 'active' ORDER BY id",
        )?;
        let goals = stmt
            .query_map([user_id], |row| {
                let status =
                    GoalStatus::from_str(&row.get::<_, String>(3)?).unwrap_or_default();
                Ok(Goal {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    title: row.get(2)?,
                    status,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(goals)
    }

    pub fn create_goal_reminder(&self, goal_id: i64, reminder_time: &str) -> Result<i64> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO goal_reminders (goal_id, reminder_time, is_active, created_at)
             VALUES (?1, ?2, 1, ?3)",
            rusqlite::params![goal_id, reminder_time, now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Candidate rows for the per-artifact goal-reminder job: active reminder
    /// × active parent goal × active user, ordered (user, reminder).
    pub fn goal_reminder_rows(&self) -> Result<Vec<GoalReminderRow>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT {USER_COLS}, g.id, g.title, r.id, r.reminder_time
             FROM goal_reminders r
             JOIN goals g ON g.id = r.goal_id
             JOIN users u ON u.id = g.user_id
             WHERE r.is_active = 1 AND g.status = 'active' AND u.is_active = 1
             ORDER BY u.id, r.id"
        ))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(GoalReminderRow {
                    user: row_to_user(row, 0)?,
                    goal_id: row.get(7)?,
                    goal_title: row.get(8)?,
                    reminder_id: row.get(9)?,
                    reminder_time: row.get(10)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    // --- todos --------------------------------------------------------------

    pub fn insert_todo(&self, todo: &NewTodo) -> Result<i64> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO todos
             (user_id, title, description, due_date, priority, is_daily,
              reminder_time, is_reminder_active, is_completed, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9)",
            rusqlite::params![
                todo.user_id,
                todo.title,
                todo.description,
                todo.due_date.format(DATE_FMT).to_string(),
                todo.priority.to_string(),
                todo.is_daily,
                todo.reminder_time,
                todo.is_reminder_active,
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn set_todo_completed(&self, todo_id: i64, completed: bool) -> Result<()> {
        self.conn.execute(
            "UPDATE todos SET is_completed = ?1 WHERE id = ?2",
            rusqlite::params![completed, todo_id],
        )?;
        Ok(())
    }

    /// All of one user's todos due on `date`, id ascending.
    pub fn todos_on(&self, user_id: &str, date: NaiveDate) -> Result<Vec<Todo>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT {TODO_COLS} FROM todos t
             WHERE t.user_id = ?1 AND t.due_date = ?2 ORDER BY t.id"
        ))?;
        let todos = stmt
            .query_map(
                rusqlite::params![user_id, date.format(DATE_FMT).to_string()],
                |row| row_to_todo(row, 0),
            )?
            .filter_map(|r| r.ok().flatten())
            .collect();
        Ok(todos)
    }

    /// True iff a todo due on `date` embeds `marker` in its description.
    /// The finance materializer's idempotency probe.
    pub fn todo_marker_exists(&self, user_id: &str, date: NaiveDate, marker: &str) -> Result<bool> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT COUNT(*) FROM todos
             WHERE user_id = ?1 AND due_date = ?2
               AND description IS NOT NULL AND instr(description, ?3) > 0",
        )?;
        let count: i64 = stmt.query_row(
            rusqlite::params![user_id, date.format(DATE_FMT).to_string(), marker],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// True iff a todo with exactly `title` is due on `date`. The goal-task
    /// and nutrition materializers' idempotency probe.
    pub fn todo_titled_exists(&self, user_id: &str, date: NaiveDate, title: &str) -> Result<bool> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT COUNT(*) FROM todos WHERE user_id = ?1 AND due_date = ?2 AND title = ?3",
        )?;
        let count: i64 = stmt.query_row(
            rusqlite::params![user_id, date.format(DATE_FMT).to_string(), title],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Daily-reset sweep: clear completion on the user's daily todos and
    /// re-date any stale ones to `today`. Returns affected rows.
    pub fn reset_daily_todos(&self, user_id: &str, today: NaiveDate) -> Result<usize> {
        let n = self.conn.execute(
            "UPDATE todos SET is_completed = 0, due_date = ?1
             WHERE user_id = ?2 AND is_daily = 1 AND (is_completed = 1 OR due_date != ?1)",
            rusqlite::params![today.format(DATE_FMT).to_string(), user_id],
        )?;
        Ok(n)
    }

    /// Candidate rows for the per-artifact todo-reminder job: armed,
    /// uncompleted todos joined with their active owners.
    pub fn todo_reminder_rows(&self) -> Result<Vec<TodoReminderRow>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT {USER_COLS}, {TODO_COLS}
             FROM todos t
             JOIN users u ON u.id = t.user_id
             WHERE t.is_reminder_active = 1 AND t.is_completed = 0
               AND t.reminder_time IS NOT NULL AND u.is_active = 1
             ORDER BY u.id, t.id"
        ))?;
        let rows = stmt
            .query_map([], |row| {
                let user = row_to_user(row, 0)?;
                Ok(row_to_todo(row, 7)?.map(|todo| TodoReminderRow { user, todo }))
            })?
            .filter_map(|r| r.ok().flatten())
            .collect();
        Ok(rows)
    }

    // --- nutrition ----------------------------------------------------------

    pub fn upsert_nutrition(&self, settings: &NutritionReminder) -> Result<i64> {
        let now = chrono::Utc::now().to_rfc3339();
        // One settings row per user; replace wholesale on update.
        self.conn.execute(
            "DELETE FROM nutrition_reminders WHERE user_id = ?1",
            [&settings.user_id],
        )?;
        self.conn.execute(
            "INSERT INTO nutrition_reminders
             (user_id, cooking_days, cooking_time, reminder_time, shopping_reminder_time,
              is_active, target_calories, body_goal, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                settings.user_id,
                settings.cooking_days.to_string(),
                settings.cooking_time,
                settings.reminder_time,
                settings.shopping_reminder_time,
                settings.is_active,
                settings.target_calories,
                settings.body_goal,
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Candidate rows for the nutrition jobs: active settings × active user.
    pub fn nutrition_rows(&self) -> Result<Vec<NutritionRow>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT {USER_COLS}, n.id, n.user_id, n.cooking_days, n.cooking_time,
                    n.reminder_time, n.shopping_reminder_time, n.is_active,
                    n.target_calories, n.body_goal
             FROM nutrition_reminders n
             JOIN users u ON u.id = n.user_id
             WHERE n.is_active = 1 AND u.is_active = 1
             ORDER BY u.id, n.id"
        ))?;
        let rows = stmt
            .query_map([], |row| {
                let user = row_to_user(row, 0)?;
                let cooking_days = DayMask::from_str(&row.get::<_, String>(9)?)
                    .unwrap_or_default();
                Ok(NutritionRow {
                    user,
                    settings: NutritionReminder {
                        id: row.get(7)?,
                        user_id: row.get(8)?,
                        cooking_days,
                        cooking_time: row.get(10)?,
                        reminder_time: row.get(11)?,
                        shopping_reminder_time: row.get(12)?,
                        is_active: row.get::<_, i32>(13)? != 0,
                        target_calories: row.get(14)?,
                        body_goal: row.get(15)?,
                    },
                })
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    /// Nutrition settings for one user, if any.
    pub fn nutrition_for(&self, user_id: &str) -> Result<Option<NutritionReminder>> {
        Ok(self
            .nutrition_rows()?
            .into_iter()
            .find(|row| row.settings.user_id == user_id)
            .map(|row| row.settings))
    }

    // --- obligations --------------------------------------------------------

    pub fn create_obligation(
        &self,
        user_id: &str,
        direction: Direction,
        party: &str,
        amount: f64,
        due_date: NaiveDate,
    ) -> Result<i64> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO obligations (user_id, direction, party, amount, due_date, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
            rusqlite::params![
                user_id,
                direction.to_string(),
                party,
                amount,
                due_date.format(DATE_FMT).to_string(),
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All active obligations for one user, due date then id ascending.
    pub fn active_obligations(&self, user_id: &str) -> Result<Vec<Obligation>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, user_id, direction, party, amount, due_date, is_active
             FROM obligations WHERE user_id = ?1 AND is_active = 1
             ORDER BY due_date, id",
        )?;
        let obligations = stmt
            .query_map([user_id], |row| {
                let direction =
                    match Direction::from_str(&row.get::<_, String>(2)?) {
                        Ok(d) => d,
                        Err(reason) => {
                            warn!(%reason, "obligation row with bad direction — skipping");
                            return Ok(None);
                        }
                    };
                let due_raw: String = row.get(5)?;
                let Ok(due_date) = NaiveDate::parse_from_str(&due_raw, DATE_FMT) else {
                    warn!(due_date = %due_raw, "obligation row with bad due_date — skipping");
                    return Ok(None);
                };
                Ok(Some(Obligation {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    direction,
                    party: row.get(3)?,
                    amount: row.get(4)?,
                    due_date,
                    is_active: row.get::<_, i32>(6)? != 0,
                }))
            })?
            .filter_map(|r| r.ok().flatten())
            .collect();
        Ok(obligations)
    }
}
