use rusqlite::Connection;

use crate::error::Result;

/// Initialise all tables the bot relies on. Safe to call on every startup —
/// CREATE IF NOT EXISTS means it's idempotent.
pub fn init_db(conn: &Connection) -> Result<()> {
    create_users_table(conn)?;
    create_motivation_table(conn)?;
    create_goals_tables(conn)?;
    create_todos_table(conn)?;
    create_nutrition_table(conn)?;
    create_obligations_table(conn)?;
    Ok(())
}

fn create_users_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY NOT NULL,
            chat_id     INTEGER NOT NULL,
            timezone    TEXT,                        -- IANA name or UTC±H[:MM]; NULL = UTC
            preferences TEXT NOT NULL DEFAULT '{}',  -- JSON object {flag: bool}
            is_active   INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_users_chat ON users (chat_id);",
    )?;
    Ok(())
}

fn create_motivation_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS motivation (
            user_id        TEXT PRIMARY KEY NOT NULL REFERENCES users(id),
            main_year_goal TEXT,
            vision         TEXT,
            mission        TEXT,
            life_values    TEXT,                       -- 'values' is reserved in SQL
            updated_at     TEXT NOT NULL
        );",
    )?;
    Ok(())
}

fn create_goals_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS goals (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id    TEXT NOT NULL REFERENCES users(id),
            title      TEXT NOT NULL,
            status     TEXT NOT NULL DEFAULT 'active',
            created_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS goal_reminders (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            goal_id       INTEGER NOT NULL REFERENCES goals(id),
            reminder_time TEXT NOT NULL,              -- HH:MM
            is_active     INTEGER NOT NULL DEFAULT 1,
            created_at    TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_goal_reminders_goal ON goal_reminders (goal_id);",
    )?;
    Ok(())
}

fn create_todos_table(conn: &Connection) -> Result<()> {
    // idx_todos_user_date serves both the reminder scan and the
    // materializers' existence probes.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS todos (
            id                 INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id            TEXT NOT NULL REFERENCES users(id),
            title              TEXT NOT NULL,
            description        TEXT,
            due_date           TEXT NOT NULL,          -- YYYY-MM-DD
            priority           TEXT NOT NULL DEFAULT 'medium',
            is_daily           INTEGER NOT NULL DEFAULT 0,
            reminder_time      TEXT,                   -- HH:MM or NULL
            is_reminder_active INTEGER NOT NULL DEFAULT 0,
            is_completed       INTEGER NOT NULL DEFAULT 0,
            created_at         TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_todos_user_date ON todos (user_id, due_date);",
    )?;
    Ok(())
}

fn create_nutrition_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS nutrition_reminders (
            id                     INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id                TEXT NOT NULL REFERENCES users(id),
            cooking_days           TEXT NOT NULL DEFAULT '0000000',  -- Mon..Sun mask
            cooking_time           TEXT,               -- HH:MM
            reminder_time          TEXT,
            shopping_reminder_time TEXT,
            is_active              INTEGER NOT NULL DEFAULT 1,
            target_calories        INTEGER,
            body_goal              TEXT,
            created_at             TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_nutrition_user ON nutrition_reminders (user_id);",
    )?;
    Ok(())
}

fn create_obligations_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS obligations (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id    TEXT NOT NULL REFERENCES users(id),
            direction  TEXT NOT NULL,                  -- 'receive' | 'pay'
            party      TEXT NOT NULL,
            amount     REAL NOT NULL,
            due_date   TEXT NOT NULL,                  -- YYYY-MM-DD
            is_active  INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_obligations_user_due ON obligations (user_id, due_date);",
    )?;
    Ok(())
}
