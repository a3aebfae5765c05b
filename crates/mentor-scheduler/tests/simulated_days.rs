// Simulated-day scenarios for the reminder engine: a fake minute-stepped
// clock drives Scheduler::tick directly against an in-memory store, a
// recording sink, and a scripted LLM, so every property here is exact.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use mentor_agent::provider::{CompletionRequest, LlmProvider, ProviderError};
use mentor_agent::Llm;
use mentor_core::outbound::{OutboundMessage, Sink, SinkError};
use mentor_core::{tz, SystemClock};
use mentor_scheduler::jobs::principle::PRINCIPLES;
use mentor_scheduler::{materialize, JobContext, Scheduler};
use mentor_store::types::{Direction, Motivation, NewTodo, NutritionReminder, User};
use mentor_store::Store;

use mentor_core::types::Priority;

// --- fakes -----------------------------------------------------------------

#[derive(Default)]
struct RecordingSink {
    messages: Mutex<Vec<OutboundMessage>>,
    failing: Mutex<bool>,
}

impl RecordingSink {
    fn snapshot(&self) -> Vec<OutboundMessage> {
        self.messages.lock().unwrap().clone()
    }

    fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }
}

#[async_trait]
impl Sink for RecordingSink {
    async fn send(&self, message: &OutboundMessage) -> Result<(), SinkError> {
        if *self.failing.lock().unwrap() {
            return Err(SinkError::Transport("simulated outage".into()));
        }
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }
}

struct FailingLlm;

#[async_trait]
impl LlmProvider for FailingLlm {
    fn name(&self) -> &str {
        "failing"
    }
    async fn complete(&self, _req: &CompletionRequest) -> Result<String, ProviderError> {
        Err(ProviderError::Unavailable("stubbed to raise".into()))
    }
}

// --- harness ---------------------------------------------------------------

struct Harness {
    store: Arc<Store>,
    sink: Arc<RecordingSink>,
    scheduler: Scheduler,
}

fn context(store: &Arc<Store>, sink: &Arc<RecordingSink>) -> JobContext {
    JobContext {
        store: Arc::clone(store),
        sink: Arc::clone(sink) as Arc<dyn Sink>,
        llm: Arc::new(
            Llm::new(Box::new(FailingLlm), "test-model".into())
                .with_deadline(std::time::Duration::from_millis(100)),
        ),
        clock: Arc::new(SystemClock),
        default_tz: tz::resolve(None),
        default_reminder_hour: 9,
    }
}

fn harness() -> Harness {
    let store = Arc::new(Store::in_memory().unwrap());
    let sink = Arc::new(RecordingSink::default());
    let scheduler = Scheduler::new(context(&store, &sink));
    Harness {
        store,
        sink,
        scheduler,
    }
}

/// Advance the simulated clock by `step` across `steps` iterations, ticking
/// once per step. Returns every send stamped with the tick's UTC instant.
async fn simulate(
    harness: &Harness,
    start: DateTime<Utc>,
    steps: u32,
    step: Duration,
) -> Vec<(DateTime<Utc>, OutboundMessage)> {
    let mut events = Vec::new();
    let mut seen = 0;
    let mut now = start;
    for _ in 0..steps {
        harness.scheduler.tick(now).await;
        let messages = harness.sink.snapshot();
        for message in &messages[seen..] {
            events.push((now, message.clone()));
        }
        seen = messages.len();
        now += step;
    }
    events
}

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn quiet_prefs(harness: &Harness, user: &User) {
    // Silence the fixed-time chatty jobs so scenarios observe one signal.
    let session = harness.store.session();
    for flag in ["health_daily", "todo_evening", "finance_reminders"] {
        session.set_preference(&user.id, flag, false).unwrap();
    }
}

// --- scenarios -------------------------------------------------------------

// S1: UTC+3 user gets exactly one principle send, at UTC 04:00–04:01, drawn
// from the fixed catalog; no motivation send without a motivation row.
#[tokio::test]
async fn s1_principle_fires_once_at_offset_local_seven() {
    let harness = harness();
    let user = {
        let session = harness.store.session();
        session.create_user(100, Some("UTC+3")).unwrap()
    };
    quiet_prefs(&harness, &user);

    let events = simulate(
        &harness,
        utc(2025, 1, 15, 0, 0),
        1440,
        Duration::minutes(1),
    )
    .await;

    assert_eq!(events.len(), 1, "expected exactly one send, got {events:?}");
    let (at, message) = &events[0];
    assert_eq!(message.chat_id, 100);
    assert!(
        *at >= utc(2025, 1, 15, 4, 0) && *at <= utc(2025, 1, 15, 4, 1),
        "fired at {at}"
    );
    assert!(
        PRINCIPLES.iter().any(|p| message.body.contains(p)),
        "body not from catalog: {}",
        message.body
    );
}

// Property 1 at higher tick frequency: 30-second ticks still yield one send.
#[tokio::test]
async fn dedup_holds_at_sub_minute_tick_frequency() {
    let harness = harness();
    let user = {
        let session = harness.store.session();
        session.create_user(100, Some("UTC+3")).unwrap()
    };
    quiet_prefs(&harness, &user);

    let events = simulate(
        &harness,
        utc(2025, 1, 15, 0, 0),
        2880,
        Duration::seconds(30),
    )
    .await;

    assert_eq!(events.len(), 1);
}

// S2: Moscow user gets the principle at UTC 04:00 and the motivation at
// UTC 05:00, carrying the stored main-year-goal text.
#[tokio::test]
async fn s2_moscow_user_gets_principle_then_motivation() {
    let harness = harness();
    let user = {
        let session = harness.store.session();
        let user = session.create_user(200, Some("Europe/Moscow")).unwrap();
        session
            .upsert_motivation(&Motivation {
                user_id: user.id.clone(),
                main_year_goal: Some("foo".into()),
                ..Default::default()
            })
            .unwrap();
        user
    };
    quiet_prefs(&harness, &user);

    let events = simulate(
        &harness,
        utc(2025, 1, 15, 0, 0),
        1440,
        Duration::minutes(1),
    )
    .await;

    assert_eq!(events.len(), 2, "expected two sends, got {events:?}");

    let principle = &events[0];
    assert!(principle.0 >= utc(2025, 1, 15, 4, 0) && principle.0 <= utc(2025, 1, 15, 4, 1));
    assert!(PRINCIPLES.iter().any(|p| principle.1.body.contains(p)));

    let motivation = &events[1];
    assert!(motivation.0 >= utc(2025, 1, 15, 5, 0) && motivation.0 <= utc(2025, 1, 15, 5, 1));
    assert!(motivation.1.body.contains("foo"));
}

// S3: a goal reminder at local 09:00 in UTC-5 fires at UTC 14:00 and names
// the goal.
#[tokio::test]
async fn s3_goal_reminder_respects_negative_offset() {
    let harness = harness();
    {
        let session = harness.store.session();
        let user = session.create_user(300, Some("UTC-5")).unwrap();
        let goal = session.create_goal(&user.id, "run 10k").unwrap();
        session.create_goal_reminder(goal, "09:00").unwrap();
    }

    let events = simulate(
        &harness,
        utc(2025, 1, 15, 0, 0),
        1440,
        Duration::minutes(1),
    )
    .await;

    let goal_sends: Vec<_> = events
        .iter()
        .filter(|(_, m)| m.body.contains("run 10k"))
        .collect();
    assert_eq!(goal_sends.len(), 1);
    let at = goal_sends[0].0;
    assert!(at >= utc(2025, 1, 15, 14, 0) && at <= utc(2025, 1, 15, 14, 1), "fired at {at}");
}

// S4: a non-daily todo reminds exactly once across the week, on its due date
// at the configured time.
#[tokio::test]
async fn s4_non_daily_todo_fires_only_on_due_date() {
    let harness = harness();
    {
        let session = harness.store.session();
        let user = session.create_user(400, None).unwrap();
        session
            .insert_todo(&NewTodo {
                user_id: user.id.clone(),
                title: "file the tax report".into(),
                description: None,
                due_date: date(2025, 1, 15),
                priority: Priority::High,
                is_daily: false,
                reminder_time: Some("18:00".into()),
                is_reminder_active: true,
            })
            .unwrap();
    }

    let events = simulate(
        &harness,
        utc(2025, 1, 13, 0, 0),
        7 * 1440,
        Duration::minutes(1),
    )
    .await;

    let todo_sends: Vec<_> = events
        .iter()
        .filter(|(_, m)| m.body.contains("file the tax report"))
        .collect();
    assert_eq!(todo_sends.len(), 1, "got {todo_sends:?}");
    let at = todo_sends[0].0;
    assert!(at >= utc(2025, 1, 15, 18, 0) && at <= utc(2025, 1, 15, 18, 1), "fired at {at}");
}

// S5: a daily todo reminds every day.
#[tokio::test]
async fn s5_daily_todo_fires_every_day() {
    let harness = harness();
    {
        let session = harness.store.session();
        let user = session.create_user(500, None).unwrap();
        session
            .insert_todo(&NewTodo {
                user_id: user.id.clone(),
                title: "morning stretch".into(),
                description: None,
                due_date: date(2025, 1, 13),
                priority: Priority::Medium,
                is_daily: true,
                reminder_time: Some("07:30".into()),
                is_reminder_active: true,
            })
            .unwrap();
    }

    let events = simulate(
        &harness,
        utc(2025, 1, 13, 0, 0),
        3 * 1440,
        Duration::minutes(1),
    )
    .await;

    let sends: Vec<_> = events
        .iter()
        .filter(|(_, m)| m.body.contains("morning stretch"))
        .collect();
    assert_eq!(sends.len(), 3, "got {sends:?}");
    for (i, (at, _)) in sends.iter().enumerate() {
        let day = 13 + i as u32;
        // The ±1-minute tolerance admits the 07:29 tick.
        assert!(
            *at >= utc(2025, 1, day, 7, 29) && *at <= utc(2025, 1, day, 7, 31),
            "day {day} fired at {at}"
        );
    }
}

// S6: with cooking days {Wed, Sun}, Tuesday gets the shopping reminder at the
// configured shopping time and no cooking reminder; Wednesday gets the
// cooking reminder at the cooking time.
#[tokio::test]
async fn s6_nutrition_shopping_eve_and_cooking_day() {
    let harness = harness();
    {
        let session = harness.store.session();
        let user = session.create_user(600, None).unwrap();
        session
            .upsert_nutrition(&NutritionReminder {
                id: 0,
                user_id: user.id.clone(),
                cooking_days: "0010001".parse().unwrap(), // Wed, Sun
                cooking_time: Some("19:00".into()),
                reminder_time: None,
                shopping_reminder_time: Some("17:00".into()),
                is_active: true,
                target_calories: None,
                body_goal: None,
            })
            .unwrap();
    }

    // 2025-01-14 is a Tuesday; simulate Tuesday and Wednesday.
    let events = simulate(
        &harness,
        utc(2025, 1, 14, 0, 0),
        2 * 1440,
        Duration::minutes(1),
    )
    .await;

    let shopping: Vec<_> = events.iter().filter(|(_, m)| m.body.contains("🛒")).collect();
    assert_eq!(shopping.len(), 1);
    let at = shopping[0].0;
    assert!(at >= utc(2025, 1, 14, 17, 0) && at <= utc(2025, 1, 14, 17, 1), "shopping at {at}");

    let cooking: Vec<_> = events.iter().filter(|(_, m)| m.body.contains("🍳")).collect();
    assert_eq!(cooking.len(), 1);
    let at = cooking[0].0;
    assert!(at >= utc(2025, 1, 15, 19, 0) && at <= utc(2025, 1, 15, 19, 1), "cooking at {at}");
    assert!(
        at.date_naive() == date(2025, 1, 15),
        "no cooking reminder on Tuesday"
    );
}

// S7: finance todo creation surviving a restart (fresh dedup cache) still
// creates exactly one todo per obligation thanks to the marker probe.
#[tokio::test]
async fn s7_finance_todos_idempotent_across_restart() {
    let store = Arc::new(Store::in_memory().unwrap());
    let sink = Arc::new(RecordingSink::default());
    let user = {
        let session = store.session();
        let user = session.create_user(700, None).unwrap();
        session
            .create_obligation(&user.id, Direction::Receive, "Alice", 120.0, date(2025, 1, 15))
            .unwrap();
        session
            .create_obligation(&user.id, Direction::Receive, "Bob", 80.0, date(2025, 1, 15))
            .unwrap();
        user
    };

    let first = Scheduler::new(context(&store, &sink));
    first.tick(utc(2025, 1, 15, 6, 0)).await;

    // Restart: a new scheduler with an empty dedup cache over the same store.
    let second = Scheduler::new(context(&store, &sink));
    second.tick(utc(2025, 1, 15, 6, 0)).await;

    let todos = store.session().todos_on(&user.id, date(2025, 1, 15)).unwrap();
    let derived: Vec<_> = todos
        .iter()
        .filter(|t| t.title.starts_with("Collect"))
        .collect();
    assert_eq!(derived.len(), 2, "one todo per creditor: {todos:?}");
    assert!(derived.iter().all(|t| t.priority == Priority::High));
}

// --- properties ------------------------------------------------------------

// Property 3: a false preference flag suppresses exactly its own job.
#[tokio::test]
async fn preference_gating_is_per_job() {
    let harness = harness();
    let user = {
        let session = harness.store.session();
        let user = session.create_user(800, None).unwrap();
        session
            .set_preference(&user.id, "daily_principle", false)
            .unwrap();
        session
            .set_preference(&user.id, "todo_evening", false)
            .unwrap();
        session
            .set_preference(&user.id, "finance_reminders", false)
            .unwrap();
        user
    };

    let events = simulate(
        &harness,
        utc(2025, 1, 15, 0, 0),
        1440,
        Duration::minutes(1),
    )
    .await;

    // health_daily (default true) fires at 09:00; daily_principle never does.
    assert_eq!(events.len(), 1, "got {events:?}");
    let (at, message) = &events[0];
    assert!(*at >= utc(2025, 1, 15, 9, 0) && *at <= utc(2025, 1, 15, 9, 1));
    assert!(message.body.contains("check-in"));
    assert_eq!(message.chat_id, user.chat_id);
}

// Property 8: two goal reminders in the same minute both dispatch; neither
// suppresses the other.
#[tokio::test]
async fn two_goal_reminders_same_minute_both_fire() {
    let harness = harness();
    {
        let session = harness.store.session();
        let user = session.create_user(900, None).unwrap();
        let first = session.create_goal(&user.id, "learn French").unwrap();
        session.create_goal_reminder(first, "09:30").unwrap();
        let second = session.create_goal(&user.id, "swim twice a week").unwrap();
        session.create_goal_reminder(second, "09:30").unwrap();
    }

    harness.scheduler.tick(utc(2025, 1, 15, 9, 30)).await;

    let messages = harness.sink.snapshot();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().any(|m| m.body.contains("learn French")));
    assert!(messages.iter().any(|m| m.body.contains("swim twice a week")));
}

// Property 7: with the LLM stubbed to raise, the daily reset still creates
// goal tasks (fallback titles) and marks its dedup key.
#[tokio::test]
async fn reset_survives_llm_outage_with_fallback_titles() {
    let harness = harness();
    let user = {
        let session = harness.store.session();
        let user = session.create_user(1000, None).unwrap();
        session.create_goal(&user.id, "write a book").unwrap();
        user
    };

    harness.scheduler.tick(utc(2025, 1, 15, 6, 0)).await;
    harness.scheduler.tick(utc(2025, 1, 15, 6, 1)).await;

    let todos = harness
        .store
        .session()
        .todos_on(&user.id, date(2025, 1, 15))
        .unwrap();
    let tasks: Vec<_> = todos
        .iter()
        .filter(|t| t.title == "work on goal: write a book")
        .collect();
    assert_eq!(tasks.len(), 1, "exactly one fallback-titled task: {todos:?}");
    assert_eq!(tasks[0].priority, Priority::High);
    assert!(tasks[0].is_daily);
}

// A failed send leaves the dedup key unset, so the next minute retries and
// the total stays at one delivery.
#[tokio::test]
async fn failed_send_retries_next_minute() {
    let harness = harness();
    let user = {
        let session = harness.store.session();
        session.create_user(1100, None).unwrap()
    };
    quiet_prefs(&harness, &user);

    harness.sink.set_failing(true);
    harness.scheduler.tick(utc(2025, 1, 15, 7, 0)).await;
    assert!(harness.sink.snapshot().is_empty());

    harness.sink.set_failing(false);
    harness.scheduler.tick(utc(2025, 1, 15, 7, 1)).await;
    let messages = harness.sink.snapshot();
    assert_eq!(messages.len(), 1);
    assert!(PRINCIPLES.iter().any(|p| messages[0].body.contains(p)));
}

// Property 5: invoking the finance materializer repeatedly within one day
// yields one todo per due obligation.
#[tokio::test]
async fn finance_materializer_is_idempotent() {
    let store = Arc::new(Store::in_memory().unwrap());
    let sink = Arc::new(RecordingSink::default());
    let ctx = context(&store, &sink);
    let today = date(2025, 1, 15);

    let user = {
        let session = store.session();
        let user = session.create_user(1200, None).unwrap();
        session
            .create_obligation(&user.id, Direction::Pay, "Carol", 42.0, today)
            .unwrap();
        session
            .create_obligation(&user.id, Direction::Receive, "Dave", 10.0, date(2025, 1, 20))
            .unwrap();
        user
    };

    for _ in 0..5 {
        materialize::finance_todos(&ctx, &user, today).unwrap();
    }

    let todos = store.session().todos_on(&user.id, today).unwrap();
    assert_eq!(todos.len(), 1, "only the due obligation materializes: {todos:?}");
    assert!(todos[0].title.starts_with("Repay"));
    assert!(todos[0]
        .description
        .as_deref()
        .unwrap_or_default()
        .contains("{pay:"));
}

// The daily reset un-completes daily todos and re-dates them to today.
#[tokio::test]
async fn reset_recycles_daily_todos() {
    let harness = harness();
    let user = {
        let session = harness.store.session();
        let user = session.create_user(1300, None).unwrap();
        let id = session
            .insert_todo(&NewTodo {
                user_id: user.id.clone(),
                title: "journal".into(),
                description: None,
                due_date: date(2025, 1, 14),
                priority: Priority::Low,
                is_daily: true,
                reminder_time: None,
                is_reminder_active: false,
            })
            .unwrap();
        session.set_todo_completed(id, true).unwrap();
        user
    };

    harness.scheduler.tick(utc(2025, 1, 15, 6, 0)).await;

    let todos = harness
        .store
        .session()
        .todos_on(&user.id, date(2025, 1, 15))
        .unwrap();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].title, "journal");
    assert!(!todos[0].is_completed);
}
