//! Perfect-day planner — the interactive "plan my day" feature.
//!
//! Takes the user's motivation, active goals, and today's todos, asks the
//! model for a schedule, and parses the answer back into structured rows.
//! Reminder-bearing todos must appear at their exact configured times; a plan
//! that moves one is rejected and the deterministic fallback is used instead.

use std::str::FromStr;

use chrono::NaiveDate;

use mentor_core::types::{ClockTime, Priority};
use mentor_store::types::{Goal, Motivation, Todo};
use mentor_store::{Store, StoreError};

use crate::llm::{meets_quality, Llm};

/// Section markers the quality gate requires in a model response.
const SECTION_MARKERS: [&str; 2] = ["Schedule:", "Notes:"];

const PLANNER_SYSTEM: &str = "You are a personal productivity assistant. \
Reply with a 'Schedule:' section of '- HH:MM title' lines followed by a \
'Notes:' section with one short paragraph. Tasks that already carry a time \
must keep exactly that time. Fill gaps with the remaining tasks ordered by \
priority. No other text.";

/// One parsed schedule row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedItem {
    pub title: String,
    pub time: Option<ClockTime>,
    pub priority: Priority,
}

/// Order todos for planning: reminder time ascending (unscheduled last),
/// then priority descending, then insertion order.
pub fn order_for_planning(todos: &mut [Todo]) {
    todos.sort_by(|a, b| {
        let ta = a.reminder_time.as_deref().and_then(|t| ClockTime::from_str(t).ok());
        let tb = b.reminder_time.as_deref().and_then(|t| ClockTime::from_str(t).ok());
        match (ta, tb) {
            (Some(x), Some(y)) => x.cmp(&y).then(b.priority.cmp(&a.priority)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)),
        }
    });
}

/// Build the planning prompt. Scheduled todos are listed with their fixed
/// times; unscheduled ones by priority.
pub fn build_prompt(motivation: Option<&Motivation>, goals: &[Goal], todos: &[Todo]) -> String {
    let mut prompt = String::from("Plan my day.\n");

    if let Some(motivation) = motivation {
        for (label, text) in motivation.filled_fields() {
            prompt.push_str(&format!("My {label}: {text}\n"));
        }
    }

    if !goals.is_empty() {
        prompt.push_str("Active goals:\n");
        for goal in goals {
            prompt.push_str(&format!("- {}\n", goal.title));
        }
    }

    let (scheduled, unscheduled): (Vec<&Todo>, Vec<&Todo>) = todos
        .iter()
        .partition(|t| t.reminder_time.is_some());

    if !scheduled.is_empty() {
        prompt.push_str("Fixed-time tasks (keep these times exactly):\n");
        for todo in &scheduled {
            let time = todo.reminder_time.as_deref().unwrap_or_default();
            prompt.push_str(&format!("- {} {} [{}]\n", time, todo.title, todo.priority));
        }
    }
    if !unscheduled.is_empty() {
        prompt.push_str("Flexible tasks (place by priority):\n");
        for todo in &unscheduled {
            prompt.push_str(&format!("- {} [{}]\n", todo.title, todo.priority));
        }
    }

    prompt
}

/// Parse a model response into schedule rows.
///
/// Accepts `- HH:MM title [priority]` lines inside the `Schedule:` section;
/// bullets and priority tags are optional, a line without a leading time
/// parses as an unscheduled item. Everything after `Notes:` is ignored.
pub fn parse_schedule(text: &str) -> Vec<PlannedItem> {
    let mut items = Vec::new();
    let mut in_schedule = true;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("Schedule:") {
            continue;
        }
        if line.starts_with("Notes:") {
            in_schedule = false;
        }
        if !in_schedule {
            continue;
        }

        let line = line
            .trim_start_matches(['-', '*', '•'])
            .trim_start();

        let (time, rest) = match line.split_once(' ') {
            Some((head, rest)) => match ClockTime::from_str(head) {
                Ok(t) => (Some(t), rest.trim()),
                Err(_) => (None, line),
            },
            None => (None, line),
        };

        let (title, priority) = split_priority_tag(rest);
        if title.is_empty() {
            continue;
        }
        items.push(PlannedItem {
            title: title.to_string(),
            time,
            priority,
        });
    }

    items
}

/// Strip a trailing `[high|medium|low]` tag, if present.
fn split_priority_tag(s: &str) -> (&str, Priority) {
    if let Some(open) = s.rfind('[') {
        if let Some(tag) = s[open..].strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            if let Ok(priority) = Priority::from_str(tag) {
                return (s[..open].trim_end(), priority);
            }
        }
    }
    (s, Priority::Medium)
}

/// A plan is valid only when every reminder-bearing todo appears at its
/// exact configured time.
pub fn plan_keeps_fixed_times(items: &[PlannedItem], todos: &[Todo]) -> bool {
    todos
        .iter()
        .filter_map(|todo| {
            let time = ClockTime::from_str(todo.reminder_time.as_deref()?).ok()?;
            Some((todo, time))
        })
        .all(|(todo, time)| {
            items
                .iter()
                .any(|item| item.time == Some(time) && item.title.contains(todo.title.as_str()))
        })
}

/// Deterministic plan used when the model is unavailable, scores low, or
/// moves a fixed-time task.
pub fn fallback_plan(todos: &[Todo]) -> String {
    let mut out = String::from("Schedule:\n");
    let mut ordered: Vec<Todo> = todos.to_vec();
    order_for_planning(&mut ordered);
    for todo in &ordered {
        match todo.reminder_time.as_deref() {
            Some(time) => out.push_str(&format!("- {} {} [{}]\n", time, todo.title, todo.priority)),
            None => out.push_str(&format!("- {} [{}]\n", todo.title, todo.priority)),
        }
    }
    out.push_str("Notes:\nWork top priorities first; keep fixed-time tasks on time.\n");
    out
}

/// Clamp `text` to at most `max_bytes`, cutting on a line boundary where
/// possible so the transport never rejects the message.
pub fn clamp_to_limit(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut cut = max_bytes;
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    let head = &text[..cut];
    match head.rfind('\n') {
        Some(nl) if nl > 0 => head[..nl].to_string(),
        _ => head.to_string(),
    }
}

/// Load a user's motivation, active goals, and today's open todos, then
/// compose the plan. The session is scoped — dropped before the LLM await.
pub async fn plan_for_user(
    llm: &Llm,
    store: &Store,
    user_id: &str,
    today: NaiveDate,
    max_bytes: usize,
) -> Result<String, StoreError> {
    let (motivation, goals, todos) = {
        let session = store.session();
        let motivation = session.motivation(user_id)?;
        let goals = session.active_goals(user_id)?;
        let todos: Vec<Todo> = session
            .todos_on(user_id, today)?
            .into_iter()
            .filter(|t| !t.is_completed)
            .collect();
        (motivation, goals, todos)
    };
    Ok(plan_perfect_day(llm, motivation.as_ref(), &goals, &todos, max_bytes).await)
}

/// Compose the full perfect-day message, clamped to the transport limit.
pub async fn plan_perfect_day(
    llm: &Llm,
    motivation: Option<&Motivation>,
    goals: &[Goal],
    todos: &[Todo],
    max_bytes: usize,
) -> String {
    let mut ordered: Vec<Todo> = todos.to_vec();
    order_for_planning(&mut ordered);

    let prompt = build_prompt(motivation, goals, &ordered);
    let fallback = fallback_plan(&ordered);

    let response = llm
        .complete_or(PLANNER_SYSTEM, &prompt, 1024, &fallback)
        .await;

    let plan = if meets_quality(&response, &SECTION_MARKERS)
        && plan_keeps_fixed_times(&parse_schedule(&response), &ordered)
    {
        response
    } else {
        fallback
    };

    clamp_to_limit(&plan, max_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn todo(id: i64, title: &str, time: Option<&str>, priority: Priority) -> Todo {
        Todo {
            id,
            user_id: "u1".into(),
            title: title.into(),
            description: None,
            due_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            priority,
            is_daily: false,
            reminder_time: time.map(String::from),
            is_reminder_active: time.is_some(),
            is_completed: false,
        }
    }

    #[test]
    fn parses_representative_transcript() {
        let text = "Schedule:\n\
                    - 07:30 morning stretch [high]\n\
                    - 09:00 reply to Carol\n\
                    - deep work block [high]\n\
                    Notes:\n\
                    Front-load the hard work.";
        let items = parse_schedule(text);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].time, Some(ClockTime::new(7, 30)));
        assert_eq!(items[0].title, "morning stretch");
        assert_eq!(items[0].priority, Priority::High);
        assert_eq!(items[1].priority, Priority::Medium);
        assert_eq!(items[2].time, None);
        assert_eq!(items[2].title, "deep work block");
    }

    #[test]
    fn parser_ignores_notes_section() {
        let text = "Schedule:\n- 08:00 breakfast\nNotes:\n- 09:00 this is prose, not a task";
        let items = parse_schedule(text);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn ordering_puts_scheduled_first_then_priority() {
        let mut todos = vec![
            todo(1, "flexible low", None, Priority::Low),
            todo(2, "evening", Some("18:00"), Priority::Low),
            todo(3, "flexible high", None, Priority::High),
            todo(4, "morning", Some("07:30"), Priority::Medium),
        ];
        order_for_planning(&mut todos);
        let titles: Vec<&str> = todos.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["morning", "evening", "flexible high", "flexible low"]);
    }

    #[test]
    fn fixed_time_deviation_is_detected() {
        let todos = vec![todo(1, "standup", Some("09:00"), Priority::High)];
        let good = parse_schedule("Schedule:\n- 09:00 standup\nNotes:\nok");
        let moved = parse_schedule("Schedule:\n- 09:15 standup\nNotes:\nok");
        assert!(plan_keeps_fixed_times(&good, &todos));
        assert!(!plan_keeps_fixed_times(&moved, &todos));
    }

    #[test]
    fn fallback_lists_fixed_times_exactly() {
        let todos = vec![
            todo(1, "standup", Some("09:00"), Priority::High),
            todo(2, "read", None, Priority::Low),
        ];
        let plan = fallback_plan(&todos);
        assert!(plan.contains("- 09:00 standup [high]"));
        assert!(plan.contains("- read [low]"));
        assert!(plan.starts_with("Schedule:"));
        assert!(plan.contains("Notes:"));
    }

    #[test]
    fn clamp_respects_limit_and_lines() {
        let text = "line one\nline two\nline three";
        let clamped = clamp_to_limit(text, 15);
        assert!(clamped.len() <= 15);
        assert_eq!(clamped, "line one");
        assert_eq!(clamp_to_limit("short", 100), "short");
    }

    struct DownProvider;

    #[async_trait::async_trait]
    impl crate::provider::LlmProvider for DownProvider {
        fn name(&self) -> &str {
            "down"
        }
        async fn complete(
            &self,
            _req: &crate::provider::CompletionRequest,
        ) -> Result<String, crate::provider::ProviderError> {
            Err(crate::provider::ProviderError::Unavailable("down".into()))
        }
    }

    #[tokio::test]
    async fn plan_for_user_falls_back_without_llm() {
        let store = Store::in_memory().unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let user = {
            let session = store.session();
            let user = session.create_user(42, None).unwrap();
            session
                .insert_todo(&mentor_store::types::NewTodo {
                    user_id: user.id.clone(),
                    title: "standup".into(),
                    description: None,
                    due_date: today,
                    priority: Priority::High,
                    is_daily: false,
                    reminder_time: Some("09:00".into()),
                    is_reminder_active: true,
                })
                .unwrap();
            user
        };

        let llm = Llm::new(Box::new(DownProvider), "m".into());
        let plan = plan_for_user(&llm, &store, &user.id, today, 4000)
            .await
            .unwrap();
        assert!(!plan.is_empty());
        assert!(plan.contains("- 09:00 standup [high]"));
        assert!(plan.starts_with("Schedule:"));
    }
}
