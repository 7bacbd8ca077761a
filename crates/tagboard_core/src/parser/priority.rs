//! Task-marker parsing.
//!
//! # Responsibility
//! - Recognize `!`/`!!`/`!!!` priority marks in note text.
//! - Resolve the optional due token glued to the mark.
//! - Strip the first mark from the stored text.
//!
//! # Invariants
//! - Only the first mark in the text is honored and removed.
//! - An unparseable due token never fails the note; the priority is kept and
//!   the due date is simply absent.

use chrono::{Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// Due token alternatives are ordered longest-first so `2024-01-05` is not
/// half-consumed by the `MM-DD` branch.
static TASK_MARK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^|\s)(!{1,3})(\d{4}-\d{2}-\d{2}|\d{2}-\d{2}-\d{2}|\d{2}-\d{2}|today|tomorrow|week)?")
        .expect("valid task marker regex")
});

use crate::model::note::TaskPriority;

/// Result of scanning note text for a task marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskAnnotation {
    /// Priority from the mark length, `None` when no mark was present.
    pub priority: TaskPriority,
    /// Resolved due date, if the mark carried a parseable due token.
    pub duedate: Option<NaiveDate>,
    /// Text with the first mark (and its due token) removed.
    pub text: String,
}

/// Scans `text` for the first task mark, resolving relative due tokens
/// against `today`.
pub fn extract_task_annotation(text: &str, today: NaiveDate) -> TaskAnnotation {
    let Some(caps) = TASK_MARK_RE.captures(text) else {
        return TaskAnnotation {
            priority: TaskPriority::None,
            duedate: None,
            text: text.to_string(),
        };
    };

    let priority = match caps[2].len() {
        1 => TaskPriority::Low,
        2 => TaskPriority::Mid,
        _ => TaskPriority::High,
    };
    let duedate = caps
        .get(3)
        .and_then(|token| resolve_due_token(token.as_str(), today));
    let text = TASK_MARK_RE.replacen(text, 1, "$1").trim().to_string();

    TaskAnnotation {
        priority,
        duedate,
        text,
    }
}

/// Resolves one due token. `MM-DD` lands in the current year; `YY-MM-DD`
/// and `YYYY-MM-DD` are absolute.
fn resolve_due_token(token: &str, today: NaiveDate) -> Option<NaiveDate> {
    match token {
        "today" => Some(today),
        "tomorrow" => today.succ_opt(),
        "week" => today.checked_add_days(Days::new(7)),
        _ => match token.len() {
            5 => NaiveDate::parse_from_str(&format!("{}-{token}", today.format("%Y")), "%Y-%m-%d")
                .ok(),
            8 => NaiveDate::parse_from_str(token, "%y-%m-%d").ok(),
            _ => NaiveDate::parse_from_str(token, "%Y-%m-%d").ok(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{extract_task_annotation, TaskAnnotation};
    use crate::model::note::TaskPriority;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    #[test]
    fn plain_text_is_not_a_task() {
        let scanned = extract_task_annotation("buy milk", today());
        assert_eq!(
            scanned,
            TaskAnnotation {
                priority: TaskPriority::None,
                duedate: None,
                text: "buy milk".to_string(),
            }
        );
    }

    #[test]
    fn mark_length_maps_to_priority() {
        assert_eq!(
            extract_task_annotation("! low", today()).priority,
            TaskPriority::Low
        );
        assert_eq!(
            extract_task_annotation("!! mid", today()).priority,
            TaskPriority::Mid
        );
        assert_eq!(
            extract_task_annotation("!!! high", today()).priority,
            TaskPriority::High
        );
    }

    #[test]
    fn relative_due_tokens_resolve_against_today() {
        assert_eq!(
            extract_task_annotation("!today pay rent", today()).duedate,
            Some(today())
        );
        assert_eq!(
            extract_task_annotation("!tomorrow pay rent", today()).duedate,
            NaiveDate::from_ymd_opt(2024, 3, 11)
        );
        assert_eq!(
            extract_task_annotation("!week pay rent", today()).duedate,
            NaiveDate::from_ymd_opt(2024, 3, 17)
        );
    }

    #[test]
    fn short_date_tokens_fill_in_the_year() {
        assert_eq!(
            extract_task_annotation("!04-01 file taxes", today()).duedate,
            NaiveDate::from_ymd_opt(2024, 4, 1)
        );
        assert_eq!(
            extract_task_annotation("!25-04-01 file taxes", today()).duedate,
            NaiveDate::from_ymd_opt(2025, 4, 1)
        );
        assert_eq!(
            extract_task_annotation("!2026-04-01 file taxes", today()).duedate,
            NaiveDate::from_ymd_opt(2026, 4, 1)
        );
    }

    #[test]
    fn unparseable_due_token_keeps_priority_and_strips_mark() {
        let scanned = extract_task_annotation("!99-99 broken", today());
        assert_eq!(scanned.priority, TaskPriority::Low);
        assert_eq!(scanned.duedate, None);
        assert_eq!(scanned.text, "broken");
    }

    #[test]
    fn only_first_mark_is_stripped() {
        let scanned = extract_task_annotation("! fix roof before !! rain", today());
        assert_eq!(scanned.priority, TaskPriority::Low);
        assert_eq!(scanned.text, "fix roof before !! rain");
    }

    #[test]
    fn mid_text_mark_counts_when_whitespace_preceded() {
        let scanned = extract_task_annotation("call plumber !!today leak", today());
        assert_eq!(scanned.priority, TaskPriority::Mid);
        assert_eq!(scanned.duedate, Some(today()));
        // Stripping keeps the captured leading space and the one after the
        // token, so a mid-text mark leaves a double space behind.
        assert_eq!(scanned.text, "call plumber  leak");
    }
}
