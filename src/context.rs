//! Compact learner summary embedded in the tutor's system prompt

use std::fmt::Write;

use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use crate::db::{self, AlgoStore, TagProgressRow};
use crate::progress::{
    completion_rate, current_streak, fail_soft, get_recent_activity, total_solved,
};

const TOPIC_COUNT: usize = 3;
const RECENT_DAYS: i64 = 7;
const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    pub username: Option<String>,
    pub points: i32,
    pub total_solved: i64,
    pub current_streak: u32,
    pub strongest_topics: Vec<String>,
    pub weakest_topics: Vec<String>,
    pub recently_solved: Vec<String>,
    /// Plain-text rendering for the system prompt
    pub summary: String,
}

/// Topics with the most solved problems, best first
pub fn strongest_topics(tags: &[TagProgressRow], n: usize) -> Vec<String> {
    let mut solved: Vec<&TagProgressRow> = tags.iter().filter(|t| t.solved_problems > 0).collect();
    solved.sort_by(|a, b| {
        b.solved_problems
            .cmp(&a.solved_problems)
            .then_with(|| a.tag_name.cmp(&b.tag_name))
    });
    solved.into_iter().take(n).map(|t| t.tag_name.clone()).collect()
}

/// Topics with the lowest completion rate, weakest first
pub fn weakest_topics(tags: &[TagProgressRow], n: usize) -> Vec<String> {
    let mut available: Vec<(&TagProgressRow, f64)> = tags
        .iter()
        .filter(|t| t.total_problems > 0)
        .map(|t| (t, completion_rate(t.solved_problems, t.total_problems)))
        .collect();
    available.sort_by(|(a, rate_a), (b, rate_b)| {
        rate_a
            .total_cmp(rate_b)
            .then_with(|| a.tag_name.cmp(&b.tag_name))
    });
    available
        .into_iter()
        .take(n)
        .map(|(t, _)| t.tag_name.clone())
        .collect()
}

/// Render the summary block; empty lists are left out
pub fn render_summary(context: &UserContext) -> String {
    let mut out = String::new();
    let name = context.username.as_deref().unwrap_or("the learner");
    let _ = writeln!(out, "Learner: {}", name);
    let _ = writeln!(out, "Points: {}", context.points);
    let _ = writeln!(out, "Problems solved: {}", context.total_solved);
    let _ = writeln!(out, "Current streak: {} day(s)", context.current_streak);
    if !context.strongest_topics.is_empty() {
        let _ = writeln!(out, "Strongest topics: {}", context.strongest_topics.join(", "));
    }
    if !context.weakest_topics.is_empty() {
        let _ = writeln!(out, "Topics needing work: {}", context.weakest_topics.join(", "));
    }
    if !context.recently_solved.is_empty() {
        let _ = writeln!(out, "Recently solved: {}", context.recently_solved.join(", "));
    }
    out.trim_end().to_string()
}

/// Build the learner summary for `user_id`
///
/// # Errors
///
/// Fails only when the id is blank or the user cannot be loaded; the
/// statistics fall back to empty values.
pub async fn get_user_context_for_prompt(
    store: &AlgoStore,
    user_id: &str,
) -> db::Result<UserContext> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(db::Error::ValidationError("user id is required".to_string()));
    }
    let user = store
        .user_info(user_id)
        .await?
        .ok_or_else(|| db::Error::NotFoundError(format!("user {}", user_id)))?;

    let counts = fail_soft(
        store.submission_counts(user_id, None).await,
        "submission breakdown",
        user_id,
    );
    let tags = fail_soft(store.tag_progress(user_id, None).await, "tag progress", user_id);
    let days = fail_soft(store.accepted_days(user_id).await, "streak", user_id);
    let recent = fail_soft(
        get_recent_activity(store, user_id, RECENT_DAYS).await,
        "recent activity",
        user_id,
    );

    let mut recently_solved: Vec<String> = Vec::new();
    for activity in recent.into_iter().filter(|a| a.was_accepted) {
        if recently_solved.len() == RECENT_LIMIT {
            break;
        }
        if !recently_solved.contains(&activity.question_slug) {
            recently_solved.push(activity.question_slug);
        }
    }

    let mut context = UserContext {
        username: user.username,
        points: user.individual_points.unwrap_or(0),
        total_solved: total_solved(&counts),
        current_streak: current_streak(&days, Utc::now().date_naive()),
        strongest_topics: strongest_topics(&tags, TOPIC_COUNT),
        weakest_topics: weakest_topics(&tags, TOPIC_COUNT),
        recently_solved,
        summary: String::new(),
    };
    context.summary = render_summary(&context);
    debug!(user_id, "user context built");
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str, total: i64, solved: i64) -> TagProgressRow {
        TagProgressRow {
            tag_name: name.to_string(),
            total_problems: total,
            solved_problems: solved,
            easy_count: 0,
            medium_count: 0,
            hard_count: 0,
        }
    }

    #[test]
    fn test_strongest_topics() {
        let tags = vec![
            tag("ARRAYS", 10, 5),
            tag("GRAPHS", 10, 0),
            tag("DP", 10, 7),
            tag("STRINGS", 4, 5),
            tag("TREES", 8, 1),
        ];
        assert_eq!(strongest_topics(&tags, 3), vec!["DP", "ARRAYS", "STRINGS"]);
    }

    #[test]
    fn test_weakest_topics_skip_empty_topics() {
        let tags = vec![
            tag("ARRAYS", 10, 5),
            tag("EMPTY", 0, 0),
            tag("GRAPHS", 10, 0),
            tag("DP", 10, 1),
            tag("HEAPS", 4, 0),
        ];
        assert_eq!(weakest_topics(&tags, 3), vec!["GRAPHS", "HEAPS", "DP"]);
    }

    #[test]
    fn test_render_summary() {
        let context = UserContext {
            username: Some("ada".to_string()),
            points: 120,
            total_solved: 14,
            current_streak: 3,
            strongest_topics: vec!["ARRAYS".to_string()],
            weakest_topics: vec![],
            recently_solved: vec!["two-sum".to_string(), "3sum".to_string()],
            summary: String::new(),
        };
        let summary = render_summary(&context);
        assert!(summary.starts_with("Learner: ada\n"));
        assert!(summary.contains("Current streak: 3 day(s)"));
        assert!(summary.contains("Strongest topics: ARRAYS"));
        assert!(!summary.contains("Topics needing work"));
        assert!(summary.ends_with("Recently solved: two-sum, 3sum"));
    }

    #[test]
    fn test_render_summary_without_username() {
        let summary = render_summary(&UserContext::default());
        assert!(summary.starts_with("Learner: the learner"));
    }
}
