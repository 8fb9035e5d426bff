//! Topic-filtered practice questions with per-user status

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::db::{self, AlgoStore, QuestionFilter, QuestionRow};

pub const DEFAULT_QUESTION_LIMIT: i64 = 50;
pub const MAX_QUESTION_LIMIT: i64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionWithStatus {
    #[serde(flatten)]
    pub question: QuestionRow,
    pub is_solved: bool,
    pub is_bookmarked: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredQuestions {
    pub questions_with_solved_status: Vec<QuestionWithStatus>,
    pub individual_points: i32,
    /// Matching questions before the limit was applied
    pub total_count: i64,
}

/// Clamp a requested page size into `1..=100`, defaulting to 50
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_QUESTION_LIMIT)
        .clamp(1, MAX_QUESTION_LIMIT)
}

/// Mark each question solved or bookmarked by set membership
pub fn overlay_status(
    questions: Vec<QuestionRow>,
    solved: &HashSet<String>,
    bookmarked: &HashSet<String>,
) -> Vec<QuestionWithStatus> {
    questions
        .into_iter()
        .map(|question| QuestionWithStatus {
            is_solved: solved.contains(&question.id),
            is_bookmarked: bookmarked.contains(&question.id),
            question,
        })
        .collect()
}

/// Questions tagged with any of `topics`, newest first
///
/// # Errors
///
/// `ValidationError` when no topic or user id is given; database errors are
/// passed through.
pub async fn get_filtered_questions(
    store: &AlgoStore,
    topics: &[String],
    user_id: &str,
    limit: Option<i64>,
    unsolved_only: bool,
) -> db::Result<FilteredQuestions> {
    let topics: Vec<String> = topics
        .iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if topics.is_empty() {
        return Err(db::Error::ValidationError(
            "at least one topic is required".to_string(),
        ));
    }
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(db::Error::ValidationError("user id is required".to_string()));
    }

    let filter = QuestionFilter {
        topics,
        user_id: user_id.to_string(),
        limit: clamp_limit(limit),
        unsolved_only,
    };
    let (questions, total_count) = store.filtered_questions(&filter).await?;

    let ids: Vec<String> = questions.iter().map(|q| q.id.clone()).collect();
    let solved = store.solved_question_ids(user_id, &ids).await?;
    let bookmarked = store.bookmarked_question_ids(user_id, &ids).await?;
    let individual_points = store.individual_points(user_id).await?.unwrap_or(0);

    debug!(
        user_id,
        returned = questions.len(),
        total_count,
        unsolved_only,
        "filtered questions fetched"
    );

    Ok(FilteredQuestions {
        questions_with_solved_status: overlay_status(questions, &solved, &bookmarked),
        individual_points,
        total_count,
    })
}

/// Every topic name, alphabetical
pub async fn get_tags(store: &AlgoStore) -> db::Result<Vec<String>> {
    store.tag_names().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn question(id: &str) -> QuestionRow {
        QuestionRow {
            id: id.to_string(),
            title: format!("Question {}", id),
            slug: format!("question-{}", id),
            difficulty: "EASY".to_string(),
            points: Some(4),
            leetcode_url: None,
            codeforces_url: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            tags: vec!["ARRAYS".to_string()],
        }
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), 50);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-5)), 1);
        assert_eq!(clamp_limit(Some(20)), 20);
        assert_eq!(clamp_limit(Some(500)), 100);
    }

    #[test]
    fn test_overlay_status() {
        let solved: HashSet<String> = ["a".to_string()].into_iter().collect();
        let bookmarked: HashSet<String> = ["a".to_string(), "c".to_string()].into_iter().collect();

        let overlaid = overlay_status(
            vec![question("a"), question("b"), question("c")],
            &solved,
            &bookmarked,
        );

        let flags: Vec<_> = overlaid
            .iter()
            .map(|q| (q.question.id.as_str(), q.is_solved, q.is_bookmarked))
            .collect();
        assert_eq!(
            flags,
            vec![("a", true, true), ("b", false, false), ("c", false, true)]
        );
    }

    #[test]
    fn test_question_with_status_wire_format() {
        let json = serde_json::to_value(QuestionWithStatus {
            question: question("a"),
            is_solved: true,
            is_bookmarked: false,
        })
        .unwrap();
        assert_eq!(json["slug"], "question-a");
        assert_eq!(json["isSolved"], true);
        assert_eq!(json["isBookmarked"], false);
        assert_eq!(json["tags"][0], "ARRAYS");
    }
}
