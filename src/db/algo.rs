//! Read access to the practice platform's database
//!
//! Enum-typed columns are cast to `text` in SQL so the store works whether the
//! platform stores them as Postgres enums or plain strings.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use deadpool_postgres::Pool;
use serde::Serialize;
use tokio_postgres::Row;

use crate::db::error::Result;

/// Credentials row used by login
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub password: String,
    pub username: Option<String>,
}

/// Profile summary joined from `"User"` and `"UserConfig"`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub username: Option<String>,
    pub leetcode_username: Option<String>,
    pub enrollment_num: Option<String>,
    pub section: Option<String>,
    pub individual_points: Option<i32>,
    pub leetcode_questions_solved: Option<i32>,
    pub codeforces_questions_solved: Option<i32>,
    pub rank: Option<i32>,
    pub user_brief: Option<String>,
}

/// Submission count for one (difficulty, status) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifficultyCount {
    pub difficulty: String,
    pub status: String,
    pub count: i64,
}

/// Per-tag solved counts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagProgressRow {
    pub tag_name: String,
    pub total_problems: i64,
    pub solved_problems: i64,
    pub easy_count: i64,
    pub medium_count: i64,
    pub hard_count: i64,
}

/// One submission joined with its question
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRow {
    pub id: String,
    pub question_id: String,
    pub status: String,
    pub score: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub question_slug: String,
    pub difficulty: String,
    pub points: Option<i32>,
    pub leetcode_url: Option<String>,
}

/// A question with its tag names
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRow {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub difficulty: String,
    pub points: Option<i32>,
    pub leetcode_url: Option<String>,
    pub codeforces_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub tags: Vec<String>,
}

/// Parameters for the tag-filtered question lookup
#[derive(Debug, Clone)]
pub struct QuestionFilter {
    pub topics: Vec<String>,
    pub user_id: String,
    pub limit: i64,
    pub unsolved_only: bool,
}

/// Access to the algo database
#[derive(Clone)]
pub struct AlgoStore {
    pool: Pool,
}

impl AlgoStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Look up login credentials; `email` must already be normalised
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"SELECT id::text AS id, email, password, username
                   FROM "User" WHERE email = $1 LIMIT 1"#,
                &[&email],
            )
            .await?;
        row.map(|row| -> Result<UserRecord> {
            Ok(UserRecord {
                id: row.try_get("id")?,
                email: row.try_get("email")?,
                password: row.try_get("password")?,
                username: row.try_get("username")?,
            })
        })
        .transpose()
    }

    /// Record a login by bumping `"updatedAt"`
    pub async fn touch_user(&self, user_id: &str) -> Result<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                r#"UPDATE "User" SET "updatedAt" = $2 WHERE id::text = $1"#,
                &[&user_id, &Utc::now().naive_utc()],
            )
            .await?;
        Ok(())
    }

    pub async fn user_info(&self, user_id: &str) -> Result<Option<UserInfo>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"SELECT u.username,
                          u."leetcodeUsername" AS leetcode_username,
                          u."enrollmentNum"::text AS enrollment_num,
                          u.section::text AS section,
                          u."individualPoints"::int AS individual_points,
                          uc.leetcode_questions_solved::int AS leetcode_questions_solved,
                          uc.codeforces_questions_solved::int AS codeforces_questions_solved,
                          uc.rank::int AS rank,
                          uc.user_brief
                   FROM "User" u
                   LEFT JOIN "UserConfig" uc ON uc."userEmail" = u.email
                   WHERE u.id::text = $1
                   LIMIT 1"#,
                &[&user_id],
            )
            .await?;
        row.map(|row| -> Result<UserInfo> {
            Ok(UserInfo {
                username: row.try_get("username")?,
                leetcode_username: row.try_get("leetcode_username")?,
                enrollment_num: row.try_get("enrollment_num")?,
                section: row.try_get("section")?,
                individual_points: row.try_get("individual_points")?,
                leetcode_questions_solved: row.try_get("leetcode_questions_solved")?,
                codeforces_questions_solved: row.try_get("codeforces_questions_solved")?,
                rank: row.try_get("rank")?,
                user_brief: row.try_get("user_brief")?,
            })
        })
        .transpose()
    }

    /// Submission counts grouped by question difficulty and status
    pub async fn submission_counts(
        &self,
        user_id: &str,
        since: Option<NaiveDateTime>,
    ) -> Result<Vec<DifficultyCount>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                r#"SELECT q.difficulty::text AS difficulty,
                          s.status::text AS status,
                          COUNT(*) AS count
                   FROM "Submission" s
                   JOIN questions q ON q.id = s."questionId"
                   WHERE s."userId"::text = $1
                     AND ($2::timestamp IS NULL OR s."createdAt" >= $2::timestamp)
                   GROUP BY q.difficulty, s.status"#,
                &[&user_id, &since],
            )
            .await?;
        rows.iter()
            .map(|row| -> Result<DifficultyCount> {
                Ok(DifficultyCount {
                    difficulty: row.try_get("difficulty")?,
                    status: row.try_get("status")?,
                    count: row.try_get("count")?,
                })
            })
            .collect()
    }

    /// Solved versus available questions for every tag
    pub async fn tag_progress(
        &self,
        user_id: &str,
        since: Option<NaiveDateTime>,
    ) -> Result<Vec<TagProgressRow>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                r#"SELECT t.name::text AS tag_name,
                          COUNT(DISTINCT q.id) AS total_problems,
                          COUNT(DISTINCT CASE WHEN s.status::text = 'ACCEPTED' THEN q.id END)
                              AS solved_problems,
                          COUNT(DISTINCT CASE WHEN q.difficulty::text = 'EASY'
                                               AND s.status::text = 'ACCEPTED' THEN q.id END)
                              AS easy_count,
                          COUNT(DISTINCT CASE WHEN q.difficulty::text = 'MEDIUM'
                                               AND s.status::text = 'ACCEPTED' THEN q.id END)
                              AS medium_count,
                          COUNT(DISTINCT CASE WHEN q.difficulty::text = 'HARD'
                                               AND s.status::text = 'ACCEPTED' THEN q.id END)
                              AS hard_count
                   FROM "QuestionTag" t
                   JOIN "_QuestionToQuestionTag" qt ON qt."B" = t.id
                   JOIN questions q ON q.id = qt."A"
                   LEFT JOIN "Submission" s
                          ON s."questionId" = q.id
                         AND s."userId"::text = $1
                         AND ($2::timestamp IS NULL OR s."createdAt" >= $2::timestamp)
                   GROUP BY t.name
                   ORDER BY solved_problems DESC, tag_name"#,
                &[&user_id, &since],
            )
            .await?;
        rows.iter()
            .map(|row| -> Result<TagProgressRow> {
                Ok(TagProgressRow {
                    tag_name: row.try_get("tag_name")?,
                    total_problems: row.try_get("total_problems")?,
                    solved_problems: row.try_get("solved_problems")?,
                    easy_count: row.try_get("easy_count")?,
                    medium_count: row.try_get("medium_count")?,
                    hard_count: row.try_get("hard_count")?,
                })
            })
            .collect()
    }

    /// Distinct days with an accepted submission, newest first
    pub async fn accepted_days(&self, user_id: &str) -> Result<Vec<NaiveDate>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                r#"SELECT DISTINCT DATE(s."createdAt") AS day
                   FROM "Submission" s
                   WHERE s."userId"::text = $1 AND s.status::text = 'ACCEPTED'
                   ORDER BY day DESC"#,
                &[&user_id],
            )
            .await?;
        rows.iter()
            .map(|row| -> Result<NaiveDate> { Ok(row.try_get("day")?) })
            .collect()
    }

    /// Submissions since `since`, newest first
    pub async fn recent_activity(
        &self,
        user_id: &str,
        since: NaiveDateTime,
    ) -> Result<Vec<ActivityRow>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                r#"SELECT s.id::text AS id,
                          s."questionId"::text AS question_id,
                          s.status::text AS status,
                          s.score::int AS score,
                          s."createdAt" AS created_at,
                          q.slug::text AS question_slug,
                          q.difficulty::text AS difficulty,
                          q.points::int AS points,
                          q."leetcodeUrl"::text AS leetcode_url
                   FROM "Submission" s
                   JOIN questions q ON q.id = s."questionId"
                   WHERE s."userId"::text = $1 AND s."createdAt" >= $2
                   ORDER BY s."createdAt" DESC"#,
                &[&user_id, &since],
            )
            .await?;
        rows.iter().map(activity_from_row).collect()
    }

    /// Questions carrying at least one of the topics, plus the match count
    /// before the limit
    ///
    /// With `unsolved_only`, questions the user has an accepted submission
    /// for are excluded before limiting.
    pub async fn filtered_questions(
        &self,
        filter: &QuestionFilter,
    ) -> Result<(Vec<QuestionRow>, i64)> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                r#"WITH matching AS (
                       SELECT DISTINCT q.id
                       FROM questions q
                       JOIN "_QuestionToQuestionTag" qt ON qt."A" = q.id
                       JOIN "QuestionTag" t ON t.id = qt."B"
                       WHERE t.name::text = ANY($1)
                         AND (NOT $3::bool OR NOT EXISTS (
                             SELECT 1 FROM "Submission" s
                             WHERE s."questionId" = q.id
                               AND s."userId"::text = $2
                               AND s.status::text = 'ACCEPTED'))
                   )
                   SELECT q.id::text AS id,
                          q.title::text AS title,
                          q.slug::text AS slug,
                          q.difficulty::text AS difficulty,
                          q.points::int AS points,
                          q."leetcodeUrl"::text AS leetcode_url,
                          q."codeforcesUrl"::text AS codeforces_url,
                          q."createdAt" AS created_at,
                          ARRAY(
                              SELECT t2.name::text
                              FROM "_QuestionToQuestionTag" qt2
                              JOIN "QuestionTag" t2 ON t2.id = qt2."B"
                              WHERE qt2."A" = q.id
                              ORDER BY t2.name
                          ) AS tags,
                          COUNT(*) OVER () AS total_count
                   FROM questions q
                   JOIN matching m ON m.id = q.id
                   ORDER BY q."createdAt" DESC, q.id
                   LIMIT $4"#,
                &[
                    &filter.topics,
                    &filter.user_id,
                    &filter.unsolved_only,
                    &filter.limit,
                ],
            )
            .await?;

        let total = match rows.first() {
            Some(row) => row.try_get("total_count")?,
            None => 0,
        };
        let questions = rows
            .iter()
            .map(question_from_row)
            .collect::<Result<Vec<_>>>()?;
        Ok((questions, total))
    }

    /// Of `question_ids`, those the user has an accepted submission for
    pub async fn solved_question_ids(
        &self,
        user_id: &str,
        question_ids: &[String],
    ) -> Result<HashSet<String>> {
        if question_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let client = self.pool.get().await?;
        let rows = client
            .query(
                r#"SELECT DISTINCT s."questionId"::text AS question_id
                   FROM "Submission" s
                   WHERE s."userId"::text = $1
                     AND s.status::text = 'ACCEPTED'
                     AND s."questionId"::text = ANY($2)"#,
                &[&user_id, &question_ids],
            )
            .await?;
        rows.iter()
            .map(|row| -> Result<String> { Ok(row.try_get("question_id")?) })
            .collect()
    }

    /// Of `question_ids`, those the user has bookmarked
    pub async fn bookmarked_question_ids(
        &self,
        user_id: &str,
        question_ids: &[String],
    ) -> Result<HashSet<String>> {
        if question_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let client = self.pool.get().await?;
        let rows = client
            .query(
                r#"SELECT DISTINCT b."questionId"::text AS question_id
                   FROM "Bookmark" b
                   WHERE b."userId"::text = $1 AND b."questionId"::text = ANY($2)"#,
                &[&user_id, &question_ids],
            )
            .await?;
        rows.iter()
            .map(|row| -> Result<String> { Ok(row.try_get("question_id")?) })
            .collect()
    }

    pub async fn individual_points(&self, user_id: &str) -> Result<Option<i32>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"SELECT "individualPoints"::int AS points FROM "User" WHERE id::text = $1"#,
                &[&user_id],
            )
            .await?;
        match row {
            Some(row) => Ok(row.try_get("points")?),
            None => Ok(None),
        }
    }

    /// Every tag name, alphabetical
    pub async fn tag_names(&self) -> Result<Vec<String>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                r#"SELECT name::text AS name FROM "QuestionTag" ORDER BY name"#,
                &[],
            )
            .await?;
        rows.iter()
            .map(|row| -> Result<String> { Ok(row.try_get("name")?) })
            .collect()
    }
}

fn activity_from_row(row: &Row) -> Result<ActivityRow> {
    let created_at: NaiveDateTime = row.try_get("created_at")?;
    Ok(ActivityRow {
        id: row.try_get("id")?,
        question_id: row.try_get("question_id")?,
        status: row.try_get("status")?,
        score: row.try_get("score")?,
        created_at: created_at.and_utc(),
        question_slug: row.try_get("question_slug")?,
        difficulty: row.try_get("difficulty")?,
        points: row.try_get("points")?,
        leetcode_url: row.try_get("leetcode_url")?,
    })
}

fn question_from_row(row: &Row) -> Result<QuestionRow> {
    let created_at: NaiveDateTime = row.try_get("created_at")?;
    Ok(QuestionRow {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        difficulty: row.try_get("difficulty")?,
        points: row.try_get("points")?,
        leetcode_url: row.try_get("leetcode_url")?,
        codeforces_url: row.try_get("codeforces_url")?,
        created_at: created_at.and_utc(),
        tags: row.try_get("tags")?,
    })
}
