//! Chat transcripts and code submissions (the service's own database)

use chrono::{DateTime, NaiveDateTime, Utc};
use deadpool_postgres::Pool;
use serde::Serialize;
use serde_json::Value;
use tokio_postgres::Row;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::error::{Error, Result};

const MIGRATIONS: &[(&str, &str)] = &[
    (
        "0001_create_chat",
        include_str!("../../migrations/0001_create_chat.sql"),
    ),
    (
        "0002_create_code_submissions",
        include_str!("../../migrations/0002_create_code_submissions.sql"),
    ),
];

/// A stored conversation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Stored LLM messages, as JSON
    pub messages: Value,
    pub external_user_id: String,
    pub user_email: Option<String>,
}

impl ChatRecord {
    fn from_row(row: &Row) -> Result<Self> {
        let created_at: NaiveDateTime = row.try_get("createdAt")?;
        Ok(Self {
            id: row.try_get("id")?,
            created_at: created_at.and_utc(),
            messages: row.try_get("messages")?,
            external_user_id: row.try_get("external_user_id")?,
            user_email: row.try_get("user_email")?,
        })
    }
}

/// A code submission to insert
#[derive(Debug, Clone)]
pub struct NewCodeSubmission {
    pub external_user_id: String,
    pub question_slug: String,
    pub code: String,
    pub language: String,
    pub problem_title: Option<String>,
    pub submission_status: String,
}

/// A stored code submission
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSubmission {
    pub id: Uuid,
    pub external_user_id: String,
    pub question_slug: String,
    pub code: String,
    pub language: String,
    pub problem_title: Option<String>,
    pub submission_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CodeSubmission {
    fn from_row(row: &Row) -> Result<Self> {
        let created_at: NaiveDateTime = row.try_get("created_at")?;
        let updated_at: NaiveDateTime = row.try_get("updated_at")?;
        Ok(Self {
            id: row.try_get("id")?,
            external_user_id: row.try_get("external_user_id")?,
            question_slug: row.try_get("question_slug")?,
            code: row.try_get("code")?,
            language: row.try_get("language")?,
            problem_title: row.try_get("problem_title")?,
            submission_status: row.try_get("submission_status")?,
            created_at: created_at.and_utc(),
            updated_at: updated_at.and_utc(),
        })
    }
}

/// Access to the `"Chat"` and `code_submissions` tables
#[derive(Clone)]
pub struct ChatStore {
    pool: Pool,
}

impl ChatStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Apply the bundled migrations; every script is idempotent
    pub async fn migrate(&self) -> Result<()> {
        let client = self.pool.get().await?;
        for (name, sql) in MIGRATIONS {
            client.batch_execute(sql).await?;
            debug!(migration = name, "migration applied");
        }
        info!(count = MIGRATIONS.len(), "chat database migrations applied");
        Ok(())
    }

    /// Insert a chat, or replace the messages of an existing one
    ///
    /// Owner and creation time are fixed by the first save. Saving over a
    /// chat owned by someone else leaves it untouched and returns
    /// `NotFoundError`.
    pub async fn save_chat(
        &self,
        id: Uuid,
        messages: &Value,
        external_user_id: &str,
        user_email: Option<&str>,
    ) -> Result<()> {
        let client = self.pool.get().await?;
        let rows = client
            .execute(
                r#"INSERT INTO "Chat" (id, "createdAt", messages, external_user_id, user_email)
                   VALUES ($1, $2, $3, $4, $5)
                   ON CONFLICT (id) DO UPDATE SET messages = EXCLUDED.messages
                   WHERE "Chat".external_user_id = EXCLUDED.external_user_id"#,
                &[
                    &id,
                    &Utc::now().naive_utc(),
                    messages,
                    &external_user_id,
                    &user_email,
                ],
            )
            .await?;
        if rows == 0 {
            return Err(Error::NotFoundError(format!(
                "chat {} for user {}",
                id, external_user_id
            )));
        }
        Ok(())
    }

    pub async fn get_chat(&self, id: Uuid) -> Result<Option<ChatRecord>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"SELECT id, "createdAt", messages, external_user_id, user_email
                   FROM "Chat" WHERE id = $1"#,
                &[&id],
            )
            .await?;
        row.as_ref().map(ChatRecord::from_row).transpose()
    }

    /// Returns whether a row was deleted
    pub async fn delete_chat(&self, id: Uuid) -> Result<bool> {
        let client = self.pool.get().await?;
        let deleted = client
            .execute(r#"DELETE FROM "Chat" WHERE id = $1"#, &[&id])
            .await?;
        Ok(deleted > 0)
    }

    /// The user's chats, newest first
    pub async fn chats_for_user(&self, external_user_id: &str) -> Result<Vec<ChatRecord>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                r#"SELECT id, "createdAt", messages, external_user_id, user_email
                   FROM "Chat" WHERE external_user_id = $1
                   ORDER BY "createdAt" DESC"#,
                &[&external_user_id],
            )
            .await?;
        rows.iter().map(ChatRecord::from_row).collect()
    }

    /// Store a submission and return its id
    ///
    /// A second submission with the same user, slug and timestamp fails with
    /// `Error::UniqueViolation`.
    pub async fn insert_code_submission(&self, submission: &NewCodeSubmission) -> Result<Uuid> {
        if submission.question_slug.trim().is_empty() {
            return Err(Error::ValidationError("question slug is empty".to_string()));
        }

        let now = Utc::now().naive_utc();
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                r#"INSERT INTO code_submissions
                       (external_user_id, question_slug, code, language, problem_title,
                        submission_status, created_at, updated_at)
                   VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
                   RETURNING id"#,
                &[
                    &submission.external_user_id,
                    &submission.question_slug,
                    &submission.code,
                    &submission.language,
                    &submission.problem_title,
                    &submission.submission_status,
                    &now,
                ],
            )
            .await?;
        Ok(row.try_get("id")?)
    }

    /// The user's newest submission for a problem
    pub async fn latest_submission(
        &self,
        external_user_id: &str,
        question_slug: &str,
    ) -> Result<Option<CodeSubmission>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"SELECT id, external_user_id, question_slug, code, language, problem_title,
                          submission_status, created_at, updated_at
                   FROM code_submissions
                   WHERE external_user_id = $1 AND question_slug = $2
                   ORDER BY created_at DESC
                   LIMIT 1"#,
                &[&external_user_id, &question_slug],
            )
            .await?;
        row.as_ref().map(CodeSubmission::from_row).transpose()
    }
}
