//! Learner progress analytics
//!
//! Builds the progress report the tutor's `getUserProgressOverview` tool
//! returns. Only the user lookup is fatal; every other section degrades to
//! an empty value when its query fails.

pub mod stats;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::db::{self, ActivityRow, AlgoStore, TagProgressRow, UserInfo};

pub use stats::{
    completion_rate, current_streak, date_filter, difficulty_breakdown, is_this_week,
    total_solved, DifficultyStat, TimeRange, ACCEPTED,
};

/// Days of history in `recentActivity.last30Days`
pub const RECENT_ACTIVITY_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Platform {
    Leetcode,
    Codeforces,
}

impl Platform {
    /// Questions with a LeetCode link are LeetCode problems, everything else
    /// comes from Codeforces
    pub fn for_leetcode_url(url: Option<&str>) -> Self {
        match url {
            Some(url) if !url.trim().is_empty() => Platform::Leetcode,
            _ => Platform::Codeforces,
        }
    }
}

/// A submission as shown in recent activity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub question_id: String,
    pub status: String,
    pub score: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub question_slug: String,
    pub difficulty: String,
    pub points: Option<i32>,
    pub platform: Platform,
    pub was_accepted: bool,
}

impl From<ActivityRow> for Activity {
    fn from(row: ActivityRow) -> Self {
        Self {
            platform: Platform::for_leetcode_url(row.leetcode_url.as_deref()),
            was_accepted: row.status == ACCEPTED,
            id: row.id,
            question_id: row.question_id,
            status: row.status,
            score: row.score,
            created_at: row.created_at,
            question_slug: row.question_slug,
            difficulty: row.difficulty,
            points: row.points,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_solved: i64,
    pub difficulty_breakdown: Vec<DifficultyStat>,
    pub current_streak: u32,
    pub time_range: TimeRange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagProgress {
    #[serde(flatten)]
    pub counts: TagProgressRow,
    pub completion_rate: f64,
}

impl From<TagProgressRow> for TagProgress {
    fn from(counts: TagProgressRow) -> Self {
        let completion_rate = completion_rate(counts.solved_problems, counts.total_problems);
        Self {
            counts,
            completion_rate,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    #[serde(rename = "last30Days")]
    pub last_30_days: Vec<Activity>,
    pub this_week: Vec<Activity>,
    pub today: Vec<Activity>,
}

impl RecentActivity {
    /// Split newest-first activity into the week and today views
    pub fn from_activities(activities: Vec<Activity>, now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let this_week = activities
            .iter()
            .filter(|a| is_this_week(a.created_at.date_naive(), today))
            .cloned()
            .collect();
        let todays = activities
            .iter()
            .filter(|a| a.created_at.date_naive() == today)
            .cloned()
            .collect();
        Self {
            last_30_days: activities,
            this_week,
            today: todays,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub user: UserInfo,
    pub overview: Overview,
    pub tag_progress: Vec<TagProgress>,
    pub recent_activity: RecentActivity,
}

/// Full progress report for a user over `range`
///
/// # Errors
///
/// `ValidationError` for a blank id, `NotFoundError` when the user does not
/// exist, or the database error from the user lookup.
pub async fn get_user_progress(
    store: &AlgoStore,
    user_id: &str,
    range: TimeRange,
) -> db::Result<ProgressReport> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(db::Error::ValidationError("user id is required".to_string()));
    }

    let user = store
        .user_info(user_id)
        .await?
        .ok_or_else(|| db::Error::NotFoundError(format!("user {}", user_id)))?;

    let now = Utc::now();
    let since = date_filter(range, now.naive_utc());

    let counts = fail_soft(
        store.submission_counts(user_id, since).await,
        "submission breakdown",
        user_id,
    );
    let tags = fail_soft(
        store.tag_progress(user_id, since).await,
        "tag progress",
        user_id,
    );
    let activities = fail_soft(
        get_recent_activity(store, user_id, RECENT_ACTIVITY_DAYS).await,
        "recent activity",
        user_id,
    );
    let days = fail_soft(store.accepted_days(user_id).await, "streak", user_id);

    debug!(user_id, ?range, "user progress assembled");

    Ok(ProgressReport {
        user,
        overview: Overview {
            total_solved: total_solved(&counts),
            difficulty_breakdown: difficulty_breakdown(&counts),
            current_streak: current_streak(&days, now.date_naive()),
            time_range: range,
        },
        tag_progress: tags.into_iter().map(TagProgress::from).collect(),
        recent_activity: RecentActivity::from_activities(activities, now),
    })
}

/// Submissions from the last `days` days, newest first
///
/// A blank id or a non-positive window yields an empty list.
pub async fn get_recent_activity(
    store: &AlgoStore,
    user_id: &str,
    days: i64,
) -> db::Result<Vec<Activity>> {
    let user_id = user_id.trim();
    if user_id.is_empty() || days <= 0 {
        return Ok(Vec::new());
    }
    let since = (Utc::now() - Duration::days(days)).naive_utc();
    let rows = store.recent_activity(user_id, since).await?;
    Ok(rows.into_iter().map(Activity::from).collect())
}

pub(crate) fn fail_soft<T: Default>(result: db::Result<T>, section: &str, user_id: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(user_id, section, error = %e, "progress query failed, using empty value");
            T::default()
        }
    }
}
