//! Functions the tutor model may call
//!
//! Each tool is bound to the signed-in user through [`ToolContext`]; the
//! model never chooses whose data it reads.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::error;

use odin_tool_macros::tool;

use crate::db::{AlgoStore, ChatStore, CodeSubmission};
use crate::llm::tools::{FunctionRegistry, RegistryError};
use crate::progress::{get_user_progress, TimeRange};
use crate::questions::{get_filtered_questions, get_tags, FilteredQuestions};
use crate::search::{SearchResult, WebSearch};

/// Per-request state handed to every tool call
#[derive(Clone)]
pub struct ToolContext {
    pub user_id: String,
    pub algo: AlgoStore,
    pub chats: ChatStore,
    pub search: WebSearch,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressOverviewArgs {
    /// Include tag progress and recent activity
    #[serde(default = "default_true")]
    pub include_stats: bool,
    /// Time range for progress data
    #[serde(default)]
    pub time_range: TimeRange,
}

#[tool(
    name = "getUserProgressOverview",
    description = "Get comprehensive overview of user's DSA learning progress including total problems solved, difficulty breakdown, and overall statistics"
)]
async fn user_progress_overview(
    ctx: ToolContext,
    args: ProgressOverviewArgs,
) -> Result<Value, String> {
    let report = get_user_progress(&ctx.algo, &ctx.user_id, args.time_range)
        .await
        .map_err(|e| format!("Failed to get user progress: {}", e))?;
    let mut value =
        serde_json::to_value(report).map_err(|e| format!("Failed to encode progress: {}", e))?;
    if !args.include_stats {
        if let Value::Object(map) = &mut value {
            map.remove("tagProgress");
            map.remove("recentActivity");
        }
    }
    Ok(value)
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilteredQuestionsArgs {
    /// List of SCREAMING_SNAKE_CASE topic tags to filter questions by
    #[schemars(length(min = 1))]
    pub topics: Vec<String>,
    /// Maximum number of questions to fetch (default 50)
    #[schemars(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    /// If true, only return questions the user has not solved
    pub unsolved_only: Option<bool>,
}

#[tool(
    name = "getFilteredQuestionsToSolve",
    description = "Fetch a curated list of DSA questions by passing SCREAMING_SNAKE_CASE topic names, along with user-specific metadata like solved/bookmarked status."
)]
async fn filtered_questions_to_solve(
    ctx: ToolContext,
    args: FilteredQuestionsArgs,
) -> Result<FilteredQuestions, String> {
    get_filtered_questions(
        &ctx.algo,
        &args.topics,
        &ctx.user_id,
        args.limit,
        args.unsolved_only.unwrap_or(false),
    )
    .await
    .map_err(|e| format!("Failed to fetch questions: {}", e))
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionArgs {
    /// The slug of the problem (e.g. 'two-sum', 'binary-search')
    pub question_slug: String,
    /// Include submission metadata like title and timestamps
    #[serde(default = "default_true")]
    pub include_metadata: bool,
}

/// Tool payload for a stored submission
pub fn submission_payload(
    question_slug: &str,
    submission: Option<CodeSubmission>,
    include_metadata: bool,
) -> Value {
    let Some(submission) = submission else {
        return json!({
            "found": false,
            "message": format!("No submission found for problem: {}", question_slug),
        });
    };

    let mut payload = json!({
        "found": true,
        "questionSlug": question_slug,
        "code": submission.code,
        "language": submission.language,
        "submissionStatus": submission.submission_status,
    });
    if include_metadata {
        if let Value::Object(map) = &mut payload {
            map.insert("problemTitle".to_string(), json!(submission.problem_title));
            map.insert("createdAt".to_string(), json!(submission.created_at));
            map.insert("updatedAt".to_string(), json!(submission.updated_at));
            map.insert("submissionId".to_string(), json!(submission.id));
        }
    }
    payload
}

#[tool(
    name = "getUserSubmissionForProblem",
    description = "Get the user's latest code submission for a specific problem/question"
)]
async fn user_submission_for_problem(
    ctx: ToolContext,
    args: SubmissionArgs,
) -> Result<Value, String> {
    let slug = args.question_slug.trim();
    match ctx.chats.latest_submission(&ctx.user_id, slug).await {
        Ok(submission) => Ok(submission_payload(slug, submission, args.include_metadata)),
        Err(e) => {
            error!(user_id = %ctx.user_id, slug, error = %e, "failed to fetch submission");
            Ok(json!({ "found": false, "error": "Failed to fetch submission" }))
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchArgs {
    /// Search query to look up on the web
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    pub rank: usize,
    pub title: String,
    pub snippet: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchToolResult {
    pub message: String,
    pub results: Vec<RankedResult>,
}

impl SearchToolResult {
    pub fn new(query: &str, results: Vec<SearchResult>) -> Self {
        let message = if results.is_empty() {
            format!("No search results found for: {}", query)
        } else {
            format!("Found {} search results for: {}", results.len(), query)
        };
        let results = results
            .into_iter()
            .enumerate()
            .map(|(i, r)| RankedResult {
                rank: i + 1,
                title: r.title,
                snippet: r.snippet,
                url: r.link,
            })
            .collect();
        Self { message, results }
    }
}

#[tool(
    name = "searchWeb",
    description = "Search the web for current information, latest news, or real-time data that might not be in the AI's training data"
)]
async fn search_web(ctx: ToolContext, args: SearchArgs) -> Result<SearchToolResult, String> {
    let results = ctx.search.search(&args.query).await;
    Ok(SearchToolResult::new(&args.query, results))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListTopicsArgs {}

#[tool(
    name = "listTopics",
    description = "List every topic tag that questions can be filtered by"
)]
async fn list_topics(ctx: ToolContext, _args: ListTopicsArgs) -> Result<Vec<String>, String> {
    get_tags(&ctx.algo)
        .await
        .map_err(|e| format!("Failed to list topics: {}", e))
}

/// Registry holding every tutor tool, bound to `ctx`
pub fn build_registry(ctx: ToolContext) -> Result<FunctionRegistry, RegistryError> {
    let mut registry = FunctionRegistry::new();
    crate::register_tools!(
        registry,
        ctx,
        user_progress_overview_tool,
        filtered_questions_to_solve_tool,
        user_submission_for_problem_tool,
        search_web_tool,
        list_topics_tool,
    )?;
    Ok(registry)
}
