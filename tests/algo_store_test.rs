mod common;

use odin_tutor::auth::{self, LoginRequest};
use odin_tutor::context::get_user_context_for_prompt;
use odin_tutor::db::{self, AlgoStore, DbConfig};
use odin_tutor::error::ApiError;
use odin_tutor::progress::{get_recent_activity, get_user_progress, Platform, TimeRange};
use odin_tutor::questions::{get_filtered_questions, get_tags};
use testcontainers::clients::Cli;

// Keeps _docker and _container alive for the duration of the test
macro_rules! setup_test {
    ($docker:ident, $container:ident, $store:ident) => {
        setup_test!($docker, $container, $store, _pool);
    };
    ($docker:ident, $container:ident, $store:ident, $pool:ident) => {
        let $docker = Cli::default();
        let $container = $docker.run(common::create_postgres_container());

        // The image restarts PostgreSQL once after its init scripts
        tokio::time::sleep(tokio::time::Duration::from_secs(3)).await;

        let host_port = $container.get_host_port_ipv4(common::POSTGRES_PORT);
        let connection_string = common::build_connection_string("127.0.0.1", host_port);
        let $pool = DbConfig::from_connection_string(&connection_string)
            .unwrap()
            .build_pool()
            .unwrap();
        $pool
            .get()
            .await
            .unwrap()
            .batch_execute(common::ALGO_FIXTURE)
            .await
            .unwrap();
        let $store = AlgoStore::new($pool.clone());
    };
}

fn topics(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

// ============================================================================
// questions
// ============================================================================

#[tokio::test]
async fn test_tags_are_alphabetical() {
    setup_test!(_docker, _container, store);

    let tags = get_tags(&store).await.unwrap();
    assert_eq!(tags, ["Array", "Dynamic Programming", "Graph", "String"]);
}

#[tokio::test]
async fn test_filtered_questions_overlay_status() {
    setup_test!(_docker, _container, store);

    let result = get_filtered_questions(&store, &topics(&["Dynamic Programming"]), "u-alice", None, false)
        .await
        .unwrap();

    assert_eq!(result.total_count, 2);
    assert_eq!(result.individual_points, 120);
    let slugs: Vec<&str> = result
        .questions_with_solved_status
        .iter()
        .map(|q| q.question.slug.as_str())
        .collect();
    assert_eq!(slugs, ["coin-change", "climbing-stairs"]);
    assert!(result.questions_with_solved_status[0].is_solved);
    assert!(!result.questions_with_solved_status[1].is_solved);
    assert_eq!(
        result.questions_with_solved_status[0].question.tags,
        ["Array", "Dynamic Programming"]
    );
}

#[tokio::test]
async fn test_filtered_questions_unsolved_only() {
    setup_test!(_docker, _container, store);

    let result = get_filtered_questions(
        &store,
        &topics(&["Array", "Dynamic Programming"]),
        "u-alice",
        None,
        true,
    )
    .await
    .unwrap();

    assert_eq!(result.total_count, 1);
    assert_eq!(result.questions_with_solved_status.len(), 1);
    assert_eq!(result.questions_with_solved_status[0].question.slug, "climbing-stairs");
    assert!(!result.questions_with_solved_status[0].is_solved);
}

#[tokio::test]
async fn test_filtered_questions_limit_and_bookmarks() {
    setup_test!(_docker, _container, store);

    let result = get_filtered_questions(
        &store,
        &topics(&["Array", "Dynamic Programming", "Graph"]),
        "u-alice",
        Some(2),
        false,
    )
    .await
    .unwrap();

    assert_eq!(result.total_count, 5);
    assert_eq!(result.questions_with_solved_status.len(), 2);
    let course = &result.questions_with_solved_status[1];
    assert_eq!(course.question.slug, "course-schedule");
    assert!(course.is_bookmarked);
    assert!(course.is_solved);
    assert!(!result.questions_with_solved_status[0].is_bookmarked);
}

#[tokio::test]
async fn test_filtered_questions_requires_topics() {
    setup_test!(_docker, _container, store);

    let err = get_filtered_questions(&store, &topics(&["  "]), "u-alice", None, false)
        .await
        .unwrap_err();
    assert!(matches!(err, db::Error::ValidationError(_)));
}

// ============================================================================
// progress
// ============================================================================

#[tokio::test]
async fn test_progress_all_time() {
    setup_test!(_docker, _container, store);

    let report = get_user_progress(&store, "u-alice", TimeRange::All).await.unwrap();

    assert_eq!(report.user.username.as_deref(), Some("alice"));
    assert_eq!(report.user.rank, Some(3));
    assert_eq!(report.overview.total_solved, 3);
    assert_eq!(report.overview.time_range, TimeRange::All);
    // s3 is today (or yesterday just after midnight); s1 is three days back
    assert_eq!(report.overview.current_streak, 1);

    let breakdown: Vec<(&str, i64, i64, i64)> = report
        .overview
        .difficulty_breakdown
        .iter()
        .map(|s| (s.difficulty.as_str(), s.solved, s.attempted, s.success_rate))
        .collect();
    assert_eq!(breakdown, [("EASY", 1, 1, 100), ("MEDIUM", 2, 3, 67)]);

    let tags: Vec<(&str, i64, i64)> = report
        .tag_progress
        .iter()
        .map(|t| (t.counts.tag_name.as_str(), t.counts.total_problems, t.counts.solved_problems))
        .collect();
    assert_eq!(
        tags,
        [("Array", 2, 2), ("Dynamic Programming", 2, 1), ("Graph", 2, 1)]
    );
    assert_eq!(report.recent_activity.last_30_days.len(), 3);
}

#[tokio::test]
async fn test_progress_month_excludes_older_submissions() {
    setup_test!(_docker, _container, store);

    let report = get_user_progress(&store, "u-alice", TimeRange::Month).await.unwrap();

    assert_eq!(report.overview.total_solved, 2);
    let medium = report
        .overview
        .difficulty_breakdown
        .iter()
        .find(|s| s.difficulty == "MEDIUM")
        .unwrap();
    assert_eq!((medium.solved, medium.attempted, medium.success_rate), (1, 2, 50));
}

#[tokio::test]
async fn test_progress_unknown_user() {
    setup_test!(_docker, _container, store);

    let err = get_user_progress(&store, "u-nobody", TimeRange::All).await.unwrap_err();
    assert!(matches!(err, db::Error::NotFoundError(_)));

    let err = get_user_progress(&store, " ", TimeRange::All).await.unwrap_err();
    assert!(matches!(err, db::Error::ValidationError(_)));
}

#[tokio::test]
async fn test_recent_activity_newest_first() {
    setup_test!(_docker, _container, store);

    let activity = get_recent_activity(&store, "u-alice", 30).await.unwrap();
    let ids: Vec<&str> = activity.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, ["s3", "s2", "s1"]);
    assert!(activity[0].was_accepted);
    assert!(!activity[1].was_accepted);
    assert_eq!(activity[0].platform, Platform::Leetcode);

    assert!(get_recent_activity(&store, "u-alice", 0).await.unwrap().is_empty());
}

// ============================================================================
// learner context
// ============================================================================

#[tokio::test]
async fn test_user_context() {
    setup_test!(_docker, _container, store);

    let context = get_user_context_for_prompt(&store, "u-alice").await.unwrap();
    assert_eq!(context.username.as_deref(), Some("alice"));
    assert_eq!(context.points, 120);
    assert_eq!(context.total_solved, 3);
    assert_eq!(context.recently_solved, ["coin-change", "two-sum"]);
    assert_eq!(context.strongest_topics.first().map(String::as_str), Some("Array"));
    assert_eq!(
        context.weakest_topics.first().map(String::as_str),
        Some("Dynamic Programming")
    );
    assert!(context.summary.contains("coin-change"));
}

// ============================================================================
// login
// ============================================================================

#[tokio::test]
async fn test_login_round_trip() {
    setup_test!(_docker, _container, store, pool);

    // replace the seeded placeholder hash
    let hash = bcrypt::hash("hunter22", 4).unwrap();
    pool.get()
        .await
        .unwrap()
        .execute(
            r#"UPDATE "User" SET password = $1 WHERE email = 'alice@example.com'"#,
            &[&hash],
        )
        .await
        .unwrap();

    let request = LoginRequest {
        email: Some("Alice@Example.com".to_string()),
        password: Some("hunter22".to_string()),
    };
    let response = auth::login(&store, Some("test-secret"), &request).await.unwrap();
    assert!(response.success);
    assert_eq!(response.user.id, "u-alice");
    assert_eq!(response.user.username, "alice");

    let claims = auth::verify_token("test-secret", &response.token).unwrap();
    assert_eq!(claims.user_id, "u-alice");
    assert_eq!(claims.email, "alice@example.com");

    let wrong = LoginRequest {
        email: Some("alice@example.com".to_string()),
        password: Some("wrong-password".to_string()),
    };
    let err = auth::login(&store, Some("test-secret"), &wrong).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
}

#[tokio::test]
async fn test_login_unreadable_hash_is_rejected() {
    setup_test!(_docker, _container, store);

    let request = LoginRequest {
        email: Some("bob@example.com".to_string()),
        password: Some("anything".to_string()),
    };
    let err = auth::login(&store, Some("test-secret"), &request).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
}
