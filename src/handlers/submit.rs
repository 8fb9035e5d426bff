// POST /api/submit handler

use std::sync::Arc;

use tracing::info;

use crate::auth::AuthUser;
use crate::db::{self, NewCodeSubmission};
use crate::error::ApiError;
use crate::models::{SubmitRequest, SubmitResponse};
use crate::state::AppState;

const SUBMISSION_STATUS: &str = "accepted";

/// Check required fields, then non-blank code
///
/// Code is stored trimmed and the language lower-cased. Submissions arrive
/// from the browser extension only after the judge accepted them.
pub fn validate_submission(
    user_id: &str,
    request: SubmitRequest,
) -> Result<NewCodeSubmission, ApiError> {
    let present = |field: &Option<String>| field.as_deref().is_some_and(|v| !v.is_empty());
    if !present(&request.slug) || !present(&request.code) || !present(&request.language) {
        return Err(ApiError::BadRequest(
            "Missing required fields: slug, code, and language are required".to_string(),
        ));
    }

    let code = request.code.unwrap_or_default();
    if code.trim().is_empty() {
        return Err(ApiError::BadRequest("Code cannot be empty".to_string()));
    }

    Ok(NewCodeSubmission {
        external_user_id: user_id.to_string(),
        question_slug: request.slug.unwrap_or_default(),
        code: code.trim().to_string(),
        language: request.language.unwrap_or_default().to_lowercase(),
        problem_title: request.problem_title.filter(|t| !t.is_empty()),
        submission_status: SUBMISSION_STATUS.to_string(),
    })
}

pub async fn submit_handler(
    user: AuthUser,
    state: Arc<AppState>,
    request: SubmitRequest,
) -> Result<impl warp::Reply, warp::Rejection> {
    let submission = validate_submission(&user.user_id, request)?;

    let submission_id = match state.chats.insert_code_submission(&submission).await {
        Ok(id) => id,
        Err(db::Error::UniqueViolation(_)) => {
            return Err(ApiError::Conflict("Submission already exists".to_string()).into())
        }
        Err(e) => return Err(ApiError::from(e).into()),
    };

    info!(
        user_id = %user.user_id,
        slug = %submission.question_slug,
        %submission_id,
        "code submission saved"
    );

    Ok(warp::reply::json(&SubmitResponse {
        success: true,
        message: "Code submission saved successfully".to_string(),
        submission_id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(slug: Option<&str>, code: Option<&str>, language: Option<&str>) -> SubmitRequest {
        SubmitRequest {
            slug: slug.map(str::to_string),
            code: code.map(str::to_string),
            language: language.map(str::to_string),
            timestamp: None,
            problem_title: Some("Two Sum".to_string()),
        }
    }

    #[test]
    fn test_missing_fields() {
        for req in [
            request(None, Some("x"), Some("rust")),
            request(Some("two-sum"), None, Some("rust")),
            request(Some("two-sum"), Some("x"), Some("")),
        ] {
            let err = validate_submission("u1", req).unwrap_err();
            assert!(err.to_string().starts_with("Missing required fields"));
        }
    }

    #[test]
    fn test_blank_code_checked_after_fields() {
        let err = validate_submission("u1", request(Some("two-sum"), Some("  \n "), None)).unwrap_err();
        assert!(err.to_string().starts_with("Missing required fields"));

        let err =
            validate_submission("u1", request(Some("two-sum"), Some("  \n "), Some("rust"))).unwrap_err();
        assert_eq!(err.to_string(), "Code cannot be empty");
    }

    #[test]
    fn test_normalisation() {
        let submission = validate_submission(
            "u1",
            request(Some("two-sum"), Some("\n  fn main() {}\n"), Some("Rust")),
        )
        .unwrap();
        assert_eq!(submission.external_user_id, "u1");
        assert_eq!(submission.code, "fn main() {}");
        assert_eq!(submission.language, "rust");
        assert_eq!(submission.submission_status, "accepted");
        assert_eq!(submission.problem_title.as_deref(), Some("Two Sum"));
    }
}
