//! HTTP error type and the recovery filter that renders it

use std::convert::Infallible;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use warp::http::StatusCode;
use warp::{Rejection, Reply};

use crate::db;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// A required setting is absent; the detail is only logged
    #[error("Server configuration error")]
    Misconfigured(String),

    /// Carries detail for the log; clients only see a generic message
    #[error("internal error: {0}")]
    Internal(String),
}

impl warp::reject::Reject for ApiError {}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Misconfigured(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to return to the client
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    pub fn internal(detail: impl std::fmt::Display) -> Self {
        ApiError::Internal(detail.to_string())
    }
}

impl From<db::Error> for ApiError {
    fn from(err: db::Error) -> Self {
        match err {
            db::Error::ValidationError(msg) => ApiError::BadRequest(msg),
            db::Error::NotFoundError(msg) => ApiError::NotFound(format!("Not found: {}", msg)),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

pub fn error_reply(status: StatusCode, message: impl Into<String>) -> warp::reply::Response {
    let body = ErrorBody {
        success: false,
        message: message.into(),
    };
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

/// Turn any rejection into a `{ success: false, message }` JSON reply
pub async fn handle_rejection(err: Rejection) -> Result<warp::reply::Response, Infallible> {
    let (status, message) = classify_rejection(&err);
    Ok(error_reply(status, message))
}

fn classify_rejection(err: &Rejection) -> (StatusCode, String) {
    if let Some(api) = err.find::<ApiError>() {
        match api {
            ApiError::Internal(detail) => error!(error = %detail, "request failed"),
            ApiError::Misconfigured(detail) => error!(setting = %detail, "server misconfigured"),
            other => warn!(status = %other.status(), error = %other, "request rejected"),
        }
        return (api.status(), api.public_message());
    }

    if err.is_not_found() {
        return (StatusCode::NOT_FOUND, "Not found".to_string());
    }
    if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        warn!(error = %e, "invalid request body");
        return (StatusCode::BAD_REQUEST, "Invalid request body".to_string());
    }
    if err.find::<warp::reject::InvalidQuery>().is_some() {
        return (StatusCode::BAD_REQUEST, "Invalid query string".to_string());
    }
    if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            "Request body too large".to_string(),
        );
    }
    if let Some(e) = err.find::<warp::filters::cors::CorsForbidden>() {
        warn!(error = %e, "CORS request refused");
        return (StatusCode::FORBIDDEN, "Forbidden".to_string());
    }
    if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed".to_string(),
        );
    }

    error!(rejection = ?err, "unhandled rejection");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::internal("boom").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let err = ApiError::internal("password authentication failed for user odin");
        assert_eq!(err.public_message(), "Internal server error");
        assert_eq!(
            ApiError::Misconfigured("JWT_SECRET".into()).public_message(),
            "Server configuration error"
        );
        assert_eq!(
            ApiError::Conflict("Submission already exists".into()).public_message(),
            "Submission already exists"
        );
    }

    #[test]
    fn test_from_db_error() {
        assert!(matches!(
            ApiError::from(db::Error::ValidationError("bad".into())),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(db::Error::NotFoundError("user 1".into())),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(db::Error::ConnectionError("refused".into())),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn test_classify_api_error() {
        let rejection = warp::reject::custom(ApiError::Unauthorized("Unauthorized".into()));
        assert_eq!(
            classify_rejection(&rejection),
            (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
        );

        let rejection = warp::reject::custom(ApiError::internal("pool timed out"));
        assert_eq!(
            classify_rejection(&rejection),
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string()
            )
        );
    }

    #[test]
    fn test_api_error_converts_into_rejection() {
        let rejection: Rejection = ApiError::NotFound("Chat not found".into()).into();
        assert_eq!(
            classify_rejection(&rejection),
            (StatusCode::NOT_FOUND, "Chat not found".to_string())
        );
    }

    #[tokio::test]
    async fn test_handle_rejection_sets_status() {
        let rejection = warp::reject::custom(ApiError::Conflict("Submission already exists".into()));
        let response = handle_rejection(rejection).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_handle_rejection_not_found() {
        let response = handle_rejection(warp::reject::not_found()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
