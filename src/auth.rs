//! Bearer-token authentication
//!
//! Tokens are HS256 JWTs signed with `JWT_SECRET`, issued by `/api/login` and
//! valid for 30 days.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use warp::{Filter, Rejection};

use crate::db::AlgoStore;
use crate::error::ApiError;

pub const TOKEN_TTL_DAYS: i64 = 30;
const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// The caller of a protected route
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
    pub username: String,
}

pub fn issue_token(
    secret: &str,
    user_id: &str,
    email: &str,
    username: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        user_id: user_id.to_string(),
        email: email.to_string(),
        username: username.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}

/// Resolve the caller from an `Authorization` header
///
/// Checks run in order: header present and `Bearer`, secret configured,
/// signature and expiry, then a non-empty `userId` claim.
pub fn authenticate(header: Option<&str>, secret: Option<&str>) -> Result<AuthUser, ApiError> {
    let token = header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            ApiError::Unauthorized("Missing or invalid authorization header".to_string())
        })?;

    let secret = secret.ok_or_else(|| ApiError::Misconfigured("JWT_SECRET".to_string()))?;

    let claims = verify_token(secret, token).map_err(|e| {
        debug!(error = %e, "token rejected");
        ApiError::Unauthorized("Invalid or expired token".to_string())
    })?;

    if claims.user_id.trim().is_empty() {
        return Err(ApiError::Unauthorized("Invalid token payload".to_string()));
    }

    Ok(AuthUser {
        user_id: claims.user_id,
        email: claims.email,
        username: claims.username,
    })
}

/// Filter extracting the authenticated caller
pub fn with_auth(
    secret: Option<Arc<str>>,
) -> impl Filter<Extract = (AuthUser,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let secret = secret.clone();
        async move {
            authenticate(header.as_deref(), secret.as_deref()).map_err(Rejection::from)
        }
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginUser {
    pub id: String,
    pub email: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: LoginUser,
    pub message: String,
}

pub fn is_valid_email(email: &str) -> bool {
    Regex::new(EMAIL_PATTERN)
        .map(|re| re.is_match(email))
        .unwrap_or(false)
}

/// Presence and shape checks; returns the normalised email and the password
pub fn validate_login(request: &LoginRequest) -> Result<(String, &str), ApiError> {
    let (email, password) = match (request.email.as_deref(), request.password.as_deref()) {
        (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
            (email, password)
        }
        _ => {
            return Err(ApiError::BadRequest(
                "Email and password are required".to_string(),
            ))
        }
    };
    if !is_valid_email(email) {
        return Err(ApiError::BadRequest("Invalid email format".to_string()));
    }
    Ok((email.trim().to_lowercase(), password))
}

/// Check credentials against the algo database and issue a token
pub async fn login(
    store: &AlgoStore,
    secret: Option<&str>,
    request: &LoginRequest,
) -> Result<LoginResponse, ApiError> {
    let (email, password) = validate_login(request)?;
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = store.find_user_by_email(&email).await?.ok_or_else(invalid)?;

    let password = password.to_string();
    let hash = user.password.clone();
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(ApiError::internal)?
        .unwrap_or_else(|e| {
            warn!(user_id = %user.id, error = %e, "stored password hash is unreadable");
            false
        });
    if !matches {
        return Err(invalid());
    }

    let secret = secret.ok_or_else(|| ApiError::Misconfigured("JWT_SECRET".to_string()))?;
    let username = user.username.clone().unwrap_or_default();
    let token = issue_token(secret, &user.id, &user.email, &username).map_err(ApiError::internal)?;

    store.touch_user(&user.id).await?;
    debug!(user_id = %user.id, "login succeeded");

    Ok(LoginResponse {
        success: true,
        token,
        user: LoginUser {
            id: user.id,
            email: user.email,
            username,
        },
        message: "Login successful".to_string(),
    })
}
