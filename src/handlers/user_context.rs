// GET /api/user-context handler

use std::sync::Arc;

use crate::auth::AuthUser;
use crate::context::get_user_context_for_prompt;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn user_context_handler(
    user: AuthUser,
    state: Arc<AppState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let context = get_user_context_for_prompt(&state.algo, &user.user_id)
        .await
        .map_err(|e| ApiError::internal(format!("failed to fetch user context: {}", e)))?;
    Ok(warp::reply::json(&context))
}
