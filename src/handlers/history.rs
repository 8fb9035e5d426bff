// GET /api/history handler

use std::sync::Arc;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn history_handler(
    user: AuthUser,
    state: Arc<AppState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let chats = state
        .chats
        .chats_for_user(&user.user_id)
        .await
        .map_err(ApiError::from)?;
    Ok(warp::reply::json(&chats))
}
