// GET /api/tags handler

use std::sync::Arc;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::questions::get_tags;
use crate::state::AppState;

pub async fn tags_handler(
    _user: AuthUser,
    state: Arc<AppState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let tags = get_tags(&state.algo).await.map_err(ApiError::from)?;
    Ok(warp::reply::json(&tags))
}
