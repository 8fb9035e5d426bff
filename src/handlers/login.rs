// POST /api/login handler

use std::sync::Arc;

use tracing::info;

use crate::auth::{self, LoginRequest};
use crate::state::AppState;

pub async fn login_handler(
    state: Arc<AppState>,
    request: LoginRequest,
) -> Result<impl warp::Reply, warp::Rejection> {
    info!("POST /api/login");
    let secret = state.jwt_secret();
    let response = auth::login(&state.algo, secret.as_deref(), &request).await?;
    Ok(warp::reply::json(&response))
}
