// Route definitions

use std::convert::Infallible;
use std::sync::Arc;

use uuid::Uuid;
use warp::Filter;

use crate::auth::with_auth;
use crate::error::handle_rejection;
use crate::handlers;
use crate::models::DeleteChatQuery;
use crate::state::AppState;

/// Largest JSON body accepted; chat requests carry the whole conversation
const MAX_BODY_BYTES: u64 = 1024 * 1024;

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// Chat id from `?id=`, checked before the caller is authenticated
fn chat_id_query() -> impl Filter<Extract = (Uuid,), Error = warp::Rejection> + Clone {
    warp::query::<DeleteChatQuery>().and_then(|query: DeleteChatQuery| async move {
        handlers::chat::chat_id_from_query(&query).map_err(warp::reject::custom)
    })
}

pub fn configure_routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = impl warp::Reply, Error = Infallible> + Clone {
    let auth = with_auth(state.jwt_secret());

    // GET /api/health
    let health = warp::path!("api" / "health")
        .and(warp::get())
        .and_then(handlers::health_handler);

    // POST /api/login
    let login = warp::path!("api" / "login")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(json_body())
        .and_then(handlers::login_handler);

    // POST /api/chat
    let chat = warp::path!("api" / "chat")
        .and(warp::post())
        .and(auth.clone())
        .and(with_state(state.clone()))
        .and(json_body())
        .and_then(handlers::chat_handler);

    // DELETE /api/chat?id={chatId}
    let delete_chat = warp::path!("api" / "chat")
        .and(warp::delete())
        .and(chat_id_query())
        .and(auth.clone())
        .and(with_state(state.clone()))
        .and_then(handlers::delete_chat_handler);

    // GET /api/chat/{chatId}
    let get_chat = warp::path!("api" / "chat" / Uuid)
        .and(warp::get())
        .and(auth.clone())
        .and(with_state(state.clone()))
        .and_then(handlers::get_chat_handler);

    // GET /api/history
    let history = warp::path!("api" / "history")
        .and(warp::get())
        .and(auth.clone())
        .and(with_state(state.clone()))
        .and_then(handlers::history_handler);

    // GET /api/user-context
    let user_context = warp::path!("api" / "user-context")
        .and(warp::get())
        .and(auth.clone())
        .and(with_state(state.clone()))
        .and_then(handlers::user_context_handler);

    // GET /api/tags
    let tags = warp::path!("api" / "tags")
        .and(warp::get())
        .and(auth.clone())
        .and(with_state(state.clone()))
        .and_then(handlers::tags_handler);

    // POST /api/search
    let search = warp::path!("api" / "search")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(json_body())
        .and_then(handlers::search_handler);

    // POST /api/submit
    let submit = warp::path!("api" / "submit")
        .and(warp::post())
        .and(auth)
        .and(with_state(state))
        .and(json_body())
        .and_then(handlers::submit_handler);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allow_headers(vec!["Content-Type", "Authorization"]);

    health
        .or(login)
        .or(chat)
        .or(delete_chat)
        .or(get_chat)
        .or(history)
        .or(user_context)
        .or(tags)
        .or(search)
        .or(submit)
        .with(cors)
        .recover(handle_rejection)
}
