// POST /api/chat, DELETE /api/chat?id= and GET /api/chat/{id} handlers

use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::context::get_user_context_for_prompt;
use crate::db::ChatRecord;
use crate::error::ApiError;
use crate::llm::{Agent, AgentError, GenerationConfig, Message};
use crate::models::{
    to_llm_history, transcript_from_messages, ChatRequest, ChatTranscript, DeleteChatQuery,
    SuccessResponse,
};
use crate::sse::{ChatEvent, ChatEventMapper};
use crate::state::AppState;
use crate::tutor::{build_registry, system_prompt};

/// Split history into the part stored as-is and the window sent to the model
pub fn split_history(mut history: Vec<Message>, window: usize) -> (Vec<Message>, Vec<Message>) {
    let at = history.len().saturating_sub(window.max(1));
    let recent = history.split_off(at);
    (history, recent)
}

/// What the client is told when a run fails
pub fn client_error_message(err: &AgentError) -> String {
    match err {
        AgentError::MaxIterationsReached(_) => {
            "The tutor needed too many steps to answer. Please try rephrasing.".to_string()
        }
        _ => "An error occurred while generating the response".to_string(),
    }
}

fn ensure_owner(record: &ChatRecord, user: &AuthUser) -> Result<(), ApiError> {
    if record.external_user_id != user.user_id {
        return Err(ApiError::Unauthorized("Unauthorized".to_string()));
    }
    Ok(())
}

/// Run the agent to completion, forwarding client events into `tx`.
///
/// Returns true when the run finished cleanly and the conversation should be
/// saved. A failed run sends one `error` event; a closed receiver stops the run.
pub async fn drive_agent(agent: &mut Agent, tx: &mpsc::UnboundedSender<ChatEvent>) -> bool {
    let mut mapper = ChatEventMapper::new();
    let mut run = agent.run();
    while let Some(item) = run.next().await {
        match item {
            Ok(event) => {
                if let Some(chat_event) = mapper.map(event) {
                    if tx.send(chat_event).is_err() {
                        warn!("client disconnected, abandoning agent run");
                        return false;
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "agent run failed");
                let _ = tx.send(ChatEvent::Error {
                    message: client_error_message(&e),
                });
                return false;
            }
        }
    }
    true
}

pub async fn chat_handler(
    user: AuthUser,
    state: Arc<AppState>,
    request: ChatRequest,
) -> Result<impl warp::Reply, warp::Rejection> {
    let chat_id = request.id;
    let history = to_llm_history(&request.messages, usize::MAX);
    if history.is_empty() {
        return Err(ApiError::BadRequest("No messages provided".to_string()).into());
    }

    if let Some(existing) = state.chats.get_chat(chat_id).await.map_err(ApiError::from)? {
        ensure_owner(&existing, &user)?;
    }

    info!(user_id = %user.user_id, %chat_id, messages = history.len(), "POST /api/chat");

    let learner = if state.config.chat_include_user_context {
        match get_user_context_for_prompt(&state.algo, &user.user_id).await {
            Ok(context) => Some(context.summary),
            Err(e) => {
                warn!(user_id = %user.user_id, error = %e, "continuing without learner context");
                None
            }
        }
    } else {
        None
    };
    let system = system_prompt(Utc::now().date_naive(), learner.as_deref());

    let registry = build_registry(state.tool_context(&user.user_id)).map_err(ApiError::internal)?;
    let (older, window) = split_history(history, state.config.chat_history_window);
    let mut generation = GenerationConfig::new(state.config.max_tokens);
    if let Some(temperature) = state.config.temperature {
        generation = generation.with_temperature(temperature);
    }
    let mut agent = Agent::new(state.provider.clone(), Box::new(registry), generation, Some(system))
        .with_max_iterations(state.config.agent_max_iterations)
        .with_history(window);

    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let finished = drive_agent(&mut agent, &tx).await;
        drop(tx);
        if !finished {
            warn!(%chat_id, "chat not saved after an unfinished run");
            return;
        }
        let mut messages = older;
        messages.extend_from_slice(agent.messages());
        match serde_json::to_value(&messages) {
            Ok(value) => {
                if let Err(e) = state
                    .chats
                    .save_chat(chat_id, &value, &user.user_id, Some(user.email.as_str()))
                    .await
                {
                    error!(%chat_id, error = %e, "failed to save chat");
                }
            }
            Err(e) => error!(%chat_id, error = %e, "failed to serialize chat"),
        }
    });

    let events = UnboundedReceiverStream::new(rx).map(ChatEvent::into_sse);
    Ok(warp::sse::reply(warp::sse::keep_alive().stream(events)))
}

/// The chat a DELETE targets; a missing or malformed id is simply not found
pub fn chat_id_from_query(query: &DeleteChatQuery) -> Result<Uuid, ApiError> {
    query
        .id
        .as_deref()
        .and_then(|id| Uuid::parse_str(id.trim()).ok())
        .ok_or_else(|| ApiError::NotFound("Chat not found".to_string()))
}

pub async fn delete_chat_handler(
    chat_id: Uuid,
    user: AuthUser,
    state: Arc<AppState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let not_found = || ApiError::NotFound("Chat not found".to_string());
    let record = state
        .chats
        .get_chat(chat_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(not_found)?;
    ensure_owner(&record, &user)?;

    state.chats.delete_chat(chat_id).await.map_err(ApiError::from)?;
    info!(user_id = %user.user_id, %chat_id, "chat deleted");

    Ok(warp::reply::json(&SuccessResponse {
        success: true,
        message: "Chat deleted".to_string(),
    }))
}

pub async fn get_chat_handler(
    chat_id: Uuid,
    user: AuthUser,
    state: Arc<AppState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let record = state
        .chats
        .get_chat(chat_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound("Chat not found".to_string()))?;
    ensure_owner(&record, &user)?;

    let messages: Vec<Message> = serde_json::from_value(record.messages)
        .map_err(|e| ApiError::internal(format!("stored chat {} is malformed: {}", chat_id, e)))?;

    Ok(warp::reply::json(&ChatTranscript {
        chat_id,
        messages: transcript_from_messages(&messages, record.created_at),
    }))
}
