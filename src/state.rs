//! State shared by every request

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::{AlgoStore, ChatStore};
use crate::llm::LlmProvider;
use crate::search::WebSearch;
use crate::tutor::ToolContext;

/// Built once at start-up and never mutated
pub struct AppState {
    pub config: AppConfig,
    pub algo: AlgoStore,
    pub chats: ChatStore,
    pub provider: Arc<dyn LlmProvider>,
    pub search: WebSearch,
    jwt_secret: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        algo: AlgoStore,
        chats: ChatStore,
        provider: Arc<dyn LlmProvider>,
        search: WebSearch,
    ) -> Self {
        let jwt_secret = config.jwt_secret.as_deref().map(Arc::from);
        Self {
            config,
            algo,
            chats,
            provider,
            search,
            jwt_secret,
        }
    }

    pub fn jwt_secret(&self) -> Option<Arc<str>> {
        self.jwt_secret.clone()
    }

    /// Tool context bound to one user
    pub fn tool_context(&self, user_id: &str) -> ToolContext {
        ToolContext {
            user_id: user_id.to_string(),
            algo: self.algo.clone(),
            chats: self.chats.clone(),
            search: self.search.clone(),
        }
    }
}
