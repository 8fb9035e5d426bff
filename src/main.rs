//! Odin tutoring backend
//!
//! Important env variables (see `config.rs` for the full list):
//!   POSTGRES_URL                 : service database (chats, code submissions)
//!   ALGO_DATABASE_URL            : practice platform database, defaults to POSTGRES_URL
//!   JWT_SECRET                   : HS256 secret shared with the web app
//!   GOOGLE_GENERATIVE_AI_API_KEY : or GCP_PROJECT_ID for Vertex AI
//!   BRAVE_API_KEY                : enables web search
//!   LOG_LEVEL                    : tracing filter
//!   LOG_FORMAT                   : "pretty" (default) or "json"

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use odin_tutor::config::AppConfig;
use odin_tutor::db::{AlgoStore, ChatStore, DbConfig};
use odin_tutor::llm::create_provider;
use odin_tutor::routes::configure_routes;
use odin_tutor::search::WebSearch;
use odin_tutor::state::AppState;
use odin_tutor::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let config = AppConfig::from_env()?;

    let chat_pool = DbConfig::from_connection_string(&config.chat_database_url)?
        .with_max_pool_size(config.db_pool_size)
        .build_pool()?;
    let algo_pool = DbConfig::from_connection_string(&config.algo_database_url)?
        .with_max_pool_size(config.db_pool_size)
        .build_pool()?;

    let chats = ChatStore::new(chat_pool);
    if config.run_migrations {
        chats.migrate().await?;
    }
    let algo = AlgoStore::new(algo_pool);

    let provider = create_provider(config.gemini_model.clone(), config.gemini_credentials.clone()).await?;
    let search = WebSearch::new(config.brave_api_key.clone())?;
    if !search.is_configured() {
        warn!("BRAVE_API_KEY not set; web search returns no results");
    }
    if config.jwt_secret.is_none() {
        warn!("JWT_SECRET not set; authenticated routes will fail");
    }

    let addr = SocketAddr::new(config.host, config.port);
    info!(
        %addr,
        model = config.gemini_model.as_str(),
        credentials = ?config.gemini_credentials,
        "starting server"
    );

    let state = Arc::new(AppState::new(config, algo, chats, provider, search));
    warp::serve(configure_routes(state)).run(addr).await;
    Ok(())
}
