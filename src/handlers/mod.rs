// Handlers module

pub mod chat;
pub mod health;
pub mod history;
pub mod login;
pub mod search;
pub mod submit;
pub mod tags;
pub mod user_context;

pub use chat::{chat_handler, delete_chat_handler, get_chat_handler};
pub use health::health_handler;
pub use history::history_handler;
pub use login::login_handler;
pub use search::search_handler;
pub use submit::submit_handler;
pub use tags::tags_handler;
pub use user_context::user_context_handler;
