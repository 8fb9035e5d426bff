//! PostgreSQL access
//!
//! Two databases sit behind this module: the service's own chat database
//! (`ChatStore`, schema shipped under `migrations/`) and the practice
//! platform's database (`AlgoStore`), which is read and only ever touched on
//! login.
//!
//! ```no_run
//! use odin_tutor::db::{AlgoStore, DbConfig};
//!
//! # async fn run() -> odin_tutor::db::Result<()> {
//! let pool = DbConfig::from_connection_string("postgresql://postgres:pw@localhost/algo")?
//!     .build_pool()?;
//! let tags = AlgoStore::new(pool).tag_names().await?;
//! # Ok(())
//! # }
//! ```

pub mod algo;
pub mod chats;
pub mod connection;
pub mod error;

pub use algo::{
    ActivityRow, AlgoStore, DifficultyCount, QuestionFilter, QuestionRow, TagProgressRow,
    UserInfo, UserRecord,
};
pub use chats::{ChatRecord, ChatStore, CodeSubmission, NewCodeSubmission};
pub use connection::DbConfig;
pub use error::{Error, Result};
