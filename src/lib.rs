pub mod buffer;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod models;
pub mod observe;
pub mod remote;
pub mod session;
pub mod workflow;

pub use buffer::{FileBuffer, InMemoryBuffer, ShortTermBuffer};
pub use cli::{Cli, Command, GlobalArgs};
pub use config::MemoryConfig;
pub use engine::{
    AppendStatus, ConversationMemory, GraphitiMemory, MemorySettings, MemoryVariables, WriteBack,
    WriteBackReport, NO_HISTORY,
};
pub use error::{MemoryError, Result};
pub use logging::{clear_logs, log, read_logs, FileLogObserver};
pub use observe::{MemoryEvent, MemoryObserver, Operation};
pub use remote::{HttpMemoryService, MemoryService};
pub use session::{resolve_session, SessionId};
