pub mod config;
pub mod error;
pub mod types;
pub mod agent;
pub mod cli;

pub use config::{Config, HistoryConfig, SessionConfig};
pub use error::{ParseError, StoreError};
pub use agent::{HistoryStore, SessionContext, SourceRegistry, TokenLimitInfo};
pub use cli::run_cli;
