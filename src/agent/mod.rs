pub mod history;
pub mod session;
pub mod sources;
pub mod token_limit;

pub use history::HistoryStore;
pub use session::{
    generate_session_id, latest_session, list_sessions, resolve_directory, SessionContext,
};
pub use sources::SourceRegistry;
pub use token_limit::{
    classify_overflow, parse, shrink_window, Classification, ErrorClassifier, OverflowSeverity,
    PatternClassifier, TokenLimitInfo,
};
