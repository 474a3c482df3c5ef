mod message;
mod source;

pub use message::{ChatMessage, HistoryEntry, Role};
pub use source::{Source, SourceKind};
