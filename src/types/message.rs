use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            _ => Err(ParseError::UnknownRole(s.to_string())),
        }
    }
}

/// 历史记录条目（持久化格式）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: String,
}

/// 可直接提交给生成接口的消息（不含时间戳）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl From<&HistoryEntry> for ChatMessage {
    fn from(entry: &HistoryEntry) -> Self {
        ChatMessage {
            role: entry.role,
            content: entry.content.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::User, Role::Assistant, Role::System] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert_eq!("ASSISTANT".parse::<Role>(), Ok(Role::Assistant));
        assert!("tool".parse::<Role>().is_err());
    }

    #[test]
    fn entry_serializes_lowercase_role() {
        let entry = HistoryEntry {
            role: Role::Assistant,
            content: "hi".to_string(),
            timestamp: "2026-01-01T00:00:00+00:00".to_string(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "hi");
        assert_eq!(json["timestamp"], "2026-01-01T00:00:00+00:00");
    }

    #[test]
    fn chat_message_drops_timestamp() {
        let entry = HistoryEntry {
            role: Role::User,
            content: "question".to_string(),
            timestamp: "t".to_string(),
        };
        let msg = ChatMessage::from(&entry);
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("timestamp").is_none());
        assert_eq!(json["role"], "user");
    }
}
