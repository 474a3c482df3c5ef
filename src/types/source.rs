use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// 引用来源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Note,
    Entity,
    File,
    Core,
    Archive,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Note => "note",
            SourceKind::Entity => "entity",
            SourceKind::File => "file",
            SourceKind::Core => "core",
            SourceKind::Archive => "archive",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "note" => Ok(SourceKind::Note),
            "entity" => Ok(SourceKind::Entity),
            "file" => Ok(SourceKind::File),
            "core" => Ok(SourceKind::Core),
            "archive" => Ok(SourceKind::Archive),
            _ => Err(ParseError::UnknownSourceKind(s.to_string())),
        }
    }
}

/// 单轮对话中登记的引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub index: usize,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_known_names() {
        assert_eq!("note".parse::<SourceKind>(), Ok(SourceKind::Note));
        assert_eq!("Archive".parse::<SourceKind>(), Ok(SourceKind::Archive));
        assert_eq!(
            "blog".parse::<SourceKind>(),
            Err(ParseError::UnknownSourceKind("blog".to_string()))
        );
    }

    #[test]
    fn source_serializes_kind_as_type() {
        let source = Source {
            index: 1,
            kind: SourceKind::Entity,
            label: "Alice".to_string(),
            detail: None,
        };
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["type"], "entity");
        assert!(json.get("detail").is_none());
    }
}
