use std::path::PathBuf;

use thiserror::Error;

/// 持久化层错误（目录创建、写文件等致命 I/O）
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("创建目录失败：{}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("写入文件失败：{}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("读取目录失败：{}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("序列化历史记录失败：{0}")]
    Serialize(#[from] serde_json::Error),
}

/// 字符串到枚举的解析错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("未知角色：{0}")]
    UnknownRole(String),

    #[error("未知来源类型：{0}")]
    UnknownSourceKind(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_dir_error_mentions_path() {
        let e = StoreError::CreateDir {
            path: PathBuf::from("/nope/sessions"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = e.to_string();
        assert!(msg.contains("/nope/sessions"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn parse_error_display() {
        assert_eq!(
            ParseError::UnknownSourceKind("blog".to_string()).to_string(),
            "未知来源类型：blog"
        );
        assert_eq!(
            ParseError::UnknownRole("tool".to_string()).to_string(),
            "未知角色：tool"
        );
    }
}
