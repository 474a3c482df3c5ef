use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::config::HistoryConfig;
use crate::error::StoreError;
use crate::types::{ChatMessage, HistoryEntry, Role};

/// 历史文件格式：{"messages": [...]}
#[derive(Debug, Default, Deserialize)]
struct HistoryFile {
    #[serde(default)]
    messages: Vec<HistoryEntry>,
}

#[derive(Serialize)]
struct HistoryFileRef<'a> {
    messages: &'a [HistoryEntry],
}

/// 历史记录 - 每个 agent 一份，追加即落盘
///
/// `window_size` 只影响读取：底层日志永远完整保留。
pub struct HistoryStore {
    agent: String,
    path: PathBuf,
    window_size: usize,
    messages: Vec<HistoryEntry>,
}

impl HistoryStore {
    /// 打开 `root/<agent>/history.json`；文件缺失或损坏时视为空历史
    pub fn open(agent: &str, root: &Path, window_size: usize) -> Self {
        let path = root.join(agent).join("history.json");
        let messages = Self::load(&path);

        HistoryStore {
            agent: agent.to_string(),
            path,
            window_size,
            messages,
        }
    }

    pub fn from_config(agent: &str, config: &HistoryConfig) -> Self {
        Self::open(agent, &config.root, config.window_size)
    }

    fn load(path: &Path) -> Vec<HistoryEntry> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    warn!(
                        path = %path.display(),
                        "读取历史记录失败，按空历史处理：{}",
                        e
                    );
                }
                return Vec::new();
            }
        };

        match serde_json::from_str::<HistoryFile>(&content) {
            Ok(file) => {
                debug!(
                    path = %path.display(),
                    count = file.messages.len(),
                    "已加载历史记录"
                );
                file.messages
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    "历史记录格式错误，按空历史处理：{}",
                    e
                );
                Vec::new()
            }
        }
    }

    /// 先写同目录下的临时文件并 sync，再 rename 覆盖；失败时旧文件保持完整
    fn persist(&self) -> Result<(), StoreError> {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;

        let body = serde_json::to_string_pretty(&HistoryFileRef {
            messages: &self.messages,
        })?;

        let write_err = |source: std::io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        let mut tmp = NamedTempFile::new_in(parent).map_err(write_err)?;
        tmp.write_all(body.as_bytes()).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        debug!(agent = %self.agent, count = self.messages.len(), "历史记录已保存");
        Ok(())
    }

    /// 追加一条消息并立即保存；保存失败时内存状态回滚
    pub fn append(&mut self, role: Role, content: &str) -> Result<(), StoreError> {
        self.messages.push(HistoryEntry {
            role,
            content: content.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        });

        if let Err(e) = self.persist() {
            self.messages.pop();
            return Err(e);
        }
        Ok(())
    }

    /// 最近 `window_size` 条消息（不含时间戳）
    pub fn window(&self) -> Vec<ChatMessage> {
        self.recent(self.window_size)
    }

    /// 最近 `window_size` 条完整条目
    pub fn window_with_timestamps(&self) -> Vec<HistoryEntry> {
        let start = self.messages.len().saturating_sub(self.window_size);
        self.messages[start..].to_vec()
    }

    /// 最近 n 条消息（不含时间戳）
    pub fn recent(&self, n: usize) -> Vec<ChatMessage> {
        let start = self.messages.len().saturating_sub(n);
        self.messages[start..].iter().map(ChatMessage::from).collect()
    }

    /// 完整历史（副本）
    pub fn full(&self) -> Vec<HistoryEntry> {
        self.messages.clone()
    }

    /// 清空历史并立即保存
    pub fn clear(&mut self) -> Result<(), StoreError> {
        let previous = std::mem::take(&mut self.messages);
        if let Err(e) = self.persist() {
            self.messages = previous;
            return Err(e);
        }
        Ok(())
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
