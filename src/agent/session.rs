use chrono::Local;
use once_cell::unsync::OnceCell;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::StoreError;

/// 指定会话 ID 的环境变量（用于恢复之前的运行）
pub const SESSION_ID_ENV: &str = "QQ_SESSION_ID";

/// 生成新的会话 ID：秒级时间戳 + 8 位随机十六进制
pub fn generate_session_id() -> String {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", stamp, &random[..8])
}

/// 会话上下文 - 由进程入口持有并显式传递
///
/// 首次 `get()` 时才确定 ID：优先外部覆盖值，否则新生成；之后在整个生命周期内保持不变，
/// 除非调用 `set()` 显式恢复某个会话。
#[derive(Debug, Default)]
pub struct SessionContext {
    id: OnceCell<String>,
    env_override: Option<String>,
}

impl SessionContext {
    pub fn new() -> Self {
        SessionContext::default()
    }

    /// 读取一次 $QQ_SESSION_ID 作为覆盖值
    pub fn from_env() -> Self {
        let env_override = std::env::var(SESSION_ID_ENV)
            .ok()
            .filter(|id| !id.trim().is_empty());
        Self::with_override(env_override)
    }

    pub fn with_override(id: Option<String>) -> Self {
        SessionContext {
            id: OnceCell::new(),
            env_override: id,
        }
    }

    /// 获取会话 ID（惰性初始化）
    pub fn get(&self) -> &str {
        self.id.get_or_init(|| match &self.env_override {
            Some(id) => {
                debug!(session_id = %id, "使用外部指定的会话 ID");
                id.clone()
            }
            None => {
                let id = generate_session_id();
                debug!(session_id = %id, "生成新会话 ID");
                id
            }
        })
    }

    /// 显式设置会话 ID（恢复会话）
    pub fn set(&mut self, id: impl Into<String>) {
        self.id = OnceCell::with_value(id.into());
    }

    /// 当前会话的目录：base/agent/sessions/<id>
    pub fn resolve_directory(&self, base: &Path, agent: &str) -> Result<PathBuf, StoreError> {
        resolve_directory(base, agent, self.get())
    }
}

pub fn sessions_root(base: &Path, agent: &str) -> PathBuf {
    base.join(agent).join("sessions")
}

/// 组合会话目录路径，不存在则创建
pub fn resolve_directory(
    base: &Path,
    agent: &str,
    session_id: &str,
) -> Result<PathBuf, StoreError> {
    let dir = sessions_root(base, agent).join(session_id);
    fs::create_dir_all(&dir).map_err(|source| StoreError::CreateDir {
        path: dir.clone(),
        source,
    })?;
    debug!(path = %dir.display(), "会话目录就绪");
    Ok(dir)
}

/// 列出 agent 下的所有会话，按 ID 降序（即时间倒序）
pub fn list_sessions(base: &Path, agent: &str) -> Result<Vec<String>, StoreError> {
    let root = sessions_root(base, agent);
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let read_err = |source: std::io::Error| StoreError::ReadDir {
        path: root.clone(),
        source,
    };

    let mut sessions = Vec::new();
    for entry in fs::read_dir(&root).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if !is_dir {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            sessions.push(name.to_string());
        }
    }

    sessions.sort_by(|a, b| b.cmp(a));
    Ok(sessions)
}

/// 最近的会话
pub fn latest_session(base: &Path, agent: &str) -> Result<Option<String>, StoreError> {
    Ok(list_sessions(base, agent)?.into_iter().next())
}
