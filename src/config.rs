use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 覆盖存储根目录的环境变量
pub const HOME_ENV: &str = "QQ_HOME";

/// 默认滑动窗口大小
pub const DEFAULT_WINDOW_SIZE: usize = 20;

/// 存储根目录：优先 $QQ_HOME，否则 ~/.qq
pub fn qq_home() -> PathBuf {
    match std::env::var(HOME_ENV) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".qq"),
    }
}

/// History 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub root: PathBuf,
    pub window_size: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            root: qq_home(),
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

/// Session 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub base: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig { base: qq_home() }
    }
}

/// 统一配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub history: HistoryConfig,
    pub session: SessionConfig,
}

impl Config {
    /// 从文件加载配置，文件不存在时使用默认值
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败：{}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("解析配置文件失败：{}", path.display()))?;

        Ok(config)
    }

    /// 保存配置到文件
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// 默认配置文件位置
    pub fn default_path() -> PathBuf {
        qq_home().join("config.toml")
    }

    /// 从默认位置加载配置
    pub fn load_default() -> Result<Self> {
        Self::load(&Self::default_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.history.window_size, DEFAULT_WINDOW_SIZE);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[history]\nwindow_size = 5\nroot = \"/tmp/qq-test\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.history.window_size, 5);
        assert_eq!(config.history.root, PathBuf::from("/tmp/qq-test"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "history = [[[").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("解析配置文件失败"));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.history.window_size = 7;
        config.session.base = dir.path().to_path_buf();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.history.window_size, 7);
        assert_eq!(loaded.session.base, dir.path());
    }
}
