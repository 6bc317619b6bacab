//! # 数据库配置

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{MarketError, Result};

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// 连接 URL，默认本地 SQLite 文件
    pub url: String,
    /// 连接池上限
    pub max_connections: u32,
    /// 建连超时（秒）
    pub connect_timeout: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/market.db".to_string(),
            max_connections: 10,
            connect_timeout: 30,
        }
    }
}

impl DatabaseConfig {
    /// 校验路径后返回连接串
    pub fn get_connection_url(&self) -> Result<String> {
        self.ensure_database_path()?;
        Ok(self.url.clone())
    }

    #[must_use]
    pub fn is_memory_database(&self) -> bool {
        self.url.contains(":memory:")
    }

    /// SQLite 文件库：保证父目录存在，文件交给首次连接创建
    fn ensure_database_path(&self) -> Result<()> {
        if !self.url.starts_with("sqlite://") || self.is_memory_database() {
            return Ok(());
        }

        let path = self.url.strip_prefix("sqlite://").unwrap_or(&self.url);
        let db_path = Path::new(path);
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    MarketError::config_with_source(
                        format!("无法创建数据库目录: {}", parent.display()),
                        e,
                    )
                })?;
                info!(dir = %parent.display(), "创建数据库目录");
            }
        }
        if !db_path.exists() {
            info!(file = %db_path.display(), "数据库文件将在首次连接时创建");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_url_detection() {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            ..DatabaseConfig::default()
        };
        assert!(config.is_memory_database());
        assert!(!DatabaseConfig::default().is_memory_database());
    }
}
