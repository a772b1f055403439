//! 主机清单
//! 从 JSON 文件读取目标主机列表：{"hosts": ["web1", "10.0.0.12"]}

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use common::{AppError, CommonResult};

/// 主机清单
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Inventory {
    /// 目标主机（保持文件中的顺序，允许重复）
    #[serde(default)]
    pub hosts: Vec<String>,
}

impl Inventory {
    /// 从文件加载主机清单
    pub fn load(path: impl AsRef<Path>) -> CommonResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::IoError(format!("read inventory {}: {}", path.display(), e))
        })?;

        let inventory = Self::parse(&content).map_err(|e| match e {
            AppError::Inventory(msg) => AppError::Inventory(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;

        debug!(path = %path.display(), hosts = inventory.hosts.len(), "Inventory loaded");
        Ok(inventory)
    }

    /// 解析清单内容，去除空白条目
    pub fn parse(content: &str) -> CommonResult<Self> {
        let raw: Inventory = serde_json::from_str(content)
            .map_err(|e| AppError::Inventory(format!("parse inventory: {}", e)))?;

        Ok(Self::from_hosts(raw.hosts))
    }

    /// 从主机列表构建清单（命令行 --host 使用同一规则）
    pub fn from_hosts<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let hosts = hosts
            .into_iter()
            .enumerate()
            .filter_map(|(index, host)| {
                let host = host.into();
                let trimmed = host.trim();
                if trimmed.is_empty() {
                    warn!(index, "Skipping blank host entry");
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect();

        Self { hosts }
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}
