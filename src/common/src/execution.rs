//! 单主机执行结果与结果集
//!
//! 每台主机的输出按命令顺序拼接；主机级错误单独记录，不与命令失败混在一起

use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

use crate::error::AppError;

/// 单台主机的执行结果
#[derive(Debug, Clone)]
pub struct HostResult {
    /// 主机名
    pub hostname: String,

    /// 按命令顺序拼接的输出与失败注记
    pub output: String,

    /// 终止错误（仅在无法连接/认证时设置）
    pub error: Option<AppError>,

    /// 成功完成的命令数
    pub commands_succeeded: usize,

    /// 失败的命令数
    pub commands_failed: usize,

    /// 开始时间
    pub started_at: DateTime<Utc>,

    /// 执行时长
    pub duration: Duration,
}

impl HostResult {
    /// 创建空结果
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            output: String::new(),
            error: None,
            commands_succeeded: 0,
            commands_failed: 0,
            started_at: Utc::now(),
            duration: Duration::ZERO,
        }
    }

    /// 创建主机级失败结果
    pub fn unreachable(hostname: impl Into<String>, error: AppError) -> Self {
        let mut result = Self::new(hostname);
        result.error = Some(error);
        result
    }

    /// 追加一条命令的输出
    pub fn record_output(&mut self, command: &str, output: &str) {
        self.output
            .push_str(&format!("Command '{}' output:\n{}\n", command, output));
        self.commands_succeeded += 1;
    }

    /// 追加一条命令的失败注记
    pub fn record_failure(&mut self, command: &str, error: &AppError) {
        self.output
            .push_str(&format!("Command '{}' failed: {}\n", command, error));
        self.commands_failed += 1;
    }

    /// 设置终止错误
    pub fn fail(mut self, error: AppError) -> Self {
        self.error = Some(error);
        self
    }

    /// 记录耗时并结束
    pub fn finish(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// 主机是否可达（连接与认证成功）
    pub fn is_reachable(&self) -> bool {
        self.error.is_none()
    }
}

/// 结果集：每个输入主机恰好一条结果，顺序为到达顺序
#[derive(Debug, Clone)]
pub struct ResultSet {
    /// 本次运行的标识
    pub run_id: Uuid,
    results: Vec<HostResult>,
}

impl ResultSet {
    pub fn new(run_id: Uuid, results: Vec<HostResult>) -> Self {
        Self { run_id, results }
    }

    /// 创建空结果集
    pub fn empty() -> Self {
        Self::new(Uuid::new_v4(), Vec::new())
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HostResult> {
        self.results.iter()
    }

    /// 按主机名查找全部结果（重复主机会返回多条）
    pub fn for_host<'a>(&'a self, hostname: &'a str) -> impl Iterator<Item = &'a HostResult> + 'a {
        self.results.iter().filter(move |r| r.hostname == hostname)
    }

    /// 无法连接/认证的主机
    pub fn failed_hosts(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| !r.is_reachable())
            .map(|r| r.hostname.as_str())
            .collect()
    }

    pub fn reachable_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_reachable()).count()
    }

    pub fn unreachable_count(&self) -> usize {
        self.len() - self.reachable_count()
    }

    /// 按主机名排序（稳定排序，重复主机保持到达顺序）
    pub fn sorted_by_host(mut self) -> Self {
        self.results.sort_by(|a, b| a.hostname.cmp(&b.hostname));
        self
    }
}

impl Default for ResultSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl IntoIterator for ResultSet {
    type Item = HostResult;
    type IntoIter = std::vec::IntoIter<HostResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a HostResult;
    type IntoIter = std::slice::Iter<'a, HostResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
