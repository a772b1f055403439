//! 测试公共模块
//! 提供可编排行为的模拟远程会话

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use ops_fanout::{AppError, ConnectionParams, Credential, RemoteSession};
use secrecy::Secret;

/// 单台模拟主机的行为
#[derive(Debug, Clone, Default)]
pub struct MockHost {
    /// 连接时返回的错误
    pub connect_error: Option<AppError>,
    /// 连接一直挂起（用于超时测试）
    pub hang_on_connect: bool,
    /// 连接时 panic（用于汇合屏障测试）
    pub panic_on_connect: bool,
    /// 会失败的命令
    pub failing_commands: HashSet<String>,
}

impl MockHost {
    pub fn unreachable(error: AppError) -> Self {
        Self {
            connect_error: Some(error),
            ..Default::default()
        }
    }

    pub fn failing(commands: &[&str]) -> Self {
        Self {
            failing_commands: commands.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }
}

/// 模拟连接：记录在这条连接上执行过的命令
#[derive(Debug)]
pub struct MockConnection {
    pub host: String,
    pub executed: Vec<String>,
}

/// 模拟远程会话
///
/// 未登记的主机视为健康主机，命令输出为 "<host>:<command>"
#[derive(Default)]
pub struct MockSession {
    hosts: HashMap<String, MockHost>,
    max_jitter_ms: u64,
    pub dials: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: &str, behavior: MockHost) -> Self {
        self.hosts.insert(host.to_string(), behavior);
        self
    }

    /// 为连接与命令加入随机延迟，打乱主机完成顺序
    pub fn with_jitter(mut self, max_jitter_ms: u64) -> Self {
        self.max_jitter_ms = max_jitter_ms;
        self
    }

    async fn jitter(&self) {
        if self.max_jitter_ms == 0 {
            return;
        }
        let delay = rand::thread_rng().gen_range(0..=self.max_jitter_ms);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    fn behavior(&self, host: &str) -> MockHost {
        self.hosts.get(host).cloned().unwrap_or_default()
    }
}

/// 模拟输出
pub fn mock_output(host: &str, command: &str) -> String {
    format!("{}:{}", host, command)
}

#[async_trait]
impl RemoteSession for MockSession {
    type Connection = MockConnection;

    async fn connect(
        &self,
        host: &str,
        _params: &ConnectionParams,
    ) -> Result<MockConnection, AppError> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        self.jitter().await;

        let behavior = self.behavior(host);
        if behavior.panic_on_connect {
            panic!("mock transport crashed while dialing {}", host);
        }
        if behavior.hang_on_connect {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if let Some(error) = behavior.connect_error {
            return Err(error);
        }

        Ok(MockConnection {
            host: host.to_string(),
            executed: Vec::new(),
        })
    }

    async fn run(&self, connection: &mut MockConnection, command: &str) -> Result<String, AppError> {
        self.jitter().await;
        connection.executed.push(command.to_string());

        if self.behavior(&connection.host).failing_commands.contains(command) {
            return Err(AppError::CommandExit { status: 127 });
        }

        Ok(mock_output(&connection.host, command))
    }

    async fn close(&self, _connection: MockConnection) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// 创建使用密码认证的测试连接参数
pub fn params_for(hosts: &[&str]) -> ConnectionParams {
    ConnectionParams::new(
        hosts.iter().map(|h| h.to_string()).collect(),
        "ops",
        Credential::Password(Secret::new("test-password".to_string())),
    )
    .with_connect_timeout(Duration::from_secs(2))
}

pub fn commands(list: &[&str]) -> Vec<String> {
    list.iter().map(|c| c.to_string()).collect()
}

/// 期望的健康主机输出
pub fn expected_blob(host: &str, commands: &[&str]) -> String {
    commands
        .iter()
        .map(|c| format!("Command '{}' output:\n{}\n", c, mock_output(host, c)))
        .collect()
}
