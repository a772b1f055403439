//! SSH 连接参数模型
//!
//! 一次运行内所有主机共享同一份连接参数，执行开始后只读

use secrecy::Secret;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 SSH 端口
pub const DEFAULT_SSH_PORT: u16 = 22;

/// 默认连接超时（秒）
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// SSH 认证凭据
#[derive(Debug, Clone, Default)]
pub enum Credential {
    /// 私钥文件路径
    KeyPath(PathBuf),
    /// 密码认证
    Password(Secret<String>),
    /// 未配置任何可用凭据，每台主机都会以认证失败结束
    #[default]
    None,
}

impl Credential {
    /// 按优先级选择凭据：私钥优先于密码，空字符串视为未设置
    pub fn select(key_path: Option<&str>, password: Option<Secret<String>>) -> Self {
        use secrecy::ExposeSecret;

        if let Some(path) = key_path.map(str::trim).filter(|p| !p.is_empty()) {
            return Credential::KeyPath(PathBuf::from(path));
        }

        match password {
            Some(password) if !password.expose_secret().is_empty() => {
                Credential::Password(password)
            }
            _ => Credential::None,
        }
    }

    /// 是否配置了可用凭据
    pub fn is_usable(&self) -> bool {
        !matches!(self, Credential::None)
    }

    /// 认证方式名称（用于日志，不包含敏感信息）
    pub fn method(&self) -> &'static str {
        match self {
            Credential::KeyPath(_) => "publickey",
            Credential::Password(_) => "password",
            Credential::None => "none",
        }
    }
}

/// SSH 连接参数
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    /// 目标主机列表（允许重复，每项都是独立目标）
    pub hosts: Vec<String>,

    /// 用户名
    pub username: String,

    /// 认证凭据
    pub credential: Credential,

    /// 端口
    pub port: u16,

    /// 连接超时（仅约束建立连接与认证阶段）
    pub connect_timeout: Duration,
}

impl ConnectionParams {
    /// 创建新的连接参数
    pub fn new(hosts: Vec<String>, username: impl Into<String>, credential: Credential) -> Self {
        Self {
            hosts,
            username: username.into(),
            credential,
            port: DEFAULT_SSH_PORT,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }

    /// 设置端口
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// 设置连接超时
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// 获取目标地址字符串
    pub fn target(&self, host: &str) -> String {
        format!("{}@{}:{}", self.username, host, self.port)
    }
}
