//! 统一错误模型
//!
//! 主机级错误（无法连接/认证）与命令级错误（单条命令失败）共用同一类型，
//! 由协调器决定记录为终止错误还是输出中的失败注记

/// 应用错误类型
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Inventory error: {0}")]
    Inventory(String),

    #[error("no auth method: neither a private key nor a password is configured")]
    NoCredential,

    #[error("load key: {0}")]
    KeyLoad(String),

    #[error("SSH connection error: {0}")]
    SshConnectionError(String),

    #[error("SSH authentication failed: {0}")]
    SshAuthenticationError(String),

    #[error("SSH execution error: {0}")]
    SshExecutionError(String),

    #[error("exited with status {status}")]
    CommandExit { status: u32 },

    #[error("killed by signal {0}")]
    CommandSignal(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// 是否属于主机级（终止）错误
    pub fn is_host_level(&self) -> bool {
        matches!(
            self,
            AppError::NoCredential
                | AppError::KeyLoad(_)
                | AppError::SshConnectionError(_)
                | AppError::SshAuthenticationError(_)
                | AppError::Timeout(_)
                | AppError::Internal(_)
        )
    }

    /// 获取错误码
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_INVALID",
            AppError::Inventory(_) => "INVENTORY_INVALID",
            AppError::NoCredential => "NO_CREDENTIAL",
            AppError::KeyLoad(_) => "KEY_LOAD_FAILED",
            AppError::SshConnectionError(_) => "CONNECT_FAILED",
            AppError::SshAuthenticationError(_) => "AUTH_FAILED",
            AppError::SshExecutionError(_) => "EXEC_FAILED",
            AppError::CommandExit { .. } => "COMMAND_EXIT",
            AppError::CommandSignal(_) => "COMMAND_SIGNAL",
            AppError::Timeout(_) => "TIMEOUT",
            AppError::IoError(_) => "IO_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    // 便捷方法
    pub fn connection(msg: impl Into<String>) -> Self {
        AppError::SshConnectionError(msg.into())
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        AppError::SshAuthenticationError(msg.into())
    }

    pub fn execution(msg: impl Into<String>) -> Self {
        AppError::SshExecutionError(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        AppError::Timeout(msg.into())
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

/// 从 std::io::Error 转换
impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::IoError(e.to_string())
    }
}
