//! Common types shared between the execution coordinator and the SSH transport

// 导出所有模块
pub mod error;
pub mod execution;
pub mod ssh;

// 重新导出常用的类型
pub use error::{AppError, Result as CommonResult};

pub use execution::{HostResult, ResultSet};

pub use ssh::{ConnectionParams, Credential, DEFAULT_SSH_PORT};
