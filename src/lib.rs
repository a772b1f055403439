//! 多主机命令分发
//! 并发地在一组主机上执行固定命令列表，汇总每台主机的输出或失败

pub mod config;
pub mod inventory;
pub mod output;
pub mod services;
pub mod ssh;
pub mod telemetry;

pub use common::{AppError, ConnectionParams, Credential, HostResult, ResultSet};
pub use services::{ExecutionCoordinator, DEFAULT_COMMANDS};
pub use ssh::{RemoteSession, SshTransport};
