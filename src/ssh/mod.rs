//! SSH执行模块
//! 远程会话能力：建立连接、在连接上执行命令、释放连接

pub mod executor;
pub mod transport;

pub use executor::SshTransport;
pub use transport::RemoteSession;
