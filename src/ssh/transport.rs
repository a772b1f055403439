//! 远程会话能力抽象
//!
//! 协调器只依赖这个 trait，真实 SSH 实现与测试用的模拟实现都在其后

use async_trait::async_trait;
use common::{CommonResult, ConnectionParams};

/// 远程会话能力
#[async_trait]
pub trait RemoteSession: Send + Sync + 'static {
    /// 一条已认证的连接
    type Connection: Send + 'static;

    /// 使用共享连接参数连接并认证到指定主机
    ///
    /// 超时由调用方统一施加
    async fn connect(
        &self,
        host: &str,
        params: &ConnectionParams,
    ) -> CommonResult<Self::Connection>;

    /// 在连接上执行一条命令直至结束，返回捕获的标准输出
    ///
    /// 每次调用使用独立的会话通道，返回前通道已关闭
    async fn run(&self, connection: &mut Self::Connection, command: &str) -> CommonResult<String>;

    /// 释放连接
    async fn close(&self, connection: Self::Connection);
}
