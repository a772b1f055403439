//! SSH执行器模块
//! 使用 russh 库实现真实的 SSH 连接和命令执行
//!
//! 注意: 不做主机密钥校验，接受任何服务端密钥（不安全的默认行为）

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use russh::client;
use russh::client::Config;
use russh::ChannelMsg;
use russh_keys::key::{KeyPair, PublicKey};
use russh_keys::load_secret_key;
use secrecy::ExposeSecret;
use tracing::{debug, error, info, warn};

use common::{AppError, CommonResult, ConnectionParams, Credential};

use super::transport::RemoteSession;

/// 一条已认证的 SSH 连接
pub type SshConnection = client::Handle<ClientHandler>;

/// 基于 russh 的远程会话能力
#[derive(Clone)]
pub struct SshTransport {
    config: Arc<Config>,
}

impl Default for SshTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SshTransport {
    pub fn new() -> Self {
        Self {
            config: Arc::new(Config {
                preferred: russh::Preferred::default(),
                ..Default::default()
            }),
        }
    }
}

/// 加载私钥（读取并解析）
fn load_key(path: &Path) -> CommonResult<KeyPair> {
    load_secret_key(path, None).map_err(|e| {
        error!(path = %path.display(), error = %e, "Failed to load SSH private key");
        AppError::KeyLoad(format!("{}: {}", path.display(), e))
    })
}

/// 认证阶段使用的凭据（私钥已加载）
enum LoadedAuth<'a> {
    Password(&'a str),
    Key(Arc<KeyPair>),
}

/// 通道关闭时收集到的状态
#[derive(Debug, Default)]
struct ChannelOutcome {
    stdout: Vec<u8>,
    exit_status: Option<u32>,
    exit_signal: Option<String>,
    /// 服务端拒绝了 exec 请求，命令从未启动
    exec_rejected: bool,
}

/// 根据通道结束时的状态决定命令结果
fn command_outcome(outcome: ChannelOutcome) -> CommonResult<String> {
    let ChannelOutcome {
        stdout,
        exit_status,
        exit_signal,
        exec_rejected,
    } = outcome;

    if exec_rejected {
        return Err(AppError::execution("start: exec request rejected"));
    }

    if let Some(signal) = exit_signal {
        return Err(AppError::CommandSignal(signal));
    }

    match exit_status {
        Some(0) | None => Ok(String::from_utf8_lossy(&stdout).into_owned()),
        Some(status) => Err(AppError::CommandExit { status }),
    }
}

#[async_trait]
impl RemoteSession for SshTransport {
    type Connection = SshConnection;

    async fn connect(&self, host: &str, params: &ConnectionParams) -> CommonResult<SshConnection> {
        debug!(
            host = %host,
            port = params.port,
            user = %params.username,
            auth = params.credential.method(),
            "Connecting"
        );

        // 先准备凭据，失败时不必拨号
        let auth = match &params.credential {
            Credential::KeyPath(path) => LoadedAuth::Key(Arc::new(load_key(path)?)),
            Credential::Password(password) => LoadedAuth::Password(password.expose_secret()),
            Credential::None => return Err(AppError::NoCredential),
        };

        let handler = ClientHandler {
            host: host.to_string(),
            port: params.port,
        };

        let mut handle = client::connect(self.config.clone(), (host.to_string(), params.port), handler)
            .await
            .map_err(|e| {
                error!(host = %host, error = %e, "SSH connection failed");
                AppError::connection(format!("dial {}: {}", host, e))
            })?;

        let auth_result = match auth {
            LoadedAuth::Password(password) => {
                handle
                    .authenticate_password(params.username.clone(), password)
                    .await
            }
            LoadedAuth::Key(key) => {
                handle
                    .authenticate_publickey(params.username.clone(), key)
                    .await
            }
        };

        match auth_result {
            Ok(true) => {
                info!(target_host = %params.target(host), "SSH authentication succeeded");
                Ok(handle)
            }
            Ok(false) => {
                error!(host = %host, "SSH authentication failed");
                let _ = handle
                    .disconnect(russh::Disconnect::ByApplication, "", "")
                    .await;
                Err(AppError::authentication(format!(
                    "{} rejected {} authentication",
                    params.target(host),
                    params.credential.method()
                )))
            }
            Err(e) => {
                error!(host = %host, error = %e, "SSH authentication failed");
                Err(AppError::authentication(format!("{}: {}", params.target(host), e)))
            }
        }
    }

    async fn run(&self, handle: &mut SshConnection, command: &str) -> CommonResult<String> {
        let start_time = std::time::Instant::now();

        let mut channel = handle.channel_open_session().await.map_err(|e| {
            error!(error = %e, "Failed to open SSH channel");
            AppError::execution(format!("session: {}", e))
        })?;

        channel.exec(true, command).await.map_err(|e| {
            error!(error = %e, command = %command, "Failed to start command");
            AppError::execution(format!("start: {}", e))
        })?;

        let mut outcome = ChannelOutcome::default();
        let mut stderr = Vec::new();

        // 读到通道关闭为止，退出状态之后仍可能有数据
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => {
                    outcome.stdout.extend_from_slice(data);
                }
                ChannelMsg::ExtendedData { ref data, ext } => {
                    if ext == 1 {
                        // SSH_EXTENDED_DATA_STDERR
                        stderr.extend_from_slice(data);
                    }
                }
                ChannelMsg::ExitStatus { exit_status: status } => {
                    outcome.exit_status = Some(status);
                }
                ChannelMsg::ExitSignal { signal_name, .. } => {
                    outcome.exit_signal = Some(format!("{:?}", signal_name));
                }
                ChannelMsg::Failure => {
                    warn!(command = %command, "Server rejected exec request");
                    outcome.exec_rejected = true;
                    // 命令未启动，服务端不一定会关闭通道
                    break;
                }
                _ => {}
            }
        }

        let _ = channel.close().await;

        if !stderr.is_empty() {
            debug!(
                command = %command,
                stderr = %String::from_utf8_lossy(&stderr),
                "Command wrote to stderr"
            );
        }

        debug!(
            command = %command,
            exit_status = ?outcome.exit_status,
            duration_secs = start_time.elapsed().as_secs_f64(),
            stdout_len = outcome.stdout.len(),
            stderr_len = stderr.len(),
            "Command executed"
        );

        command_outcome(outcome)
    }

    async fn close(&self, handle: SshConnection) {
        let _ = handle
            .disconnect(russh::Disconnect::ByApplication, "", "")
            .await;
    }
}

/// SSH 客户端会话处理器
pub struct ClientHandler {
    host: String,
    port: u16,
}

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        debug!(
            host = %self.host,
            port = self.port,
            fingerprint = %server_public_key.fingerprint(),
            "Host key verification DISABLED - accepting server key"
        );
        Ok(true)
    }
}
