//! 执行协调器
//!
//! 每台主机一个并发任务：连接一次，按顺序执行全部命令，结果经通道汇总。
//! 所有任务结束后才返回结果集，单台主机的失败只记录在它自己的结果里

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use common::{AppError, ConnectionParams, HostResult, ResultSet};

use crate::ssh::RemoteSession;

/// 默认命令列表（主机状态快照）
pub const DEFAULT_COMMANDS: &[&str] = &["uname -a", "df -h", "uptime", "free -h", "nproc"];

/// 执行协调器
pub struct ExecutionCoordinator<S: RemoteSession> {
    session: Arc<S>,
}

impl<S: RemoteSession> Clone for ExecutionCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
        }
    }
}

impl<S: RemoteSession> ExecutionCoordinator<S> {
    /// 创建新的执行协调器
    pub fn new(session: S) -> Self {
        Self {
            session: Arc::new(session),
        }
    }

    /// 在所有主机上执行命令列表
    ///
    /// 每个输入主机恰好返回一条结果（重复主机各自独立）。本方法不会失败，
    /// 所有错误都记录在各主机的结果中
    pub async fn execute(&self, params: ConnectionParams, commands: Vec<String>) -> ResultSet {
        let run_id = Uuid::new_v4();

        if params.hosts.is_empty() {
            debug!(run_id = %run_id, "No hosts given, nothing to execute");
            return ResultSet::new(run_id, Vec::new());
        }

        let host_count = params.hosts.len();
        let params = Arc::new(params);
        let commands: Arc<[String]> = commands.into();

        info!(
            run_id = %run_id,
            hosts = host_count,
            commands = commands.len(),
            "Starting fan-out execution"
        );

        if !params.credential.is_usable() {
            warn!(run_id = %run_id, "No private key or password configured, every host will fail");
        }

        let (tx, mut rx) = mpsc::channel::<HostResult>(host_count);
        let mut handles: Vec<(String, JoinHandle<()>)> = Vec::with_capacity(host_count);

        for (index, host) in params.hosts.iter().enumerate() {
            let tx = tx.clone();
            let session = self.session.clone();
            let params = params.clone();
            let commands = commands.clone();
            let hostname = host.clone();
            let span = info_span!("host", run_id = %run_id, host = %host, index);

            let handle = tokio::spawn(
                async move {
                    let result = run_host(session.as_ref(), hostname, &params, &commands).await;
                    // 接收端在全部结果到达前不会关闭
                    let _ = tx.send(result).await;
                }
                .instrument(span),
            );

            handles.push((host.clone(), handle));
        }

        // 只保留任务持有的发送端，全部任务结束后通道自然关闭
        drop(tx);

        let mut results = Vec::with_capacity(host_count);
        while let Some(result) = rx.recv().await {
            debug!(host = %result.hostname, reachable = result.is_reachable(), "Host reported");
            results.push(result);
        }

        // 汇合屏障：确认每个任务都已结束，异常退出的任务补一条主机级错误
        for (host, handle) in handles {
            if let Err(e) = handle.await {
                warn!(run_id = %run_id, host = %host, error = %e, "Host task aborted before reporting");
                results.push(HostResult::unreachable(
                    host,
                    AppError::internal_error(format!("host task aborted: {}", e)),
                ));
            }
        }

        debug_assert_eq!(results.len(), host_count);

        let result_set = ResultSet::new(run_id, results);

        info!(
            run_id = %run_id,
            hosts = result_set.len(),
            reachable = result_set.reachable_count(),
            unreachable = result_set.unreachable_count(),
            "Fan-out execution completed"
        );

        result_set
    }
}

/// 单台主机的工作单元
async fn run_host<S: RemoteSession>(
    session: &S,
    hostname: String,
    params: &ConnectionParams,
    commands: &[String],
) -> HostResult {
    let start_time = Instant::now();
    let mut result = HostResult::new(hostname);

    if !params.credential.is_usable() {
        return result.fail(AppError::NoCredential).finish(start_time.elapsed());
    }

    let connected = tokio::time::timeout(
        params.connect_timeout,
        session.connect(&result.hostname, params),
    )
    .await;

    let mut connection = match connected {
        Ok(Ok(connection)) => connection,
        Ok(Err(e)) => {
            warn!(error = %e, "Host unreachable");
            return result.fail(e).finish(start_time.elapsed());
        }
        Err(_) => {
            let e = AppError::timeout(format!(
                "connect to {} timed out after {}s",
                params.target(&result.hostname),
                params.connect_timeout.as_secs_f64()
            ));
            warn!(error = %e, "Host unreachable");
            return result.fail(e).finish(start_time.elapsed());
        }
    };

    for command in commands {
        match session.run(&mut connection, command).await {
            Ok(output) => result.record_output(command, &output),
            Err(e) => {
                warn!(command = %command, error = %e, "Command failed");
                result.record_failure(command, &e);
            }
        }
    }

    session.close(connection).await;

    debug!(
        succeeded = result.commands_succeeded,
        failed = result.commands_failed,
        "Host finished"
    );

    result.finish(start_time.elapsed())
}
