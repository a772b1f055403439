//! ops-fanout 主入口

use std::io::IsTerminal;

use clap::Parser;
use ops_fanout::{
    config::{AppConfig, CliOverrides},
    inventory::Inventory,
    output::{self, OutputFormat},
    telemetry, ExecutionCoordinator, SshTransport, DEFAULT_COMMANDS,
};

/// 在多台主机上并发执行命令并汇总输出
#[derive(Debug, Parser)]
#[command(name = "ops-fanout", version, about)]
struct Cli {
    /// SSH 用户名
    #[arg(short, long)]
    user: Option<String>,

    /// SSH 私钥路径（优先于 OPS_SSH__PASSWORD）
    #[arg(short, long)]
    key: Option<String>,

    /// 主机清单文件
    #[arg(short, long)]
    inventory: Option<String>,

    /// 目标主机，可重复；指定后忽略清单文件
    #[arg(long = "host", value_name = "HOST")]
    hosts: Vec<String>,

    /// 要执行的命令，可重复；替换默认命令列表
    #[arg(short, long = "command", value_name = "COMMAND")]
    commands: Vec<String>,

    /// SSH 端口
    #[arg(short, long)]
    port: Option<u16>,

    /// 连接超时（秒）
    #[arg(long, value_name = "SECS")]
    timeout: Option<u32>,

    /// 报告格式: text, json
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// 按主机名排序输出
    #[arg(long)]
    sort: bool,

    /// 禁用颜色
    #[arg(long)]
    no_color: bool,

    /// 日志级别: trace, debug, info, warn, error
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn load_dotenv() {
    // 按优先级加载：.env.<OPS_ENV> 或 .env.local > .env
    if let Ok(name) = std::env::var("OPS_ENV") {
        dotenv::from_filename(format!(".env.{}", name)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::dotenv().ok();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    load_dotenv();

    // 1. 加载配置
    let config = AppConfig::load(CliOverrides {
        username: cli.user.clone(),
        key_path: cli.key.clone(),
        port: cli.port,
        connect_timeout_secs: cli.timeout,
        inventory_path: cli.inventory.clone(),
        log_level: cli.log_level.clone(),
    })
    .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    // 2. 初始化日志
    telemetry::init_telemetry(&config.logging);

    tracing::warn!("Host key verification is disabled: every server key is accepted");

    // 3. 目标主机
    let inventory = if cli.hosts.is_empty() {
        Inventory::load(&config.inventory.path)?
    } else {
        Inventory::from_hosts(cli.hosts.clone())
    };

    if inventory.is_empty() {
        tracing::warn!("Inventory contains no hosts");
    }

    let commands: Vec<String> = if cli.commands.is_empty() {
        DEFAULT_COMMANDS.iter().map(|c| c.to_string()).collect()
    } else {
        cli.commands.clone()
    };

    // 4. 执行
    let params = config.ssh.connection_params(inventory.hosts);
    let coordinator = ExecutionCoordinator::new(SshTransport::new());
    let mut results = coordinator.execute(params, commands).await;

    if cli.sort {
        results = results.sorted_by_host();
    }

    tracing::info!(run_id = %results.run_id, "{}", output::summary_line(&results));

    // 5. 输出
    match cli.format {
        OutputFormat::Text => {
            let color = !cli.no_color && std::io::stdout().is_terminal();
            print!("{}", output::render_text(&results, color));
        }
        OutputFormat::Json => println!("{}", output::render_json(&results)?),
    }

    Ok(())
}
