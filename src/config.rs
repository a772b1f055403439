//! 配置系统
//! 默认值 < 环境变量（OPS_ 前缀）< 命令行覆盖，密码使用 Secret 包装

use common::{ConnectionParams, Credential};
use config::{Config, ConfigError, Environment};
use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct SshSettings {
    /// SSH 用户名（必填，可由 --user 提供）
    pub username: Option<String>,
    /// SSH 密码（使用 Secret 包装，防止日志泄露）
    pub password: Option<Secret<String>>,
    /// 私钥路径（优先于密码）
    pub key_path: Option<String>,
    /// 端口
    pub port: u16,
    /// 连接超时时间（秒）
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventorySettings {
    /// 主机清单文件路径
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty, compact
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub ssh: SshSettings,
    pub inventory: InventorySettings,
    pub logging: LoggingConfig,
}

/// 命令行覆盖项（未提供的字段保持环境变量/默认值）
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub username: Option<String>,
    pub key_path: Option<String>,
    pub port: Option<u16>,
    pub connect_timeout_secs: Option<u32>,
    pub inventory_path: Option<String>,
    pub log_level: Option<String>,
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(CliOverrides::default())
    }

    /// 加载配置并应用命令行覆盖
    pub fn load(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        // 添加默认配置
        settings = settings
            .set_default("ssh.port", 22)?
            .set_default("ssh.connect_timeout_secs", 5)?
            .set_default("inventory.path", "inventory.json")?
            .set_default("logging.level", "warn")?
            .set_default("logging.format", "compact")?;

        // 从环境变量加载配置（前缀为 OPS_）
        // 环境变量一律按字符串读取，数值字段在反序列化时转换，密码保持原样
        settings = settings.add_source(
            Environment::with_prefix("OPS")
                .prefix_separator("_")
                .separator("__"),
        );

        settings = settings
            .set_override_option("ssh.username", overrides.username)?
            .set_override_option("ssh.key_path", overrides.key_path)?
            .set_override_option("ssh.port", overrides.port.map(i64::from))?
            .set_override_option(
                "ssh.connect_timeout_secs",
                overrides.connect_timeout_secs.map(i64::from),
            )?
            .set_override_option("inventory.path", overrides.inventory_path)?
            .set_override_option("logging.level", overrides.log_level)?;

        let config: AppConfig = settings.build()?.try_deserialize()?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    fn validate(&self) -> Result<(), ConfigError> {
        // 用户名是唯一的必填项
        match self.ssh.username.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => {}
            _ => {
                return Err(ConfigError::Message(
                    "SSH user must be specified with --user or OPS_SSH__USERNAME".to_string(),
                ))
            }
        }

        if self.ssh.port == 0 {
            return Err(ConfigError::Message("SSH port must be non-zero".to_string()));
        }

        if self.ssh.connect_timeout_secs == 0 || self.ssh.connect_timeout_secs > 300 {
            return Err(ConfigError::Message(
                "connect_timeout_secs must be between 1 and 300".to_string(),
            ));
        }

        // 验证日志级别
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        // 验证日志格式
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" | "compact" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty, compact",
                    self.logging.format
                )))
            }
        }

        Ok(())
    }
}

impl SshSettings {
    /// 为指定主机列表构建连接参数
    ///
    /// 未配置凭据不是配置错误：每台主机会各自以认证失败结束
    pub fn connection_params(&self, hosts: Vec<String>) -> ConnectionParams {
        let credential = Credential::select(self.key_path.as_deref(), self.password.clone());
        let username = self.username.as_deref().unwrap_or_default().trim().to_string();

        ConnectionParams::new(hosts, username, credential)
            .with_port(self.port)
            .with_connect_timeout(Duration::from_secs(self.connect_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "OPS_SSH__USERNAME",
        "OPS_SSH__PASSWORD",
        "OPS_SSH__KEY_PATH",
        "OPS_SSH__PORT",
        "OPS_SSH__CONNECT_TIMEOUT_SECS",
        "OPS_INVENTORY__PATH",
        "OPS_LOGGING__LEVEL",
        "OPS_LOGGING__FORMAT",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        clear_env();
        std::env::set_var("OPS_SSH__USERNAME", "ops");

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.ssh.username.as_deref(), Some("ops"));
        assert_eq!(config.ssh.port, 22);
        assert_eq!(config.ssh.connect_timeout_secs, 5);
        assert_eq!(config.inventory.path, "inventory.json");
        assert_eq!(config.logging.level, "warn");
        assert!(config.ssh.password.is_none());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_missing_username_is_rejected() {
        clear_env();

        let result = AppConfig::from_env();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("--user"));
    }

    #[test]
    #[serial]
    fn test_cli_overrides_environment() {
        clear_env();
        std::env::set_var("OPS_SSH__USERNAME", "from-env");
        std::env::set_var("OPS_SSH__PORT", "2200");

        let config = AppConfig::load(CliOverrides {
            username: Some("from-cli".to_string()),
            port: Some(2222),
            connect_timeout_secs: Some(10),
            inventory_path: Some("hosts.json".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(config.ssh.username.as_deref(), Some("from-cli"));
        assert_eq!(config.ssh.port, 2222);
        assert_eq!(config.ssh.connect_timeout_secs, 10);
        assert_eq!(config.inventory.path, "hosts.json");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_validation_invalid_log_level() {
        clear_env();
        std::env::set_var("OPS_SSH__USERNAME", "ops");
        std::env::set_var("OPS_LOGGING__LEVEL", "invalid");

        let result = AppConfig::from_env();
        assert!(result.is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_validation_invalid_timeout() {
        clear_env();

        let result = AppConfig::load(CliOverrides {
            username: Some("ops".to_string()),
            connect_timeout_secs: Some(0),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_connection_params_prefer_key() {
        clear_env();
        std::env::set_var("OPS_SSH__USERNAME", "ops");
        std::env::set_var("OPS_SSH__PASSWORD", "hunter2");

        let config = AppConfig::load(CliOverrides {
            key_path: Some("/tmp/id_ed25519".to_string()),
            ..Default::default()
        })
        .unwrap();
        let params = config
            .ssh
            .connection_params(vec!["web1".to_string(), "web2".to_string()]);

        assert!(matches!(params.credential, Credential::KeyPath(_)));
        assert_eq!(params.username, "ops");
        assert_eq!(params.hosts.len(), 2);
        assert_eq!(params.connect_timeout, Duration::from_secs(5));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_numeric_looking_secrets_are_kept_verbatim() {
        clear_env();
        std::env::set_var("OPS_SSH__USERNAME", "0042");
        std::env::set_var("OPS_SSH__PASSWORD", "007");

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.ssh.username.as_deref(), Some("0042"));
        assert_eq!(
            config.ssh.password.as_ref().map(|p| p.expose_secret().as_str()),
            Some("007")
        );

        std::env::set_var("OPS_SSH__PASSWORD", "TRUE");
        let config = AppConfig::from_env().unwrap();
        assert_eq!(
            config.ssh.password.as_ref().map(|p| p.expose_secret().as_str()),
            Some("TRUE")
        );

        clear_env();
    }

    #[test]
    #[serial]
    fn test_numeric_fields_parse_from_environment() {
        clear_env();
        std::env::set_var("OPS_SSH__USERNAME", "ops");
        std::env::set_var("OPS_SSH__PORT", "2200");
        std::env::set_var("OPS_SSH__CONNECT_TIMEOUT_SECS", "30");

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.ssh.port, 2200);
        assert_eq!(config.ssh.connect_timeout_secs, 30);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_connection_params_without_credential() {
        clear_env();
        std::env::set_var("OPS_SSH__USERNAME", "ops");

        let config = AppConfig::from_env().unwrap();
        let params = config.ssh.connection_params(vec!["web1".to_string()]);

        assert!(!params.credential.is_usable());

        clear_env();
    }
}
