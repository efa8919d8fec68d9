//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// 检查模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckModeSetting {
    /// 遇到第一个失败的规则立即停止
    #[default]
    FailFast,
    /// 评估全部规则后统一报告失败
    CollectAll,
}

/// 检查配置
#[derive(Debug, Clone, Deserialize)]
pub struct CheckConfig {
    #[serde(default)]
    pub mode: CheckModeSetting,
    /// 输出的配置是否格式化
    #[serde(default)]
    pub pretty: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            mode: CheckModeSetting::FailFast,
            pretty: false,
        }
    }
}

/// 可观测性配置
#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 是否启用 JSON 格式日志
    #[serde(default)]
    pub json_logs: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    #[serde(default)]
    pub check: CheckConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. config/{service_name}.toml（服务特定配置）
    /// 4. 环境变量（CHECKER 前缀，如 CHECKER__CHECK__MODE -> check.mode）
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("CHECKER_ENV").unwrap_or_else(|_| "development".to_string());

        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        Self::load_from(service_name, &env, Path::new(&config_dir))
    }

    /// 从指定目录加载配置
    pub fn load_from(service_name: &str, env: &str, config_dir: &Path) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", env))).required(false))
            .add_source(
                File::from(config_dir.join(format!("{}.toml", service_name))).required(false),
            )
            // 键名含下划线（log_level），因此层级分隔符使用双下划线
            .add_source(
                Environment::with_prefix("CHECKER")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.check.mode, CheckModeSetting::FailFast);
        assert!(!config.check.pretty);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_load_without_files_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from("config-checker", "test", dir.path()).unwrap();

        assert_eq!(config.service_name, "config-checker");
        assert_eq!(config.environment, "test");
        assert_eq!(config.check.mode, CheckModeSetting::FailFast);
        assert!(!config.is_production());
    }

    #[test]
    fn test_service_file_overrides_default_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            "[check]\nmode = \"fail_fast\"\npretty = true\n\n[observability]\nlog_level = \"warn\"\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("config-checker.toml"),
            "[check]\nmode = \"collect_all\"\n",
        )
        .unwrap();

        let config = AppConfig::load_from("config-checker", "test", dir.path()).unwrap();
        assert_eq!(config.check.mode, CheckModeSetting::CollectAll);
        assert!(config.check.pretty);
        assert_eq!(config.observability.log_level, "warn");
    }

    #[test]
    fn test_invalid_mode_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("default.toml"), "[check]\nmode = \"sometimes\"\n").unwrap();

        assert!(AppConfig::load_from("config-checker", "test", dir.path()).is_err());
    }
}
