//! 统一可观测性模块
//!
//! 提供日志的统一初始化。检查器是一次性运行的命令行程序，
//! 日志统一写到 stderr，stdout 留给规范化后的配置输出。

pub mod tracing;

use ::tracing::debug;
use anyhow::Result;

use crate::config::ObservabilityConfig;

/// 可观测性资源守卫
///
/// 持有日志相关资源的生命周期，drop 时输出关闭日志。
pub struct ObservabilityGuard {
    service_name: String,
}

impl Drop for ObservabilityGuard {
    fn drop(&mut self) {
        debug!(service = %self.service_name, "Shutting down observability...");
    }
}

/// 统一初始化可观测性
///
/// # Example
///
/// ```ignore
/// use checker_shared::config::AppConfig;
/// use checker_shared::observability;
///
/// fn main() -> anyhow::Result<()> {
///     let config = AppConfig::load("config-checker")?;
///     let _guard = observability::init(&config.service_name, &config.observability)?;
///
///     // 应用逻辑...
///
///     Ok(())
/// }
/// ```
pub fn init(service_name: &str, config: &ObservabilityConfig) -> Result<ObservabilityGuard> {
    tracing::init(config)?;

    debug!(
        service = %service_name,
        log_level = %config.log_level,
        json_logs = config.json_logs,
        "Observability initialized"
    );

    Ok(ObservabilityGuard {
        service_name: service_name.to_string(),
    })
}
