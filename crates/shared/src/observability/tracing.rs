//! 日志初始化模块
//!
//! 基于 tracing-subscriber 组合环境过滤器与格式化输出层。

use anyhow::Result;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::ObservabilityConfig;

/// 构建环境过滤器
///
/// 优先使用 RUST_LOG，其次使用配置中的日志级别，都无效时回退到 info。
pub fn build_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// 初始化 tracing
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    let env_filter = build_filter(config);

    let fmt_layer = if config.json_logs {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_ansi(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_falls_back() {
        let config = ObservabilityConfig {
            log_level: "not a [valid filter".to_string(),
            json_logs: false,
        };
        // 无效的过滤表达式不应该 panic
        let _ = build_filter(&config);
    }
}
