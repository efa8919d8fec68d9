//! 共享库
//!
//! 包含检查器二进制共用的配置加载、日志初始化与 JSON 文档读取等基础设施代码。

pub mod config;
pub mod error;
pub mod loader;
pub mod observability;
