//! 统一错误处理模块
//!
//! 定义文档加载过程中的错误类型，使用 thiserror 提供良好的错误信息。

use std::path::PathBuf;
use thiserror::Error;

/// 文档加载错误
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("读取文件失败: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON 解析失败: {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("文档顶层必须是对象: {path}, 实际为 {actual}")]
    NotAnObject { path: PathBuf, actual: &'static str },
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, LoadError>;

impl LoadError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "IO_ERROR",
            Self::Json { .. } => "JSON_ERROR",
            Self::NotAnObject { .. } => "NOT_AN_OBJECT",
        }
    }
}
