//! JSON 文档加载器
//!
//! 从磁盘读取规则集与待检查配置。两者都必须是 JSON 对象，
//! 规则集的键顺序会被保留，作为规则的定义顺序。

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{LoadError, Result};

/// 从字符串解析 JSON 对象
pub fn parse_object(text: &str, path: &Path) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(LoadError::NotAnObject {
            path: path.to_path_buf(),
            actual: json_type_name(&other),
        }),
    }
}

/// 读取 JSON 对象文件
pub fn load_object(path: impl AsRef<Path>) -> Result<Map<String, Value>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let map = parse_object(&text, path)?;
    debug!(path = %path.display(), keys = map.len(), "JSON document loaded");
    Ok(map)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_object_preserves_key_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"zeta": 1, "alpha": 2, "mid": 3}}"#).unwrap();

        let map = load_object(file.path()).unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_object("/nonexistent/rules.json").unwrap_err();
        assert_eq!(err.code(), "IO_ERROR");
    }

    #[test]
    fn test_parse_rejects_non_object() {
        let err = parse_object("[1, 2]", Path::new("config.json")).unwrap_err();
        assert!(matches!(err, LoadError::NotAnObject { actual: "array", .. }));
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = parse_object("{\"a\": ", Path::new("config.json")).unwrap_err();
        assert_eq!(err.code(), "JSON_ERROR");
    }
}
