//! 配置项路径
//!
//! 裸名称直接选择顶层键；以 `/` 开头的路径按 `/` 分段，从左到右逐层进入嵌套对象。

use serde_json::{Map, Value};
use std::fmt;

/// 路径分隔符
pub const PATH_SEP: char = '/';

/// 解析后的配置项路径
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemPath {
    raw: String,
    segments: Vec<String>,
}

impl ItemPath {
    pub fn parse(raw: &str) -> Self {
        let segments = match raw.strip_prefix(PATH_SEP) {
            Some(rest) => rest.split(PATH_SEP).map(str::to_string).collect(),
            None => vec![raw.to_string()],
        };

        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// 路径分段，裸名称 `k` 与 `/k` 的分段相同
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// 是否指向同一个配置项
    pub fn same_item(&self, other: &ItemPath) -> bool {
        self.segments == other.segments
    }

    /// 读取路径对应的值，路径不存在或中间节点不是对象时返回 None
    pub fn get<'a>(&self, config: &'a Map<String, Value>) -> Option<&'a Value> {
        let (last, parents) = self.segments.split_last()?;

        let mut current = config;
        for segment in parents {
            match current.get(segment) {
                Some(Value::Object(map)) => current = map,
                _ => return None,
            }
        }

        current.get(last)
    }

    /// 写入路径对应的值
    ///
    /// 缺失的中间对象会被创建，中间位置上已有的非对象值会被覆盖。
    pub fn set(&self, config: &mut Map<String, Value>, value: Value) {
        let Some((last, parents)) = self.segments.split_last() else {
            return;
        };

        let mut current = config;
        for segment in parents {
            let slot = current
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            current = match slot {
                Value::Object(map) => map,
                _ => unreachable!("slot was just replaced with an object"),
            };
        }

        current.insert(last.clone(), value);
    }
}

impl fmt::Display for ItemPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// 按路径读取配置值
pub fn get<'a>(config: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    ItemPath::parse(path).get(config)
}

/// 按路径写入配置值
pub fn set(config: &mut Map<String, Value>, path: &str, value: Value) {
    ItemPath::parse(path).set(config, value)
}
