//! 值约束
//!
//! 一个值约束由 exists/type/allowed/default 四项组成，负责校验配置项的原始值并把
//! 字符串表示转换为声明的类型。规则定义中的 exists 与 type 本身也通过两个固定的
//! 元约束校验，与校验用户配置走同一条路径。

use crate::error::{CheckerError, Result};
use crate::range::Range;
use crate::value::{TypedValue, ValueType, classify};
use serde_json::{Map, Value};
use std::fmt;

pub const KEY_EXISTS: &str = "exists";
pub const KEY_TYPE: &str = "type";
pub const KEY_ALLOWED: &str = "allowed";
pub const KEY_DEFAULT: &str = "default";

/// 约束定义中允许出现的键
pub const CONSTRAINT_KEYS: [&str; 4] = [KEY_EXISTS, KEY_TYPE, KEY_ALLOWED, KEY_DEFAULT];

/// 允许的取值
#[derive(Debug, Clone, PartialEq)]
pub enum Allowed {
    /// 有序的候选值列表
    Values(Vec<TypedValue>),
    /// 数值区间
    Range(Range),
}

impl Allowed {
    pub fn contains(&self, value: &TypedValue) -> bool {
        match self {
            Self::Values(values) => values.contains(value),
            Self::Range(range) => range.contains(value),
        }
    }
}

impl fmt::Display for Allowed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Values(values) => {
                let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "({})", values.join(", "))
            }
            Self::Range(range) => write!(f, "{}", range),
        }
    }
}

/// 值约束
#[derive(Debug, Clone, PartialEq)]
pub struct ValueConstraint {
    pub exists: bool,
    pub value_type: ValueType,
    pub allowed: Option<Allowed>,
    pub default: Option<TypedValue>,
}

impl ValueConstraint {
    pub fn new(exists: bool, value_type: ValueType) -> Self {
        Self {
            exists,
            value_type,
            allowed: None,
            default: None,
        }
    }

    pub fn with_allowed(mut self, allowed: Allowed) -> Self {
        self.allowed = Some(allowed);
        self
    }

    pub fn with_default(mut self, default: TypedValue) -> Self {
        self.default = Some(default);
        self
    }

    /// `exists` 键的元约束：布尔值，必须存在
    pub fn exists_meta() -> Self {
        Self::new(true, ValueType::Bool).with_allowed(Allowed::Values(vec![
            TypedValue::Bool(true),
            TypedValue::Bool(false),
        ]))
    }

    /// `type` 键的元约束：int/float/str 之一，必须存在
    pub fn type_meta() -> Self {
        Self::new(true, ValueType::Type).with_allowed(Allowed::Values(vec![
            TypedValue::Type(ValueType::Int),
            TypedValue::Type(ValueType::Float),
            TypedValue::Type(ValueType::Str),
        ]))
    }

    /// 校验原始值
    ///
    /// 返回需要写回配置的值；None 表示无需写回。null 视为缺失。
    pub fn apply(&self, item: &str, raw: Option<&Value>) -> Result<Option<TypedValue>> {
        let raw = raw.filter(|v| !v.is_null());

        if !self.exists {
            return match raw {
                Some(_) => Err(CheckerError::Forbidden {
                    item: item.to_string(),
                }),
                None => Ok(None),
            };
        }

        let Some(raw) = raw else {
            return match &self.default {
                Some(default) => Ok(Some(default.clone())),
                None => Err(CheckerError::Mandatory {
                    item: item.to_string(),
                }),
            };
        };

        let value = self.coerce(item, raw)?;

        if let Some(allowed) = &self.allowed
            && !allowed.contains(&value)
        {
            return Err(CheckerError::NotAllowed {
                item: item.to_string(),
                value: value.to_string(),
                allowed: allowed.to_string(),
            });
        }

        Ok(Some(value))
    }

    /// 把原始值转换为声明的类型
    fn coerce(&self, item: &str, raw: &Value) -> Result<TypedValue> {
        let typed = TypedValue::from_json(raw).ok_or_else(|| {
            CheckerError::type_error(
                item,
                format!("期望 {} 类型的值，实际为 {}", self.value_type, json_kind(raw)),
            )
        })?;

        if typed.value_type() == self.value_type {
            return Ok(typed);
        }

        let TypedValue::Str(s) = &typed else {
            return Err(CheckerError::type_error(
                item,
                format!("期望 {} 类型的值，实际为 {} ({})", self.value_type, typed.value_type(), typed),
            ));
        };

        let represented = classify(s);
        if represented != self.value_type {
            return Err(CheckerError::type_error(
                item,
                format!("期望 {} 类型的值，字符串 {:?} 表示的是 {}", self.value_type, s, represented),
            ));
        }

        self.value_type.convert_str(s).ok_or_else(|| {
            CheckerError::type_error(item, format!("无法把 {:?} 转换为 {}", s, self.value_type))
        })
    }

    /// 从约束定义解析
    ///
    /// `entries` 只包含约束键，条件子规则由调用方拆出。exists 与 type 必须出现。
    pub fn parse(rule: &str, entries: &Map<String, Value>) -> Result<Self> {
        if let Some(key) = entries.keys().find(|k| !CONSTRAINT_KEYS.contains(&k.as_str())) {
            return Err(CheckerError::rule_definition(rule, format!("非法的键 {:?}", key)));
        }

        let value_type = match Self::type_meta()
            .apply(&meta_label(rule, KEY_TYPE), entries.get(KEY_TYPE))
            .map_err(|e| definition_failure(rule, e))?
        {
            Some(TypedValue::Type(t)) => t,
            _ => return Err(CheckerError::rule_definition(rule, "缺少 type")),
        };

        let exists = match Self::exists_meta()
            .apply(&meta_label(rule, KEY_EXISTS), entries.get(KEY_EXISTS))
            .map_err(|e| definition_failure(rule, e))?
        {
            Some(TypedValue::Bool(b)) => b,
            _ => return Err(CheckerError::rule_definition(rule, "缺少 exists")),
        };

        let mut constraint = Self::new(exists, value_type);

        if let Some(raw) = entries.get(KEY_ALLOWED) {
            let allowed = parse_allowed(rule, raw, value_type)?;
            constraint = constraint.with_allowed(allowed);
        }

        if let Some(raw) = entries.get(KEY_DEFAULT) {
            let checker = Self {
                exists: true,
                value_type,
                allowed: constraint.allowed.clone(),
                default: None,
            };
            if let Some(default) = checker
                .apply(&meta_label(rule, KEY_DEFAULT), Some(raw))
                .map_err(|e| definition_failure(rule, e))?
            {
                constraint = constraint.with_default(default);
            }
        }

        Ok(constraint)
    }
}

/// 解析 allowed
///
/// 字符串先按区间解析，只有语法错误时才退回逗号分隔的列表；列表与单个字面量
/// 中的每个值都必须符合声明的类型。
fn parse_allowed(rule: &str, raw: &Value, value_type: ValueType) -> Result<Allowed> {
    let label = meta_label(rule, KEY_ALLOWED);

    let candidates: Vec<Value> = match raw {
        Value::String(text) => match Range::parse(text) {
            Ok(range) => {
                if range.value_type() != value_type {
                    return Err(CheckerError::rule_definition(
                        rule,
                        format!("区间 {} 的类型是 {}，规则类型是 {}", range, range.value_type(), value_type),
                    ));
                }
                return Ok(Allowed::Range(range));
            }
            Err(CheckerError::Syntax { .. }) => text
                .split(',')
                .map(|s| Value::String(s.trim().to_string()))
                .collect(),
            Err(e) => return Err(e),
        },
        Value::Array(values) => values.clone(),
        other => vec![other.clone()],
    };

    let element = ValueConstraint::new(true, value_type);
    let mut values = Vec::with_capacity(candidates.len());
    for candidate in &candidates {
        if let Some(value) = element
            .apply(&label, Some(candidate))
            .map_err(|e| definition_failure(rule, e))?
        {
            values.push(value);
        }
    }

    Ok(Allowed::Values(values))
}

fn meta_label(rule: &str, key: &str) -> String {
    format!("{}.{}", rule, key)
}

/// 解析规则定义时的值校验失败统一归为规则定义错误
fn definition_failure(rule: &str, err: CheckerError) -> CheckerError {
    if err.is_definition_error() {
        err
    } else {
        CheckerError::rule_definition(rule, err.to_string())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
