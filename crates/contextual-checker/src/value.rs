//! 值类型与类型化字面量
//!
//! `ValueType` 是封闭的类型标签，`TypedValue` 是经过类型转换后的标量值。
//! 字符串表示的识别与转换都集中在这里，不对输入做任何动态求值。

use serde::Serialize;
use serde_json::{Number, Value};
use std::fmt;

/// 值类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Int,
    Float,
    Str,
    Bool,
    /// 值本身是 Int/Float/Str 之一的类型名
    Type,
}

impl ValueType {
    /// 类型名关键字，只有 int/float/str 可以作为规则类型出现
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "str" => Some(Self::Str),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Bool => "bool",
            Self::Type => "type",
        }
    }

    /// 按目标类型转换字符串表示
    ///
    /// Bool 与 Type 无法通过通用的数值/字符串转换得到，只识别对应的关键字。
    pub fn convert_str(self, s: &str) -> Option<TypedValue> {
        match self {
            Self::Int => parse_int(s).map(TypedValue::Int),
            Self::Float => parse_float(s).map(TypedValue::Float),
            Self::Str => Some(TypedValue::Str(s.to_string())),
            Self::Bool => parse_bool_keyword(s).map(TypedValue::Bool),
            Self::Type => Self::from_type_name(s).map(TypedValue::Type),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 识别字符串表示的类型
///
/// 依次尝试：类型名关键字、True/False、整数、浮点数，都不匹配时为字符串。
pub fn classify(s: &str) -> ValueType {
    if ValueType::from_type_name(s).is_some() {
        ValueType::Type
    } else if parse_bool_keyword(s).is_some() {
        ValueType::Bool
    } else if parse_int(s).is_some() {
        ValueType::Int
    } else if parse_float(s).is_some() {
        ValueType::Float
    } else {
        ValueType::Str
    }
}

fn parse_bool_keyword(s: &str) -> Option<bool> {
    match s {
        "True" => Some(true),
        "False" => Some(false),
        _ => None,
    }
}

fn parse_int(s: &str) -> Option<i64> {
    s.trim().parse().ok()
}

/// inf、NaN 以及溢出为无穷大的写法都不算浮点数
fn parse_float(s: &str) -> Option<f64> {
    s.trim().parse().ok().filter(|f: &f64| f.is_finite())
}

/// 类型化的标量值
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Type(ValueType),
}

impl TypedValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
            Self::Str(_) => ValueType::Str,
            Self::Bool(_) => ValueType::Bool,
            Self::Type(_) => ValueType::Type,
        }
    }

    /// 从 JSON 标量转换，null/数组/对象返回 None
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Self::Int(i)),
                None => n.as_f64().map(Self::Float),
            },
            Value::String(s) => Some(Self::Str(s.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// 转换为写回配置的 JSON 值，类型名写回为字符串
    pub fn to_json(&self) -> Value {
        match self {
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Str(s) => Value::String(s.clone()),
            Self::Bool(b) => Value::Bool(*b),
            Self::Type(t) => Value::String(t.name().to_string()),
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{:?}", x),
            Self::Str(s) => write!(f, "\"{}\"", s),
            Self::Bool(true) => write!(f, "True"),
            Self::Bool(false) => write!(f, "False"),
            Self::Type(t) => write!(f, "{}", t),
        }
    }
}

impl From<i64> for TypedValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for TypedValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for TypedValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<bool> for TypedValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify() {
        let cases = [
            ("0", ValueType::Int),
            ("-12", ValueType::Int),
            ("0.", ValueType::Float),
            ("1.5e3", ValueType::Float),
            ("a", ValueType::Str),
            ("int", ValueType::Type),
            ("float", ValueType::Type),
            ("str", ValueType::Type),
            ("True", ValueType::Bool),
            ("False", ValueType::Bool),
            ("true", ValueType::Str),
            ("inf", ValueType::Str),
            ("-infinity", ValueType::Str),
            ("NaN", ValueType::Str),
            ("1e400", ValueType::Str),
        ];

        for (input, expected) in cases {
            assert_eq!(classify(input), expected, "classify({:?})", input);
        }
    }

    #[test]
    fn test_convert_str() {
        assert_eq!(ValueType::Int.convert_str("7"), Some(TypedValue::Int(7)));
        assert_eq!(ValueType::Float.convert_str("7"), Some(TypedValue::Float(7.0)));
        assert_eq!(ValueType::Bool.convert_str("False"), Some(TypedValue::Bool(false)));
        assert_eq!(
            ValueType::Type.convert_str("float"),
            Some(TypedValue::Type(ValueType::Float))
        );
        assert_eq!(ValueType::Int.convert_str("a"), None);
        assert_eq!(ValueType::Bool.convert_str("1"), None);
    }

    #[test]
    fn test_json_conversion() {
        assert_eq!(TypedValue::from_json(&json!(3)), Some(TypedValue::Int(3)));
        assert_eq!(TypedValue::from_json(&json!(3.5)), Some(TypedValue::Float(3.5)));
        assert_eq!(TypedValue::from_json(&json!("x")), Some(TypedValue::Str("x".into())));
        assert_eq!(TypedValue::from_json(&json!(null)), None);
        assert_eq!(TypedValue::from_json(&json!({"a": 1})), None);

        assert_eq!(TypedValue::Type(ValueType::Int).to_json(), json!("int"));
        assert_eq!(TypedValue::Float(0.5).to_json(), json!(0.5));
    }

    #[test]
    fn test_display() {
        assert_eq!(TypedValue::Float(0.0).to_string(), "0.0");
        assert_eq!(TypedValue::Int(2).to_string(), "2");
        assert_eq!(TypedValue::Bool(true).to_string(), "True");
        assert_eq!(TypedValue::Str("b".into()).to_string(), "\"b\"");
    }
}
