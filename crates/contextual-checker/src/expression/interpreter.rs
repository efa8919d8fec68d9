//! 条件表达式求值
//!
//! 对语法树做纯递归求值，配置只读。`and`/`or` 短路。

use super::ast::{BinaryOp, Node};
use crate::error::{CheckerError, Result};
use crate::path::ItemPath;
use crate::value::{TypedValue, ValueType};
use serde_json::{Map, Value};

/// 绑定了一份配置的求值器
pub struct Interpreter<'a> {
    source: &'a str,
    config: &'a Map<String, Value>,
}

impl<'a> Interpreter<'a> {
    pub fn new(source: &'a str, config: &'a Map<String, Value>) -> Self {
        Self { source, config }
    }

    /// 求布尔值
    pub fn eval(&self, node: &Node) -> Result<bool> {
        match node {
            Node::BoolLiteral(value) => Ok(*value),
            Node::ItemRef { path, position } => match self.resolve(path, *position)? {
                TypedValue::Bool(value) => Ok(value),
                other => Err(self.type_error(format!(
                    "配置项 {{{}}} 的值 {} 不是布尔值 (位置 {})",
                    path, other, position
                ))),
            },
            Node::Not(inner) => Ok(!self.eval(inner)?),
            Node::BinaryOp {
                op: BinaryOp::And,
                lhs,
                rhs,
            } => Ok(self.eval(lhs)? && self.eval(rhs)?),
            Node::BinaryOp {
                op: BinaryOp::Or,
                lhs,
                rhs,
            } => Ok(self.eval(lhs)? || self.eval(rhs)?),
            Node::BinaryOp { op, lhs, rhs } => self.compare(*op, lhs, rhs),
            Node::Membership {
                item,
                negated,
                list,
            } => Ok(self.membership(item, list)? != *negated),
            Node::NumberLiteral { .. } | Node::StringLiteral { .. } => Err(self.type_error(
                format!("{} 不是布尔表达式 (位置 {})", node, node.position().unwrap_or(0)),
            )),
        }
    }

    /// 求操作数的值
    fn operand(&self, node: &Node) -> Result<TypedValue> {
        match node {
            Node::NumberLiteral { value, .. } => Ok((*value).into()),
            Node::StringLiteral { value, .. } => Ok(TypedValue::Str(value.clone())),
            Node::ItemRef { path, position } => self.resolve(path, *position),
            other => Err(self.type_error(format!("{} 不是比较操作数", other))),
        }
    }

    /// 读取配置项，缺失或为 null 时报错
    fn resolve(&self, path: &ItemPath, position: usize) -> Result<TypedValue> {
        match path.get(self.config) {
            None | Some(Value::Null) => Err(CheckerError::UnresolvedItem {
                rule: None,
                path: path.to_string(),
                text: self.source.to_string(),
                position,
            }),
            Some(value) => TypedValue::from_json(value).ok_or_else(|| {
                self.type_error(format!(
                    "配置项 {{{}}} 不是标量值 (位置 {})",
                    path, position
                ))
            }),
        }
    }

    fn compare(&self, op: BinaryOp, lhs: &Node, rhs: &Node) -> Result<bool> {
        let left = self.operand(lhs)?;
        let right = self.operand(rhs)?;

        if left.value_type() != right.value_type() {
            return Err(self.type_error(format!(
                "{} {} {} 两侧类型不一致: {} 与 {} (位置 {})",
                left,
                op,
                right,
                left.value_type(),
                right.value_type(),
                rhs.position().unwrap_or(0)
            )));
        }

        let accepted = match left.value_type() {
            ValueType::Int | ValueType::Float => true,
            ValueType::Str => !op.is_ordering(),
            _ => false,
        };
        if !accepted {
            return Err(self.type_error(format!(
                "操作符 {} 不支持 {} 类型的操作数 (位置 {})",
                op,
                left.value_type(),
                lhs.position().unwrap_or(0)
            )));
        }

        let ordering = match (&left, &right) {
            (TypedValue::Int(a), TypedValue::Int(b)) => a.partial_cmp(b),
            (TypedValue::Float(a), TypedValue::Float(b)) => a.partial_cmp(b),
            (TypedValue::Str(a), TypedValue::Str(b)) => a.partial_cmp(b),
            _ => None,
        };

        // NaN 与任何值都不相等
        let Some(ordering) = ordering else {
            return Ok(op == BinaryOp::Ne);
        };

        Ok(match op {
            BinaryOp::Eq => ordering.is_eq(),
            BinaryOp::Ne => ordering.is_ne(),
            BinaryOp::Lt => ordering.is_lt(),
            BinaryOp::Gt => ordering.is_gt(),
            BinaryOp::Le => ordering.is_le(),
            BinaryOp::Ge => ordering.is_ge(),
            BinaryOp::And | BinaryOp::Or => unreachable!("logical operators are evaluated in eval"),
        })
    }

    /// 成员检查：列表元素先转换为被检查值的类型
    fn membership(&self, item: &Node, list: &[Node]) -> Result<bool> {
        let probe = self.operand(item)?;
        let probe_type = probe.value_type();
        if !matches!(probe_type, ValueType::Int | ValueType::Float | ValueType::Str) {
            return Err(self.type_error(format!(
                "成员检查不支持 {} 类型的值 {} (位置 {})",
                probe_type,
                probe,
                item.position().unwrap_or(0)
            )));
        }

        for node in list {
            let element = self.operand(node)?;
            let converted = coerce(&element, probe_type).ok_or_else(|| {
                self.type_error(format!(
                    "列表元素 {} 无法转换为 {} 类型 (位置 {})",
                    element,
                    probe_type,
                    node.position().unwrap_or(0)
                ))
            })?;
            if converted == probe {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn type_error(&self, reason: String) -> CheckerError {
        CheckerError::type_error(self.source, reason)
    }
}

/// 数值之间可以互相转换，浮点转整数要求没有小数部分；字符串与数值不能互转
fn coerce(value: &TypedValue, target: ValueType) -> Option<TypedValue> {
    match (value, target) {
        (TypedValue::Int(i), ValueType::Int) => Some(TypedValue::Int(*i)),
        (TypedValue::Int(i), ValueType::Float) => Some(TypedValue::Float(*i as f64)),
        (TypedValue::Float(f), ValueType::Float) => Some(TypedValue::Float(*f)),
        (TypedValue::Float(f), ValueType::Int)
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 =>
        {
            Some(TypedValue::Int(*f as i64))
        }
        (TypedValue::Str(s), ValueType::Str) => Some(TypedValue::Str(s.clone())),
        _ => None,
    }
}
