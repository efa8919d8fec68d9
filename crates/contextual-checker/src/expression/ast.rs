//! 条件表达式语法树

use crate::path::ItemPath;
use crate::range::Number;
use std::fmt;

/// 二元操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // 逻辑组合
    And,
    Or,

    // 比较
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
        }
    }

    /// 是否为比较操作符
    pub fn is_comparison(&self) -> bool {
        !matches!(self, Self::And | Self::Or)
    }

    /// 是否只接受数值操作数
    pub fn is_ordering(&self) -> bool {
        matches!(self, Self::Lt | Self::Gt | Self::Le | Self::Ge)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// 语法树节点
///
/// 字面量与配置项引用记录原文位置，求值出错时用于定位。
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    BoolLiteral(bool),
    NumberLiteral { value: Number, position: usize },
    StringLiteral { value: String, position: usize },
    ItemRef { path: ItemPath, position: usize },
    Not(Box<Node>),
    BinaryOp {
        op: BinaryOp,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Membership {
        item: Box<Node>,
        negated: bool,
        list: Vec<Node>,
    },
}

impl Node {
    /// 节点在原文中的位置，组合节点取最左侧的操作数
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::BoolLiteral(_) => None,
            Self::NumberLiteral { position, .. }
            | Self::StringLiteral { position, .. }
            | Self::ItemRef { position, .. } => Some(*position),
            Self::Not(inner) => inner.position(),
            Self::BinaryOp { lhs, .. } => lhs.position(),
            Self::Membership { item, .. } => item.position(),
        }
    }

    /// 按出现顺序收集引用的配置项路径
    pub fn collect_items<'a>(&'a self, out: &mut Vec<&'a ItemPath>) {
        match self {
            Self::ItemRef { path, .. } => out.push(path),
            Self::Not(inner) => inner.collect_items(out),
            Self::BinaryOp { lhs, rhs, .. } => {
                lhs.collect_items(out);
                rhs.collect_items(out);
            }
            Self::Membership { item, list, .. } => {
                item.collect_items(out);
                for node in list {
                    node.collect_items(out);
                }
            }
            Self::BoolLiteral(_) | Self::NumberLiteral { .. } | Self::StringLiteral { .. } => {}
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BoolLiteral(true) => write!(f, "True"),
            Self::BoolLiteral(false) => write!(f, "False"),
            Self::NumberLiteral { value, .. } => write!(f, "{}", value),
            Self::StringLiteral { value, .. } => write!(f, "{:?}", value),
            Self::ItemRef { path, .. } => write!(f, "{{{}}}", path),
            Self::Not(inner) => write!(f, "not ({})", inner),
            Self::BinaryOp { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op, rhs),
            Self::Membership {
                item,
                negated,
                list,
            } => {
                let keyword = if *negated { "not in" } else { "in" };
                let items: Vec<String> = list.iter().map(|n| n.to_string()).collect();
                write!(f, "{} {} ({})", item, keyword, items.join(", "))
            }
        }
    }
}
