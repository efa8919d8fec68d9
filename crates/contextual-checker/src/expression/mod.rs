//! 条件表达式引擎
//!
//! 表达式在规则解析时编译一次，之后可以对任意多份配置求值而无需重新编译。
//! 求值只读取传入的配置，不持有任何全局状态，因此同一个编译结果可以被多个线程同时使用。

pub mod ast;
pub mod interpreter;
pub mod lexer;
pub mod parser;

use crate::error::Result;
use crate::path::ItemPath;
use ast::Node;
use interpreter::Interpreter;
use serde_json::{Map, Value};
use std::fmt;

/// 编译后的条件表达式
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    root: Node,
    item_paths: Vec<ItemPath>,
}

impl Expression {
    /// 编译表达式文本
    pub fn compile(source: &str) -> Result<Self> {
        let root = parser::parse(source)?;

        let mut items = Vec::new();
        root.collect_items(&mut items);
        let mut item_paths: Vec<ItemPath> = Vec::with_capacity(items.len());
        for path in items {
            if !item_paths.contains(path) {
                item_paths.push(path.clone());
            }
        }

        Ok(Self {
            source: source.to_string(),
            root,
            item_paths,
        })
    }

    /// 对一份配置求值
    pub fn evaluate(&self, config: &Map<String, Value>) -> Result<bool> {
        Interpreter::new(&self.source, config).eval(&self.root)
    }

    /// 原始表达式文本
    pub fn source(&self) -> &str {
        &self.source
    }

    /// 语法树根节点
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// 引用的配置项，按首次出现顺序去重
    pub fn item_paths(&self) -> &[ItemPath] {
        &self.item_paths
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}
