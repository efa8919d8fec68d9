//! 上下文相关的配置检查器
//!
//! 根据声明式规则校验并规范化层级配置，规则的约束可以随其他配置项的取值变化：
//! - 规则依赖图与拓扑评估
//! - 条件表达式编译与求值
//! - 值约束校验与类型转换
//! - 数值区间

pub mod checker;
pub mod constraint;
pub mod error;
pub mod expression;
pub mod graph;
pub mod path;
pub mod range;
pub mod rule;
pub mod value;

pub use checker::{CheckMode, CheckReport, Checker, RuleOutcome, RuleResolution};
pub use constraint::{Allowed, ValueConstraint};
pub use error::{CheckerError, Result};
pub use expression::Expression;
pub use graph::RuleGraph;
pub use path::ItemPath;
pub use range::{Bound, Number, Range};
pub use rule::{ContextualConstraint, RuleSpec};
pub use value::{TypedValue, ValueType};
