//! 检查器
//!
//! 从规则集构建依赖图，按评估顺序逐条应用规则并把结果写回配置，
//! 后面的规则在同一轮检查中能看到前面规则写回的值。
//! 检查器构建后只读，可以在多个线程间共享，每次检查针对各自独立的配置。

use crate::error::{CheckerError, Result};
use crate::graph::RuleGraph;
use crate::rule::RuleSpec;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{debug, instrument, trace, warn};

/// 检查模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckMode {
    /// 第一个失败的规则立即终止检查
    #[default]
    FailFast,
    /// 失败的规则不写回，继续评估后续规则
    CollectAll,
}

/// 单条规则的检查结果
#[derive(Debug, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum RuleOutcome {
    /// 值已写回配置
    Written(Value),
    /// 无需写回
    Unchanged,
    #[serde(serialize_with = "serialize_error")]
    Failed(CheckerError),
}

impl RuleOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

fn serialize_error<S>(error: &CheckerError, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut state = serializer.serialize_struct("CheckerError", 2)?;
    state.serialize_field("code", error.code())?;
    state.serialize_field("message", &error.to_string())?;
    state.end()
}

/// 规则的解析过程
#[derive(Debug, Serialize)]
pub struct RuleResolution {
    pub rule: String,
    /// 生效的条件表达式，None 表示基础约束
    pub selected: Option<String>,
    pub outcome: RuleOutcome,
}

/// 检查报告，按评估顺序记录每条访问过的规则
#[derive(Debug, Default, Serialize)]
pub struct CheckReport {
    pub resolutions: Vec<RuleResolution>,
}

impl CheckReport {
    pub fn is_success(&self) -> bool {
        !self.resolutions.iter().any(|r| r.outcome.is_failure())
    }

    /// 失败的规则及其错误
    pub fn failures(&self) -> impl Iterator<Item = (&str, &CheckerError)> {
        self.resolutions.iter().filter_map(|r| match &r.outcome {
            RuleOutcome::Failed(error) => Some((r.rule.as_str(), error)),
            _ => None,
        })
    }

    /// 转换为第一个失败的错误
    pub fn into_result(self) -> Result<()> {
        for resolution in self.resolutions {
            if let RuleOutcome::Failed(error) = resolution.outcome {
                return Err(error);
            }
        }
        Ok(())
    }
}

/// 配置检查器
#[derive(Debug, Clone)]
pub struct Checker {
    graph: RuleGraph,
}

impl Checker {
    /// 从规则集构建检查器，键的顺序即定义顺序
    #[instrument(skip(definitions), fields(rules = definitions.len()))]
    pub fn new(definitions: &Map<String, Value>) -> Result<Self> {
        Self::from_definitions(definitions.iter().map(|(name, def)| (name.as_str(), def)))
    }

    /// 从 JSON 文本构建检查器
    pub fn from_json(text: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(definitions) => Self::new(&definitions),
            _ => Err(CheckerError::rule_definition("<root>", "规则集必须是 JSON 对象")),
        }
    }

    /// 从 (规则名, 规则定义) 序列构建检查器，保留迭代顺序
    pub fn from_definitions<'a, I>(definitions: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a Value)>,
    {
        let rules = definitions
            .into_iter()
            .map(|(name, definition)| RuleSpec::parse(name, definition))
            .collect::<Result<Vec<_>>>()?;

        let graph = RuleGraph::build(rules)?;
        debug!(
            rules = graph.len(),
            order = ?graph.ordered().map(|r| r.name()).collect::<Vec<_>>(),
            "检查器构建完成"
        );

        Ok(Self { graph })
    }

    /// 检查并规范化配置，遇到第一个失败立即返回
    pub fn check(&self, config: &mut Map<String, Value>) -> Result<()> {
        self.check_with_report(config, CheckMode::FailFast).into_result()
    }

    /// 检查配置并返回每条规则的处理结果
    #[instrument(skip_all, fields(rules = self.graph.len(), mode = ?mode))]
    pub fn check_with_report(&self, config: &mut Map<String, Value>, mode: CheckMode) -> CheckReport {
        let mut report = CheckReport::default();

        for rule in self.graph.ordered() {
            let (selected, outcome) = Self::resolve(rule, config);

            if let RuleOutcome::Failed(error) = &outcome {
                if mode == CheckMode::CollectAll {
                    warn!(rule = %rule.name(), code = error.code(), error = %error, "规则检查失败");
                } else {
                    debug!(rule = %rule.name(), code = error.code(), "规则检查失败，终止检查");
                }
            }

            let failed = outcome.is_failure();
            report.resolutions.push(RuleResolution {
                rule: rule.name().to_string(),
                selected,
                outcome,
            });

            if failed && mode == CheckMode::FailFast {
                break;
            }
        }

        report
    }

    /// 应用单条规则，成功时把值写回配置
    fn resolve(rule: &RuleSpec, config: &mut Map<String, Value>) -> (Option<String>, RuleOutcome) {
        let selected = match rule.select(config) {
            Ok(selected) => selected,
            Err(error) => return (None, RuleOutcome::Failed(error)),
        };

        let outcome = match rule.apply_selected(config, selected) {
            Ok(Some(value)) => {
                let value = value.to_json();
                trace!(rule = %rule.name(), value = %value, "写回配置");
                rule.path().set(config, value.clone());
                RuleOutcome::Written(value)
            }
            Ok(None) => {
                trace!(rule = %rule.name(), "无需写回");
                RuleOutcome::Unchanged
            }
            Err(error) => RuleOutcome::Failed(error),
        };

        let selected = selected.map(|entry| entry.expression.source().to_string());
        (selected, outcome)
    }

    /// 按评估顺序遍历规则
    pub fn rules(&self) -> impl Iterator<Item = &RuleSpec> {
        self.graph.ordered()
    }

    /// 评估顺序中的规则名
    pub fn evaluation_order(&self) -> Vec<&str> {
        self.graph.ordered().map(|r| r.name()).collect()
    }

    pub fn graph(&self) -> &RuleGraph {
        &self.graph
    }
}
