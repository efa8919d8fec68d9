//! 规则
//!
//! 一条规则约束一个配置项：规则名即配置项路径，由基础约束和若干条件约束组成。
//! 条件约束以条件表达式为键，只需给出要覆盖的约束项，其余继承自基础约束。
//! 按定义顺序第一个为真的条件约束生效，都不成立时使用基础约束。

use crate::constraint::ValueConstraint;
use crate::error::{CheckerError, Result};
use crate::expression::Expression;
use crate::path::ItemPath;
use crate::value::TypedValue;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::trace;

/// 匹配条件表达式中的 `{name}` 依赖
static DEPENDENCY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(.+?)\}").expect("dependency pattern is valid"));

/// 条件约束
#[derive(Debug, Clone)]
pub struct ContextualConstraint {
    pub expression: Expression,
    pub constraint: ValueConstraint,
}

/// 规则
#[derive(Debug, Clone)]
pub struct RuleSpec {
    name: String,
    path: ItemPath,
    base: ValueConstraint,
    contextual: Vec<ContextualConstraint>,
    dependencies: Vec<ItemPath>,
}

impl RuleSpec {
    /// 解析规则定义
    pub fn parse(name: &str, definition: &Value) -> Result<Self> {
        let Value::Object(definition) = definition else {
            return Err(CheckerError::rule_definition(name, "规则定义必须是对象"));
        };

        // 对象值是条件约束，其余是基础约束项
        let mut flat = Map::new();
        let mut sections = Vec::new();
        for (key, value) in definition {
            match value {
                Value::Object(section) => sections.push((key, section)),
                _ => {
                    flat.insert(key.clone(), value.clone());
                }
            }
        }

        let base = ValueConstraint::parse(name, &flat)?;

        let path = ItemPath::parse(name);
        let mut contextual = Vec::with_capacity(sections.len());
        let mut dependencies: Vec<ItemPath> = Vec::new();
        for (condition, section) in sections {
            for dependency in extract_dependencies(&path, condition)? {
                if !dependencies.iter().any(|d| d.same_item(&dependency)) {
                    dependencies.push(dependency);
                }
            }

            let mut merged = flat.clone();
            for (key, value) in section {
                if value.is_object() {
                    return Err(CheckerError::rule_definition(
                        name,
                        format!("条件约束 {:?} 中不能再嵌套对象: {:?}", condition, key),
                    ));
                }
                merged.insert(key.clone(), value.clone());
            }

            contextual.push(ContextualConstraint {
                expression: Expression::compile(condition)?,
                constraint: ValueConstraint::parse(name, &merged)?,
            });
        }

        Ok(Self {
            name: name.to_string(),
            path,
            base,
            contextual,
            dependencies,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &ItemPath {
        &self.path
    }

    pub fn base(&self) -> &ValueConstraint {
        &self.base
    }

    pub fn contextual(&self) -> &[ContextualConstraint] {
        &self.contextual
    }

    /// 依赖的配置项，按首次出现顺序去重，`k` 与 `/k` 视为同一项
    pub fn dependencies(&self) -> &[ItemPath] {
        &self.dependencies
    }

    /// 选择生效的条件约束，None 表示使用基础约束
    ///
    /// 条件求值失败时错误中带上本规则名。
    pub fn select(&self, config: &Map<String, Value>) -> Result<Option<&ContextualConstraint>> {
        for entry in &self.contextual {
            if entry
                .expression
                .evaluate(config)
                .map_err(|e| e.in_rule(&self.name))?
            {
                trace!(rule = %self.name, condition = %entry.expression, "条件成立");
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    /// 对配置应用规则，返回需要写回的值
    pub fn apply(&self, config: &Map<String, Value>) -> Result<Option<TypedValue>> {
        self.apply_selected(config, self.select(config)?)
    }

    /// 用已选定的条件约束应用规则，None 时使用基础约束
    pub fn apply_selected(
        &self,
        config: &Map<String, Value>,
        selected: Option<&ContextualConstraint>,
    ) -> Result<Option<TypedValue>> {
        let constraint = selected.map_or(&self.base, |entry| &entry.constraint);
        constraint.apply(&self.name, self.path.get(config))
    }
}

/// 提取条件表达式引用的配置项
fn extract_dependencies(rule: &ItemPath, condition: &str) -> Result<Vec<ItemPath>> {
    let paths: Vec<ItemPath> = DEPENDENCY_PATTERN
        .captures_iter(condition)
        .map(|c| ItemPath::parse(&c[1]))
        .collect();

    if paths.is_empty() {
        return Err(CheckerError::rule_definition(
            rule.as_str(),
            format!("条件表达式 {:?} 中没有找到依赖", condition),
        ));
    }

    if let Some(own) = paths.iter().find(|p| p.same_item(rule)) {
        return Err(CheckerError::rule_definition(
            rule.as_str(),
            format!("规则不能依赖自身: {{{}}}", own),
        ));
    }

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueType;
    use serde_json::json;

    fn config(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_parse_flat_rule() {
        let rule = RuleSpec::parse("limit", &json!({"exists": true, "type": "int", "default": 10})).unwrap();
        assert_eq!(rule.name(), "limit");
        assert!(rule.contextual().is_empty());
        assert!(rule.dependencies().is_empty());
        assert_eq!(rule.base().default, Some(TypedValue::Int(10)));
    }

    #[test]
    fn test_contextual_inherits_base() {
        let rule = RuleSpec::parse(
            "threshold",
            &json!({
                "exists": true,
                "type": "int",
                "default": 1,
                "{/mode} == \"b\"": {"default": 5},
                "{/mode} == \"c\" and {other} > 0": {"exists": false}
            }),
        )
        .unwrap();

        let dependencies: Vec<&str> = rule.dependencies().iter().map(ItemPath::as_str).collect();
        assert_eq!(dependencies, vec!["/mode", "other"]);
        assert_eq!(rule.contextual().len(), 2);

        let first = &rule.contextual()[0].constraint;
        assert!(first.exists);
        assert_eq!(first.value_type, ValueType::Int);
        assert_eq!(first.default, Some(TypedValue::Int(5)));

        let second = &rule.contextual()[1].constraint;
        assert!(!second.exists);
        assert_eq!(second.default, Some(TypedValue::Int(1)));
    }

    #[test]
    fn test_first_true_condition_wins() {
        let rule = RuleSpec::parse(
            "threshold",
            &json!({
                "exists": true,
                "type": "int",
                "default": 1,
                "{mode} in (\"b\", \"c\")": {"default": 5},
                "{mode} == \"b\"": {"default": 9}
            }),
        )
        .unwrap();

        let cfg = config(json!({"mode": "b"}));
        let selected = rule.select(&cfg).unwrap();
        assert_eq!(selected.map(|e| e.expression.source()), Some("{mode} in (\"b\", \"c\")"));
        assert_eq!(rule.apply(&cfg).unwrap(), Some(TypedValue::Int(5)));

        let cfg = config(json!({"mode": "a"}));
        assert!(rule.select(&cfg).unwrap().is_none());
        assert_eq!(rule.apply(&cfg).unwrap(), Some(TypedValue::Int(1)));
        assert_eq!(rule.apply_selected(&cfg, selected).unwrap(), Some(TypedValue::Int(5)));
    }

    #[test]
    fn test_condition_errors_name_rule() {
        let rule = RuleSpec::parse(
            "threshold",
            &json!({"exists": true, "type": "int", "{/mode} == 1": {"default": 5}}),
        )
        .unwrap();

        match rule.select(&Map::new()).unwrap_err() {
            CheckerError::UnresolvedItem { rule, path, .. } => {
                assert_eq!(rule.as_deref(), Some("threshold"));
                assert_eq!(path, "/mode");
            }
            other => panic!("unexpected error {:?}", other),
        }

        let cfg = config(json!({"mode": 1.5}));
        match rule.select(&cfg).unwrap_err() {
            CheckerError::Type { item, reason } => {
                assert_eq!(item, "threshold");
                assert!(reason.contains("{/mode} == 1"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_missing_dependency_rejected() {
        let err = RuleSpec::parse(
            "threshold",
            &json!({"exists": true, "type": "int", "unknown": {"default": 5}}),
        )
        .unwrap_err();
        match err {
            CheckerError::RuleDefinition { rule, reason } => {
                assert_eq!(rule, "threshold");
                assert!(reason.contains("unknown"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_self_dependency_rejected() {
        let cases = [
            ("limit", "{limit} > 0"),
            ("limit", "{/limit} > 0"),
            ("/limit", "{limit} > 0"),
            ("/net/port", "{other} == 1 or {/net/port} > 0"),
        ];
        for (name, condition) in cases {
            let mut definition = json!({"exists": true, "type": "int"});
            definition[condition] = json!({"default": 5});
            let err = RuleSpec::parse(name, &definition).unwrap_err();
            assert!(
                matches!(err, CheckerError::RuleDefinition { .. }),
                "{} with {:?} should be rejected, got {:?}",
                name,
                condition,
                err
            );
        }
    }

    #[test]
    fn test_dependency_spellings_deduplicated() {
        let rule = RuleSpec::parse(
            "threshold",
            &json!({
                "exists": true,
                "type": "int",
                "{mode} == \"b\"": {"default": 5},
                "{/mode} == \"c\"": {"default": 9}
            }),
        )
        .unwrap();
        assert_eq!(rule.dependencies().len(), 1);
        assert_eq!(rule.dependencies()[0].as_str(), "mode");
    }

    #[test]
    fn test_invalid_sections_rejected() {
        let cases = [
            json!("int"),
            json!({"exists": true, "type": "int", "{a} == 1": {"nested": {"x": 1}}}),
            json!({"exists": true, "type": "int", "{a} == 1": {"colour": 1}}),
        ];
        for definition in cases {
            let err = RuleSpec::parse("limit", &definition).unwrap_err();
            assert!(matches!(err, CheckerError::RuleDefinition { .. }), "{}", definition);
        }
    }

    #[test]
    fn test_malformed_condition_is_syntax_error() {
        let err = RuleSpec::parse(
            "limit",
            &json!({"exists": true, "type": "int", "{a} == ": {"default": 5}}),
        )
        .unwrap_err();
        assert!(matches!(err, CheckerError::Syntax { .. }));
    }
}
