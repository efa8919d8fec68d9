//! 检查器错误类型

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("{}", describe_syntax(.token, .text, .position))]
    Syntax {
        /// 出错的记号，None 表示输入意外结束
        token: Option<String>,
        text: String,
        /// 以字符计的位置
        position: usize,
    },

    #[error("规则定义错误: {rule}: {reason}")]
    RuleDefinition { rule: String, reason: String },

    #[error("规则依赖存在环: {}", .rules.join(" -> "))]
    Cycle { rules: Vec<String> },

    #[error("配置项缺失且没有默认值: {item}")]
    Mandatory { item: String },

    #[error("配置项不允许存在: {item}")]
    Forbidden { item: String },

    #[error("类型错误: {item}: {reason}")]
    Type { item: String, reason: String },

    #[error("值不被允许: {item} = {value}, 必须属于 {allowed}")]
    NotAllowed {
        item: String,
        value: String,
        allowed: String,
    },

    #[error("无效的区间 '{range}': {reason}")]
    RangeDefinition { range: String, reason: String },

    #[error("{}条件表达式引用的配置项不存在: {{{path}}}\n{text}\n{}", rule_prefix(.rule), pointer_at(.text, .position))]
    UnresolvedItem {
        /// 正在检查的规则，表达式单独求值时为 None
        rule: Option<String>,
        path: String,
        text: String,
        position: usize,
    },

    #[error("JSON 序列化错误: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CheckerError>;

impl CheckerError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Syntax { .. } => "SYNTAX_ERROR",
            Self::RuleDefinition { .. } => "RULE_DEFINITION_ERROR",
            Self::Cycle { .. } => "CYCLE_ERROR",
            Self::Mandatory { .. } => "MANDATORY_ERROR",
            Self::Forbidden { .. } => "FORBIDDEN_ERROR",
            Self::Type { .. } => "TYPE_ERROR",
            Self::NotAllowed { .. } => "NOT_ALLOWED_ERROR",
            Self::RangeDefinition { .. } => "RANGE_DEFINITION_ERROR",
            Self::UnresolvedItem { .. } => "UNRESOLVED_ITEM",
            Self::Json(_) => "JSON_ERROR",
        }
    }

    /// 是否只可能在构建检查器时出现
    pub fn is_definition_error(&self) -> bool {
        matches!(
            self,
            Self::Syntax { .. }
                | Self::RuleDefinition { .. }
                | Self::Cycle { .. }
                | Self::RangeDefinition { .. }
                | Self::Json(_)
        )
    }

    pub(crate) fn rule_definition(rule: &str, reason: impl Into<String>) -> Self {
        Self::RuleDefinition {
            rule: rule.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn type_error(item: &str, reason: impl Into<String>) -> Self {
        Self::Type {
            item: item.to_string(),
            reason: reason.into(),
        }
    }

    /// 为条件求值错误标注所属规则
    ///
    /// 表达式求值的类型错误以表达式文本为 item，改为规则名后表达式移入 reason。
    pub(crate) fn in_rule(self, rule: &str) -> Self {
        match self {
            Self::UnresolvedItem {
                path,
                text,
                position,
                ..
            } => Self::UnresolvedItem {
                rule: Some(rule.to_string()),
                path,
                text,
                position,
            },
            Self::Type { item, reason } => Self::Type {
                item: rule.to_string(),
                reason: format!("条件 {}: {}", item, reason),
            },
            other => other,
        }
    }
}

fn rule_prefix(rule: &Option<String>) -> String {
    match rule {
        Some(rule) => format!("{}: ", rule),
        None => String::new(),
    }
}

/// 生成指向出错位置的标记行，如 `-----^--`
pub fn pointer_line(text: &str, position: usize) -> String {
    let len = text.chars().count();
    let after = len.saturating_sub(position + 1);
    format!("{}^{}", "-".repeat(position), "-".repeat(after))
}

fn pointer_at(text: &str, position: &usize) -> String {
    pointer_line(text, *position)
}

fn describe_syntax(token: &Option<String>, text: &str, position: &usize) -> String {
    let position = *position;
    match token {
        Some(token) => format!(
            "语法错误: 位于 \"{}\"\n{}\n{}",
            token,
            text,
            pointer_line(text, position)
        ),
        None => format!(
            "语法错误: 输入意外结束\n{}\n{}",
            text,
            pointer_line(text, position)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_line() {
        assert_eq!(pointer_line("0 in 0", 5), "-----^");
        assert_eq!(pointer_line("0 in 0)", 5), "-----^-");
        assert_eq!(pointer_line("0 in (", 6), "------^");
    }

    #[test]
    fn test_syntax_message() {
        let err = CheckerError::Syntax {
            token: Some("\"a\"".to_string()),
            text: "0 < \"a\"".to_string(),
            position: 4,
        };
        let message = err.to_string();
        assert!(message.contains("\"a\""));
        assert!(message.ends_with("0 < \"a\"\n----^--"));
    }

    #[test]
    fn test_error_code() {
        let err = CheckerError::Mandatory {
            item: "limit".to_string(),
        };
        assert_eq!(err.code(), "MANDATORY_ERROR");
        assert!(!err.is_definition_error());

        let err = CheckerError::Cycle {
            rules: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.code(), "CYCLE_ERROR");
        assert!(err.is_definition_error());
        assert!(err.to_string().contains("a -> b"));
    }

    #[test]
    fn test_in_rule_names_rule() {
        let err = CheckerError::UnresolvedItem {
            rule: None,
            path: "/mode".to_string(),
            text: "{/mode} == 1".to_string(),
            position: 0,
        }
        .in_rule("threshold");
        assert!(err.to_string().starts_with("threshold: "));

        let err = CheckerError::type_error("{a} == 1.", "类型不一致").in_rule("threshold");
        match err {
            CheckerError::Type { item, reason } => {
                assert_eq!(item, "threshold");
                assert!(reason.contains("{a} == 1."));
            }
            other => panic!("unexpected error {:?}", other),
        }

        let err = CheckerError::Mandatory {
            item: "limit".to_string(),
        }
        .in_rule("threshold");
        assert!(matches!(err, CheckerError::Mandatory { item } if item == "limit"));
    }
}
