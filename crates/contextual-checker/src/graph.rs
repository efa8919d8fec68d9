//! 规则依赖图
//!
//! 规则按下标存放在数组中，边为 (依赖, 被依赖) 下标对。拓扑排序使用 Kahn 算法，
//! 同时就绪的节点按定义顺序出队，保证同一份规则集每次得到相同的评估顺序。
//! 规则与依赖按路径分段匹配，`k` 与 `/k` 是同一项。依赖没有对应规则时视为外部配置项，不产生边。

use crate::error::{CheckerError, Result};
use crate::rule::RuleSpec;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use tracing::debug;

/// 规则依赖图
#[derive(Debug, Clone)]
pub struct RuleGraph {
    rules: Vec<RuleSpec>,
    edges: Vec<(usize, usize)>,
    order: Vec<usize>,
}

impl RuleGraph {
    /// 构建依赖图并计算评估顺序
    ///
    /// 两条规则指向同一配置项或依赖存在环时返回错误。
    pub fn build(rules: Vec<RuleSpec>) -> Result<Self> {
        let mut index: HashMap<&[String], usize> = HashMap::with_capacity(rules.len());
        for (idx, rule) in rules.iter().enumerate() {
            if let Some(previous) = index.insert(rule.path().segments(), idx) {
                return Err(CheckerError::rule_definition(
                    rule.name(),
                    format!("规则重复定义，与 {} 指向同一配置项", rules[previous].name()),
                ));
            }
        }

        let mut edges = Vec::new();
        for (idx, rule) in rules.iter().enumerate() {
            for dependency in rule.dependencies() {
                if let Some(&dep_idx) = index.get(dependency.segments()) {
                    edges.push((dep_idx, idx));
                }
            }
        }

        let order = topological_order(rules.len(), &edges).map_err(|cycle| CheckerError::Cycle {
            rules: cycle.iter().map(|&i| rules[i].name().to_string()).collect(),
        })?;

        debug!(rules = rules.len(), edges = edges.len(), "规则依赖图构建完成");

        Ok(Self {
            rules,
            edges,
            order,
        })
    }

    /// 按定义顺序排列的规则
    pub fn rules(&self) -> &[RuleSpec] {
        &self.rules
    }

    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// 评估顺序（规则下标）
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// 按评估顺序遍历规则
    pub fn ordered(&self) -> impl Iterator<Item = &RuleSpec> {
        self.order.iter().map(|&i| &self.rules[i])
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Kahn 拓扑排序
///
/// 失败时返回环上的节点，首尾相同，如 `[a, b, a]`。
fn topological_order(n: usize, edges: &[(usize, usize)]) -> std::result::Result<Vec<usize>, Vec<usize>> {
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut in_degree = vec![0usize; n];
    for &(from, to) in edges {
        successors[from].push(to);
        in_degree[to] += 1;
    }

    let mut ready: BinaryHeap<Reverse<usize>> = (0..n)
        .filter(|&i| in_degree[i] == 0)
        .map(Reverse)
        .collect();

    let mut order = Vec::with_capacity(n);
    while let Some(Reverse(idx)) = ready.pop() {
        order.push(idx);
        for &next in &successors[idx] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }

    if order.len() == n {
        return Ok(order);
    }

    let mut residual = vec![true; n];
    for &idx in &order {
        residual[idx] = false;
    }
    Err(find_cycle(&successors, &mut residual))
}

/// 在剩余节点中找出一个环
///
/// 剩余节点都至少有一条入边来自剩余节点，先反复剔除没有剩余后继的节点，
/// 之后沿后继走下去必然回到走过的节点。
fn find_cycle(successors: &[Vec<usize>], residual: &mut [bool]) -> Vec<usize> {
    loop {
        let mut pruned = false;
        for idx in 0..residual.len() {
            if residual[idx] && !successors[idx].iter().any(|&s| residual[s]) {
                residual[idx] = false;
                pruned = true;
            }
        }
        if !pruned {
            break;
        }
    }

    let Some(start) = residual.iter().position(|&r| r) else {
        return Vec::new();
    };

    let mut path = vec![start];
    let mut current = start;
    loop {
        let Some(&next) = successors[current].iter().find(|&&s| residual[s]) else {
            return path;
        };
        if let Some(pos) = path.iter().position(|&p| p == next) {
            let mut cycle = path.split_off(pos);
            cycle.push(next);
            return cycle;
        }
        path.push(next);
        current = next;
    }
}
