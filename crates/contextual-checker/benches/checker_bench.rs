//! 检查器性能基准测试
//!
//! 覆盖条件表达式的编译与求值，以及完整的检查流程。

use contextual_checker::{Checker, Expression};
use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::{Map, Value, json};
use std::hint::black_box;

const EXPRESSION: &str =
    "{/server/port} < 1024 and {/server/protocol} in (\"tcp\", \"udp\") or not {debug}";

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected object"),
    }
}

/// 创建测试规则集
fn create_rules() -> Map<String, Value> {
    object(json!({
        "/server/protocol": {"exists": true, "type": "str", "allowed": "tcp,udp", "default": "tcp"},
        "/server/port": {
            "exists": true,
            "type": "int",
            "allowed": "]0,65535]",
            "{/server/protocol} == \"udp\"": {"default": 53},
            "{/server/protocol} == \"tcp\"": {"default": 80}
        },
        "workers": {
            "exists": true,
            "type": "int",
            "default": 4,
            "{/server/port} < 1024": {"allowed": "[1,2]", "default": 1}
        }
    }))
}

fn bench_expression(c: &mut Criterion) {
    let mut group = c.benchmark_group("expression");

    group.bench_function("compile", |b| {
        b.iter(|| Expression::compile(black_box(EXPRESSION)))
    });

    let expression = Expression::compile(EXPRESSION).unwrap();
    let config = object(json!({"server": {"port": 80, "protocol": "tcp"}, "debug": false}));
    group.bench_function("evaluate", |b| {
        b.iter(|| expression.evaluate(black_box(&config)))
    });

    group.finish();
}

fn bench_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("checker");

    let rules = create_rules();
    group.bench_function("build", |b| b.iter(|| Checker::new(black_box(&rules))));

    let checker = Checker::new(&rules).unwrap();
    let config = object(json!({"server": {"protocol": "udp"}, "workers": "2"}));
    group.bench_function("check", |b| {
        b.iter(|| {
            let mut config = config.clone();
            checker.check(black_box(&mut config))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_expression, bench_check);
criterion_main!(benches);
