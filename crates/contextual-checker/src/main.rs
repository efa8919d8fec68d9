//! 配置检查命令行工具
//!
//! 读取规则集与配置文件，检查并输出规范化后的配置。

use anyhow::{Context, Result, bail};
use checker_shared::config::{AppConfig, CheckModeSetting};
use checker_shared::{loader, observability};
use clap::Parser;
use contextual_checker::{CheckMode, Checker};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// 命令行参数
#[derive(Debug, Parser)]
#[command(name = "config-checker", version, about = "Check and normalize a configuration against contextual rules")]
struct Args {
    /// 规则集文件（JSON 对象，键顺序即定义顺序）
    #[arg(short, long, env = "CHECKER_RULES")]
    rules: PathBuf,

    /// 待检查的配置文件
    config: PathBuf,

    /// 规范化配置的输出路径，缺省写到 stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 评估全部规则后统一报告失败
    #[arg(long)]
    collect_all: bool,

    /// 格式化输出
    #[arg(long)]
    pretty: bool,

    /// 把每条规则的处理结果写成 JSON 报告
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = AppConfig::load("config-checker").unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });

    let _guard = observability::init(&config.service_name, &config.observability)?;

    let mode = if args.collect_all {
        CheckMode::CollectAll
    } else {
        match config.check.mode {
            CheckModeSetting::FailFast => CheckMode::FailFast,
            CheckModeSetting::CollectAll => CheckMode::CollectAll,
        }
    };
    let pretty = args.pretty || config.check.pretty;

    let definitions = loader::load_object(&args.rules)?;
    let checker = match Checker::new(&definitions) {
        Ok(checker) => checker,
        Err(e) => {
            eprintln!("[{}] {}", e.code(), e);
            bail!("Invalid rule set: {}", args.rules.display());
        }
    };
    info!(
        rules = checker.rules().count(),
        path = %args.rules.display(),
        "Rule set loaded"
    );

    let mut document = loader::load_object(&args.config)?;
    let report = checker.check_with_report(&mut document, mode);

    if let Some(path) = &args.report {
        let text = serde_json::to_string_pretty(&report)?;
        fs::write(path, text).with_context(|| format!("Failed to write report to {}", path.display()))?;
        debug!(path = %path.display(), "Report written");
    }

    let mut failures = 0;
    for (_, error) in report.failures() {
        eprintln!("[{}] {}", error.code(), error);
        failures += 1;
    }
    if failures > 0 {
        bail!("{} rule(s) failed for {}", failures, args.config.display());
    }

    let document = Value::Object(document);
    let text = if pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };

    match &args.output {
        Some(path) => {
            fs::write(path, text + "\n")
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            info!(path = %path.display(), "Normalized configuration written");
        }
        None => println!("{}", text),
    }

    Ok(())
}
