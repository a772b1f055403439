//! 执行报告输出
//! 文本报告（可选 ANSI 颜色）与 JSON 报告

use chrono::{DateTime, Utc};
use serde::Serialize;

use common::{HostResult, ResultSet};

const BANNER_COLOR: &str = "\x1b[1;34m";
const ERROR_COLOR: &str = "\x1b[0;31m";
const RESET: &str = "\x1b[0m";

/// 报告格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown output format: {} (expected text or json)", s)),
        }
    }
}

/// 渲染文本报告，每台主机一个区块，顺序与结果集一致
pub fn render_text(results: &ResultSet, color: bool) -> String {
    let mut out = String::new();
    for result in results {
        render_host(&mut out, result, color);
    }
    out
}

fn render_host(out: &mut String, result: &HostResult, color: bool) {
    let (banner, error, reset) = if color {
        (BANNER_COLOR, ERROR_COLOR, RESET)
    } else {
        ("", "", "")
    };

    out.push_str(&format!(
        "\n{}========== Host: {} =========={}\n",
        banner, result.hostname, reset
    ));

    match &result.error {
        Some(e) => out.push_str(&format!("{}Error:{} {}\n", error, reset, e)),
        None => out.push_str(&format!("{}\n", result.output)),
    }
}

/// 一行汇总
pub fn summary_line(results: &ResultSet) -> String {
    format!(
        "{} hosts, {} reachable, {} unreachable",
        results.len(),
        results.reachable_count(),
        results.unreachable_count()
    )
}

#[derive(Serialize)]
struct JsonReport<'a> {
    run_id: String,
    hosts: Vec<JsonHost<'a>>,
}

#[derive(Serialize)]
struct JsonHost<'a> {
    host: &'a str,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonError>,
    output: &'a str,
    commands_succeeded: usize,
    commands_failed: usize,
    started_at: DateTime<Utc>,
    duration_secs: f64,
}

#[derive(Serialize)]
struct JsonError {
    code: &'static str,
    message: String,
}

/// 渲染 JSON 报告
pub fn render_json(results: &ResultSet) -> serde_json::Result<String> {
    let report = JsonReport {
        run_id: results.run_id.to_string(),
        hosts: results
            .iter()
            .map(|r| JsonHost {
                host: &r.hostname,
                ok: r.is_reachable(),
                error: r.error.as_ref().map(|e| JsonError {
                    code: e.error_code(),
                    message: e.to_string(),
                }),
                output: &r.output,
                commands_succeeded: r.commands_succeeded,
                commands_failed: r.commands_failed,
                started_at: r.started_at,
                duration_secs: r.duration.as_secs_f64(),
            })
            .collect(),
    };

    serde_json::to_string_pretty(&report)
}
