use nl2sql_core::config::AppConfig;
use nl2sql_core::{DataDictionary, FilePromptSource, PromptSource, StrategyType};
use nl2sql_db::connect_with_config;
use serde::Serialize;

use crate::commands::LoadedConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str) -> Self {
        Self {
            name,
            status: CheckStatus::Skipped,
            details: "skipped because configuration did not load".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(loaded: &LoadedConfig, json_output: bool) -> String {
    let report = build_report(loaded);

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report(loaded: &LoadedConfig) -> DoctorReport {
    let mut checks = Vec::new();

    match loaded {
        Ok(config) => {
            checks.push(DoctorCheck::pass("config_validation", "configuration loaded and validated"));
            checks.push(check_data_dictionary(&config));
            checks.push(check_prompts(&config));
            checks.push(check_database_connectivity(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck::fail("config_validation", error.to_string()));
            checks.push(DoctorCheck::skipped("data_dictionary"));
            checks.push(DoctorCheck::skipped("prompt_files"));
            checks.push(DoctorCheck::skipped("database_connectivity"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_data_dictionary(config: &AppConfig) -> DoctorCheck {
    match DataDictionary::load(&config.data_dictionary.dir) {
        Ok(dictionary) if dictionary.is_empty() => {
            DoctorCheck::fail("data_dictionary", "data dictionary has no tables")
        }
        Ok(dictionary) => DoctorCheck::pass(
            "data_dictionary",
            format!("{} tables described", dictionary.len()),
        ),
        Err(error) => DoctorCheck::fail("data_dictionary", error.to_string()),
    }
}

/// Every agent prompt of the configured default strategy must resolve.
fn check_prompts(config: &AppConfig) -> DoctorCheck {
    let strategy = config.strategy.default;
    let source = FilePromptSource::new(&config.prompts.dir);

    let missing: Vec<String> = required_prompts(strategy)
        .iter()
        .filter_map(|agent| source.load(strategy, agent, &[]).err())
        .map(|error| error.to_string())
        .collect();

    if missing.is_empty() {
        DoctorCheck::pass("prompt_files", format!("prompts for `{strategy}` are present"))
    } else {
        DoctorCheck::fail("prompt_files", missing.join("; "))
    }
}

pub(crate) fn required_prompts(strategy: StrategyType) -> &'static [&'static str] {
    match strategy {
        StrategyType::Nl2sqlAdvisor => &["user_proxy", "nl2sql_assistant", "advisor"],
        StrategyType::Nl2sqlFewshot => &["user_proxy", "nl2sql_assistant"],
        StrategyType::ClassicRag => &["user_proxy", "classic_rag_assistant", "chat_closure"],
    }
}

fn check_database_connectivity(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck::fail(
                "database_connectivity",
                format!("failed to initialize async runtime: {error}"),
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| format!("failed to connect to database: {error}"))?;

        pool.close().await;
        Ok::<(), String>(())
    });

    match result {
        Ok(()) => DoctorCheck::pass(
            "database_connectivity",
            format!("connected using `{}`", config.database.url),
        ),
        Err(error) => DoctorCheck::fail("database_connectivity", error),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
