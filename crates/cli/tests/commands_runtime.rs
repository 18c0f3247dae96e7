use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use nl2sql_cli::commands::{agents, clock, dictionary, load, search, sql};
use serde_json::Value;
use tempfile::TempDir;

const DICTIONARY: &str = r#"{
    "sales": {
        "description_long": "One row per order with region and amount.",
        "description_short": "Orders",
        "columns": {"order_id": "Order key", "region": "Sales region", "amount": "Order total"}
    },
    "regions": {
        "description_long": "Region master data.",
        "columns": {"region": "Region code", "manager": "Regional manager"}
    }
}"#;

#[test]
fn validate_reports_valid_and_invalid_sql() {
    with_env(&[("NL2SQL_DATABASE_URL", "sqlite::memory:")], || {
        let result = sql::validate(&load(), "SELECT 1 AS answer");
        assert_eq!(result.exit_code, 0);
        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "validate");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["is_valid"], true);

        let result = sql::validate(&load(), "SELEC 1");
        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["is_valid"], false);
        assert!(payload["data"]["error"].is_string());
    });
}

#[test]
fn execute_returns_rows_and_rejects_writes() {
    with_env(&[("NL2SQL_DATABASE_URL", "sqlite::memory:")], || {
        let result = sql::execute(&load(), "SELECT 1 AS answer, 'north' AS region");
        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);
        let payload = parse_payload(&result.output);
        assert_eq!(payload["message"], "1 rows");
        assert_eq!(payload["data"]["results"][0]["answer"], 1);
        assert_eq!(payload["data"]["results"][0]["region"], "north");

        let result = sql::execute(&load(), "DROP TABLE sales");
        assert_eq!(result.exit_code, 6);
        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "query");
        assert_eq!(payload["message"], "Only SELECT statements are allowed.");
    });
}

#[test]
fn commands_fail_with_config_error_on_invalid_env() {
    with_env(&[("NL2SQL_DATABASE_URL", "postgres://localhost/db")], || {
        let result = sql::execute(&load(), "SELECT 1");
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "execute");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn commands_reuse_the_config_loaded_once_by_the_caller() {
    with_env(&[("NL2SQL_DATABASE_URL", "sqlite::memory:")], || {
        let loaded = load();
        env::set_var("NL2SQL_DATABASE_URL", "postgres://localhost/db");

        let result = sql::execute(&loaded, "SELECT 1 AS answer");
        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);
        assert_eq!(parse_payload(&result.output)["data"]["results"][0]["answer"], 1);

        let result = sql::execute(&load(), "SELECT 1 AS answer");
        assert_eq!(result.exit_code, 2);
    });
}

#[test]
fn tables_and_schema_read_the_data_dictionary() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join("data_dictionary.json"), DICTIONARY).expect("dictionary written");
    let dir_value = dir.path().display().to_string();

    with_env(&[("NL2SQL_DATA_DICTIONARY_DIR", dir_value.as_str())], || {
        let payload = parse_payload(&dictionary::tables(&load()).output);
        assert_eq!(payload["message"], "2 tables");
        assert_eq!(payload["data"]["tables"][0]["table_name"], "sales");
        assert_eq!(payload["data"]["tables"][1]["table_name"], "regions");

        let payload = parse_payload(&dictionary::schema(&load(), None, Some("region")).output);
        assert_eq!(payload["data"]["table_name"], "sales", "first table in file order wins");

        let payload = parse_payload(&dictionary::schema(&load(), Some("orders"), None).output);
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["error"], "Table 'orders' not found in data dictionary.");
    });
}

#[test]
fn schema_fails_when_dictionary_is_missing() {
    let dir = TempDir::new().expect("temp dir");
    let dir_value = dir.path().display().to_string();

    with_env(&[("NL2SQL_DATA_DICTIONARY_DIR", dir_value.as_str())], || {
        let result = dictionary::tables(&load());
        assert_eq!(result.exit_code, 4);
        assert_eq!(parse_payload(&result.output)["error_class"], "data_dictionary");
    });
}

#[test]
fn agents_reports_the_configured_strategy() {
    let dir = TempDir::new().expect("temp dir");
    write_prompts(dir.path());
    let dir_value = dir.path().display().to_string();

    with_env(&[("NL2SQL_PROMPTS_DIR", dir_value.as_str())], || {
        let result = agents::run(&load(), Some("classic_rag"));
        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["strategy"], "classic_rag");
        assert_eq!(payload["data"]["max_rounds"], 10);
        assert_eq!(payload["data"]["transitions"]["assistant"][0], "chat_closure");
        assert_eq!(
            payload["data"]["agents"][1]["system_prompt"],
            "Answer with sources. The conversation just started."
        );

        let result = agents::run(&load(), Some("graph_rag"));
        assert_eq!(result.exit_code, 2);
        assert_eq!(parse_payload(&result.output)["error_class"], "invalid_strategy");

        let result = agents::run(&load(), Some("nl2sql_fewshot"));
        assert_eq!(result.exit_code, 5, "fewshot prompts were not written");
    });
}

#[test]
fn search_without_configured_backends_returns_no_sources() {
    with_env(&[], || {
        let result = search::run(&load(), "refund policy", true);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["message"], "no sources found");
        assert_eq!(payload["data"], "");
    });
}

#[test]
fn clock_commands_use_fixed_formats() {
    let today = parse_payload(&clock::today().output);
    let time = parse_payload(&clock::time().output);

    let date = today["message"].as_str().unwrap_or_default();
    assert_eq!(date.len(), 10);
    assert_eq!(date.as_bytes()[4], b'-');
    let clock = time["message"].as_str().unwrap_or_default();
    assert_eq!(clock.len(), 5);
    assert_eq!(clock.as_bytes()[2], b':');
}

fn write_prompts(root: &Path) {
    let strategy_dir = root.join("classic_rag");
    fs::create_dir_all(&strategy_dir).expect("prompt dir");
    fs::write(strategy_dir.join("user_proxy.txt"), "Relay. Say TERMINATE when done.").expect("prompt");
    fs::write(
        strategy_dir.join("classic_rag_assistant.txt"),
        "Answer with sources. {{conversation_summary}}\n",
    )
    .expect("prompt");
    fs::write(strategy_dir.join("chat_closure.txt"), "Close politely.").expect("prompt");
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "NL2SQL_DATABASE_URL",
        "NL2SQL_DATABASE_MAX_CONNECTIONS",
        "NL2SQL_DATABASE_TIMEOUT_SECS",
        "NL2SQL_LLM_PROVIDER",
        "NL2SQL_LLM_API_KEY",
        "NL2SQL_LLM_BASE_URL",
        "NL2SQL_LLM_MODEL",
        "NL2SQL_LLM_EMBEDDING_MODEL",
        "NL2SQL_LLM_API_VERSION",
        "NL2SQL_LLM_TIMEOUT_SECS",
        "NL2SQL_SEARCH_SERVICE",
        "NL2SQL_SEARCH_ENDPOINT",
        "NL2SQL_SEARCH_API_KEY",
        "NL2SQL_SEARCH_TOP_K",
        "NL2SQL_SEARCH_APPROACH",
        "NL2SQL_KEYWORD_SEARCH_BASE_URL",
        "NL2SQL_KEYWORD_SEARCH_COLLECTION_ID",
        "NL2SQL_KEYWORD_SEARCH_TOP_K",
        "NL2SQL_PROMPTS_DIR",
        "NL2SQL_DATA_DICTIONARY_DIR",
        "NL2SQL_STRATEGY",
        "NL2SQL_LOGGING_LEVEL",
        "NL2SQL_LOGGING_FORMAT",
        "NL2SQL_LOG_LEVEL",
        "NL2SQL_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
