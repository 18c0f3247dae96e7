use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use nl2sql_core::config::default_config_paths;
use secrecy::SecretString;
use toml::Value;

use crate::commands::LoadedConfig;

pub fn run(loaded: &LoadedConfig) -> String {
    let config = match loaded {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let path = detect_config_path();
    let sources = Sources { doc: load_config_file_doc(path.as_deref()), path };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    let mut push = |key: &str, value: &str, env_keys: &[&str]| {
        lines.push(render_line(key, value, sources.field_source(key, env_keys)));
    };

    push("database.url", &config.database.url, &["NL2SQL_DATABASE_URL"]);
    push(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        &["NL2SQL_DATABASE_MAX_CONNECTIONS"],
    );
    push(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        &["NL2SQL_DATABASE_TIMEOUT_SECS"],
    );

    push("llm.provider", &format!("{:?}", config.llm.provider), &["NL2SQL_LLM_PROVIDER"]);
    push("llm.model", &config.llm.model, &["NL2SQL_LLM_MODEL"]);
    push("llm.embedding_model", &config.llm.embedding_model, &["NL2SQL_LLM_EMBEDDING_MODEL"]);
    push("llm.base_url", &optional(config.llm.base_url.as_deref()), &["NL2SQL_LLM_BASE_URL"]);
    push(
        "llm.api_version",
        &optional(config.llm.api_version.as_deref()),
        &["NL2SQL_LLM_API_VERSION"],
    );
    push("llm.api_key", &redact_secret(config.llm.api_key.as_ref()), &["NL2SQL_LLM_API_KEY"]);

    push(
        "search.endpoint",
        &optional(config.search.endpoint_url().as_deref()),
        &["NL2SQL_SEARCH_ENDPOINT", "NL2SQL_SEARCH_SERVICE"],
    );
    push("search.index", &config.search.index, &["NL2SQL_SEARCH_INDEX"]);
    push("search.approach", &format!("{:?}", config.search.approach), &["NL2SQL_SEARCH_APPROACH"]);
    push("search.top_k", &config.search.top_k.to_string(), &["NL2SQL_SEARCH_TOP_K"]);
    push(
        "search.use_semantic",
        &config.search.use_semantic.to_string(),
        &["NL2SQL_SEARCH_USE_SEMANTIC"],
    );
    push(
        "search.api_key",
        &redact_secret(config.search.api_key.as_ref()),
        &["NL2SQL_SEARCH_API_KEY"],
    );

    push(
        "keyword_search.base_url",
        &config.keyword_search.base_url,
        &["NL2SQL_KEYWORD_SEARCH_BASE_URL"],
    );
    push(
        "keyword_search.collection_id",
        &optional(config.keyword_search.collection_id.as_deref()),
        &["NL2SQL_KEYWORD_SEARCH_COLLECTION_ID"],
    );

    push("prompts.dir", &config.prompts.dir.display().to_string(), &["NL2SQL_PROMPTS_DIR"]);
    push(
        "data_dictionary.dir",
        &config.data_dictionary.dir.display().to_string(),
        &["NL2SQL_DATA_DICTIONARY_DIR"],
    );
    push("strategy.default", &config.strategy.default.to_string(), &["NL2SQL_STRATEGY"]);

    push("logging.level", &config.logging.level, &["NL2SQL_LOGGING_LEVEL", "NL2SQL_LOG_LEVEL"]);
    push(
        "logging.format",
        &format!("{:?}", config.logging.format),
        &["NL2SQL_LOGGING_FORMAT", "NL2SQL_LOG_FORMAT"],
    );

    lines.join("\n")
}

struct Sources {
    doc: Option<Value>,
    path: Option<PathBuf>,
}

impl Sources {
    fn field_source(&self, key_path: &str, env_keys: &[&str]) -> String {
        if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
            return format!("env ({env_key})");
        }

        if let Some(doc) = &self.doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .path
                    .as_deref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

fn detect_config_path() -> Option<PathBuf> {
    default_config_paths().into_iter().find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn optional(value: Option<&str>) -> String {
    value.unwrap_or("<unset>").to_string()
}

fn redact_secret(secret: Option<&SecretString>) -> String {
    match secret {
        Some(_) => "<redacted>".to_string(),
        None => "<unset>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{contains_path, redact_secret};

    #[test]
    fn nested_key_paths_are_found_in_toml() {
        let doc: toml::Value =
            "[search]\nendpoint = \"https://x\"\n".parse().expect("toml should parse");

        assert!(contains_path(&doc, "search.endpoint"));
        assert!(!contains_path(&doc, "search.index"));
        assert!(!contains_path(&doc, "llm.model"));
    }

    #[test]
    fn secrets_never_render_their_value() {
        let secret = secrecy::SecretString::from("sk-live-123".to_string());

        assert_eq!(redact_secret(Some(&secret)), "<redacted>");
        assert_eq!(redact_secret(None), "<unset>");
    }
}
