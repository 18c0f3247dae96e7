use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::strategy::StrategyType;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub keyword_search: KeywordSearchConfig,
    pub prompts: PromptsConfig,
    pub data_dictionary: DataDictionaryConfig,
    pub strategy: StrategyConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub embedding_model: String,
    pub api_version: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub service: Option<String>,
    pub endpoint: Option<String>,
    pub index: String,
    pub api_version: String,
    pub api_key: Option<SecretString>,
    pub top_k: u32,
    pub approach: SearchApproach,
    pub use_semantic: bool,
    pub semantic_config: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct KeywordSearchConfig {
    pub base_url: String,
    pub collection_id: Option<String>,
    pub top_k: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct PromptsConfig {
    pub dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct DataDictionaryConfig {
    pub dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct StrategyConfig {
    pub default: StrategyType,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    #[serde(rename = "openai", alias = "open_ai")]
    OpenAi,
    #[serde(rename = "azure_openai", alias = "azure_open_ai", alias = "azure")]
    AzureOpenAi,
    Ollama,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchApproach {
    Term,
    Vector,
    Hybrid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
    pub llm_base_url: Option<String>,
    pub search_endpoint: Option<String>,
    pub search_api_key: Option<String>,
    pub keyword_search_base_url: Option<String>,
    pub keyword_search_collection_id: Option<String>,
    pub prompts_dir: Option<PathBuf>,
    pub data_dictionary_dir: Option<PathBuf>,
    pub strategy: Option<StrategyType>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://nl2sql.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            llm: LlmConfig {
                provider: LlmProvider::Ollama,
                api_key: None,
                base_url: Some("http://localhost:11434".to_string()),
                model: "llama3.1".to_string(),
                embedding_model: "nomic-embed-text".to_string(),
                api_version: None,
                timeout_secs: 60,
            },
            search: SearchConfig {
                service: None,
                endpoint: None,
                index: "ragindex".to_string(),
                api_version: "2024-07-01".to_string(),
                api_key: None,
                top_k: 3,
                approach: SearchApproach::Hybrid,
                use_semantic: false,
                semantic_config: "my-semantic-config".to_string(),
                timeout_secs: 30,
            },
            keyword_search: KeywordSearchConfig {
                base_url: "https://search.cogmo.jp".to_string(),
                collection_id: None,
                top_k: 3,
                timeout_secs: 30,
            },
            prompts: PromptsConfig { dir: PathBuf::from("prompts") },
            data_dictionary: DataDictionaryConfig { dir: PathBuf::from("config") },
            strategy: StrategyConfig { default: StrategyType::Nl2sqlAdvisor },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" | "open_ai" => Ok(Self::OpenAi),
            "azure_openai" | "azure_open_ai" | "azure" => Ok(Self::AzureOpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected openai|azure_openai|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for SearchApproach {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "term" => Ok(Self::Term),
            "vector" => Ok(Self::Vector),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(ConfigError::Validation(format!(
                "unsupported search approach `{other}` (expected term|vector|hybrid)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl SearchConfig {
    /// Explicit endpoint if set, otherwise the public host derived from `service`.
    pub fn endpoint_url(&self) -> Option<String> {
        if let Some(endpoint) = &self.endpoint {
            return Some(endpoint.trim_end_matches('/').to_string());
        }
        self.service.as_ref().map(|service| format!("https://{service}.search.windows.net"))
    }

    pub fn search_url(&self) -> Option<String> {
        self.endpoint_url().map(|endpoint| {
            format!(
                "{endpoint}/indexes/{}/docs/search?api-version={}",
                self.index, self.api_version
            )
        })
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("nl2sql.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(embedding_model) = llm.embedding_model {
                self.llm.embedding_model = embedding_model;
            }
            if let Some(api_version) = llm.api_version {
                self.llm.api_version = Some(api_version);
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(search) = patch.search {
            if let Some(service) = search.service {
                self.search.service = Some(service);
            }
            if let Some(endpoint) = search.endpoint {
                self.search.endpoint = Some(endpoint);
            }
            if let Some(index) = search.index {
                self.search.index = index;
            }
            if let Some(api_version) = search.api_version {
                self.search.api_version = api_version;
            }
            if let Some(search_api_key_value) = search.api_key {
                self.search.api_key = Some(secret_value(search_api_key_value));
            }
            if let Some(top_k) = search.top_k {
                self.search.top_k = top_k;
            }
            if let Some(approach) = search.approach {
                self.search.approach = approach;
            }
            if let Some(use_semantic) = search.use_semantic {
                self.search.use_semantic = use_semantic;
            }
            if let Some(semantic_config) = search.semantic_config {
                self.search.semantic_config = semantic_config;
            }
            if let Some(timeout_secs) = search.timeout_secs {
                self.search.timeout_secs = timeout_secs;
            }
        }

        if let Some(keyword_search) = patch.keyword_search {
            if let Some(base_url) = keyword_search.base_url {
                self.keyword_search.base_url = base_url;
            }
            if let Some(collection_id) = keyword_search.collection_id {
                self.keyword_search.collection_id = Some(collection_id);
            }
            if let Some(top_k) = keyword_search.top_k {
                self.keyword_search.top_k = top_k;
            }
            if let Some(timeout_secs) = keyword_search.timeout_secs {
                self.keyword_search.timeout_secs = timeout_secs;
            }
        }

        if let Some(prompts) = patch.prompts {
            if let Some(dir) = prompts.dir {
                self.prompts.dir = dir;
            }
        }

        if let Some(data_dictionary) = patch.data_dictionary {
            if let Some(dir) = data_dictionary.dir {
                self.data_dictionary.dir = dir;
            }
        }

        if let Some(strategy) = patch.strategy {
            if let Some(default) = strategy.default {
                self.strategy.default = default
                    .parse::<StrategyType>()
                    .map_err(|error| ConfigError::Validation(format!("strategy.default: {error}")))?;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("NL2SQL_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("NL2SQL_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("NL2SQL_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("NL2SQL_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("NL2SQL_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("NL2SQL_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        if let Some(value) = read_env("NL2SQL_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("NL2SQL_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("NL2SQL_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("NL2SQL_LLM_EMBEDDING_MODEL") {
            self.llm.embedding_model = value;
        }
        if let Some(value) = read_env("NL2SQL_LLM_API_VERSION") {
            self.llm.api_version = Some(value);
        }
        if let Some(value) = read_env("NL2SQL_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("NL2SQL_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("NL2SQL_SEARCH_SERVICE") {
            self.search.service = Some(value);
        }
        if let Some(value) = read_env("NL2SQL_SEARCH_ENDPOINT") {
            self.search.endpoint = Some(value);
        }
        if let Some(value) = read_env("NL2SQL_SEARCH_INDEX") {
            self.search.index = value;
        }
        if let Some(value) = read_env("NL2SQL_SEARCH_API_VERSION") {
            self.search.api_version = value;
        }
        if let Some(value) = read_env("NL2SQL_SEARCH_API_KEY") {
            self.search.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("NL2SQL_SEARCH_TOP_K") {
            self.search.top_k = parse_u32("NL2SQL_SEARCH_TOP_K", &value)?;
        }
        if let Some(value) = read_env("NL2SQL_SEARCH_APPROACH") {
            self.search.approach = value.parse()?;
        }
        if let Some(value) = read_env("NL2SQL_SEARCH_USE_SEMANTIC") {
            self.search.use_semantic = parse_bool("NL2SQL_SEARCH_USE_SEMANTIC", &value)?;
        }
        if let Some(value) = read_env("NL2SQL_SEARCH_SEMANTIC_CONFIG") {
            self.search.semantic_config = value;
        }
        if let Some(value) = read_env("NL2SQL_SEARCH_TIMEOUT_SECS") {
            self.search.timeout_secs = parse_u64("NL2SQL_SEARCH_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("NL2SQL_KEYWORD_SEARCH_BASE_URL") {
            self.keyword_search.base_url = value;
        }
        if let Some(value) = read_env("NL2SQL_KEYWORD_SEARCH_COLLECTION_ID") {
            self.keyword_search.collection_id = Some(value);
        }
        if let Some(value) = read_env("NL2SQL_KEYWORD_SEARCH_TOP_K") {
            self.keyword_search.top_k = parse_u32("NL2SQL_KEYWORD_SEARCH_TOP_K", &value)?;
        }

        if let Some(value) = read_env("NL2SQL_PROMPTS_DIR") {
            self.prompts.dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("NL2SQL_DATA_DICTIONARY_DIR") {
            self.data_dictionary.dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("NL2SQL_STRATEGY") {
            self.strategy.default = value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "NL2SQL_STRATEGY".to_string(),
                value: value.clone(),
            })?;
        }

        let log_level = read_env("NL2SQL_LOGGING_LEVEL").or_else(|| read_env("NL2SQL_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("NL2SQL_LOGGING_FORMAT").or_else(|| read_env("NL2SQL_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(llm_base_url) = overrides.llm_base_url {
            self.llm.base_url = Some(llm_base_url);
        }
        if let Some(search_endpoint) = overrides.search_endpoint {
            self.search.endpoint = Some(search_endpoint);
        }
        if let Some(search_api_key) = overrides.search_api_key {
            self.search.api_key = Some(secret_value(search_api_key));
        }
        if let Some(base_url) = overrides.keyword_search_base_url {
            self.keyword_search.base_url = base_url;
        }
        if let Some(collection_id) = overrides.keyword_search_collection_id {
            self.keyword_search.collection_id = Some(collection_id);
        }
        if let Some(prompts_dir) = overrides.prompts_dir {
            self.prompts.dir = prompts_dir;
        }
        if let Some(data_dictionary_dir) = overrides.data_dictionary_dir {
            self.data_dictionary.dir = data_dictionary_dir;
        }
        if let Some(strategy) = overrides.strategy {
            self.strategy.default = strategy;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_llm(&self.llm)?;
        validate_search(&self.search)?;
        validate_keyword_search(&self.keyword_search)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// Config file candidates in lookup order when no explicit path is given.
pub fn default_config_paths() -> [PathBuf; 2] {
    [PathBuf::from("nl2sql.toml"), PathBuf::from("config/nl2sql.toml")]
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    default_config_paths().into_iter().find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    let missing_key =
        llm.api_key.as_ref().map(|value| value.expose_secret().trim().is_empty()).unwrap_or(true);
    let missing_base_url =
        llm.base_url.as_ref().map(|value| value.trim().is_empty()).unwrap_or(true);

    match llm.provider {
        LlmProvider::OpenAi => {
            if missing_key {
                return Err(ConfigError::Validation(
                    "llm.api_key is required for the openai provider".to_string(),
                ));
            }
        }
        LlmProvider::AzureOpenAi => {
            if missing_key || missing_base_url {
                return Err(ConfigError::Validation(
                    "llm.api_key and llm.base_url are required for the azure_openai provider"
                        .to_string(),
                ));
            }
            if llm.api_version.as_ref().map(|value| value.trim().is_empty()).unwrap_or(true) {
                return Err(ConfigError::Validation(
                    "llm.api_version is required for the azure_openai provider".to_string(),
                ));
            }
        }
        LlmProvider::Ollama => {
            if missing_base_url {
                return Err(ConfigError::Validation(
                    "llm.base_url is required for ollama provider".to_string(),
                ));
            }
        }
    }

    Ok(())
}

fn validate_search(search: &SearchConfig) -> Result<(), ConfigError> {
    if search.top_k == 0 || search.top_k > 50 {
        return Err(ConfigError::Validation("search.top_k must be in range 1..=50".to_string()));
    }

    if search.timeout_secs == 0 || search.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "search.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if search.index.trim().is_empty() {
        return Err(ConfigError::Validation("search.index must not be empty".to_string()));
    }

    if let Some(endpoint) = &search.endpoint {
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ConfigError::Validation(
                "search.endpoint must start with http:// or https://".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_keyword_search(keyword_search: &KeywordSearchConfig) -> Result<(), ConfigError> {
    let base_url = &keyword_search.base_url;
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "keyword_search.base_url must start with http:// or https://".to_string(),
        ));
    }

    if keyword_search.top_k == 0 || keyword_search.top_k > 50 {
        return Err(ConfigError::Validation(
            "keyword_search.top_k must be in range 1..=50".to_string(),
        ));
    }

    if keyword_search.timeout_secs == 0 || keyword_search.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "keyword_search.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().to_ascii_lowercase().parse::<bool>().map_err(|_| {
        ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    llm: Option<LlmPatch>,
    search: Option<SearchPatch>,
    keyword_search: Option<KeywordSearchPatch>,
    prompts: Option<DirPatch>,
    data_dictionary: Option<DirPatch>,
    strategy: Option<StrategyPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    embedding_model: Option<String>,
    api_version: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchPatch {
    service: Option<String>,
    endpoint: Option<String>,
    index: Option<String>,
    api_version: Option<String>,
    api_key: Option<String>,
    top_k: Option<u32>,
    approach: Option<SearchApproach>,
    use_semantic: Option<bool>,
    semantic_config: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct KeywordSearchPatch {
    base_url: Option<String>,
    collection_id: Option<String>,
    top_k: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct DirPatch {
    dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct StrategyPatch {
    default: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
