use std::sync::Arc;

use nl2sql_agent::{KeywordCollectionRetriever, OpenAiCompatibleClient, Retriever, VectorIndexRetriever};
use serde_json::Value;

use crate::commands::{require_config, runtime, CommandResult, LoadedConfig};

const COMMAND: &str = "search";

/// Runs a retrieval query; an empty result is not an error.
pub fn run(loaded: &LoadedConfig, query: &str, keyword: bool) -> CommandResult {
    match search(loaded, query, keyword) {
        Ok(result) | Err(result) => result,
    }
}

fn search(
    loaded: &LoadedConfig,
    query: &str,
    keyword: bool,
) -> Result<CommandResult, CommandResult> {
    let config = require_config(COMMAND, loaded)?;

    let retriever: Box<dyn Retriever> = if keyword {
        Box::new(KeywordCollectionRetriever::from_config(&config.keyword_search).map_err(
            |error| CommandResult::failure(COMMAND, "retriever", error.to_string(), 4),
        )?)
    } else {
        let embedder = OpenAiCompatibleClient::from_config(&config.llm).map_err(|error| {
            CommandResult::failure(COMMAND, "llm_client", error.to_string(), 4)
        })?;
        Box::new(VectorIndexRetriever::from_config(&config.search, Arc::new(embedder)).map_err(
            |error| CommandResult::failure(COMMAND, "retriever", error.to_string(), 4),
        )?)
    };

    let sources = runtime(COMMAND)?.block_on(retriever.retrieve(query));
    let message =
        if sources.is_empty() { "no sources found".to_string() } else { "sources found".to_string() };

    Ok(CommandResult::success_with_data(COMMAND, message, Some(Value::String(sources))))
}
