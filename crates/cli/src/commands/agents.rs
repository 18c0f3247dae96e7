use std::sync::Arc;

use nl2sql_agent::{OpenAiCompatibleClient, StrategyBuilder};
use nl2sql_core::{FilePromptSource, StrategyType};

use crate::commands::{require_config, runtime, to_data, CommandResult, LoadedConfig};

const COMMAND: &str = "agents";

/// Builds a fresh session configuration and reports its roster and wiring.
pub fn run(loaded: &LoadedConfig, strategy: Option<&str>) -> CommandResult {
    match build(loaded, strategy) {
        Ok(result) | Err(result) => result,
    }
}

fn build(loaded: &LoadedConfig, strategy: Option<&str>) -> Result<CommandResult, CommandResult> {
    let config = require_config(COMMAND, loaded)?;

    let strategy = match strategy {
        Some(value) => value.parse::<StrategyType>().map_err(|error| {
            CommandResult::failure(COMMAND, "invalid_strategy", error.to_string(), 2)
        })?,
        None => config.strategy.default,
    };

    let llm = OpenAiCompatibleClient::from_config(&config.llm).map_err(|error| {
        CommandResult::failure(COMMAND, "llm_client", error.to_string(), 4)
    })?;
    let builder =
        StrategyBuilder::new(Arc::new(FilePromptSource::new(&config.prompts.dir)), Arc::new(llm));

    let configuration = runtime(COMMAND)?
        .block_on(builder.build(strategy, &[]))
        .map_err(|error| CommandResult::failure(COMMAND, "strategy", error.to_string(), 5))?;

    let message = format!(
        "{strategy}: {} agents, {} tools, max {} rounds",
        configuration.agents.len(),
        configuration.tools.len(),
        configuration.max_rounds
    );
    Ok(CommandResult::success_with_data(COMMAND, message, Some(to_data(COMMAND, &configuration)?)))
}
