use nl2sql_db::{connect_with_config, SqlGateway, SqlQueryGateway};

use crate::commands::{require_config, runtime, to_data, CommandResult, LoadedConfig};

pub fn validate(loaded: &LoadedConfig, query: &str) -> CommandResult {
    const COMMAND: &str = "validate";

    let outcome = with_gateway(COMMAND, loaded, |gateway| async move {
        let result = gateway.validate(query).await;
        gateway.pool().close().await;
        result
    });

    match outcome {
        Ok(result) => {
            let message = match &result.error {
                Some(error) => format!("invalid: {error}"),
                None => "valid".to_string(),
            };
            to_data(COMMAND, &result)
                .map(|data| CommandResult::success_with_data(COMMAND, message, Some(data)))
                .unwrap_or_else(|failure| failure)
        }
        Err(failure) => failure,
    }
}

pub fn execute(loaded: &LoadedConfig, query: &str) -> CommandResult {
    const COMMAND: &str = "execute";

    let outcome = with_gateway(COMMAND, loaded, |gateway| async move {
        let result = gateway.execute(query).await;
        gateway.pool().close().await;
        result
    });

    match outcome {
        Ok(result) => {
            if let Some(error) = &result.error {
                return CommandResult::failure(COMMAND, "query", error.clone(), 6);
            }
            let rows = result.results.as_ref().map_or(0, Vec::len);
            to_data(COMMAND, &result)
                .map(|data| CommandResult::success_with_data(COMMAND, format!("{rows} rows"), Some(data)))
                .unwrap_or_else(|failure| failure)
        }
        Err(failure) => failure,
    }
}

fn with_gateway<F, Fut, T>(
    command: &str,
    loaded: &LoadedConfig,
    operation: F,
) -> Result<T, CommandResult>
where
    F: FnOnce(SqlQueryGateway) -> Fut,
    Fut: std::future::Future<Output = T>,
{
    let config = require_config(command, loaded)?;

    runtime(command)?.block_on(async {
        let pool = connect_with_config(&config.database).await.map_err(|error| {
            CommandResult::failure(command, "db_connectivity", error.to_string(), 4)
        })?;
        Ok::<T, CommandResult>(operation(SqlQueryGateway::new(pool)).await)
    })
}
