use nl2sql_core::DataDictionary;

use crate::commands::{require_config, to_data, CommandResult, LoadedConfig};

fn load(command: &str, loaded: &LoadedConfig) -> Result<DataDictionary, CommandResult> {
    let config = require_config(command, loaded)?;
    DataDictionary::load(&config.data_dictionary.dir).map_err(|error| {
        CommandResult::failure(command, "data_dictionary", error.to_string(), 4)
    })
}

pub fn tables(loaded: &LoadedConfig) -> CommandResult {
    const COMMAND: &str = "tables";

    let result = load(COMMAND, loaded).and_then(|dictionary| {
        let tables = dictionary.tables_info();
        let message = format!("{} tables", tables.tables.len());
        Ok(CommandResult::success_with_data(COMMAND, message, Some(to_data(COMMAND, &tables)?)))
    });

    result.unwrap_or_else(|failure| failure)
}

/// Lookup errors are reported inside `data`, the way the assistant sees them.
pub fn schema(
    loaded: &LoadedConfig,
    table_name: Option<&str>,
    column_name: Option<&str>,
) -> CommandResult {
    const COMMAND: &str = "schema";

    let result = load(COMMAND, loaded).and_then(|dictionary| {
        let info = dictionary.schema_info(table_name, column_name);
        let message = match (&info.error, &info.table_name) {
            (Some(error), _) => error.clone(),
            (None, Some(table)) => format!("schema for {table}"),
            (None, None) => "schema lookup".to_string(),
        };
        Ok(CommandResult::success_with_data(COMMAND, message, Some(to_data(COMMAND, &info)?)))
    });

    result.unwrap_or_else(|failure| failure)
}
