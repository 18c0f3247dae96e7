use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::errors::DataDictionaryError;
use crate::results::{SchemaInfo, TableSummary, TablesList};

pub const CUSTOM_DICTIONARY_FILE: &str = "data_dictionary.custom.json";
pub const DEFAULT_DICTIONARY_FILE: &str = "data_dictionary.json";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    #[serde(default)]
    pub description_long: Option<String>,
    #[serde(default)]
    pub description_short: Option<String>,
    #[serde(default)]
    pub columns: IndexMap<String, String>,
}

/// Table and column descriptions the assistant consults before writing SQL.
///
/// Tables keep the order in which the dictionary file lists them, and column
/// lookups scan tables in that order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataDictionary {
    tables: IndexMap<String, TableEntry>,
}

impl DataDictionary {
    pub fn new(tables: IndexMap<String, TableEntry>) -> Self {
        Self { tables }
    }

    /// Loads `data_dictionary.custom.json` from `dir`, falling back to `data_dictionary.json`.
    pub fn load(dir: &Path) -> Result<Self, DataDictionaryError> {
        let path = resolve_dictionary_path(dir)?;
        let raw = fs::read_to_string(&path)
            .map_err(|source| DataDictionaryError::Read { path: path.clone(), source })?;
        serde_json::from_str(&raw).map_err(|source| DataDictionaryError::Parse { path, source })
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table(&self, name: &str) -> Option<&TableEntry> {
        self.tables.get(name)
    }

    /// Table lookup wins when both arguments are given; blank arguments count as absent.
    pub fn schema_info(&self, table_name: Option<&str>, column_name: Option<&str>) -> SchemaInfo {
        let table_name = table_name.filter(|value| !value.is_empty());
        let column_name = column_name.filter(|value| !value.is_empty());

        if let Some(table_name) = table_name {
            return match self.tables.get(table_name) {
                Some(entry) => SchemaInfo {
                    table_name: Some(table_name.to_string()),
                    description_long: entry.description_long.clone(),
                    description_short: entry.description_short.clone(),
                    columns: Some(entry.columns.clone()),
                    ..SchemaInfo::default()
                },
                None => SchemaInfo::error(format!(
                    "Table '{table_name}' not found in data dictionary."
                )),
            };
        }

        if let Some(column_name) = column_name {
            let found = self.tables.iter().find_map(|(table, entry)| {
                entry.columns.get(column_name).map(|description| (table, description))
            });
            return match found {
                Some((table, description)) => SchemaInfo {
                    table_name: Some(table.clone()),
                    column_name: Some(column_name.to_string()),
                    column_description: Some(description.clone()),
                    ..SchemaInfo::default()
                },
                None => SchemaInfo::error(format!(
                    "Column '{column_name}' not found in data dictionary."
                )),
            };
        }

        SchemaInfo::error("Please provide either 'table_name' or 'column_name'.")
    }

    pub fn tables_info(&self) -> TablesList {
        let tables = self
            .tables
            .iter()
            .map(|(name, entry)| TableSummary {
                table_name: name.clone(),
                description_long: entry.description_long.clone(),
            })
            .collect();
        TablesList { tables }
    }
}

fn resolve_dictionary_path(dir: &Path) -> Result<PathBuf, DataDictionaryError> {
    let custom = dir.join(CUSTOM_DICTIONARY_FILE);
    if custom.exists() {
        info!(path = %custom.display(), "using custom data dictionary");
        return Ok(custom);
    }

    let default = dir.join(DEFAULT_DICTIONARY_FILE);
    if default.exists() {
        info!(path = %default.display(), "using default data dictionary");
        return Ok(default);
    }

    error!(dir = %dir.display(), "data dictionary file not found");
    Err(DataDictionaryError::NotFound(dir.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::DataDictionary;
    use crate::errors::DataDictionaryError;

    const SAMPLE: &str = r#"{
        "sales": {
            "description_long": "One row per order line.",
            "description_short": "Order lines",
            "columns": {"order_id": "Order identifier", "region": "Sales region"}
        },
        "regions": {
            "description_long": "Sales regions and their managers.",
            "columns": {"region": "Region code", "manager": "Regional manager"}
        }
    }"#;

    fn sample() -> DataDictionary {
        DataDictionary::from_json(SAMPLE).expect("sample dictionary should parse")
    }

    #[test]
    fn table_lookup_returns_descriptions_and_columns() {
        let info = sample().schema_info(Some("sales"), None);

        assert_eq!(info.table_name.as_deref(), Some("sales"));
        assert_eq!(info.description_short.as_deref(), Some("Order lines"));
        let columns = info.columns.expect("columns should be present");
        assert_eq!(columns.keys().collect::<Vec<_>>(), ["order_id", "region"]);
        assert!(info.error.is_none());
    }

    #[test]
    fn column_lookup_scans_tables_in_file_order() {
        let info = sample().schema_info(None, Some("region"));

        assert_eq!(info.table_name.as_deref(), Some("sales"));
        assert_eq!(info.column_description.as_deref(), Some("Sales region"));

        let info = sample().schema_info(None, Some("manager"));
        assert_eq!(info.table_name.as_deref(), Some("regions"));
    }

    #[test]
    fn lookups_report_actionable_errors() {
        let dictionary = sample();

        assert_eq!(
            dictionary.schema_info(Some("orders"), None).error.as_deref(),
            Some("Table 'orders' not found in data dictionary.")
        );
        assert_eq!(
            dictionary.schema_info(None, Some("price")).error.as_deref(),
            Some("Column 'price' not found in data dictionary.")
        );
        assert_eq!(
            dictionary.schema_info(Some(""), None).error.as_deref(),
            Some("Please provide either 'table_name' or 'column_name'.")
        );
    }

    #[test]
    fn tables_info_lists_every_table_with_long_description() {
        let tables = sample().tables_info().tables;

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].table_name, "sales");
        assert_eq!(tables[1].description_long.as_deref(), Some("Sales regions and their managers."));
    }

    #[test]
    fn custom_dictionary_file_wins_over_default() -> Result<(), String> {
        let dir = TempDir::new().map_err(|err| err.to_string())?;
        fs::write(dir.path().join("data_dictionary.json"), SAMPLE).map_err(|err| err.to_string())?;
        fs::write(
            dir.path().join("data_dictionary.custom.json"),
            r#"{"custom_only": {"columns": {}}}"#,
        )
        .map_err(|err| err.to_string())?;

        let dictionary = DataDictionary::load(dir.path()).map_err(|err| err.to_string())?;
        assert_eq!(dictionary.len(), 1);
        assert!(dictionary.table("custom_only").is_some());
        Ok(())
    }

    #[test]
    fn missing_dictionary_is_an_error() -> Result<(), String> {
        let dir = TempDir::new().map_err(|err| err.to_string())?;

        let result = DataDictionary::load(dir.path());
        assert!(matches!(result, Err(DataDictionaryError::NotFound(_))));
        Ok(())
    }
}
