use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use nl2sql_core::{clock, DataDictionary};
use nl2sql_db::SqlGateway;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::retrieval::Retriever;

pub const GET_SCHEMA_INFO: &str = "get_schema_info";
pub const GET_ALL_TABLES_INFO: &str = "get_all_tables_info";
pub const VALIDATE_SQL_QUERY: &str = "validate_sql_query";
pub const EXECUTE_SQL_QUERY: &str = "execute_sql_query";
pub const GET_TODAY_DATE: &str = "get_today_date";
pub const GET_TIME: &str = "get_time";
pub const VECTOR_INDEX_RETRIEVE: &str = "vector_index_retrieve";

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    async fn execute(&self, input: Value) -> Result<Value>;
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    pub fn register_boxed(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(Box::as_ref)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Runs a tool and always answers with JSON.
    ///
    /// Unknown tools and tool errors become `{"error": ...}` payloads.
    pub async fn invoke(&self, name: &str, input: Value) -> Value {
        let Some(tool) = self.tools.get(name) else {
            error!(event_name = "tool.unknown", tool = name, "tool is not registered");
            return json!({ "error": format!("unknown tool: {name}") });
        };

        match tool.execute(input).await {
            Ok(output) => {
                info!(event_name = "tool.completed", tool = name, "tool call completed");
                output
            }
            Err(err) => {
                error!(event_name = "tool.failed", tool = name, error = %err, "tool call failed");
                json!({ "error": format!("{err:#}") })
            }
        }
    }
}

/// Reads named arguments; `null` counts as an empty argument object.
fn arguments<T>(tool: &str, input: Value) -> Result<T>
where
    T: for<'de> Deserialize<'de> + Default,
{
    if input.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(input).with_context(|| format!("invalid arguments for {tool}"))
}

#[derive(Debug, Default, Deserialize)]
struct SchemaArgs {
    table_name: Option<String>,
    column_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct QueryArgs {
    #[serde(default)]
    query: String,
}

#[derive(Debug, Default, Deserialize)]
struct RetrieveArgs {
    #[serde(default)]
    input: String,
}

pub struct GetSchemaInfoTool {
    dictionary: Arc<DataDictionary>,
}

impl GetSchemaInfoTool {
    pub const DESCRIPTION: &'static str = "Retrieve schema information from the data dictionary. Provide table_name or column_name to get information about the table or column.";

    pub fn new(dictionary: Arc<DataDictionary>) -> Self {
        Self { dictionary }
    }
}

#[async_trait]
impl Tool for GetSchemaInfoTool {
    fn name(&self) -> &'static str {
        GET_SCHEMA_INFO
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let args: SchemaArgs = arguments(GET_SCHEMA_INFO, input)?;
        let info =
            self.dictionary.schema_info(args.table_name.as_deref(), args.column_name.as_deref());
        Ok(serde_json::to_value(info)?)
    }
}

pub struct GetAllTablesInfoTool {
    dictionary: Arc<DataDictionary>,
}

impl GetAllTablesInfoTool {
    pub const DESCRIPTION: &'static str =
        "Retrieve a list of all table names and their descriptions from the data dictionary.";

    pub fn new(dictionary: Arc<DataDictionary>) -> Self {
        Self { dictionary }
    }
}

#[async_trait]
impl Tool for GetAllTablesInfoTool {
    fn name(&self) -> &'static str {
        GET_ALL_TABLES_INFO
    }

    async fn execute(&self, _input: Value) -> Result<Value> {
        Ok(serde_json::to_value(self.dictionary.tables_info())?)
    }
}

pub struct ValidateSqlQueryTool {
    gateway: Arc<dyn SqlGateway>,
}

impl ValidateSqlQueryTool {
    pub const DESCRIPTION: &'static str = "Validate the syntax of an SQL query. Returns is_valid as True if valid, or is_valid as False with an error message if invalid.";

    pub fn new(gateway: Arc<dyn SqlGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Tool for ValidateSqlQueryTool {
    fn name(&self) -> &'static str {
        VALIDATE_SQL_QUERY
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let args: QueryArgs = arguments(VALIDATE_SQL_QUERY, input)?;
        Ok(serde_json::to_value(self.gateway.validate(&args.query).await)?)
    }
}

pub struct ExecuteSqlQueryTool {
    gateway: Arc<dyn SqlGateway>,
}

impl ExecuteSqlQueryTool {
    pub const DESCRIPTION: &'static str = "Execute an SQL query and return the results as a list of dictionaries. Each dictionary represents a row.";

    pub fn new(gateway: Arc<dyn SqlGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Tool for ExecuteSqlQueryTool {
    fn name(&self) -> &'static str {
        EXECUTE_SQL_QUERY
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let args: QueryArgs = arguments(EXECUTE_SQL_QUERY, input)?;
        Ok(serde_json::to_value(self.gateway.execute(&args.query).await)?)
    }
}

#[derive(Default)]
pub struct GetTodayDateTool;

impl GetTodayDateTool {
    pub const DESCRIPTION: &'static str = "Provides today's date in the format YYYY-MM-DD.";
}

#[async_trait]
impl Tool for GetTodayDateTool {
    fn name(&self) -> &'static str {
        GET_TODAY_DATE
    }

    async fn execute(&self, _input: Value) -> Result<Value> {
        Ok(Value::String(clock::today_date()))
    }
}

#[derive(Default)]
pub struct GetTimeTool;

impl GetTimeTool {
    pub const DESCRIPTION: &'static str = "Provides the current time in the format HH:MM.";
}

#[async_trait]
impl Tool for GetTimeTool {
    fn name(&self) -> &'static str {
        GET_TIME
    }

    async fn execute(&self, _input: Value) -> Result<Value> {
        Ok(Value::String(clock::current_time()))
    }
}

/// `vector_index_retrieve` backed by whichever retriever the strategy uses.
pub struct RetrieveTool {
    retriever: Arc<dyn Retriever>,
}

impl RetrieveTool {
    pub const FEWSHOT_DESCRIPTION: &'static str =
        "Search for similar queries before the assistant generate a new query. Return sources.";
    pub const KNOWLEDGE_BASE_DESCRIPTION: &'static str =
        "Search the knowledge base for sources to ground and give context to answer a user question.";

    pub fn new(retriever: Arc<dyn Retriever>) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl Tool for RetrieveTool {
    fn name(&self) -> &'static str {
        VECTOR_INDEX_RETRIEVE
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let query = match input {
            Value::String(text) => text,
            other => arguments::<RetrieveArgs>(VECTOR_INDEX_RETRIEVE, other)?.input,
        };
        Ok(Value::String(self.retriever.retrieve(&query).await))
    }
}
