use std::sync::Arc;

use nl2sql_core::{AgentConfiguration, DataDictionary, StrategyError, StrategyType};
use nl2sql_db::SqlGateway;
use serde_json::{json, Value};
use tracing::warn;

use crate::conversation::ConversationTurn;
use crate::retrieval::Retriever;
use crate::strategies::StrategyBuilder;
use crate::tools::{
    ExecuteSqlQueryTool, GetAllTablesInfoTool, GetSchemaInfoTool, GetTimeTool, GetTodayDateTool,
    RetrieveTool, Tool, ToolRegistry, ValidateSqlQueryTool, EXECUTE_SQL_QUERY, GET_ALL_TABLES_INFO,
    GET_SCHEMA_INFO, GET_TIME, GET_TODAY_DATE, VALIDATE_SQL_QUERY, VECTOR_INDEX_RETRIEVE,
};

/// Backends the tools of a session run against.
#[derive(Clone)]
pub struct ToolBackends {
    pub dictionary: Arc<DataDictionary>,
    pub sql: Arc<dyn SqlGateway>,
    pub index: Arc<dyn Retriever>,
    pub keyword: Arc<dyn Retriever>,
}

impl ToolBackends {
    fn tool(&self, strategy: StrategyType, name: &str) -> Option<Box<dyn Tool>> {
        let tool: Box<dyn Tool> = match name {
            GET_SCHEMA_INFO => Box::new(GetSchemaInfoTool::new(self.dictionary.clone())),
            GET_ALL_TABLES_INFO => Box::new(GetAllTablesInfoTool::new(self.dictionary.clone())),
            VALIDATE_SQL_QUERY => Box::new(ValidateSqlQueryTool::new(self.sql.clone())),
            EXECUTE_SQL_QUERY => Box::new(ExecuteSqlQueryTool::new(self.sql.clone())),
            GET_TODAY_DATE => Box::new(GetTodayDateTool),
            GET_TIME => Box::new(GetTimeTool),
            VECTOR_INDEX_RETRIEVE if strategy == StrategyType::ClassicRag => {
                Box::new(RetrieveTool::new(self.keyword.clone()))
            }
            VECTOR_INDEX_RETRIEVE => Box::new(RetrieveTool::new(self.index.clone())),
            _ => return None,
        };
        Some(tool)
    }
}

pub struct AgentRuntime {
    strategies: StrategyBuilder,
    backends: ToolBackends,
}

impl AgentRuntime {
    pub fn new(strategies: StrategyBuilder, backends: ToolBackends) -> Self {
        Self { strategies, backends }
    }

    pub async fn start_session(
        &self,
        strategy: StrategyType,
        history: &[ConversationTurn],
    ) -> Result<AgentSession, StrategyError> {
        let configuration = self.strategies.build(strategy, history).await?;

        let mut registry = ToolRegistry::default();
        for binding in &configuration.tools {
            if registry.get(&binding.name).is_some() {
                continue;
            }
            match self.backends.tool(strategy, &binding.name) {
                Some(tool) => registry.register_boxed(tool),
                None => warn!(tool = %binding.name, "no backend for bound tool"),
            }
        }

        Ok(AgentSession { configuration, registry })
    }
}

/// One configured conversation with the tools its agents may call.
pub struct AgentSession {
    configuration: AgentConfiguration,
    registry: ToolRegistry,
}

impl AgentSession {
    pub fn configuration(&self) -> &AgentConfiguration {
        &self.configuration
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Runs `tool` for `caller` if the configuration binds it to that agent.
    pub async fn call_tool(&self, caller: &str, tool: &str, input: Value) -> Value {
        let bound = self
            .configuration
            .tools
            .iter()
            .any(|binding| binding.caller == caller && binding.name == tool);
        if !bound {
            warn!(
                event_name = "tool.unbound_call",
                caller,
                tool,
                correlation_id = %self.configuration.session_id,
                "agent called a tool it is not bound to"
            );
            return json!({ "error": format!("tool {tool} is not available to {caller}") });
        }

        self.registry.invoke(tool, input).await
    }
}
