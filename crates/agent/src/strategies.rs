use std::sync::Arc;

use nl2sql_core::{
    AgentConfiguration, AgentDescriptor, AgentRole, PromptSource, StrategyError, StrategyType,
    TerminationPredicate, ToolBinding, TransitionTable,
};
use tracing::info;

use crate::conversation::{ConversationSummarizer, ConversationTurn};
use crate::llm::LlmClient;
use crate::tools::{
    ExecuteSqlQueryTool, GetAllTablesInfoTool, GetSchemaInfoTool, GetTimeTool, GetTodayDateTool,
    RetrieveTool, ValidateSqlQueryTool, EXECUTE_SQL_QUERY, GET_ALL_TABLES_INFO, GET_SCHEMA_INFO,
    GET_TIME, GET_TODAY_DATE, VALIDATE_SQL_QUERY, VECTOR_INDEX_RETRIEVE,
};

pub const USER: &str = "user";
pub const ASSISTANT: &str = "assistant";
pub const ADVISOR: &str = "advisor";
pub const CHAT_CLOSURE: &str = "chat_closure";

pub const SUMMARY_PLACEHOLDER: &str = "conversation_summary";

const USER_PROXY_PROMPT: &str = "user_proxy";
const NL2SQL_ASSISTANT_PROMPT: &str = "nl2sql_assistant";
const ADVISOR_PROMPT: &str = "advisor";
const CLASSIC_RAG_ASSISTANT_PROMPT: &str = "classic_rag_assistant";
const CHAT_CLOSURE_PROMPT: &str = "chat_closure";

const ASSISTANT_DESCRIPTION: &str =
    "Generates SQL queries, considers advisor recommendations, and executes queries after feedback.";
const ADVISOR_DESCRIPTION: &str = "Reviews and rewrites SQL queries as needed for optimal execution.";

/// Assembles the agent roster, prompts, tool bindings and transitions of a strategy.
pub struct StrategyBuilder {
    prompts: Arc<dyn PromptSource>,
    summarizer: ConversationSummarizer,
}

impl StrategyBuilder {
    pub fn new(prompts: Arc<dyn PromptSource>, llm: Arc<dyn LlmClient>) -> Self {
        Self { prompts, summarizer: ConversationSummarizer::new(llm) }
    }

    pub async fn build(
        &self,
        strategy: StrategyType,
        history: &[ConversationTurn],
    ) -> Result<AgentConfiguration, StrategyError> {
        let summary = self
            .summarizer
            .summarize(history)
            .await
            .map_err(|err| StrategyError::Summary(err.to_string()))?;

        let configuration = match strategy {
            StrategyType::Nl2sqlAdvisor => self.advisor(&summary)?,
            StrategyType::Nl2sqlFewshot => self.fewshot(&summary)?,
            StrategyType::ClassicRag => self.classic_rag(&summary)?,
        };

        info!(
            event_name = "strategy.configuration.built",
            strategy = %strategy,
            correlation_id = %configuration.session_id,
            agents = configuration.agents.len(),
            tools = configuration.tools.len(),
            "agent configuration built"
        );
        Ok(configuration)
    }

    fn prompt(
        &self,
        strategy: StrategyType,
        name: &str,
        summary: Option<&str>,
    ) -> Result<String, StrategyError> {
        let placeholders: Vec<(&str, &str)> =
            summary.map(|summary| vec![(SUMMARY_PLACEHOLDER, summary)]).unwrap_or_default();
        Ok(self.prompts.load(strategy, name, &placeholders)?)
    }

    fn user_proxy(&self, strategy: StrategyType) -> Result<AgentDescriptor, StrategyError> {
        let prompt = self.prompt(strategy, USER_PROXY_PROMPT, None)?;
        Ok(AgentDescriptor::new(USER, AgentRole::UserProxy, prompt)
            .terminating_on(TerminationPredicate::default()))
    }

    fn advisor(&self, summary: &str) -> Result<AgentConfiguration, StrategyError> {
        let strategy = StrategyType::Nl2sqlAdvisor;

        let agents = vec![
            self.user_proxy(strategy)?,
            AgentDescriptor::new(
                ASSISTANT,
                AgentRole::Assistant,
                self.prompt(strategy, NL2SQL_ASSISTANT_PROMPT, Some(summary))?,
            )
            .with_description(ASSISTANT_DESCRIPTION)
            .terminating_on(TerminationPredicate::default()),
            AgentDescriptor::new(
                ADVISOR,
                AgentRole::Advisor,
                self.prompt(strategy, ADVISOR_PROMPT, None)?,
            )
            .with_description(ADVISOR_DESCRIPTION),
        ];

        let transitions = TransitionTable::builder()
            .allow(USER, [ASSISTANT])
            .allow(ASSISTANT, [ADVISOR, USER])
            .allow(ADVISOR, [USER, ASSISTANT])
            .build()?;

        let tools = vec![
            ToolBinding::new(GET_SCHEMA_INFO, GetSchemaInfoTool::DESCRIPTION, ASSISTANT, USER),
            ToolBinding::new(GET_ALL_TABLES_INFO, GetAllTablesInfoTool::DESCRIPTION, ASSISTANT, USER),
            ToolBinding::new(EXECUTE_SQL_QUERY, ExecuteSqlQueryTool::DESCRIPTION, ASSISTANT, USER),
            ToolBinding::new(GET_TODAY_DATE, GetTodayDateTool::DESCRIPTION, ASSISTANT, USER),
            ToolBinding::new(GET_TIME, GetTimeTool::DESCRIPTION, ASSISTANT, USER),
            ToolBinding::new(VALIDATE_SQL_QUERY, ValidateSqlQueryTool::DESCRIPTION, ADVISOR, USER),
        ];

        AgentConfiguration::new(strategy, agents, transitions, tools)
    }

    fn fewshot(&self, summary: &str) -> Result<AgentConfiguration, StrategyError> {
        let strategy = StrategyType::Nl2sqlFewshot;

        let agents = vec![
            self.user_proxy(strategy)?,
            AgentDescriptor::new(
                ASSISTANT,
                AgentRole::Assistant,
                self.prompt(strategy, NL2SQL_ASSISTANT_PROMPT, Some(summary))?,
            ),
        ];

        let transitions =
            TransitionTable::builder().allow(USER, [ASSISTANT]).allow(ASSISTANT, [USER]).build()?;

        let tools = vec![
            ToolBinding::new(GET_SCHEMA_INFO, GetSchemaInfoTool::DESCRIPTION, ASSISTANT, USER),
            ToolBinding::new(GET_ALL_TABLES_INFO, GetAllTablesInfoTool::DESCRIPTION, ASSISTANT, USER),
            ToolBinding::new(VALIDATE_SQL_QUERY, ValidateSqlQueryTool::DESCRIPTION, ASSISTANT, USER),
            ToolBinding::new(EXECUTE_SQL_QUERY, ExecuteSqlQueryTool::DESCRIPTION, ASSISTANT, USER),
            ToolBinding::new(VECTOR_INDEX_RETRIEVE, RetrieveTool::FEWSHOT_DESCRIPTION, ASSISTANT, USER),
        ];

        AgentConfiguration::new(strategy, agents, transitions, tools)
    }

    fn classic_rag(&self, summary: &str) -> Result<AgentConfiguration, StrategyError> {
        let strategy = StrategyType::ClassicRag;

        let agents = vec![
            self.user_proxy(strategy)?,
            AgentDescriptor::new(
                ASSISTANT,
                AgentRole::Assistant,
                self.prompt(strategy, CLASSIC_RAG_ASSISTANT_PROMPT, Some(summary))?,
            ),
            AgentDescriptor::new(
                CHAT_CLOSURE,
                AgentRole::Advisor,
                self.prompt(strategy, CHAT_CLOSURE_PROMPT, None)?,
            ),
        ];

        let transitions = TransitionTable::builder()
            .allow(USER, [ASSISTANT])
            .allow(ASSISTANT, [CHAT_CLOSURE, USER])
            .allow(CHAT_CLOSURE, [USER])
            .build()?;

        let tools = vec![
            ToolBinding::new(
                VECTOR_INDEX_RETRIEVE,
                RetrieveTool::KNOWLEDGE_BASE_DESCRIPTION,
                ASSISTANT,
                USER,
            ),
            ToolBinding::new(GET_TODAY_DATE, GetTodayDateTool::DESCRIPTION, ASSISTANT, USER),
            ToolBinding::new(GET_TIME, GetTimeTool::DESCRIPTION, ASSISTANT, USER),
        ];

        AgentConfiguration::new(strategy, agents, transitions, tools)
    }
}
