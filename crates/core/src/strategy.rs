use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agents::AgentDescriptor;
use crate::errors::StrategyError;
use crate::transitions::TransitionTable;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    Nl2sqlAdvisor,
    Nl2sqlFewshot,
    ClassicRag,
}

impl StrategyType {
    pub const ALL: [StrategyType; 3] = [Self::Nl2sqlAdvisor, Self::Nl2sqlFewshot, Self::ClassicRag];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nl2sqlAdvisor => "nl2sql_advisor",
            Self::Nl2sqlFewshot => "nl2sql_fewshot",
            Self::ClassicRag => "classic_rag",
        }
    }

    /// Upper bound on agent turns before the runtime gives up on the session.
    pub fn max_rounds(&self) -> u32 {
        match self {
            Self::Nl2sqlAdvisor => 30,
            Self::Nl2sqlFewshot => 20,
            Self::ClassicRag => 10,
        }
    }

    pub fn send_introductions(&self) -> bool {
        matches!(self, Self::Nl2sqlAdvisor)
    }
}

impl std::fmt::Display for StrategyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StrategyType {
    type Err = StrategyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "nl2sql_advisor" | "advisor" => Ok(Self::Nl2sqlAdvisor),
            "nl2sql_fewshot" | "fewshot" => Ok(Self::Nl2sqlFewshot),
            "classic_rag" => Ok(Self::ClassicRag),
            other => Err(StrategyError::UnknownStrategy(other.to_string())),
        }
    }
}

/// A tool exposed to one agent's LLM and run on behalf of another agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ToolBinding {
    pub name: String,
    pub description: String,
    pub caller: String,
    pub executor: String,
}

impl ToolBinding {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        caller: impl Into<String>,
        executor: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            caller: caller.into(),
            executor: executor.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionsType {
    Allowed,
}

/// Everything the orchestration runtime needs to run one session.
#[derive(Clone, Debug, Serialize)]
pub struct AgentConfiguration {
    pub session_id: Uuid,
    pub strategy: StrategyType,
    pub agents: Vec<AgentDescriptor>,
    pub transitions: TransitionTable,
    pub transitions_type: TransitionsType,
    pub tools: Vec<ToolBinding>,
    pub max_rounds: u32,
    pub send_introductions: bool,
}

impl AgentConfiguration {
    pub fn new(
        strategy: StrategyType,
        agents: Vec<AgentDescriptor>,
        transitions: TransitionTable,
        tools: Vec<ToolBinding>,
    ) -> Result<Self, StrategyError> {
        for (index, agent) in agents.iter().enumerate() {
            if agents[..index].iter().any(|other| other.name == agent.name) {
                return Err(StrategyError::DuplicateAgent(agent.name.clone()));
            }
        }

        let known = |name: &str| agents.iter().any(|agent| agent.name == name);
        for binding in &tools {
            for participant in [&binding.caller, &binding.executor] {
                if !known(participant) {
                    return Err(StrategyError::UnboundToolParticipant {
                        tool: binding.name.clone(),
                        agent: participant.clone(),
                    });
                }
            }
        }
        for name in transitions.agent_names() {
            if !known(name) {
                return Err(StrategyError::UnknownTransitionAgent(name.to_string()));
            }
        }

        Ok(Self {
            session_id: Uuid::new_v4(),
            strategy,
            agents,
            transitions,
            transitions_type: TransitionsType::Allowed,
            tools,
            max_rounds: strategy.max_rounds(),
            send_introductions: strategy.send_introductions(),
        })
    }

    pub fn agent(&self, name: &str) -> Option<&AgentDescriptor> {
        self.agents.iter().find(|agent| agent.name == name)
    }

    pub fn tools_for(&self, caller: &str) -> Vec<&ToolBinding> {
        self.tools.iter().filter(|binding| binding.caller == caller).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{AgentConfiguration, StrategyType, ToolBinding};
    use crate::agents::{AgentDescriptor, AgentRole};
    use crate::errors::StrategyError;
    use crate::transitions::TransitionTable;

    fn pair() -> Vec<AgentDescriptor> {
        vec![
            AgentDescriptor::new("user", AgentRole::UserProxy, "proxy"),
            AgentDescriptor::new("assistant", AgentRole::Assistant, "writes sql"),
        ]
    }

    fn pair_table() -> TransitionTable {
        TransitionTable::builder()
            .allow("user", ["assistant"])
            .allow("assistant", ["user"])
            .build()
            .expect("table should build")
    }

    #[test]
    fn strategy_round_limits_and_introductions() {
        assert_eq!(StrategyType::Nl2sqlAdvisor.max_rounds(), 30);
        assert_eq!(StrategyType::Nl2sqlFewshot.max_rounds(), 20);
        assert_eq!(StrategyType::ClassicRag.max_rounds(), 10);
        assert!(StrategyType::Nl2sqlAdvisor.send_introductions());
        assert!(!StrategyType::Nl2sqlFewshot.send_introductions());
        assert!(!StrategyType::ClassicRag.send_introductions());
    }

    #[test]
    fn strategy_type_parses_ids_and_short_aliases() {
        assert_eq!("nl2sql_advisor".parse::<StrategyType>().ok(), Some(StrategyType::Nl2sqlAdvisor));
        assert_eq!(" Fewshot ".parse::<StrategyType>().ok(), Some(StrategyType::Nl2sqlFewshot));
        assert!(matches!(
            "graph_rag".parse::<StrategyType>(),
            Err(StrategyError::UnknownStrategy(ref id)) if id == "graph_rag"
        ));
    }

    #[test]
    fn configuration_rejects_duplicate_agent_names() {
        let mut agents = pair();
        agents.push(AgentDescriptor::new("user", AgentRole::Advisor, "dup"));

        let result =
            AgentConfiguration::new(StrategyType::Nl2sqlFewshot, agents, pair_table(), Vec::new());
        assert!(matches!(result, Err(StrategyError::DuplicateAgent(ref name)) if name == "user"));
    }

    #[test]
    fn configuration_rejects_tools_bound_to_missing_agents() {
        let tools = vec![ToolBinding::new("validate_sql_query", "check", "advisor", "user")];

        let result =
            AgentConfiguration::new(StrategyType::Nl2sqlFewshot, pair(), pair_table(), tools);
        assert!(matches!(
            result,
            Err(StrategyError::UnboundToolParticipant { ref agent, .. }) if agent == "advisor"
        ));
    }

    #[test]
    fn configuration_carries_strategy_limits_and_filters_tools_by_caller() {
        let tools = vec![
            ToolBinding::new("get_time", "time", "assistant", "user"),
            ToolBinding::new("get_today_date", "date", "assistant", "user"),
        ];
        let config =
            AgentConfiguration::new(StrategyType::Nl2sqlFewshot, pair(), pair_table(), tools)
                .expect("configuration should build");

        assert_eq!(config.max_rounds, 20);
        assert!(!config.send_introductions);
        assert_eq!(config.tools_for("assistant").len(), 2);
        assert!(config.tools_for("user").is_empty());
        assert_eq!(config.agent("assistant").map(|agent| agent.role), Some(AgentRole::Assistant));
    }
}
