pub mod agents;
pub mod clock;
pub mod config;
pub mod dictionary;
pub mod errors;
pub mod prompts;
pub mod results;
pub mod strategy;
pub mod transitions;

pub use agents::{AgentDescriptor, AgentRole, TerminationPredicate, TERMINATION_SENTINEL};
pub use dictionary::{DataDictionary, TableEntry};
pub use errors::{DataDictionaryError, PromptError, StrategyError, TransitionError};
pub use prompts::{FilePromptSource, PromptSource, StaticPromptSource};
pub use results::{
    ExecuteSqlResult, SchemaInfo, SqlRow, SqlValue, TableSummary, TablesList, ValidateSqlResult,
};
pub use strategy::{AgentConfiguration, StrategyType, ToolBinding, TransitionsType};
pub use transitions::{TransitionTable, TransitionTableBuilder};
