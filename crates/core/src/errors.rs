use std::path::PathBuf;

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("transition table contains an empty agent name")]
    EmptyAgentName,
    #[error("agent `{0}` declares its hand-offs more than once")]
    DuplicateSource(String),
    #[error("agent `{from}` lists `{to}` as a hand-off target more than once")]
    DuplicateTarget { from: String, to: String },
    #[error("agent `{0}` can receive control but has no allowed hand-offs")]
    DeadEnd(String),
}

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt file for agent `{agent}` not found under `{dir}`")]
    NotFound { agent: String, dir: PathBuf },
    #[error("could not read prompt file `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
}

#[derive(Debug, Error)]
pub enum DataDictionaryError {
    #[error("data dictionary file not found in `{0}`")]
    NotFound(PathBuf),
    #[error("could not read data dictionary `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not parse data dictionary `{path}`: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
}

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("unsupported strategy `{0}` (expected nl2sql_advisor|nl2sql_fewshot|classic_rag)")]
    UnknownStrategy(String),
    #[error("agent name `{0}` is used more than once")]
    DuplicateAgent(String),
    #[error("transition table references unknown agent `{0}`")]
    UnknownTransitionAgent(String),
    #[error("tool `{tool}` is bound to unknown agent `{agent}`")]
    UnboundToolParticipant { tool: String, agent: String },
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error("conversation summary failed: {0}")]
    Summary(String),
}
