//! Agent Runtime - strategy assembly and tool execution for NL-to-SQL sessions
//!
//! This crate turns a chosen strategy into a runnable agent configuration:
//! - Summarizes prior conversation turns for the assistant prompt
//! - Builds the agent roster, transition table and tool bindings per strategy
//! - Runs bound tools (schema lookup, SQL validate/execute, retrieval, clock)
//!
//! # Architecture
//!
//! 1. **Strategy** (`strategies`) - roster, prompts, transitions, bindings
//! 2. **Tools** (`tools`) - JSON-in/JSON-out functions the agents call
//! 3. **Retrieval** (`retrieval`) - document index and keyword collection search
//! 4. **Session** (`runtime`) - binds configuration and tool registry together
//!
//! # Failure Model
//!
//! Tools never fail a session. Errors are logged and handed back to the
//! calling agent as data so the conversation can recover.

pub mod conversation;
pub mod llm;
pub mod retrieval;
pub mod runtime;
pub mod strategies;
pub mod tools;

pub use conversation::{ConversationSummarizer, ConversationTurn};
pub use llm::{EmbeddingClient, LlmClient, LlmError, OpenAiCompatibleClient};
pub use retrieval::{KeywordCollectionRetriever, Retriever, VectorIndexRetriever};
pub use runtime::{AgentRuntime, AgentSession, ToolBackends};
pub use strategies::StrategyBuilder;
pub use tools::{Tool, ToolRegistry};
