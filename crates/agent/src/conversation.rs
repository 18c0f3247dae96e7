use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::llm::{LlmClient, LlmError};

pub const EMPTY_HISTORY_SUMMARY: &str = "The conversation just started.";

const SUMMARY_INSTRUCTION: &str = "Please summarize the following conversation, highlighting the main topics discussed, the specific subject if mentioned, any decisions made, questions raised, and any unresolved issues or actions pending. If there is a document or object mentioned with an identifying number, include that information for future reference. If the last message in the conversation is an agent asking the user for clarification, leave the last raw conversation history of both sides as is. Conversation history: \n";

const LOGGED_SUMMARY_CHARS: usize = 200;

/// One message of a prior exchange, oldest first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: String,
    pub content: String,
}

impl ConversationTurn {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self { role: role.into(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// Condenses earlier turns into the text injected into assistant prompts.
#[derive(Clone)]
pub struct ConversationSummarizer {
    llm: Arc<dyn LlmClient>,
}

impl ConversationSummarizer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn summarize(&self, history: &[ConversationTurn]) -> Result<String, LlmError> {
        if history.is_empty() {
            return Ok(EMPTY_HISTORY_SUMMARY.to_string());
        }

        let summary = self.llm.complete(&summary_prompt(history)).await?;
        let preview: String = summary.chars().take(LOGGED_SUMMARY_CHARS).collect();
        info!(
            event_name = "conversation.summary.generated",
            turns = history.len(),
            summary = %preview,
            "conversation summary generated"
        );

        Ok(summary)
    }
}

pub fn summary_prompt(history: &[ConversationTurn]) -> String {
    let rendered = history
        .iter()
        .map(|turn| format!("{}: {}", turn.role, turn.content))
        .collect::<Vec<_>>()
        .join("\n");

    format!("{SUMMARY_INSTRUCTION}{rendered}")
}
