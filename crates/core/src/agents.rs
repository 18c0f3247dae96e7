use serde::{Deserialize, Serialize};

pub const TERMINATION_SENTINEL: &str = "TERMINATE";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    UserProxy,
    Assistant,
    Advisor,
}

/// Ends the conversation once a message carries the sentinel token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationPredicate {
    pub sentinel: String,
}

impl Default for TerminationPredicate {
    fn default() -> Self {
        Self { sentinel: TERMINATION_SENTINEL.to_string() }
    }
}

impl TerminationPredicate {
    pub fn new(sentinel: impl Into<String>) -> Self {
        Self { sentinel: sentinel.into() }
    }

    pub fn is_termination(&self, content: Option<&str>) -> bool {
        content.is_some_and(|content| content.contains(&self.sentinel))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AgentDescriptor {
    pub name: String,
    pub role: AgentRole,
    pub description: Option<String>,
    pub system_prompt: String,
    /// The user proxy only executes tools and relays input; it never calls the LLM.
    pub uses_llm: bool,
    pub termination: Option<TerminationPredicate>,
}

impl AgentDescriptor {
    pub fn new(name: impl Into<String>, role: AgentRole, system_prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role,
            description: None,
            system_prompt: system_prompt.into(),
            uses_llm: role != AgentRole::UserProxy,
            termination: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn terminating_on(mut self, predicate: TerminationPredicate) -> Self {
        self.termination = Some(predicate);
        self
    }

    pub fn is_termination_msg(&self, content: Option<&str>) -> bool {
        self.termination.as_ref().is_some_and(|predicate| predicate.is_termination(content))
    }
}

#[cfg(test)]
mod tests {
    use super::{AgentDescriptor, AgentRole, TerminationPredicate};

    #[test]
    fn termination_requires_present_content_with_sentinel() {
        let predicate = TerminationPredicate::default();

        assert!(predicate.is_termination(Some("All done. TERMINATE")));
        assert!(!predicate.is_termination(Some("terminate")));
        assert!(!predicate.is_termination(Some("")));
        assert!(!predicate.is_termination(None));
    }

    #[test]
    fn agents_without_predicate_never_terminate() {
        let advisor = AgentDescriptor::new("advisor", AgentRole::Advisor, "review sql");
        assert!(!advisor.is_termination_msg(Some("TERMINATE")));

        let user = AgentDescriptor::new("user", AgentRole::UserProxy, "relay")
            .terminating_on(TerminationPredicate::default());
        assert!(user.is_termination_msg(Some("TERMINATE")));
        assert!(!user.uses_llm);
        assert!(advisor.uses_llm);
    }
}
