use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::errors::PromptError;
use crate::strategy::StrategyType;

pub const COMMON_PROMPT_DIR: &str = "common";

/// Supplies system prompts for the agents of a strategy.
pub trait PromptSource: Send + Sync {
    /// Returns the prompt for `agent` with `{{name}}` placeholders filled in.
    fn load(
        &self,
        strategy: StrategyType,
        agent: &str,
        placeholders: &[(&str, &str)],
    ) -> Result<String, PromptError>;
}

/// Reads `<root>/<strategy>/<agent>.custom.txt`, falling back to `<agent>.txt`.
///
/// Placeholders not supplied by the caller are filled from
/// `<root>/common/<name>.txt` when such a file exists.
#[derive(Clone, Debug)]
pub struct FilePromptSource {
    root: PathBuf,
}

impl FilePromptSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn strategy_dir(&self, strategy: StrategyType) -> PathBuf {
        self.root.join(strategy.as_str())
    }
}

impl PromptSource for FilePromptSource {
    fn load(
        &self,
        strategy: StrategyType,
        agent: &str,
        placeholders: &[(&str, &str)],
    ) -> Result<String, PromptError> {
        let dir = self.strategy_dir(strategy);
        let custom = dir.join(format!("{agent}.custom.txt"));
        let default = dir.join(format!("{agent}.txt"));

        let selected = if custom.exists() {
            info!(path = %custom.display(), "using custom prompt file");
            custom
        } else if default.exists() {
            info!(path = %default.display(), "using default prompt file");
            default
        } else {
            error!(agent, dir = %dir.display(), "prompt file not found");
            return Err(PromptError::NotFound { agent: agent.to_string(), dir });
        };

        let raw = fs::read_to_string(&selected)
            .map_err(|source| PromptError::Read { path: selected.clone(), source })?;
        let common_dir = self.root.join(COMMON_PROMPT_DIR);

        Ok(render_prompt(raw.trim(), placeholders, |name| {
            fs::read_to_string(common_dir.join(format!("{name}.txt")))
                .ok()
                .map(|content| content.trim().to_string())
        }))
    }
}

/// Prompts held in memory, keyed by strategy and agent name.
#[derive(Clone, Debug, Default)]
pub struct StaticPromptSource {
    prompts: HashMap<(StrategyType, String), String>,
    common: HashMap<String, String>,
}

impl StaticPromptSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prompt(
        mut self,
        strategy: StrategyType,
        agent: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        self.prompts.insert((strategy, agent.into()), prompt.into());
        self
    }

    pub fn with_common(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.common.insert(name.into(), content.into());
        self
    }
}

impl PromptSource for StaticPromptSource {
    fn load(
        &self,
        strategy: StrategyType,
        agent: &str,
        placeholders: &[(&str, &str)],
    ) -> Result<String, PromptError> {
        let raw = self.prompts.get(&(strategy, agent.to_string())).ok_or_else(|| {
            PromptError::NotFound { agent: agent.to_string(), dir: PathBuf::from(strategy.as_str()) }
        })?;

        Ok(render_prompt(raw.trim(), placeholders, |name| self.common.get(name).cloned()))
    }
}

/// Replaces `{{name}}` markers: caller values first, then `common` lookups.
///
/// Markers that neither source can fill stay in the output verbatim.
pub fn render_prompt<F>(template: &str, placeholders: &[(&str, &str)], common: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut prompt = template.to_string();
    for (key, value) in placeholders {
        prompt = prompt.replace(&marker(key), value);
    }

    for name in placeholder_names(&prompt) {
        if placeholders.iter().any(|(key, _)| *key == name) {
            continue;
        }
        match common(&name) {
            Some(content) => prompt = prompt.replace(&marker(&name), &content),
            None => warn!(placeholder = %name, "prompt placeholder could not be replaced"),
        }
    }

    prompt
}

fn marker(name: &str) -> String {
    format!("{{{{{name}}}}}")
}

/// Distinct placeholder names in order of first appearance.
pub fn placeholder_names(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let name_len = after.find('}').unwrap_or(after.len());

        if name_len > 0 && after[name_len..].starts_with("}}") {
            let name = &after[..name_len];
            if !names.iter().any(|existing| existing == name) {
                names.push(name.to_string());
            }
            rest = &after[name_len + 2..];
        } else {
            rest = &rest[start + 1..];
        }
    }

    names
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{placeholder_names, render_prompt, FilePromptSource, PromptSource};
    use crate::errors::PromptError;
    use crate::strategy::StrategyType;

    #[test]
    fn placeholder_names_are_distinct_and_ordered() {
        let names = placeholder_names("{{a}} then {{b}} and {{a}} but not {{}} or {single}");

        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn supplied_values_win_over_common_lookups() {
        let rendered = render_prompt(
            "Summary: {{conversation_summary}}\n{{sql_rules}}\n{{unknown}}",
            &[("conversation_summary", "The conversation just started.")],
            |name| (name == "sql_rules").then(|| "Only SELECT.".to_string()),
        );

        assert_eq!(rendered, "Summary: The conversation just started.\nOnly SELECT.\n{{unknown}}");
    }

    #[test]
    fn custom_prompt_file_wins_and_common_fragments_are_inlined() -> Result<(), String> {
        let dir = TempDir::new().map_err(|err| err.to_string())?;
        let strategy_dir = dir.path().join("nl2sql_advisor");
        let common_dir = dir.path().join("common");
        fs::create_dir_all(&strategy_dir).map_err(|err| err.to_string())?;
        fs::create_dir_all(&common_dir).map_err(|err| err.to_string())?;

        fs::write(strategy_dir.join("advisor.txt"), "default advisor").map_err(|e| e.to_string())?;
        fs::write(strategy_dir.join("advisor.custom.txt"), "  custom {{guidelines}}\n")
            .map_err(|err| err.to_string())?;
        fs::write(common_dir.join("guidelines.txt"), "be precise\n").map_err(|e| e.to_string())?;

        let source = FilePromptSource::new(dir.path());
        let prompt = source
            .load(StrategyType::Nl2sqlAdvisor, "advisor", &[])
            .map_err(|err| err.to_string())?;

        assert_eq!(prompt, "custom be precise");
        Ok(())
    }

    #[test]
    fn missing_prompt_file_is_reported() -> Result<(), String> {
        let dir = TempDir::new().map_err(|err| err.to_string())?;
        let source = FilePromptSource::new(dir.path());

        let result = source.load(StrategyType::ClassicRag, "chat_closure", &[]);
        assert!(matches!(result, Err(PromptError::NotFound { ref agent, .. }) if agent == "chat_closure"));
        Ok(())
    }
}
