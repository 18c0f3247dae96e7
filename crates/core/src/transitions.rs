use indexmap::IndexMap;
use serde::Serialize;

use crate::errors::TransitionError;

/// Static map of which agent may hand control to which next.
///
/// Built once per session through [`TransitionTableBuilder`]; there is no way
/// to mutate a table after `build`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TransitionTable {
    edges: IndexMap<String, Vec<String>>,
}

impl TransitionTable {
    pub fn builder() -> TransitionTableBuilder {
        TransitionTableBuilder::default()
    }

    /// Hand-off targets for `from`, in declaration order. Unknown agents have none.
    pub fn targets(&self, from: &str) -> &[String] {
        self.edges.get(from).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn can_hand_off(&self, from: &str, to: &str) -> bool {
        self.targets(from).iter().any(|target| target == to)
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }

    /// Every agent mentioned as source or target, sources first.
    pub fn agent_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (from, targets) in &self.edges {
            for name in std::iter::once(from).chain(targets) {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct TransitionTableBuilder {
    edges: Vec<(String, Vec<String>)>,
}

impl TransitionTableBuilder {
    pub fn allow<I, S>(mut self, from: impl Into<String>, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.edges.push((from.into(), targets.into_iter().map(Into::into).collect()));
        self
    }

    pub fn build(self) -> Result<TransitionTable, TransitionError> {
        let mut edges: IndexMap<String, Vec<String>> = IndexMap::new();

        for (from, targets) in self.edges {
            if from.trim().is_empty() {
                return Err(TransitionError::EmptyAgentName);
            }
            if edges.contains_key(&from) {
                return Err(TransitionError::DuplicateSource(from));
            }

            let mut unique: Vec<String> = Vec::with_capacity(targets.len());
            for target in targets {
                if target.trim().is_empty() {
                    return Err(TransitionError::EmptyAgentName);
                }
                if unique.contains(&target) {
                    return Err(TransitionError::DuplicateTarget { from, to: target });
                }
                unique.push(target);
            }
            edges.insert(from, unique);
        }

        // Every hand-off target must itself be able to hand control back.
        for targets in edges.values() {
            if let Some(dead_end) = targets.iter().find(|target| !edges.contains_key(*target)) {
                return Err(TransitionError::DeadEnd(dead_end.clone()));
            }
        }

        Ok(TransitionTable { edges })
    }
}
